use std::collections::{BTreeSet, HashMap, HashSet};

use crate::errors::ValidationError;
use crate::stage::{StageInfo, StageKind};

/// Stage-level graph derived from lane wiring.
///
/// Stage `a` precedes stage `b` when `b` reads a lane that `a` writes. Nodes are
/// indices into the stage list the graph was built from, so config order is the
/// natural tie-break.
#[derive(Debug, Clone)]
pub struct StageGraph {
    names: Vec<String>,
    observers: Vec<bool>,
    downstream: Vec<Vec<usize>>,
    upstream: Vec<Vec<usize>>,
}

impl StageGraph {
    pub fn from_infos(infos: &[StageInfo]) -> Self {
        let mut producers: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, info) in infos.iter().enumerate() {
            for lane in info.output_lanes() {
                producers.entry(lane.as_str()).or_default().push(index);
            }
        }

        let mut downstream = vec![Vec::new(); infos.len()];
        let mut upstream = vec![Vec::new(); infos.len()];
        for (consumer, info) in infos.iter().enumerate() {
            let mut seen = HashSet::new();
            for lane in info.input_lanes() {
                for &producer in producers.get(lane.as_str()).into_iter().flatten() {
                    if seen.insert(producer) {
                        downstream[producer].push(consumer);
                        upstream[consumer].push(producer);
                    }
                }
            }
        }

        Self {
            names: infos.iter().map(|i| i.instance_name().to_string()).collect(),
            observers: infos.iter().map(|i| i.kind() == StageKind::Observer).collect(),
            downstream,
            upstream,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Direct consumers of the stage's output lanes.
    pub fn downstream(&self, index: usize) -> &[usize] {
        &self.downstream[index]
    }

    /// Every stage the given stage transitively depends on, in index order.
    pub fn upstream_of(&self, index: usize) -> Vec<usize> {
        let mut found = BTreeSet::new();
        let mut stack: Vec<usize> = self.upstream[index].clone();
        while let Some(next) = stack.pop() {
            if found.insert(next) {
                stack.extend(self.upstream[next].iter().copied());
            }
        }
        found.into_iter().collect()
    }

    /// Execution order using Kahn's algorithm.
    ///
    /// Among ready stages, observers go first so they see a lane before its
    /// consumer drains it; remaining ties resolve by config order.
    pub fn topological_order(&self) -> Result<Vec<usize>, ValidationError> {
        let mut in_degree: Vec<usize> = self.upstream.iter().map(Vec::len).collect();
        let mut ready: BTreeSet<(bool, usize)> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(index, _)| (!self.observers[index], index))
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some(next) = ready.pop_first() {
            let (_, index) = next;
            order.push(index);
            for &consumer in &self.downstream[index] {
                in_degree[consumer] -= 1;
                if in_degree[consumer] == 0 {
                    ready.insert((!self.observers[consumer], consumer));
                }
            }
        }

        if order.len() == self.len() {
            Ok(order)
        } else {
            Err(ValidationError::CyclicDependency {
                cycle: self.find_cycle().unwrap_or_default(),
            })
        }
    }

    /// First cycle found by depth-first search, as stage names with the first
    /// name repeated at the end.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut visited = vec![false; self.len()];
        let mut on_stack = vec![false; self.len()];
        let mut path = Vec::new();

        for start in 0..self.len() {
            if !visited[start] {
                if let Some(cycle) = self.dfs(start, &mut visited, &mut on_stack, &mut path) {
                    return Some(cycle.into_iter().map(|i| self.names[i].clone()).collect());
                }
            }
        }
        None
    }

    fn dfs(
        &self,
        node: usize,
        visited: &mut [bool],
        on_stack: &mut [bool],
        path: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        visited[node] = true;
        on_stack[node] = true;
        path.push(node);

        for &next in &self.downstream[node] {
            if !visited[next] {
                if let Some(cycle) = self.dfs(next, visited, on_stack, path) {
                    return Some(cycle);
                }
            } else if on_stack[next] {
                let start = path.iter().position(|&n| n == next).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(next);
                return Some(cycle);
            }
        }

        on_stack[node] = false;
        path.pop();
        None
    }
}
