//! Pipeline topology validation.
//!
//! The engine trusts stage descriptors, so every structural rule is checked
//! here, before a pipeline is built:
//!
//! 1. **Uniqueness**: stage names are unique
//! 2. **Shape**: exactly one source, and each stage's lanes fit its kind
//! 3. **Wiring**: every consumed lane has exactly one producer and at most one
//!    non-observer consumer
//! 4. **Acyclicity**: DFS over the stage graph, reporting the cycle path
//!
//! Errors from steps 1-3 are accumulated. Cycle detection runs only when the
//! wiring is otherwise sound, since a cycle report over a broken graph is noise.
//!
//! # Examples
//!
//! ```rust
//! use lanewise::config::validate_stage_topology;
//! use lanewise::errors::ValidationError;
//! use lanewise::stage::{StageInfo, StageKind};
//!
//! let stages = vec![
//!     StageInfo::new("src", StageKind::Source, Vec::<String>::new(), ["raw"]),
//!     StageInfo::new("sink", StageKind::Target, ["parsed"], Vec::<String>::new()),
//! ];
//!
//! let errors = validate_stage_topology(&stages).unwrap_err();
//! assert!(errors.contains(&ValidationError::UnresolvedLane {
//!     stage: "sink".into(),
//!     lane: "parsed".into(),
//! }));
//! ```

use std::collections::{HashMap, HashSet};

use crate::config::{Config, StageGraph};
use crate::errors::ValidationError;
use crate::observability::messages::validation::{
    CyclicDependencyDetected, ValidationCompleted, ValidationFailed,
};
use crate::observability::messages::StructuredLog;
use crate::stage::{StageInfo, StageKind};

/// Validate the stages of a loaded configuration.
pub fn validate_pipeline(config: &Config) -> Result<(), Vec<ValidationError>> {
    validate_stage_topology(&config.stage_infos())
}

/// Validate a set of stage descriptors, accumulating every error found.
///
/// # Returns
///
/// * `Ok(())` - The stages form a runnable pipeline
/// * `Err(Vec<ValidationError>)` - Every problem found, in check order
pub fn validate_stage_topology(stages: &[StageInfo]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    errors.extend(check_unique_names(stages));
    errors.extend(check_source_count(stages));
    errors.extend(check_lane_shapes(stages));
    errors.extend(check_lane_wiring(stages));

    if errors.is_empty() {
        if let Some(cycle) = StageGraph::from_infos(stages).find_cycle() {
            let names: Vec<&str> = cycle.iter().map(String::as_str).collect();
            CyclicDependencyDetected { cycle: &names }.log();
            errors.push(ValidationError::CyclicDependency { cycle });
        }
    }

    if errors.is_empty() {
        ValidationCompleted {
            stage_count: stages.len(),
            lane_count: lane_names(stages).len(),
        }
        .log();
        Ok(())
    } else {
        ValidationFailed {
            error_count: errors.len(),
        }
        .log();
        Err(errors)
    }
}

/// Every lane named by any stage, in first-appearance order.
pub fn lane_names(stages: &[StageInfo]) -> Vec<String> {
    let mut seen: HashSet<&String> = HashSet::new();
    let mut lanes = Vec::new();
    for stage in stages {
        for lane in stage.output_lanes().iter().chain(stage.input_lanes()) {
            if seen.insert(lane) {
                lanes.push(lane.clone());
            }
        }
    }
    lanes
}

fn check_unique_names(stages: &[StageInfo]) -> Vec<ValidationError> {
    let mut seen = HashSet::new();
    let mut errors = Vec::new();
    for stage in stages {
        if !seen.insert(stage.instance_name()) {
            errors.push(ValidationError::DuplicateStageName {
                stage: stage.instance_name().to_string(),
            });
        }
    }
    errors
}

fn check_source_count(stages: &[StageInfo]) -> Option<ValidationError> {
    let found = stages
        .iter()
        .filter(|s| s.kind() == StageKind::Source)
        .count();
    (found != 1).then_some(ValidationError::SourceCount { found })
}

fn check_lane_shapes(stages: &[StageInfo]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for stage in stages {
        // (lanes required, message when the requirement is broken)
        let (inputs, outputs) = match stage.kind() {
            StageKind::Source => (
                (false, "sources cannot read lanes"),
                (true, "sources need at least one output lane"),
            ),
            StageKind::Processor => (
                (true, "processors need at least one input lane"),
                (true, "processors need at least one output lane"),
            ),
            StageKind::Target => (
                (true, "targets need at least one input lane"),
                (false, "targets cannot write lanes"),
            ),
            StageKind::Observer => (
                (true, "observers need at least one input lane"),
                (false, "observers cannot write lanes"),
            ),
        };
        let checks = [
            (inputs, !stage.input_lanes().is_empty()),
            (outputs, !stage.output_lanes().is_empty()),
        ];
        for ((required, reason), present) in checks {
            if required != present {
                errors.push(ValidationError::InvalidLaneShape {
                    stage: stage.instance_name().to_string(),
                    reason,
                });
            }
        }
    }
    errors
}

fn check_lane_wiring(stages: &[StageInfo]) -> Vec<ValidationError> {
    let mut producers: HashMap<&str, Vec<String>> = HashMap::new();
    let mut consumers: HashMap<&str, Vec<String>> = HashMap::new();
    for stage in stages {
        for lane in stage.output_lanes() {
            producers
                .entry(lane.as_str())
                .or_default()
                .push(stage.instance_name().to_string());
        }
        if stage.kind() != StageKind::Observer {
            for lane in stage.input_lanes() {
                consumers
                    .entry(lane.as_str())
                    .or_default()
                    .push(stage.instance_name().to_string());
            }
        }
    }

    let mut errors = Vec::new();
    for stage in stages {
        for lane in stage.input_lanes() {
            if !producers.contains_key(lane.as_str()) {
                errors.push(ValidationError::UnresolvedLane {
                    stage: stage.instance_name().to_string(),
                    lane: lane.clone(),
                });
            }
        }
    }

    for lane in lane_names(stages) {
        if let Some(names) = producers.get(lane.as_str()).filter(|p| p.len() > 1) {
            errors.push(ValidationError::MultipleProducers {
                lane: lane.clone(),
                producers: names.clone(),
            });
        }
        if let Some(names) = consumers.get(lane.as_str()).filter(|c| c.len() > 1) {
            errors.push(ValidationError::MultipleConsumers {
                lane: lane.clone(),
                consumers: names.clone(),
            });
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(name: &str, kind: StageKind, inputs: &[&str], outputs: &[&str]) -> StageInfo {
        StageInfo::new(name, kind, inputs.iter().copied(), outputs.iter().copied())
    }

    fn linear() -> Vec<StageInfo> {
        vec![
            stage("src", StageKind::Source, &[], &["raw"]),
            stage("parse", StageKind::Processor, &["raw"], &["parsed"]),
            stage("peek", StageKind::Observer, &["raw"], &[]),
            stage("sink", StageKind::Target, &["parsed"], &[]),
        ]
    }

    #[test]
    fn test_valid_linear_pipeline() {
        assert!(validate_stage_topology(&linear()).is_ok());
    }

    #[test]
    fn test_duplicate_stage_names() {
        let mut stages = linear();
        stages.push(stage("sink", StageKind::Observer, &["parsed"], &[]));

        let errors = validate_stage_topology(&stages).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateStageName {
                stage: "sink".into()
            }]
        );
    }

    #[test]
    fn test_source_count() {
        let stages = vec![stage("sink", StageKind::Target, &["raw"], &[])];
        let errors = validate_stage_topology(&stages).unwrap_err();
        assert!(errors.contains(&ValidationError::SourceCount { found: 0 }));

        let mut stages = linear();
        stages.push(stage("src2", StageKind::Source, &[], &["other"]));
        let errors = validate_stage_topology(&stages).unwrap_err();
        assert_eq!(errors, vec![ValidationError::SourceCount { found: 2 }]);
    }

    #[test]
    fn test_lane_shapes() {
        let stages = vec![
            stage("src", StageKind::Source, &["x"], &["raw"]),
            stage("x_src", StageKind::Source, &[], &["x"]),
            stage("proc", StageKind::Processor, &["raw"], &[]),
            stage("sink", StageKind::Target, &["raw"], &["extra"]),
        ];
        let errors = validate_stage_topology(&stages).unwrap_err();

        let shapes: Vec<&ValidationError> = errors
            .iter()
            .filter(|e| matches!(e, ValidationError::InvalidLaneShape { .. }))
            .collect();
        assert_eq!(shapes.len(), 3);
    }

    #[test]
    fn test_unresolved_lane() {
        let stages = vec![
            stage("src", StageKind::Source, &[], &["raw"]),
            stage("sink", StageKind::Target, &["missing"], &[]),
        ];
        let errors = validate_stage_topology(&stages).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UnresolvedLane {
                stage: "sink".into(),
                lane: "missing".into(),
            }]
        );
    }

    #[test]
    fn test_multiple_producers_and_consumers() {
        let stages = vec![
            stage("src", StageKind::Source, &[], &["raw"]),
            stage("a", StageKind::Processor, &["raw"], &["out"]),
            stage("b", StageKind::Processor, &["raw"], &["out"]),
            stage("sink", StageKind::Target, &["out"], &[]),
        ];
        let errors = validate_stage_topology(&stages).unwrap_err();

        assert!(errors.contains(&ValidationError::MultipleConsumers {
            lane: "raw".into(),
            consumers: vec!["a".into(), "b".into()],
        }));
        assert!(errors.contains(&ValidationError::MultipleProducers {
            lane: "out".into(),
            producers: vec!["a".into(), "b".into()],
        }));
    }

    #[test]
    fn test_observers_do_not_count_as_consumers() {
        let mut stages = linear();
        stages.push(stage("peek2", StageKind::Observer, &["raw", "parsed"], &[]));
        assert!(validate_stage_topology(&stages).is_ok());
    }

    #[test]
    fn test_cycle_detected() {
        let stages = vec![
            stage("src", StageKind::Source, &[], &["raw"]),
            stage("a", StageKind::Processor, &["raw", "loop"], &["mid"]),
            stage("b", StageKind::Processor, &["mid"], &["loop"]),
        ];
        let errors = validate_stage_topology(&stages).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::CyclicDependency {
                cycle: vec!["a".into(), "b".into(), "a".into()],
            }]
        );
    }

    #[test]
    fn test_lane_names_in_first_appearance_order() {
        assert_eq!(lane_names(&linear()), vec!["raw", "parsed"]);
    }
}
