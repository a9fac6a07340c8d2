// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // built-in stages and error sinks
pub mod config;     // config loading, validation, runtime building
pub mod engine;     // lanes, lane views, batch traversal
pub mod errors;     // error handling
pub mod observability;
pub mod record;     // the record model
pub mod stage;      // stage runtime, context, error policy
pub mod traits;     // stage and batch abstractions
