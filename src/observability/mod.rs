// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! All diagnostic and operational logging goes through message structs defined
//! in [`messages`]. Each message implements `Display` for its human-readable
//! text and [`messages::StructuredLog`] to emit itself with structured fields at
//! the right level, which keeps log text out of the engine code paths.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - batch traversal lifecycle and per-stage execution
//! * `messages::stage` - per-record outcomes inside a stage
//! * `messages::validation` - pipeline topology validation
//!
//! # Usage
//!
//! ```rust
//! use lanewise::observability::messages::{engine::LeftoverRecords, StructuredLog};
//!
//! LeftoverRecords {
//!     pipeline: "orders",
//!     lane: "audit",
//!     count: 3,
//! }
//! .log();
//! ```

pub mod messages;
