//! # service_cli: mockgraph Entry Point
//!
//! ## Layer 4 (Service) Role
//!
//! Orchestrates the other layers behind the `mockgraph` binary:
//! - `generate`: validate the plan, assemble the dataset, then export the
//!   bulk-import file set (`csv` mode) or upload it transactionally
//!   (`direct` mode)
//! - `plan`: print the validated plan and merged settings
//! - `verify`: re-read an exported file set and check its references
//!
//! The library half holds the run lifecycle ([`RunState`]), the
//! [`Pipeline`] and the error taxonomy ([`RunError`], [`ErrorKind`]) so they
//! can be driven from tests without spawning the binary.

#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod pipeline;
pub mod state;

pub use error::{ErrorKind, Result, RunError};
pub use pipeline::{Pipeline, ProgressCallback, RunOutcome, RunReport};
pub use state::{RunFailure, RunState};
