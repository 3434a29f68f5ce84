//! # Tali Forth 2 Test Harness
//!
//! Feeds the Tali Forth 2 test suites to the c65 emulator in a single run
//! and classifies what comes back.
//!
//! The tester preamble and the selected test files are concatenated into one
//! script ending in `bye`, piped to the emulator, and the captured output is
//! scanned line by line for undefined words, failed tests and interpreter
//! errors.

#![warn(clippy::all)]

pub mod assembler;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod runner;

pub use assembler::{AssembledScript, ScriptAssembler, Segment, SourceLoader};
pub use catalog::{TestCatalog, TestSelection};
pub use classify::{Classification, OutputClassifier, Signatures};
pub use config::HarnessConfig;
pub use error::{HarnessError, HarnessResult};
pub use pipeline::Harness;
pub use report::{ReportOptions, ResultReporter, RunSummary};
pub use runner::{ExecutionResult, ProcessRunner};
