//! Error types for the test harness
//!
//! Only structural problems are errors. Findings in the captured output
//! (undefined words, failed tests, a crashed target) are reported through
//! [`crate::classify::Classification`] instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a harness run
#[derive(Error, Debug)]
pub enum HarnessError {
    /// One or more requested tests are not in the catalog
    #[error("Illegal test(s): {}", unknown.join(", "))]
    InvalidSelection {
        /// Requested identifiers that the catalog does not know
        unknown: Vec<String>,
    },

    /// The configured catalog has no tests
    #[error("Test catalog is empty")]
    EmptyCatalog,

    /// The configured catalog lists a test twice
    #[error("Test '{0}' appears more than once in the catalog")]
    DuplicateTest(String),

    /// Configuration file could not be read or parsed
    #[error("Failed to load config '{}': {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The tester preamble could not be read
    #[error("Failed to read tester '{}': {source}", path.display())]
    TesterUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A selected test's source file could not be read
    #[error("Failed to read test '{test}' from '{}': {source}", path.display())]
    TestSourceUnavailable {
        test: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The emulator could not be started
    #[error("Failed to launch '{}': {source}", program.display())]
    LaunchFailure {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading the emulator's output or waiting for it failed
    #[error("Failed to capture emulator output: {0}")]
    Capture(#[source] std::io::Error),

    /// The raw output could not be written to the results file
    #[error("Failed to write results to '{}': {source}", path.display())]
    ResultsWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;
