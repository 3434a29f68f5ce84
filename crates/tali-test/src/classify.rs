//! Classification of captured emulator output
//!
//! Tali Forth 2 has no structured result protocol, so a run is judged by
//! plain substring matches on each output line:
//!
//! - the run completed if the emulator's shutdown banner (`bye c65:`) shows up
//! - lines mentioning `undefined` point at words the image lacks
//! - lines carrying a tester failure or a Tali error message are failures,
//!   unless they are `compiled` echoes of the test source itself

use serde::{Deserialize, Serialize};

/// Failure messages printed by `tester.fs`
pub const TESTER_FAILURES: &[&str] = &["INCORRECT RESULT", "WRONG NUMBER OF RESULTS"];

/// Error messages printed by Tali Forth 2
pub const TALI_ERRORS: &[&str] = &[
    "Undefined word",
    "Stack underflow",
    "ALLOT using all available memory",
    "Illegal SOURCE-ID during REFILL",
    "Interpreting a compile-only word",
    "DEFERed word not defined yet",
    "Division by zero",
    "Not in interpret mode",
    "Parsing failure",
    "No such xt found in Dictionary",
    "Digit larger than base",
    "QUIT could not get input (REFILL returned -1)",
    "Already in compile mode",
];

/// Text the classifier looks for
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Signatures {
    /// Printed by the emulator after `bye` shut the target down
    pub sentinel: String,
    /// Marks a reference to an undefined word
    pub undefined_marker: String,
    /// Lines containing this are never failures
    pub skip_marker: String,
    /// Test framework failure messages
    pub failure_phrases: Vec<String>,
    /// Interpreter error messages
    pub error_phrases: Vec<String>,
}

impl Default for Signatures {
    fn default() -> Self {
        Self {
            sentinel: "bye c65:".to_string(),
            undefined_marker: "undefined".to_string(),
            skip_marker: "compiled".to_string(),
            failure_phrases: TESTER_FAILURES.iter().map(|s| s.to_string()).collect(),
            error_phrases: TALI_ERRORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// What went wrong in a run, in output order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// The target processed `bye` and shut down
    pub completed: bool,
    /// Lines reporting undefined words
    pub undefined: Vec<String>,
    /// Lines reporting failed tests or interpreter errors
    pub failures: Vec<String>,
}

impl Classification {
    /// No undefined words and no failures.
    ///
    /// Independent of `completed`: a crash with clean output still passes.
    pub fn passed(&self) -> bool {
        self.undefined.is_empty() && self.failures.is_empty()
    }
}

/// Applies [`Signatures`] to captured output
#[derive(Debug, Clone, Default)]
pub struct OutputClassifier {
    signatures: Signatures,
}

impl OutputClassifier {
    pub fn new(signatures: Signatures) -> Self {
        Self { signatures }
    }

    /// Classify `output`. Pure; the same text always gives the same result.
    pub fn classify(&self, output: &str) -> Classification {
        let sig = &self.signatures;
        let completed = output.contains(sig.sentinel.as_str());

        let mut undefined = Vec::new();
        let mut failures = Vec::new();

        for line in split_lines(output) {
            if line.contains(sig.undefined_marker.as_str()) {
                undefined.push(line.to_string());
            }
            if self.is_failure(line) {
                failures.push(line.to_string());
            }
        }

        Classification {
            completed,
            undefined,
            failures,
        }
    }

    /// Whether a single line counts as a failure
    pub fn is_failure(&self, line: &str) -> bool {
        let sig = &self.signatures;
        if line.contains(sig.skip_marker.as_str()) {
            return false;
        }
        sig.failure_phrases
            .iter()
            .chain(sig.error_phrases.iter())
            .any(|phrase| line.contains(phrase.as_str()))
    }
}

/// Split on `\r\n`, `\n` and a bare `\r`.
/// Blank lines are dropped since no signature can match them.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split("\r\n")
        .flat_map(|chunk| chunk.split(['\n', '\r']))
        .filter(|line| !line.is_empty())
}
