//! TOML configuration for the test harness

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::catalog::{DEFAULT_TESTS, TestCatalog};
use crate::classify::Signatures;
use crate::error::{HarnessError, HarnessResult};

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "talitest.toml";

/// Harness configuration loaded from TOML file.
///
/// Built once at startup and shared read-only by every stage of a run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Path to the c65 emulator binary
    pub emulator: PathBuf,

    /// Arguments passed to the emulator before the image path
    pub emulator_args: Vec<String>,

    /// Path to the Tali Forth 2 image loaded by the emulator
    pub image: PathBuf,

    /// Directory holding the tester and the `.fs` test files
    pub tests_dir: PathBuf,

    /// Tester preamble, relative to `tests_dir`
    pub tester: PathBuf,

    /// Where the raw emulator output is written
    pub results: PathBuf,

    /// Catalog of known tests, in the order `all` runs them
    pub tests: Vec<String>,

    /// Output signatures used to classify the run (top-level keys)
    #[serde(flatten)]
    pub signatures: Signatures,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            emulator: PathBuf::from("../c65/c65"),
            emulator_args: vec!["-r".to_string()],
            image: PathBuf::from("../taliforth-c65.bin"),
            tests_dir: PathBuf::from("."),
            tester: PathBuf::from("tester.fs"),
            results: PathBuf::from("results.txt"),
            tests: DEFAULT_TESTS.iter().map(|s| s.to_string()).collect(),
            signatures: Signatures::default(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HarnessError::Config {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        Self::parse(&content).map_err(|e| HarnessError::Config {
            path: path.to_path_buf(),
            source: Box::new(e),
        })
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load an explicitly requested file, or the default location if present.
    ///
    /// An explicit path must load. A broken default file only warns and
    /// falls back to built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> HarnessResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if !default_path.exists() {
            return Ok(Self::default());
        }
        match Self::load(default_path) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("{}; using built-in defaults", e);
                Ok(Self::default())
            }
        }
    }

    /// Validated catalog built from `tests`
    pub fn catalog(&self) -> HarnessResult<TestCatalog> {
        TestCatalog::new(self.tests.iter().cloned())
    }

    /// Full path of the tester preamble
    pub fn tester_path(&self) -> PathBuf {
        self.tests_dir.join(&self.tester)
    }
}
