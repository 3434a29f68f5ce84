//! Builds the single script fed to Tali Forth 2
//!
//! The script is the tester preamble, then every selected test preceded by a
//! Forth comment naming it, then `bye` so the emulator shuts down instead of
//! waiting for more input.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::catalog::TestCatalog;
use crate::error::{HarnessError, HarnessResult};

/// Directive that makes Tali Forth 2 quit
pub const TERMINATOR: &str = "bye";

/// Leading text of every test marker, used to find where tests begin in output
pub const MARKER_PREFIX: &str = "( Running test '";

/// Source of test file contents
pub trait SourceLoader {
    /// Read the source of test `id`, stored in `file_name`
    fn load(&self, id: &str, file_name: &str) -> std::io::Result<String>;

    /// Path reported when loading fails
    fn location(&self, file_name: &str) -> PathBuf {
        PathBuf::from(file_name)
    }
}

impl<F> SourceLoader for F
where
    F: Fn(&str, &str) -> std::io::Result<String>,
{
    fn load(&self, id: &str, file_name: &str) -> std::io::Result<String> {
        self(id, file_name)
    }
}

/// Loads test files from a directory on disk
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl SourceLoader for DirectorySource {
    fn load(&self, _id: &str, file_name: &str) -> std::io::Result<String> {
        std::fs::read_to_string(self.dir.join(file_name))
    }

    fn location(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

/// One piece of an assembled script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Tester framework loaded before any test
    Preamble(String),
    /// Comment announcing the next test
    Marker { test: String, file: String },
    /// Raw contents of a test file
    Source { test: String, text: String },
    /// Final `bye`
    Terminator,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Preamble(text) => f.write_str(text),
            Segment::Marker { test, file } => {
                write!(f, "\n {}{}' from file '{}' )\n", MARKER_PREFIX, test, file)
            }
            Segment::Source { text, .. } => f.write_str(text),
            Segment::Terminator => write!(f, "\n{}\n", TERMINATOR),
        }
    }
}

/// Ordered script segments, ending with exactly one terminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledScript {
    segments: Vec<Segment>,
}

impl AssembledScript {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Tests included in the script, in run order
    pub fn tests(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Marker { test, .. } => Some(test.as_str()),
            _ => None,
        })
    }

    /// Concatenate all segments into the text piped to the emulator
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AssembledScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Assembles scripts from a preamble and a source loader
pub struct ScriptAssembler<L> {
    preamble: String,
    loader: L,
}

impl<L: SourceLoader> ScriptAssembler<L> {
    pub fn new(preamble: impl Into<String>, loader: L) -> Self {
        Self {
            preamble: preamble.into(),
            loader,
        }
    }

    /// Build the script for already-resolved tests.
    ///
    /// Stops at the first unreadable test file.
    pub fn assemble(&self, tests: &[String]) -> HarnessResult<AssembledScript> {
        let mut segments = Vec::with_capacity(tests.len() * 2 + 2);
        segments.push(Segment::Preamble(self.preamble.clone()));

        for test in tests {
            let file = TestCatalog::file_name(test);
            let text = self.loader.load(test, &file).map_err(|source| {
                HarnessError::TestSourceUnavailable {
                    test: test.clone(),
                    path: self.loader.location(&file),
                    source,
                }
            })?;
            tracing::debug!(test = %test, bytes = text.len(), "loaded test source");

            segments.push(Segment::Marker {
                test: test.clone(),
                file,
            });
            segments.push(Segment::Source {
                test: test.clone(),
                text,
            });
        }

        segments.push(Segment::Terminator);
        Ok(AssembledScript { segments })
    }
}

/// Read the tester preamble from disk
pub fn load_tester(path: &Path) -> HarnessResult<String> {
    std::fs::read_to_string(path).map_err(|source| HarnessError::TesterUnavailable {
        path: path.to_path_buf(),
        source,
    })
}
