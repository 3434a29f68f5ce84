//! Known test suites and selection validation

use crate::error::{HarnessError, HarnessResult};

/// File extension of Forth test sources
pub const TEST_EXTENSION: &str = "fs";

/// Test suites shipped with Tali Forth 2, in the order `all` runs them
pub const DEFAULT_TESTS: &[&str] = &[
    "core_a", "core_b", "core_c", "string", "double", "facility", "ed", "asm", "tali", "tools",
    "block", "search", "user", "cycles",
];

/// Ordered set of test identifiers the harness accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCatalog {
    ids: Vec<String>,
}

/// Which tests to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestSelection {
    /// Every test in catalog order
    All,
    /// Specific tests in the order requested
    Named(Vec<String>),
}

impl TestCatalog {
    /// Build a catalog, rejecting empty lists and duplicate ids
    pub fn new<I, S>(ids: I) -> HarnessResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen: Vec<String> = Vec::new();
        for id in ids {
            let id = id.into();
            if seen.contains(&id) {
                return Err(HarnessError::DuplicateTest(id));
            }
            seen.push(id);
        }
        if seen.is_empty() {
            return Err(HarnessError::EmptyCatalog);
        }
        Ok(Self { ids: seen })
    }

    /// Test identifiers in catalog order
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|known| known == id)
    }

    /// Source file name for a test id (`core_a` -> `core_a.fs`)
    pub fn file_name(id: &str) -> String {
        format!("{}.{}", id, TEST_EXTENSION)
    }

    /// Expand a selection into the concrete ordered list of tests to run.
    ///
    /// Every unknown id is reported at once. Nothing is read or launched
    /// before this succeeds.
    pub fn resolve(&self, selection: &TestSelection) -> HarnessResult<Vec<String>> {
        match selection {
            TestSelection::All => Ok(self.ids.clone()),
            TestSelection::Named(names) => {
                let unknown: Vec<String> = names
                    .iter()
                    .filter(|name| !self.contains(name))
                    .cloned()
                    .collect();
                if !unknown.is_empty() {
                    return Err(HarnessError::InvalidSelection { unknown });
                }
                if names.is_empty() {
                    return Err(HarnessError::InvalidSelection { unknown: Vec::new() });
                }
                Ok(names.clone())
            }
        }
    }
}

impl Default for TestCatalog {
    fn default() -> Self {
        Self {
            ids: DEFAULT_TESTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TestSelection {
    /// Interpret command line names; nothing or a lone `all` selects everything
    pub fn from_args(names: &[String]) -> Self {
        match names {
            [] => TestSelection::All,
            [only] if only == "all" => TestSelection::All,
            _ => TestSelection::Named(names.to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_all_expands_in_catalog_order() {
        let catalog = TestCatalog::default();
        let resolved = catalog.resolve(&TestSelection::All).unwrap();
        assert_eq!(resolved, names(DEFAULT_TESTS));
    }

    #[test]
    fn test_named_keeps_request_order() {
        let catalog = TestCatalog::default();
        let selection = TestSelection::Named(names(&["tools", "core_a", "string"]));
        let resolved = catalog.resolve(&selection).unwrap();
        assert_eq!(resolved, names(&["tools", "core_a", "string"]));
    }

    #[test]
    fn test_unknown_test_rejected() {
        let catalog = TestCatalog::default();
        let selection = TestSelection::Named(names(&["core_a", "bogus", "nope"]));
        match catalog.resolve(&selection) {
            Err(HarnessError::InvalidSelection { unknown }) => {
                assert_eq!(unknown, names(&["bogus", "nope"]));
            }
            other => panic!("expected InvalidSelection, got {:?}", other),
        }
    }

    #[test]
    fn test_from_args() {
        assert_eq!(TestSelection::from_args(&[]), TestSelection::All);
        assert_eq!(TestSelection::from_args(&names(&["all"])), TestSelection::All);
        assert_eq!(
            TestSelection::from_args(&names(&["core_b", "all"])),
            TestSelection::Named(names(&["core_b", "all"]))
        );
    }

    #[test]
    fn test_all_mixed_with_names_is_invalid() {
        let catalog = TestCatalog::default();
        let selection = TestSelection::from_args(&names(&["core_b", "all"]));
        assert!(matches!(
            catalog.resolve(&selection),
            Err(HarnessError::InvalidSelection { .. })
        ));
    }

    #[test]
    fn test_catalog_rejects_duplicates_and_empty() {
        assert!(matches!(
            TestCatalog::new(["core_a", "core_a"]),
            Err(HarnessError::DuplicateTest(id)) if id == "core_a"
        ));
        assert!(matches!(
            TestCatalog::new(Vec::<String>::new()),
            Err(HarnessError::EmptyCatalog)
        ));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(TestCatalog::file_name("core_a"), "core_a.fs");
        assert!(TestCatalog::default().contains("cycles"));
        assert!(!TestCatalog::default().contains("core_a.fs"));
    }
}
