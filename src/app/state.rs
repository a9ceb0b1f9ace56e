use std::path::{Path, PathBuf};

use crate::data::parse::load_path;
use crate::data::{CaseMode, DataError, Table};

/// What the interactive session currently holds.
#[derive(Debug, Default)]
pub struct State {
    pub source: Option<PathBuf>,
    pub table: Option<Table>,
    pub case: CaseMode,
}

impl State {
    /// Load `path` and make it the current table. On failure the previously
    /// loaded table stays in place.
    pub fn open(&mut self, path: &Path) -> Result<&Table, DataError> {
        let table = load_path(path)?;
        self.source = Some(path.to_path_buf());
        Ok(self.table.insert(table))
    }

    pub fn loaded(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn source_name(&self) -> String {
        self.source
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn failed_open_keeps_previous_table() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("vault.csv");
        fs::write(&good, "name\nGitHub\n").unwrap();

        let mut state = State::default();
        state.open(&good).unwrap();
        let before = state.table.clone();

        let result = state.open(&dir.path().join("missing.csv"));

        assert!(matches!(result, Err(DataError::FileNotFound(_))));
        assert_eq!(state.table, before);
        assert_eq!(state.source_name(), "vault.csv");
    }
}
