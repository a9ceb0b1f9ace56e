use tracing::debug;

use super::{CaseMode, DataError, Table};

impl Table {
    /// Rows whose value in `column` contains `needle`, as a new table.
    ///
    /// Missing values never match, so an empty `needle` selects exactly the rows
    /// where `column` is present. Row order and column layout are preserved.
    pub fn filter_rows(&self, column: &str, needle: &str, case: CaseMode) -> Result<Table, DataError> {
        let col = self
            .column_index(column)
            .ok_or_else(|| DataError::InvalidColumn(column.to_string()))?;

        let needle = match case {
            CaseMode::Sensitive => needle.to_string(),
            CaseMode::Insensitive => needle.to_lowercase(),
        };

        let rows = self
            .rows
            .iter()
            .filter(|row| match &row[col] {
                None => false,
                Some(value) => match case {
                    CaseMode::Sensitive => value.contains(&needle),
                    CaseMode::Insensitive => value.to_lowercase().contains(&needle),
                },
            })
            .cloned()
            .collect::<Vec<_>>();

        debug!(
            "Filter on column '{}' kept {} of {} rows",
            column,
            rows.len(),
            self.num_rows()
        );

        Ok(Table {
            headers: self.headers.clone(),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table_of;
    use pretty_assertions::assert_eq;
    use speculoos::prelude::*;

    fn vault() -> Table {
        table_of(
            &["name", "notes", "login_uri"],
            &[
                &["GitHub", "", "https://github.com"],
                &["gitlab.com", "work", ""],
                &["Bank", "GitKraken-unrelated-field-elsewhere", "https://bank.example"],
                &["Email", "", "https://mail.example"],
                &["", "orphan", "https://git.example"],
            ],
        )
    }

    fn names(t: &Table) -> Vec<Option<&str>> {
        (0..t.num_rows()).map(|r| t.value(r, "name")).collect()
    }

    #[test]
    fn substring_match_ignores_case_by_default() {
        let t = vault();
        let filtered = t.filter_rows("name", "git", CaseMode::Insensitive).unwrap();

        assert_eq!(names(&filtered), vec![Some("GitHub"), Some("gitlab.com")]);
        assert_eq!(filtered.headers(), t.headers());
    }

    #[test]
    fn case_sensitive_match() {
        let t = vault();
        let filtered = t.filter_rows("name", "Git", CaseMode::Sensitive).unwrap();

        assert_eq!(names(&filtered), vec![Some("GitHub")]);
    }

    #[test]
    fn empty_needle_selects_present_values() {
        let t = vault();

        let by_notes = t.filter_rows("notes", "", CaseMode::Insensitive).unwrap();
        assert_eq!(names(&by_notes), vec![Some("gitlab.com"), Some("Bank"), None]);

        let by_name = t.filter_rows("name", "", CaseMode::Insensitive).unwrap();
        assert_that(&by_name.num_rows()).is_equal_to(4);
    }

    #[test]
    fn unknown_column_is_rejected() {
        let result = vault().filter_rows("password", "x", CaseMode::Insensitive);

        match result {
            Err(DataError::InvalidColumn(name)) => assert_eq!(name, "password"),
            other => panic!("expected InvalidColumn, got {other:?}"),
        }
    }

    #[test]
    fn source_is_untouched() {
        let t = vault();
        let before = t.clone();
        let filtered = t.filter_rows("name", "zzz", CaseMode::Insensitive).unwrap();

        assert_that(&filtered.is_empty()).is_true();
        assert_eq!(t, before);
    }

    #[test]
    fn unicode_case_folding() {
        let t = table_of(&["name"], &[&["ÉCOLE"], &["ecole"]]);
        let filtered = t.filter_rows("name", "école", CaseMode::Insensitive).unwrap();

        assert_eq!(names(&filtered), vec![Some("ÉCOLE")]);
    }
}
