pub mod error;
pub mod export;
pub mod filter;
pub mod output;
pub mod parse;
pub mod preview;
pub mod reformat;

pub use error::DataError;

/// A single field. `None` is a missing value (an empty field in the source file).
pub type Cell = Option<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table, checking that every row has exactly one cell per header.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, DataError> {
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != headers.len())
        {
            return Err(DataError::RaggedRow {
                row,
                found: cells.len(),
                expected: headers.len(),
            });
        }

        Ok(Table { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the column called `name`. With duplicate headers the last one wins.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().rposition(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Value of column `name` in row `row`, `None` when missing.
    pub fn value(&self, row: usize, name: &str) -> Option<&str> {
        let col = self.column_index(name)?;
        self.rows.get(row)?.get(col)?.as_deref()
    }
}

/// How the filter compares the search string against cell values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMode {
    #[default]
    Insensitive,
    Sensitive,
}

impl CaseMode {
    pub fn from_sensitive(case_sensitive: bool) -> Self {
        if case_sensitive {
            CaseMode::Sensitive
        } else {
            CaseMode::Insensitive
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            CaseMode::Insensitive => CaseMode::Sensitive,
            CaseMode::Sensitive => CaseMode::Insensitive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Plain,
    Json,
    Csv,
}

#[cfg(test)]
pub(crate) fn table_of(headers: &[&str], rows: &[&[&str]]) -> Table {
    let cell = |v: &&str| {
        if v.is_empty() {
            None
        } else {
            Some(v.to_string())
        }
    };
    Table::new(
        headers.iter().map(|h| h.to_string()).collect(),
        rows.iter().map(|r| r.iter().map(cell).collect()).collect(),
    )
    .unwrap()
}
