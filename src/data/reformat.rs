use std::fmt;

use tracing::{debug, info};

use super::{Cell, DataError, Table};

/// Column layout Bitwarden produces on export and expects on import.
pub const BITWARDEN_COLUMNS: [&str; 11] = [
    "folder",
    "favorite",
    "type",
    "name",
    "notes",
    "fields",
    "reprompt",
    "login_uri",
    "login_username",
    "login_password",
    "login_totp",
];

/// Ordered list of column names a table is reshaped into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSchema {
    columns: Vec<String>,
}

impl TargetSchema {
    pub fn new<I, S>(columns: I) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(DataError::EmptySchema);
        }
        Ok(TargetSchema { columns })
    }

    pub fn bitwarden() -> Self {
        TargetSchema {
            columns: BITWARDEN_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Schema taken from the header row of a reference table, e.g. a blank
    /// export that only carries the desired header.
    pub fn from_reference(reference: &Table) -> Result<Self, DataError> {
        TargetSchema::new(reference.headers().iter().cloned())
    }

    /// Parse a comma separated list such as `folder,name,login_password`.
    pub fn parse_list(list: &str) -> Result<Self, DataError> {
        TargetSchema::new(
            list.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        )
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }
}

impl fmt::Display for TargetSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.columns.join(", "))
    }
}

impl Table {
    /// Reshape into `schema`: same rows, exactly the schema's columns in its order.
    ///
    /// Columns the source lacks are filled with empty strings, and missing values
    /// in copied columns become empty strings too, since import tools reject nulls.
    /// Source columns outside the schema are dropped.
    pub fn reformat(&self, schema: &TargetSchema) -> Table {
        let sources: Vec<Option<usize>> = schema
            .columns()
            .iter()
            .map(|name| self.column_index(name))
            .collect();

        let absent: Vec<&str> = schema
            .columns()
            .iter()
            .zip(&sources)
            .filter(|(_, src)| src.is_none())
            .map(|(name, _)| name.as_str())
            .collect();
        if !absent.is_empty() {
            debug!("Filling absent columns with empty values: {:?}", absent);
        }

        let dropped = self
            .headers
            .iter()
            .filter(|h| !schema.columns().contains(*h))
            .count();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                sources
                    .iter()
                    .map(|src| -> Cell {
                        Some(src.and_then(|i| row[i].clone()).unwrap_or_default())
                    })
                    .collect()
            })
            .collect();

        info!(
            "Reformatted {} rows into {} columns ({} absent, {} dropped)",
            self.num_rows(),
            schema.len(),
            absent.len(),
            dropped
        );

        Table {
            headers: schema.columns().to_vec(),
            rows,
        }
    }
}
