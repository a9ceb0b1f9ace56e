use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info};

use super::{Cell, DataError, Table};

/// Read a CSV file from disk and parse it into a Table.
pub fn load_path(path: &Path) -> Result<Table, DataError> {
    let bytes = fs::read(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => DataError::FileNotFound(path.to_path_buf()),
        _ => DataError::io(path, err),
    })?;
    let input = String::from_utf8(bytes).map_err(|err| DataError::parse(path, err))?;

    let table = parse_string(&input, path)?;
    info!(
        "Loaded {} rows, {} columns from {:?}",
        table.num_rows(),
        table.num_columns(),
        path
    );
    Ok(table)
}

/// Parse CSV text into a Table (testable core). `source` is only used in error messages.
pub fn parse_string(input: &str, source: &Path) -> Result<Table, DataError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    check_quotes(input).map_err(|line| {
        DataError::parse(source, format!("unterminated quoted field starting on line {line}"))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| DataError::parse(source, err))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() {
        return Err(DataError::parse(source, "missing header row"));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|err| DataError::parse(source, err))?;
        if record.len() > headers.len() {
            let line = record.position().map_or(0, |p| p.line());
            return Err(DataError::parse(
                source,
                format!(
                    "line {line} has {} fields, header has {}",
                    record.len(),
                    headers.len()
                ),
            ));
        }

        let mut row: Vec<Cell> = record.iter().map(to_cell).collect();
        if row.len() < headers.len() {
            debug!("Padding short row {} with missing values", rows.len());
            row.resize(headers.len(), None);
        }
        rows.push(row);
    }

    Table::new(headers, rows)
}

fn to_cell(field: &str) -> Cell {
    if field.is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}

/// Walk the input the way an RFC 4180 reader would and report the line of a
/// quoted field that never closes. The csv reader silently accepts those.
fn check_quotes(input: &str) -> Result<(), usize> {
    let mut line = 1;
    let mut opened_on = 0;
    let mut in_quotes = false;
    let mut field_start = true;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
        }

        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }

        match c {
            '"' if field_start => {
                in_quotes = true;
                opened_on = line;
                field_start = false;
            }
            ',' | '\n' | '\r' => field_start = true,
            _ => field_start = false,
        }
    }

    if in_quotes {
        Err(opened_on)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use speculoos::prelude::*;
    use std::path::PathBuf;

    fn parse(input: &str) -> Result<Table, DataError> {
        parse_string(input, Path::new("test.csv"))
    }

    #[test]
    fn csv_with_header() {
        let table = parse("name,login_username\nGitHub,alice\nGitLab,bob").unwrap();

        assert_eq!(table.headers(), &["name", "login_username"]);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.value(0, "name"), Some("GitHub"));
        assert_eq!(table.value(1, "login_username"), Some("bob"));
    }

    #[test]
    fn empty_fields_are_missing() {
        let table = parse("folder,name\n,GitHub").unwrap();

        assert_eq!(table.rows()[0], vec![None, Some("GitHub".to_string())]);
    }

    #[test]
    fn quoted_fields_with_commas_and_newlines() {
        let input = "name,notes\nAlice,\"likes cats, dogs\"\nBob,\"line1\nline2\"\nEve,\"say \"\"hi\"\"\"";
        let table = parse(input).unwrap();

        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.value(0, "notes"), Some("likes cats, dogs"));
        assert_eq!(table.value(1, "notes"), Some("line1\nline2"));
        assert_eq!(table.value(2, "notes"), Some("say \"hi\""));
    }

    #[test]
    fn short_rows_are_padded() {
        let table = parse("a,b,c\n1,2").unwrap();

        assert_eq!(table.rows()[0].len(), 3);
        assert_eq!(table.value(0, "c"), None);
    }

    #[test]
    fn long_rows_are_rejected() {
        let result = parse("a,b\n1,2,3");

        assert!(matches!(result, Err(DataError::Parse { .. })));
    }

    #[test]
    fn unbalanced_quotes_are_rejected() {
        let result = parse("name,notes\nGitHub,\"never closed\nGitLab,x");

        match result {
            Err(DataError::Parse { reason, .. }) => {
                assert_that(&reason).contains("line 2");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn quote_inside_unquoted_field_is_accepted() {
        let table = parse("name\n5\" floppy").unwrap();

        assert_eq!(table.value(0, "name"), Some("5\" floppy"));
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(parse(""), Err(DataError::Parse { .. })));
    }

    #[test]
    fn header_only_gives_empty_table() {
        let table = parse("folder,name\n").unwrap();

        assert_eq!(table.num_columns(), 2);
        assert_that(&table.is_empty()).is_true();
    }

    #[test]
    fn byte_order_mark_is_stripped() {
        let table = parse("\u{feff}name\nx").unwrap();

        assert_eq!(table.headers(), &["name"]);
    }

    #[test]
    fn duplicate_headers_are_kept() {
        let table = parse("name,name\nfirst,second").unwrap();

        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.value(0, "name"), Some("second"));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("nope.csv");

        match load_path(&path) {
            Err(DataError::FileNotFound(p)) => assert_eq!(p, path),
            other => panic!("expected FileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, [b'n', b'\n', 0xff, 0xfe]).unwrap();

        assert!(matches!(load_path(&path), Err(DataError::Parse { .. })));
    }
}
