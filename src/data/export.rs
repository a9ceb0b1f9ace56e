use std::io::Write;
use std::path::Path;

use tracing::info;

use super::{DataError, Table};

/// Write `table` as CSV (header first) into any writer.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(table.headers())?;
    for row in table.rows() {
        wtr.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Export `table` to `path`, replacing any existing file.
///
/// The data goes to a temporary file in the destination directory first and is
/// renamed over `path` once complete.
pub fn export_path(table: &Table, path: &Path) -> Result<(), DataError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".pwcsv-export-")
        .tempfile_in(dir)
        .map_err(|err| DataError::io(path, err))?;

    write_csv(table, temp.as_file_mut()).map_err(|err| match err.into_kind() {
        csv::ErrorKind::Io(err) => DataError::io(path, err),
        other => DataError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::Other, format!("{other:?}")),
        ),
    })?;

    temp.persist(path)
        .map_err(|err| DataError::io(path, err.error))?;

    info!("Exported {} rows to {:?}", table.num_rows(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse::load_path;
    use crate::data::table_of;
    use pretty_assertions::assert_eq;
    use speculoos::prelude::*;
    use std::fs;

    #[test]
    fn writes_header_and_rows_with_quoting() {
        let t = table_of(
            &["name", "notes"],
            &[&["GitHub", "a, b"], &["Bank", "say \"hi\""], &["Mail", "l1\nl2"], &["Empty", ""]],
        );
        let mut buf = Vec::new();
        write_csv(&t, &mut buf).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "name,notes\nGitHub,\"a, b\"\nBank,\"say \"\"hi\"\"\"\nMail,\"l1\nl2\"\nEmpty,\n"
        );
    }

    #[test]
    fn round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.csv");
        let t = table_of(
            &["folder", "name", "login_username"],
            &[&["Work", "GitHub", "alice"], &["", "Bank", "bob"]],
        );

        export_path(&t, &path).unwrap();
        let back = load_path(&path).unwrap();

        assert_eq!(back, t);
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "stale,content\n1,2\n3,4\n").unwrap();

        export_path(&table_of(&["name"], &[&["x"]]), &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "name\nx\n");
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_that(&leftovers).is_equal_to(1);
    }

    #[test]
    fn unwritable_destination_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("out.csv");

        let result = export_path(&table_of(&["name"], &[]), &path);

        assert!(matches!(result, Err(DataError::Io { .. })));
    }
}
