use super::{OutputFormat, Table};

pub fn format_row(table: &Table, format: OutputFormat, row_idx: usize) -> Result<String, csv::Error> {
    let row = &table.rows()[row_idx];
    let fields = row.iter().map(|cell| cell.as_deref().unwrap_or(""));

    match format {
        OutputFormat::Plain => Ok(fields.collect::<Vec<_>>().join(",")),
        OutputFormat::Csv => csv_encode_row(fields),
        OutputFormat::Json => {
            let obj: serde_json::Map<String, serde_json::Value> = table
                .headers()
                .iter()
                .zip(row)
                .map(|(h, cell)| {
                    let val = match cell {
                        Some(v) => serde_json::Value::String(v.clone()),
                        None => serde_json::Value::Null,
                    };
                    (h.clone(), val)
                })
                .collect();
            Ok(serde_json::Value::Object(obj).to_string())
        }
    }
}

/// Every row of `table`, one formatted line each. CSV output starts with the header.
pub fn format_rows(table: &Table, format: OutputFormat) -> Result<Vec<String>, csv::Error> {
    let mut lines = Vec::with_capacity(table.num_rows() + 1);
    if format == OutputFormat::Csv {
        lines.push(csv_encode_row(table.headers().iter().map(String::as_str))?);
    }
    for idx in 0..table.num_rows() {
        lines.push(format_row(table, format, idx)?);
    }
    Ok(lines)
}

fn csv_encode_row<'a>(fields: impl IntoIterator<Item = &'a str>) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut buf);
        wtr.write_record(fields)?;
        wtr.flush()?;
    }
    let line = String::from_utf8_lossy(&buf);
    Ok(line.strip_suffix('\n').unwrap_or(&line).to_string())
}
