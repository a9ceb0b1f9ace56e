use comfy_table::presets::ASCII_MARKDOWN;
use comfy_table::{Cell, CellAlignment, ContentArrangement};

use super::Table;

/// Render up to `max_rows` rows of `table` as a text grid. Cells longer than
/// `max_width` characters are cut and end in `...`.
pub fn render(table: &Table, max_rows: usize, max_width: usize) -> String {
    let mut text_table = comfy_table::Table::new();
    text_table
        .load_preset(ASCII_MARKDOWN)
        .set_content_arrangement(ContentArrangement::Disabled);

    let header_row: Vec<Cell> = table
        .headers()
        .iter()
        .map(|h| Cell::new(h).set_alignment(CellAlignment::Center))
        .collect();
    text_table.set_header(header_row);

    for row in table.rows().iter().take(max_rows) {
        let formatted_row: Vec<String> = row
            .iter()
            .map(|cell| truncate(cell.as_deref().unwrap_or(""), max_width))
            .collect();
        text_table.add_row(formatted_row);
    }

    text_table.to_string()
}

pub fn truncate(value: &str, max_width: usize) -> String {
    // Line breaks would split a grid row.
    let flat = value.replace(['\r', '\n'], " ");
    if flat.chars().count() <= max_width {
        return flat;
    }
    let keep = max_width.saturating_sub(3);
    let mut cut: String = flat.chars().take(keep).collect();
    cut.push_str("...");
    cut
}
