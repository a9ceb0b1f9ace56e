use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::data::export::export_path;
use crate::data::preview;
use crate::data::{CaseMode, Table};

pub mod state;

pub const FILTERED_EXPORT_NAME: &str = "filtered_export.csv";
pub const FORMATTED_EXPORT_NAME: &str = "formatted_export.csv";

const SECURITY_NOTICE: &str = "\
Security notice:
  * Your password data stays on this computer; nothing is uploaded.
  * Exported files contain your passwords in plain text. Keep them private
    and never commit them to version control.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Open,
    Preview,
    Columns,
    Filter,
    Format,
    ToggleCase,
    Exit,
}

impl Message {
    fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Message::Open),
            "2" => Some(Message::Preview),
            "3" => Some(Message::Columns),
            "4" => Some(Message::Filter),
            "5" => Some(Message::Format),
            "6" => Some(Message::ToggleCase),
            "7" | "q" | "quit" | "exit" => Some(Message::Exit),
            _ => None,
        }
    }
}

/// Whether the menu loop keeps going after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Console session: reads operator answers line by line from `input` and
/// writes menus, tables and messages to `output`.
pub struct Session<'c, R, W> {
    state: state::State,
    config: &'c Config,
    input: R,
    output: W,
}

impl<'c, R: BufRead, W: Write> Session<'c, R, W> {
    pub fn new(config: &'c Config, input: R, output: W) -> Self {
        let state = state::State {
            case: CaseMode::from_sensitive(config.case_sensitive),
            ..Default::default()
        };
        Session {
            state,
            config,
            input,
            output,
        }
    }

    /// Run the menu loop until the operator exits or input ends.
    pub fn run(&mut self, initial: Option<&Path>) -> Result<()> {
        writeln!(self.output, "{SECURITY_NOTICE}")?;

        if let Some(path) = initial {
            self.report(|s| s.open(path))?;
        }

        loop {
            self.print_menu()?;
            let Some(choice) = self.prompt("Enter your choice (1-7): ")? else {
                break;
            };

            let Some(message) = Message::from_choice(&choice) else {
                writeln!(self.output, "Invalid choice. Please try again.")?;
                continue;
            };

            if self.report(|s| s.update(message))? == Flow::Quit {
                break;
            }
        }

        writeln!(self.output, "Exiting.")?;
        info!("Session finished");
        Ok(())
    }

    /// Run one action and print its error, if any, instead of ending the session.
    fn report<F>(&mut self, action: F) -> Result<Flow>
    where
        F: FnOnce(&mut Self) -> Result<Flow>,
    {
        match action(self) {
            Ok(flow) => Ok(flow),
            Err(err) if err.downcast_ref::<io::Error>().is_some() => Err(err),
            Err(err) => {
                warn!("{err:#}");
                writeln!(self.output, "Error: {err:#}")?;
                Ok(Flow::Continue)
            }
        }
    }

    fn update(&mut self, message: Message) -> Result<Flow> {
        debug!("Menu action {:?}", message);
        match message {
            Message::Open => {
                let Some(path) = self.prompt("Path to the CSV export: ")? else {
                    return Ok(Flow::Quit);
                };
                if path.is_empty() {
                    writeln!(self.output, "No file selected.")?;
                    return Ok(Flow::Continue);
                }
                self.open(Path::new(&path))
            }
            Message::Preview => {
                let table = self.require_table()?.clone();
                writeln!(self.output, "Showing all {} records", table.num_rows())?;
                self.show(&table, table.num_rows())?;
                Ok(Flow::Continue)
            }
            Message::Columns => {
                let headers = self.require_table()?.headers().to_vec();
                writeln!(self.output, "\nAvailable columns:")?;
                for col in headers {
                    writeln!(self.output, "- {col}")?;
                }
                Ok(Flow::Continue)
            }
            Message::Filter => self.filter(),
            Message::Format => self.format(),
            Message::ToggleCase => {
                self.state.case = self.state.case.toggled();
                writeln!(self.output, "Case sensitivity: {}", case_label(self.state.case))?;
                Ok(Flow::Continue)
            }
            Message::Exit => Ok(Flow::Quit),
        }
    }

    fn open(&mut self, path: &Path) -> Result<Flow> {
        let rows = self.state.open(path)?.num_rows();
        writeln!(
            self.output,
            "Loaded {} records from {}",
            rows,
            self.state.source_name()
        )?;
        if let Some(table) = self.state.loaded().cloned() {
            self.show(&table, self.config.preview_rows)?;
        }
        Ok(Flow::Continue)
    }

    fn filter(&mut self) -> Result<Flow> {
        let table = self.require_table()?.clone();

        writeln!(self.output, "\nAvailable columns:")?;
        for col in table.headers() {
            writeln!(self.output, "- {col}")?;
        }

        let Some(column) = self.prompt("Enter the column to filter by: ")? else {
            return Ok(Flow::Quit);
        };
        if !table.has_column(&column) {
            return Err(crate::data::DataError::InvalidColumn(column).into());
        }

        let Some(value) = self.prompt(&format!("Enter the value to search for in '{column}': "))? else {
            return Ok(Flow::Quit);
        };
        if value.is_empty() {
            writeln!(self.output, "Please enter a search value.")?;
            return Ok(Flow::Continue);
        }

        let filtered = table.filter_rows(&column, &value, self.state.case)?;
        if filtered.is_empty() {
            writeln!(self.output, "No records match your filter criteria.")?;
            return Ok(Flow::Continue);
        }

        writeln!(self.output, "\nFound {} results:", filtered.num_rows())?;
        self.show(&filtered, filtered.num_rows())?;

        let Some(answer) = self.prompt("\nExport these results to a new CSV? (y/n): ")? else {
            return Ok(Flow::Quit);
        };
        if answer.eq_ignore_ascii_case("y") {
            self.export(&filtered, FILTERED_EXPORT_NAME)
        } else {
            Ok(Flow::Continue)
        }
    }

    fn format(&mut self) -> Result<Flow> {
        let table = self.require_table()?.clone();
        let schema = self.config.target_schema(None, None)?;
        let formatted = table.reformat(&schema);

        writeln!(
            self.output,
            "Formatted {} records into columns: {}",
            formatted.num_rows(),
            schema
        )?;
        self.show(&formatted, self.config.preview_rows)?;
        self.export(&formatted, FORMATTED_EXPORT_NAME)
    }

    fn export(&mut self, table: &Table, default_name: &str) -> Result<Flow> {
        let Some(name) = self.prompt(&format!("Enter a filename for the export [{default_name}]: "))? else {
            return Ok(Flow::Quit);
        };
        let path = if name.is_empty() {
            PathBuf::from(default_name)
        } else {
            PathBuf::from(name)
        };

        export_path(table, &path)?;
        writeln!(
            self.output,
            "Data exported successfully to {} ({} records)",
            path.display(),
            table.num_rows()
        )?;
        Ok(Flow::Continue)
    }

    fn require_table(&self) -> Result<&Table> {
        self.state
            .loaded()
            .ok_or_else(|| anyhow!("no file loaded; open a CSV export first"))
    }

    fn show(&mut self, table: &Table, rows: usize) -> Result<()> {
        if table.num_columns() == 0 {
            return Ok(());
        }
        writeln!(
            self.output,
            "{}",
            preview::render(table, rows, self.config.max_cell_width)
        )?;
        Ok(())
    }

    fn print_menu(&mut self) -> Result<()> {
        let loaded = match self.state.loaded() {
            Some(table) => format!("{} ({} records)", self.state.source_name(), table.num_rows()),
            None => "none".to_string(),
        };
        writeln!(self.output, "\nLoaded file: {loaded}")?;
        writeln!(self.output, "What would you like to do?")?;
        writeln!(self.output, "1. Open a CSV export")?;
        writeln!(self.output, "2. Preview data")?;
        writeln!(self.output, "3. List columns")?;
        writeln!(self.output, "4. Filter data and export")?;
        writeln!(self.output, "5. Export entire file in target format")?;
        writeln!(
            self.output,
            "6. Toggle case sensitivity (currently {})",
            case_label(self.state.case)
        )?;
        writeln!(self.output, "7. Exit")?;
        Ok(())
    }

    /// Print `label` and read one answer. `None` once input is exhausted.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

fn case_label(case: CaseMode) -> &'static str {
    match case {
        CaseMode::Insensitive => "case-insensitive",
        CaseMode::Sensitive => "case-sensitive",
    }
}
