use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::Lazy;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::Config;
use data::export::export_path;
use data::parse::load_path;
use data::{preview, CaseMode, OutputFormat};

pub mod app;
pub mod config;
pub mod data;

pub static CONFIG_PATH: Lazy<Mutex<PathBuf>> = Lazy::new(|| {
    Mutex::new(
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pwcsv")
            .join("config.json"),
    )
});

pub static CONFIG: Lazy<Config> = Lazy::new(Config::load);

#[derive(Parser)]
#[command(name = "pwcsv")]
#[command(about = "Filter and reformat password-manager CSV exports")]
struct Cli {
    #[arg(
        long = "config",
        short = 'C',
        global = true,
        help = "Path to an alternate pwcsv config file"
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive menu (the default when no command is given)
    Menu {
        /// CSV export to open on start
        file: Option<PathBuf>,
    },
    /// List the columns of a CSV export
    Columns { file: PathBuf },
    /// Show the first rows of a CSV export
    Preview {
        file: PathBuf,

        #[arg(long = "rows", short = 'n', help = "Number of rows to show")]
        rows: Option<usize>,
    },
    /// Keep the rows whose column contains a value
    Filter {
        file: PathBuf,

        #[arg(long = "column", short = 'c', help = "Column to search in")]
        column: String,

        #[arg(
            long = "value",
            short = 'v',
            allow_hyphen_values = true,
            help = "Substring to look for; an empty value keeps every non-empty cell"
        )]
        value: String,

        #[arg(long = "case-sensitive", short = 's', help = "Match case exactly")]
        case_sensitive: bool,

        #[arg(
            long = "output",
            short = 'o',
            help = "Write matching rows to this CSV file instead of stdout"
        )]
        output: Option<PathBuf>,

        #[arg(
            long = "format",
            short = 'f',
            default_value = "plain",
            help = "Stdout format: plain, json, or csv"
        )]
        format: String,
    },
    /// Reshape a CSV export into the target column layout
    Format {
        file: PathBuf,

        #[arg(
            long = "reference",
            short = 'r',
            conflicts_with = "columns",
            help = "CSV file whose header row is the target layout"
        )]
        reference: Option<PathBuf>,

        #[arg(
            long = "columns",
            help = "Comma separated target layout, e.g. folder,name,login_password"
        )]
        columns: Option<String>,

        #[arg(
            long = "output",
            short = 'o',
            default_value = app::FORMATTED_EXPORT_NAME,
            help = "Destination CSV file"
        )]
        output: PathBuf,
    },
}

pub fn main() -> ExitCode {
    // Reset SIGPIPE to default so piping into `head` exits cleanly
    // instead of panicking.
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "pwcsv=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting pwcsv");
    let cli = Cli::parse();

    if let Some(config_path) = cli.config {
        let path = config_path.canonicalize().unwrap_or(config_path);
        info!("Using alternate config : {:?}", path);
        if let Ok(mut current) = CONFIG_PATH.lock() {
            *current = path;
        }
    }

    match run(cli.command, &CONFIG) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Option<Command>, config: &Config) -> Result<()> {
    match command.unwrap_or(Command::Menu { file: None }) {
        Command::Menu { file } => {
            let stdin = io::stdin();
            let mut session = app::Session::new(config, stdin.lock(), io::stdout());
            session.run(file.as_deref())
        }
        Command::Columns { file } => {
            let table = load_path(&file)?;
            let mut stdout = io::stdout().lock();
            for col in table.headers() {
                writeln!(stdout, "{col}")?;
            }
            Ok(())
        }
        Command::Preview { file, rows } => {
            let table = load_path(&file)?;
            let rows = rows.unwrap_or(config.preview_rows);
            println!("{}", preview::render(&table, rows, config.max_cell_width));
            Ok(())
        }
        Command::Filter {
            file,
            column,
            value,
            case_sensitive,
            output,
            format,
        } => {
            let format = parse_output_format(&format)?;
            let case = CaseMode::from_sensitive(case_sensitive || config.case_sensitive);

            let table = load_path(&file)?;
            let filtered = table.filter_rows(&column, &value, case)?;
            info!("Found {} matching rows", filtered.num_rows());

            match output {
                Some(path) => export_path(&filtered, &path)?,
                None => {
                    let mut stdout = io::stdout().lock();
                    for line in data::output::format_rows(&filtered, format)? {
                        writeln!(stdout, "{line}")?;
                    }
                }
            }
            Ok(())
        }
        Command::Format {
            file,
            reference,
            columns,
            output,
        } => {
            let schema = config.target_schema(columns.as_deref(), reference.as_deref())?;
            debug!("Target schema: {}", schema);

            let table = load_path(&file)?;
            let formatted = table.reformat(&schema);
            export_path(&formatted, &output)?;
            println!(
                "Formatted {} records into {} columns: {}",
                formatted.num_rows(),
                formatted.num_columns(),
                output.display()
            );
            Ok(())
        }
    }
}

fn parse_output_format(format: &str) -> Result<OutputFormat> {
    match format {
        "json" => Ok(OutputFormat::Json),
        "csv" => Ok(OutputFormat::Csv),
        "plain" => Ok(OutputFormat::Plain),
        other => Err(anyhow!(
            "Unknown output format: {other}. Valid formats: plain, json, csv"
        )),
    }
}
