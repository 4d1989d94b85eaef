//! # Tabula
//!
//! The terminal front-end: create, inspect and edit sheet files from the
//! command line. All the real work happens in the library.

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};

use tabula::display::{print_amount, print_cell, GridView};
use tabula::parser::annotate;
use tabula::persist;
use tabula::sheet::{Metadata, Sheet};
use tabula::xy::XY;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Specify the log level of the engine.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    verbosity: LogLevel,
}

/// Enum for specifying the log level.
#[derive(ValueEnum, Clone, Default, Debug)]
enum LogLevel {
    /// Only critical errors will be logged.
    #[default]
    #[value(alias("0"))]
    Error,

    #[value(alias("1"))]
    Warn,

    /// Also log information about writes and fan-out.
    #[value(alias("2"))]
    Info,

    #[value(alias("3"))]
    Debug,

    /// Log everything, including every parser rule attempt. Clunky.
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create an empty sheet file.
    New {
        file: PathBuf,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        author: Option<String>,
    },

    /// Print the whole sheet as a grid, plus its metadata.
    Show { file: PathBuf },

    /// Print one cell's value.
    Get { file: PathBuf, cell: String },

    /// Bind a cell to a formula and report what changed.
    Set {
        file: PathBuf,
        cell: String,
        formula: String,
    },

    /// Remove a cell.
    Clear { file: PathBuf, cell: String },
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    simple_logger::init_with_level((&args.verbosity).into()).unwrap();

    match args.command {
        Commands::New {
            file,
            title,
            author,
        } => {
            let mut metadata = Metadata::new();
            if let Some(title) = title {
                metadata.set_title(title);
            }
            if let Some(author) = author {
                metadata.set_author(author);
            }
            persist::save(&Sheet::with_metadata(metadata), &file)?;
            info!("created {}", file.display());
        }

        Commands::Show { file } => {
            let sheet = persist::load(&file)?;

            let metadata = sheet.metadata();
            if let Some(title) = metadata.title() {
                println!("title:  {title}");
            }
            if let Some(author) = metadata.author() {
                println!("author: {author}");
            }
            println!("edited: {}", metadata.edited_time().to_rfc3339());
            println!("{}", GridView::of_sheet(&sheet));
        }

        Commands::Get { file, cell } => {
            let sheet = persist::load(&file)?;
            let amount = sheet.get(XY::from_a1(&cell)?)?;
            println!("{}", print_amount(&amount));
        }

        Commands::Set {
            file,
            cell,
            formula,
        } => {
            let mut sheet = persist::load(&file)?;

            sheet.register_on_change(|changed: &tabula::sheet::Cell| {
                println!("{} -> {}", changed.location, print_cell(changed));
            });

            match sheet.set(XY::from_a1(&cell)?, &formula) {
                Ok(amount) => println!("{cell} = {}", print_amount(&amount)),
                Err(tabula::Error::Parse(parse_error)) => {
                    error!("{}", annotate(&formula, &parse_error));
                    std::process::exit(-1);
                }
                Err(other) => {
                    error!("{other}");
                    std::process::exit(-1);
                }
            }

            persist::save(&sheet, &file)?;
        }

        Commands::Clear { file, cell } => {
            let mut sheet = persist::load(&file)?;

            sheet.register_on_change(|changed: &tabula::sheet::Cell| {
                println!("{} -> {}", changed.location, print_cell(changed));
            });

            sheet.clear(XY::from_a1(&cell)?);
            persist::save(&sheet, &file)?;
        }
    }

    Ok(())
}
