use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "GR10 A07 - Monitoramento de PLD")]
pub struct Cli {
    /// Path to the platform config file (defaults to GR10_CONFIG_PATH or ~/.gr10.config)
    #[clap(long, short = 'c')]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check whether a form exists for a contract
    Search {
        /// Contract number, in any formatting
        contrato: String,
    },

    /// Show a stored form's fields
    Show {
        /// Contract number, in any formatting
        contrato: String,
    },

    /// Save a form and update the consolidated spreadsheet
    Save {
        /// Contract number, in any formatting
        contrato: String,

        /// Read the form fields from a JSON file
        #[clap(long)]
        file: Option<PathBuf>,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },

    /// List forms pointed out or filled in inside a date range
    Report {
        /// Range start (2024-01-01, 01/01/2024 or ISO date-time)
        data_inicio: String,

        /// Range end, inclusive
        data_fim: String,

        /// Write the report as a PDF instead of printing it
        #[clap(long)]
        pdf: Option<PathBuf>,
    },

    /// Render one form as a PDF
    FormPdf {
        /// Contract number, in any formatting
        contrato: String,

        /// Output file path
        #[clap(long, short = 'o')]
        output: PathBuf,
    },

    /// Re-export a stored form to the consolidated spreadsheet
    Export {
        /// Contract number, in any formatting
        contrato: String,
    },

    /// Email colleagues the link to a contract's form
    Notify {
        /// Contract number, in any formatting
        contrato: String,

        /// Recipients, semicolon separated
        #[clap(long)]
        to: String,

        /// Display name signed under the message
        #[clap(long)]
        name: String,

        /// Optional note appended to the message
        #[clap(long)]
        note: Option<String>,
    },

    /// Print the resolved config file location
    ConfigPath,
}
