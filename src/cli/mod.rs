pub mod chat;
pub mod init;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cashback", about = "Shared cashback offers with typo-tolerant lookup.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up the data directory and initialize the database.
    Init {
        /// Path for data (default: ~/.local/share/cashback-advisor)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Chat with the advisor as one user. Reads messages from stdin, one per line;
    /// end a line with `\` to continue the message on the next line.
    Chat {
        /// Numeric user id
        #[arg(long)]
        user: i64,
        /// Display name shown as the card holder of saved offers
        #[arg(long)]
        name: Option<String>,
        /// Treat this date (YYYY-MM-DD) as today when checking expiry
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}
