use clap::{Parser, Subcommand};

use crate::commands;

#[derive(Parser)]
#[command(name = "coinpulse")]
#[command(about = "Crypto price history feed with live broadcast", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the server and broadcast worker
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
    /// Fetch a coin's price history once and print it as JSON
    History {
        /// Coin identifier (e.g. bitcoin)
        coin: String,

        /// Timeframe in days: 1, 7, 30, 90
        #[arg(short, long, default_value = "1")]
        days: String,
    },
}

pub async fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            commands::serve::run(port).await;
        }
        Commands::History { coin, days } => {
            commands::history::run(coin, days).await;
        }
    }
}
