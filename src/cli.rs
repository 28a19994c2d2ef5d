use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "verdura")]
#[command(author, version, about = "Telegram ordering bot for a wholesale catalog", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (long polling)
    Run,

    /// Create the database schema and exit
    InitDb {
        /// Also insert a small demo catalog
        #[arg(long)]
        seed: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
