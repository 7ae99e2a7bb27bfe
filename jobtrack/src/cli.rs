use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "jobtrack", version, about = "Track job applications found in your Gmail")]
pub struct Cli {
    /// Also print log events to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Sign in with a Google access token, or through the browser if none is given
    Login {
        #[arg(long)]
        token: Option<String>,
    },
    /// Forget the stored credential
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List tracked applications
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        page_size: u32,
        #[arg(long)]
        search: Option<String>,
        /// Comma-separated statuses, e.g. applied,interviewing
        #[arg(long, value_delimiter = ',')]
        status: Vec<String>,
        #[arg(long)]
        date_range: Option<String>,
        #[arg(long)]
        date_from: Option<String>,
        #[arg(long)]
        date_to: Option<String>,
    },
    /// Track a new application
    Add {
        company: String,
        position: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change the status of an application
    SetStatus { id: i64, status: String },
    /// Import applications from emails matching a Gmail search query
    ProcessEmails {
        query: String,
        #[arg(long, default_value_t = 10)]
        max_results: u32,
    },
}
