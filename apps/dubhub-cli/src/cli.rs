//! Command line definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use dubhub_protocol::OperationType;

#[derive(Debug, Parser)]
#[command(name = "dubhub")]
#[command(version, about = "Video translation and dubbing client")]
pub struct Cli {
    /// Configuration file (defaults to ~/.config/dubhub/cli.toml).
    #[arg(long, global = true, env = "DUBHUB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend API base URL, overriding the configured one.
    #[arg(long, global = true, env = "DUBHUB_BACKEND_URL")]
    pub backend_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session token
    Login {
        /// Mobile number (09xxxxxxxxx)
        mobile: String,
        /// Log in with a texted one-time code instead of a password
        #[arg(long)]
        otp: bool,
        #[arg(long, env = "DUBHUB_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session token
    Logout,
    /// Create an account with a texted one-time code
    Signup {
        mobile: String,
        #[arg(long, env = "DUBHUB_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Preview the cost of translating a video
    Estimate {
        #[arg(short, long, value_parser = parse_operation)]
        operation: Option<OperationType>,
        /// Video resolution, e.g. 1920x1080 or 720p
        #[arg(short, long, default_value = "1920x1080")]
        resolution: String,
        /// Video length in seconds
        #[arg(short, long, conflicts_with = "file")]
        duration: Option<f64>,
        /// Guess the length from a file's size
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Compare against the wallet balance (requires login)
        #[arg(long)]
        balance: bool,
    },
    /// Upload a video and start its translation
    Upload {
        file: PathBuf,
        #[arg(short, long, value_parser = parse_operation)]
        operation: Option<OperationType>,
        #[arg(short, long)]
        resolution: Option<String>,
        /// Video length in seconds (guessed from size when omitted)
        #[arg(short, long)]
        duration: Option<f64>,
        /// Pay from the wallet balance
        #[arg(long)]
        wallet: bool,
        /// Return once the upload is confirmed instead of waiting for the job
        #[arg(long)]
        no_wait: bool,
    },
    /// Show a project's processing status
    Status {
        project_id: u64,
        /// Keep polling until the job finishes
        #[arg(short, long)]
        watch: bool,
    },
    /// Show the wallet balance
    Balance,
    /// Top up the wallet (amount in Toman)
    Topup { amount: u64 },
    /// Update first and last name
    Profile { first_name: String, last_name: String },
    /// Change the account password
    Password,
}

fn parse_operation(s: &str) -> Result<OperationType, String> {
    s.parse::<OperationType>().map_err(|e| {
        let known: Vec<_> = OperationType::ALL.iter().map(|op| op.as_str()).collect();
        format!("{e} (expected one of: {})", known.join(", "))
    })
}
