use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "authflow")]
#[command(version, about = "AuthFlow - Identity onboarding automation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (defaults to ~/.authflow/authflow.db)
    #[arg(long, global = true, env = "AUTHFLOW_DB_PATH")]
    pub db_path: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Sponsor group management
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },

    /// Managed identity management
    Identity {
        #[command(subcommand)]
        command: IdentityCommands,
    },

    /// Run the onboarding pipeline
    Run(RunArgs),

    /// Capture an OAuth callback URL for one identity
    Capture(CaptureArgs),

    /// Background run bookkeeping
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Show identity status summary per group
    Status,
}

#[derive(Subcommand)]
pub enum GroupCommands {
    /// Add a sponsor group
    Add {
        /// Sponsor account email
        email: String,

        #[arg(short, long)]
        nickname: String,

        /// Maximum identities the group may hold
        #[arg(long, default_value_t = 5)]
        max_identities: u32,
    },

    /// List all groups
    List,

    /// Delete a group and all of its identities
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum IdentityCommands {
    /// Add a managed identity to a group
    Add {
        /// Identity email
        email: String,

        /// Group ID
        #[arg(short, long)]
        group: String,

        #[arg(short, long)]
        password: String,

        /// Base32 TOTP seed, when 2FA is enrolled
        #[arg(long)]
        totp: Option<String>,
    },

    /// List identities
    List {
        /// Restrict to one group
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Delete an identity
    Delete { id: String },

    /// Reset a failed identity back to pending
    Reset { id: String },
}

#[derive(Args)]
pub struct RunArgs {
    /// Run one identity
    #[arg(long, conflicts_with_all = ["group_id", "all"])]
    pub identity_id: Option<String>,

    /// Run every identity in a group
    #[arg(long, conflicts_with = "all")]
    pub group_id: Option<String>,

    /// Run every identity not yet joined
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct CaptureArgs {
    /// Identity to capture for
    #[arg(long)]
    pub identity_id: String,

    /// OAuth authorization URL to drive
    #[arg(long)]
    pub url: String,
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// List runs launched by this process
    List,
}
