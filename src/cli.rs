//! CLI argument parsing using clap v4

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// edgehost - deploy and serve functions with their static assets
#[derive(Parser, Debug)]
#[command(name = "edgehost")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the configuration file (extension optional)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where a function lives and how it is laid out
#[derive(Args, Debug, Clone)]
pub struct FunctionArgs {
    /// Function root directory or its entry file
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Directory of static files served alongside the function
    /// (relative to the function root)
    #[arg(short, long)]
    pub public: Option<PathBuf>,

    /// Entry file (relative to the function root)
    #[arg(short, long)]
    pub index: Option<PathBuf>,

    /// Environment file (KEY=VALUE lines)
    #[arg(short, long)]
    pub env: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bundle a function and its public directory into the deployment store
    Deploy {
        #[command(flatten)]
        function: FunctionArgs,

        /// Function name (defaults to the directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Deployment store directory
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Serve a function from source, reloading assets on change
    Dev {
        #[command(flatten)]
        function: FunctionArgs,

        /// Port to listen on
        #[arg(long, default_value_t = 1234)]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        hostname: String,
    },

    /// Serve every deployed function, routed by Host header
    Serve {
        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides server.port)
        #[arg(long)]
        port: Option<u16>,

        /// Deployment store directory
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// List deployed functions
    #[command(alias = "list")]
    Ls {
        /// Deployment store directory
        #[arg(long)]
        store: Option<PathBuf>,
    },
}
