use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "talon")]
#[command(version, about = "Automated API security assessment engine")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover the API surface and probe it for vulnerabilities
    Scan {
        #[arg(short, long)]
        url: String,

        /// Protocols to assess, comma-separated: rest,graphql,soap
        #[arg(short, long, default_value = "rest,graphql,soap")]
        protocols: String,

        /// Token for the normal-privilege credential tier
        #[arg(long)]
        token: Option<String>,

        /// Token for the elevated-privilege credential tier
        #[arg(long)]
        admin_token: Option<String>,

        #[arg(long, default_value = "Authorization")]
        header: String,

        #[arg(short, long, default_value = "8")]
        concurrency: usize,

        /// Per-request timeout in seconds
        #[arg(short, long, default_value = "10")]
        timeout: u64,

        /// Whole-session deadline in seconds
        #[arg(long, default_value = "600")]
        session_timeout: u64,

        /// Delay in ms above which a response counts as time-based evidence
        #[arg(long, default_value = "4500")]
        timing_threshold_ms: u64,

        /// JSON file overriding built-in payload lists per class
        #[arg(long)]
        payloads: Option<String>,

        /// Comma-separated path fragments exempt from missing-auth findings
        #[arg(long)]
        public_paths: Option<String>,

        #[arg(long, default_value = "/graphql")]
        graphql_path: String,

        #[arg(long, default_value = "/soap")]
        soap_path: String,

        /// Write the JSON report here
        #[arg(short, long)]
        output: Option<String>,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Re-render a previously exported JSON report
    Report {
        #[arg(short, long)]
        input: String,

        #[arg(short, long, default_value = "html")]
        format: String,

        #[arg(short, long)]
        output: Option<String>,
    },
}
