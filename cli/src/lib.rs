use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use app::sync::{parse_switch, OutputFormat};
use utils::app_config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "s3sync", version)]
#[command(about = "Upload a local directory to an S3 bucket prefix", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload the source tree and optionally delete stale remote objects
    Sync(SyncArgs),
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Access key id
    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key_id: Option<String>,

    /// Secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,

    /// Bucket region
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Endpoint of an S3 compatible service
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    pub endpoint: Option<String>,

    /// Target bucket
    #[arg(short, long, env = "S3SYNC_BUCKET")]
    pub bucket: Option<String>,

    /// Local file or directory to upload
    #[arg(short, long, default_value = ".")]
    pub source: String,

    /// Key prefix in the bucket
    #[arg(short, long, default_value = "")]
    pub target: String,

    /// Canned ACL applied to every uploaded object
    #[arg(long)]
    pub acl: Option<String>,

    /// Expiry time of uploaded objects (RFC 3339, RFC 2822 or YYYY-MM-DD)
    #[arg(long)]
    pub expires: Option<String>,

    /// Delete remote objects under the target that do not exist locally
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = switch
    )]
    pub delete: bool,

    /// Report upload failures without failing the run
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = switch
    )]
    pub ignore_error: bool,

    /// Maximum number of uploads in flight, 0 for no limit
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Number of keys listed per request while deleting (1 to 1000)
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Output format of the result (text, json)
    #[arg(short, long, default_value = "text")]
    pub output: OutputFormat,
}

fn switch(value: &str) -> Result<bool, String> {
    Ok(parse_switch(value))
}

pub async fn cli_match() -> utils::error::Result<()> {
    let cli = Cli::parse();

    // Merge the user configuration before anything reads it
    AppConfig::merge_config(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        AppConfig::set("log.level", level)?;
    }

    let _guard = utils::logger::setup_logging()?;

    // Execute the subcommand
    match cli.command {
        Commands::Sync(args) => commands::sync_cmd(args).await?,
    }

    Ok(())
}
