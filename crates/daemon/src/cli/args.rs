pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "secure-share")]
#[command(about = "Share a secret through a relay that can't read it, exactly once")]
#[command(version)]
pub struct Args {
    /// Relay to talk to (defaults to localhost on the configured port)
    #[arg(long, global = true, env = "SECURE_SHARE_REMOTE")]
    pub remote: Option<Url>,

    /// Path to the config directory (defaults to ~/.secure-share)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
