use clap::Parser;

/// gemmirror: a mirror/cache for RubyGems dependency metadata.
#[derive(Parser, Debug)]
#[command(name = "gemmirror", version, about)]
pub struct Args {
    /// Listen address, e.g. 127.0.0.1:8080
    #[arg(long)]
    pub bind: Option<String>,

    /// Path of the primary catalog database
    #[arg(long)]
    pub database: Option<String>,

    /// Path of the follower database for the read path
    #[arg(long)]
    pub follower_database: Option<String>,

    /// Upstream origin for gem archives and redirects
    #[arg(long)]
    pub upstream: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}
