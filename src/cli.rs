use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dmarc-convert")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert DMARC aggregate reports into human-readable formats")]
#[command(
    long_about = "dmarc-convert reads DMARC aggregate report deliveries (raw reports or .eml \
                  messages carrying them as attachments) from a directory, optionally merges \
                  reports from the same reporting organization, and renders each one through \
                  a configurable template."
)]
#[command(after_help = "EXAMPLES:\n  \
    dmarc-convert --config /etc/dmarc-convert/config.toml\n  \
    dmarc-convert --generate-config --config config.toml")]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Write a commented sample configuration file to --config and exit
    #[arg(long)]
    pub generate_config: bool,
}
