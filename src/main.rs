use clap::Parser;
use dmarc_convert::{Cli, Config, FilesConverter, SAMPLE_CONFIG};
use std::process;
use tracing::{error, warn, Level};

fn main() {
    process::exit(run());
}

fn run() -> i32 {
    let cli = Cli::parse();

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let cfg = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("error: {}", e);
            return 2;
        }
    };

    init_logging(&cfg);

    if cfg.input.imap.is_configured() {
        warn!(
            server = %cfg.input.imap.server,
            "message retrieval is delegated to an external fetcher, processing existing files only"
        );
    }

    let mut converter = match FilesConverter::new(&cfg) {
        Ok(converter) => converter,
        Err(e) => {
            error!(error = %e, "unable to prepare input directory");
            return 1;
        }
    };

    match converter.convert_write() {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "conversion run failed");
            1
        }
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    match std::fs::write(&cli.config, SAMPLE_CONFIG) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", cli.config.display());
            println!("\nEdit it for your environment, then run:");
            println!("  dmarc-convert --config {}", cli.config.display());
            0
        }
        Err(e) => {
            eprintln!("error: unable to write {}: {}", cli.config.display(), e);
            1
        }
    }
}

fn init_logging(cfg: &Config) {
    let level = if cfg.log_debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cfg.log_datetime {
        builder.init();
    } else {
        builder.without_time().init();
    }
}
