use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use compass_accounts::cli::{self, Cli};
use compass_accounts::config::AccountsConfig;

fn main() {
    let args = Cli::parse();
    let config = AccountsConfig::load_or_default(&args.config);

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = cli::run(args.command, &config) {
        error!(code = ?e.code(), "{}", e);
        std::process::exit(1);
    }
}
