//! cryptostep - didactic RSA, ElGamal and BB84 walkthroughs
//!
//! Every stage of each protocol is recorded and printed so the algebra can be
//! followed by hand. None of this is secure: parameters are fixed or small,
//! randomness is not cryptographic and nothing is constant time.

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn main() {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = cli::run_cli(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
