//! Command-line interface

use clap::{Parser, Subcommand};
use cryptostep::crypto::sanitize_message;
use cryptostep::protocol::order::DEFAULT_MAX_STEPS;
use cryptostep::protocol::{bb84, elgamal, order, rsa};
use cryptostep::types::{SimConfig, DEFAULT_MAX_KEY_ATTEMPTS, DEFAULT_PRIME_BITS};
use num_bigint::BigUint;

#[derive(Parser)]
#[command(name = "cryptostep")]
#[command(author = "cryptostep Contributors")]
#[command(version = "1.0.0")]
#[command(
    about = "Step through RSA, ElGamal and BB84",
    long_about = "Step through RSA, ElGamal and BB84, printing every intermediate value.\n\n\
                  ** FOR ILLUSTRATION ONLY. THIS IS NOT A SECURE IMPLEMENTATION. **"
)]
pub struct Cli {
    /// Seed the random source for a reproducible run
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Size in bits of each RSA prime
    #[arg(long, global = true, default_value_t = DEFAULT_PRIME_BITS,
          value_parser = clap::value_parser!(u64).range(2..))]
    pub bits: u64,

    /// Fresh prime pairs to try before RSA key generation gives up
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_KEY_ATTEMPTS)]
    pub max_attempts: usize,

    /// Log protocol stages to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// RSA key generation, encryption and decryption (e.g. `rsa attack at dawn`)
    Rsa {
        /// The message to transmit. Only a-zA-Z0-9 characters are kept
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        message: Vec<String>,
    },

    /// ElGamal over the RFC 5114 group (e.g. `elgamal attack at dawn`)
    Elgamal {
        /// The message to transmit. Only a-zA-Z0-9 characters are kept
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        message: Vec<String>,
    },

    /// BB84 basis encoding and sifting (e.g. `bb84 -n 10`)
    Bb84 {
        /// Number of bits in the key string; the absolute value is used
        #[arg(short = 'n', allow_negative_numbers = true)]
        n: i64,
    },

    /// Classical order finding and Shor post-processing (e.g. `order -a 5 -N 13`)
    Order {
        /// Element a in Z_N whose order is wanted
        #[arg(short = 'a', allow_negative_numbers = true)]
        a: i64,

        /// Integer N defining the modular algebra
        #[arg(short = 'N', allow_negative_numbers = true)]
        n: i64,

        /// Powers of a to walk before giving up
        #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
        max_steps: u64,
    },
}

impl Cli {
    pub fn config(&self) -> SimConfig {
        SimConfig {
            prime_bits: self.bits,
            max_key_attempts: self.max_attempts,
            seed: self.seed,
            ..SimConfig::default()
        }
    }
}

pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config();
    let mut rng = config.rng();

    match &cli.command {
        Command::Rsa { message } => {
            let message = sanitize_message(message);
            tracing::info!(%message, bits = config.prime_bits, "starting RSA run");

            let run = rsa::run(&message, &config, &mut rng)?;
            print!("{}", run.transcript);
            if !run.verified {
                anyhow::bail!(
                    "RSA round trip failed: sent {:?}, recovered {:?}",
                    run.plaintext,
                    run.recovered
                );
            }
        }
        Command::Elgamal { message } => {
            let message = sanitize_message(message);
            tracing::info!(%message, "starting ElGamal run");

            let run = elgamal::run(&message, &mut rng)?;
            print!("{}", run.transcript);
            if !run.verified {
                anyhow::bail!(
                    "ElGamal round trip failed: sent {:?}, recovered {:?}",
                    run.plaintext,
                    run.recovered
                );
            }
        }
        Command::Bb84 { n } => {
            let n = usize::try_from(n.unsigned_abs())?;
            tracing::info!(n, "starting BB84 run");

            let run = bb84::run(n, &mut rng)?;
            print!("{}", run.transcript);
            if run.alice_key != run.bob_key {
                anyhow::bail!("BB84 sifted keys disagree");
            }
        }
        Command::Order { a, n, max_steps } => {
            let a = BigUint::from(a.unsigned_abs());
            let n = BigUint::from(n.unsigned_abs());
            tracing::info!(%a, %n, "starting order finding");

            let run = order::run(&a, &n, *max_steps)?;
            print!("{}", run.transcript);
        }
    }

    Ok(())
}
