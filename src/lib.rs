//! Didactic simulator for RSA, ElGamal and BB84.
//!
//! Engines under [`protocol`] return typed results plus a [`protocol::Transcript`];
//! the arithmetic they share lives in [`crypto`].
//!
//! ** THIS IS NOT A SECURE IMPLEMENTATION **

pub mod crypto;
pub mod error;
pub mod protocol;
pub mod types;

pub use error::{Result, SimError};
