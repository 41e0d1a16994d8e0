//! Protocol engines
//!
//! Each engine runs to completion and returns its typed results together with
//! a [`Transcript`] of every intermediate value. Printing is left to the caller.

pub mod bb84;
pub mod elgamal;
pub mod order;
pub mod rsa;
pub mod transcript;

pub use transcript::{Phase, Stage, Step, Transcript, Value};
