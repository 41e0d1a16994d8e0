//! Error type shared by the arithmetic helpers and the protocol engines

use num_bigint::BigUint;

use crate::protocol::Stage;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(thiserror::Error, Debug)]
pub enum SimError {
    /// Modular arithmetic requested with a modulus of zero.
    #[error("Domain: modulus must be at least 1, got {modulus}")]
    Domain { modulus: BigUint },

    /// `gcd(value, modulus) != 1`, so no inverse exists.
    #[error("NotInvertible: {value} has no inverse mod {modulus} (gcd = {gcd})")]
    NotInvertible {
        value: BigUint,
        modulus: BigUint,
        gcd: BigUint,
    },

    #[error("MessageTooLarge at {stage}: encoded plaintext {encoded} is not below modulus {modulus}")]
    MessageTooLarge {
        stage: Stage,
        encoded: BigUint,
        modulus: BigUint,
    },

    #[error("Decode at {stage}: {value} is not valid UTF-8 text")]
    Decode {
        stage: Stage,
        value: BigUint,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("KeyGenerationTimeout at {stage}: no result after {attempts} attempts")]
    KeyGenerationTimeout { stage: Stage, attempts: usize },

    #[error("InvalidArgument: {0}")]
    InvalidArgument(String),

    #[error("OrderNotFound: no order for {a} mod {n} within {bound} steps")]
    OrderNotFound {
        a: BigUint,
        n: BigUint,
        bound: BigUint,
    },
}
