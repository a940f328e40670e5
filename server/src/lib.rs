//! # Choreo Server
//! The authoritative side of an effect choreography session. Runs Effectrons
//! and Selectrons on a fixed tick and writes bit-packed updates for every
//! connection to whom they are in-scope.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use choreo_shared::{
        BitReader, BitWrite, BitWriter, ConstBitLength, Serde, SerdeErr, SignedInteger,
        SignedVariableInteger, UnsignedInteger, UnsignedVariableInteger,
    };
}

mod connection;
mod error;
mod server;
mod viewer_scope;

pub use error::ChoreoServerError;
pub use server::{ChoreoServer, ServerConfig};
pub use viewer_scope::{ViewersMut, ViewersRef};
