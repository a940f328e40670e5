//! # Choreo Client
//! The replica side of an effect choreography session. Reads the updates a
//! choreo-server writes and plays the same Effectrons and Selectrons with the
//! local camera and listener.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod shared {
    pub use choreo_shared::{
        BitReader, BitWrite, BitWriter, ConstBitLength, Serde, SerdeErr, SignedInteger,
        SignedVariableInteger, UnsignedInteger, UnsignedVariableInteger,
    };
}

mod client;
mod error;

pub use client::{ChoreoClient, ClientConfig};
pub use error::ChoreoClientError;
