//! Core types and utilities for the ODR ASN.1 codec
//!
//! This crate provides the error taxonomy, handle configuration, the nibble
//! memory arena and the value types used throughout the codec.

pub mod config;
pub mod datatypes;
pub mod error;
pub mod nmem;
pub mod oid;

pub use config::OdrConfig;
pub use datatypes::BitString;
pub use error::{errmsg, OdrError, OdrErrorCode, OdrResult};
pub use nmem::{BlockPool, Nmem};
pub use oid::Oid;
