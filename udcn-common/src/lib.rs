//! Shared packet types and utilities for the uDCN forwarding core.
//!
//! This crate provides the wire-agnostic packet model (`Name`, `Interest`,
//! `Data`) and the error and metrics vocabulary shared by the forwarding
//! engine and its operator-facing CLI.

pub mod error;
pub mod metrics;
pub mod ndn;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
