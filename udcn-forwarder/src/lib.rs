//! Forwarding pipelines, tables and variant derivation for the uDCN
//! forwarding engine.

pub mod cache;
pub mod config;
pub mod content_store;
pub mod dead_nonce_list;
pub mod face;
pub mod fib;
pub mod forwarder;
pub mod name_tree;
pub mod object_processor;
pub mod pit;
pub mod scheduler;
pub mod strategy;
pub mod variant_deriver;

pub use config::Config;
pub use face::{Face, FaceError, FaceTable};
pub use forwarder::Forwarder;
