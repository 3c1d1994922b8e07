//! Core types, configuration, and the persistence seam for s3gate.
//!
//! This crate provides the foundational building blocks shared by the
//! authentication and authorization crates: the gateway configuration, the
//! region and service identifiers carried in credential scopes, and the
//! [`KvStore`] trait through which credentials and policies are persisted.

mod config;
mod error;
mod store;
mod types;

pub use config::GateConfig;
pub use error::{GateError, GateResult};
pub use store::{KvStore, MemoryStore, StoreError};
pub use types::{AwsRegion, ServiceType};
