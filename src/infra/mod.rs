//! Infrastructure adapters and runtime bootstrap.

pub mod client;
pub mod clients;
pub mod credentials;
pub mod error;
pub mod imgbb;
pub mod postgrest;
pub mod qr;
pub mod telemetry;
