//! Infrastructure adapters and runtime bootstrap.

pub mod backend;
pub mod drafts;
pub mod error;
pub mod http;
pub mod memory;
pub mod telemetry;
pub mod uploads;
