#![forbid(unsafe_code)]

//! Attrition runtime.
//!
//! Wraps the kernel with run parameters, an append-only record log, JSON run
//! reports, session directories, replay, drift detection and lead-time
//! sensitivity sweeps.
//!
//! No domain logic lives here. Every month is stepped by the kernel.

pub mod error;
pub mod logging;
pub mod run;
pub mod proto_types;
pub mod proto_bridge;
pub mod record_store;
pub mod export;
pub mod replay;
pub mod session;
pub mod drift;
pub mod scenario;
