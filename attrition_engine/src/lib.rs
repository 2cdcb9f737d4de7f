#![forbid(unsafe_code)]

//! Attrition spiral kernel.
//!
//! A workforce loses members month by month, vacancies are backfilled after a
//! branch-dependent lead time, departing workload spills onto survivors and
//! every delay or departure is charged to a loss ledger.

/// Model v1. Any change to a phase formula requires a new model version.
pub const MODEL_VERSION: u32 = 1;

pub mod arithmetic;
pub mod domain;
pub mod config;
pub mod error;
pub mod events;
pub mod state;
pub mod generator;
pub mod transitions;
pub mod invariants;
pub mod analysis;
pub mod hashing;
pub mod engine;
