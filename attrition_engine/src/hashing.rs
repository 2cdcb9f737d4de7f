//! Canonical hashing.
//!
//! Deterministic canonical serialization + SHA-256 hashing of run output.
//!
//! Rules:
//!   - model_version is always the first field
//!   - records in month order, employees sorted by id
//!   - struct fields in declaration order (serde_json with preserve_order)
//!   - UTF-8 JSON, no whitespace

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::SimulationConfig;
use crate::domain::{Employee, MonthlyRecord};
use crate::MODEL_VERSION;

#[derive(Serialize)]
struct Canonical<'a, T: Serialize + ?Sized> {
    model_version: u32,
    body: &'a T,
}

fn canonical_bytes<T: Serialize + ?Sized>(body: &T) -> Vec<u8> {
    let wrapped = Canonical {
        model_version: MODEL_VERSION,
        body,
    };
    serde_json::to_vec(&wrapped).expect("canonical serialization: JSON encoding failed")
}

/// Lowercase hex of a finalized digest.
pub fn to_hex(digest: &[u8]) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn hex_digest(bytes: &[u8]) -> String {
    to_hex(&Sha256::digest(bytes))
}

/// Canonical JSON of a record history.
pub fn canonical_serialize_history(records: &[MonthlyRecord]) -> Vec<u8> {
    canonical_bytes(records)
}

/// SHA-256 of the canonical record history.
pub fn history_hash(records: &[MonthlyRecord]) -> String {
    hex_digest(&canonical_serialize_history(records))
}

/// Canonical JSON of a population, sorted by employee id.
pub fn canonical_serialize_population(population: &[Employee]) -> Vec<u8> {
    let mut sorted: Vec<&Employee> = population.iter().collect();
    sorted.sort_by_key(|e| e.id);
    canonical_bytes(&sorted)
}

pub fn population_hash(population: &[Employee]) -> String {
    hex_digest(&canonical_serialize_population(population))
}

/// SHA-256 of the canonical configuration bundle.
pub fn config_hash(config: &SimulationConfig) -> String {
    hex_digest(&canonical_bytes(config))
}
