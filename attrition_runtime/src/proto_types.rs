//! Hand-written protobuf types for the monthly record log.
//!
//! Uses prost derive macros for encode/decode without prost-build.
//! Field numbers are part of the on-disk format and must never be reused.

use prost::Message;

// ── Record Envelope ────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoRecordEnvelope {
    /// Strictly increasing, starting at 1. Always `record.month + 1`.
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(message, optional, tag = "2")]
    pub record: Option<ProtoMonthlyRecord>,
}

// ── Monthly Record ─────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoMonthlyRecord {
    #[prost(uint32, tag = "1")]
    pub month: u32,
    #[prost(double, tag = "2")]
    pub hp_overtime_avg: f64,
    #[prost(uint32, tag = "3")]
    pub urban_count: u32,
    #[prost(uint32, tag = "4")]
    pub rural_count: u32,
    #[prost(double, tag = "5")]
    pub cumulative_loss: f64,
    #[prost(double, tag = "6")]
    pub cumulative_cash_out: f64,
    #[prost(double, tag = "7")]
    pub cumulative_opportunity_loss: f64,
    #[prost(uint32, tag = "8")]
    pub hired: u32,
    #[prost(uint32, tag = "9")]
    pub resigned: u32,
    #[prost(uint32, tag = "10")]
    pub open_vacancies: u32,
}
