//! Proto ↔ Kernel conversion bridge.
//!
//! Converts between the record log's wire types (proto_types.rs) and the
//! kernel's `MonthlyRecord`. Doubles travel as IEEE-754 bits, so a record
//! survives the round trip exactly.

use std::io;

use attrition_engine::domain::MonthlyRecord;

use crate::proto_types::{ProtoMonthlyRecord, ProtoRecordEnvelope};

/// Sequence number a record is stored under.
pub fn sequence_for(record: &MonthlyRecord) -> u64 {
    u64::from(record.month) + 1
}

/// Wrap a kernel record in a log envelope.
pub fn record_to_proto(record: &MonthlyRecord) -> ProtoRecordEnvelope {
    ProtoRecordEnvelope {
        sequence: sequence_for(record),
        record: Some(ProtoMonthlyRecord {
            month: record.month,
            hp_overtime_avg: record.hp_overtime_avg,
            urban_count: record.urban_count,
            rural_count: record.rural_count,
            cumulative_loss: record.cumulative_loss,
            cumulative_cash_out: record.cumulative_cash_out,
            cumulative_opportunity_loss: record.cumulative_opportunity_loss,
            hired: record.hired,
            resigned: record.resigned,
            open_vacancies: record.open_vacancies,
        }),
    }
}

/// Unwrap a log envelope. Fails on an empty envelope or when the sequence
/// does not match the record's month.
pub fn proto_to_record(envelope: &ProtoRecordEnvelope) -> io::Result<MonthlyRecord> {
    let p = envelope.record.as_ref().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Envelope {} carries no record", envelope.sequence),
        )
    })?;

    let record = MonthlyRecord {
        month: p.month,
        hp_overtime_avg: p.hp_overtime_avg,
        urban_count: p.urban_count,
        rural_count: p.rural_count,
        cumulative_loss: p.cumulative_loss,
        cumulative_cash_out: p.cumulative_cash_out,
        cumulative_opportunity_loss: p.cumulative_opportunity_loss,
        hired: p.hired,
        resigned: p.resigned,
        open_vacancies: p.open_vacancies,
    };

    if sequence_for(&record) != envelope.sequence {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Envelope {} holds the record of month {}",
                envelope.sequence, record.month
            ),
        ));
    }
    Ok(record)
}
