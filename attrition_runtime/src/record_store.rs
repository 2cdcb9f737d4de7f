//! Append-only record log: binary protobuf frames.
//!
//! Storage format: length-prefixed protobuf frames.
//!   [4-byte LE length][protobuf bytes][4-byte LE length][protobuf bytes]...
//!
//! Rules:
//!   - Strict append only, never rewritten or reordered
//!   - fsync after every write
//!   - Sequence strictly increasing from 1 (validated on append)
//!   - Zero-length frames, frames over 16 MiB and torn length prefixes are
//!     rejected on load

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use prost::Message;
use sha2::{Digest, Sha256};
use tracing::debug;

use attrition_engine::domain::MonthlyRecord;
use attrition_engine::hashing::{hex_digest, to_hex};

use crate::proto_bridge::{proto_to_record, record_to_proto};
use crate::proto_types::ProtoRecordEnvelope;

/// Largest frame accepted on load.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Append-only monthly record log backed by a binary file.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    last_sequence: u64,
}

impl RecordStore {
    /// Open or create a record log at the given path.
    /// Reads existing frames to determine the last sequence number.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let last_sequence = if path.exists() {
            let frames = Self::read_all_from_file(path)?;
            frames.last().map(|f| f.sequence).unwrap_or(0)
        } else {
            0
        };

        Ok(Self {
            path: path.to_path_buf(),
            last_sequence,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a single envelope to the log.
    ///
    /// Validates strict sequence ordering.
    /// Writes length-prefixed protobuf and fsyncs.
    pub fn append_envelope(&mut self, envelope: &ProtoRecordEnvelope) -> io::Result<()> {
        let expected = self.last_sequence + 1;
        if envelope.sequence != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Sequence violation in record log: expected {}, got {}",
                    expected, envelope.sequence
                ),
            ));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let buf = envelope.encode_to_vec();
        let len = buf.len() as u32;

        {
            let mut writer = BufWriter::new(&mut file);
            writer.write_all(&len.to_le_bytes())?;
            writer.write_all(&buf)?;
            writer.flush()?;
        }
        file.sync_all()?;

        self.last_sequence = envelope.sequence;
        debug!(sequence = envelope.sequence, bytes = len, "record appended");
        Ok(())
    }

    /// Append a kernel record under sequence `month + 1`.
    pub fn append_record(&mut self, record: &MonthlyRecord) -> io::Result<()> {
        self.append_envelope(&record_to_proto(record))
    }

    /// Load all envelopes in sequence order.
    pub fn load_all_envelopes(&self) -> io::Result<Vec<ProtoRecordEnvelope>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Self::read_all_from_file(&self.path)
    }

    /// Load all records in month order.
    pub fn load_records(&self) -> io::Result<Vec<MonthlyRecord>> {
        self.load_all_envelopes()?
            .iter()
            .map(proto_to_record)
            .collect()
    }

    /// Get the last sequence number in the log. Zero when empty.
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// SHA-256 of the raw log bytes.
    pub fn digest(&self) -> io::Result<String> {
        if !self.path.exists() {
            return Ok(hex_digest(&[]));
        }
        let mut hasher = Sha256::new();
        let mut reader = BufReader::new(File::open(&self.path)?);
        io::copy(&mut reader, &mut hasher)?;
        Ok(to_hex(&hasher.finalize()))
    }

    /// Read all frames from a file, validating frame integrity and ordering.
    fn read_all_from_file(path: &Path) -> io::Result<Vec<ProtoRecordEnvelope>> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut frames: Vec<ProtoRecordEnvelope> = Vec::new();
        let mut len_buf = [0u8; 4];

        loop {
            if !read_length_prefix(&mut reader, &mut len_buf, frames.len())? {
                break;
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len == 0 || len > MAX_FRAME_LEN {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Invalid frame length: {}", len),
                ));
            }

            let mut frame = vec![0u8; len];
            reader.read_exact(&mut frame).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Truncated frame after sequence {}: {}", frames.len(), e),
                )
            })?;

            let envelope = ProtoRecordEnvelope::decode(frame.as_slice()).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Protobuf decode error: {}", e),
                )
            })?;

            let expected = frames.len() as u64 + 1;
            if envelope.sequence != expected {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Out-of-order frame: expected sequence {}, found {}",
                        expected, envelope.sequence
                    ),
                ));
            }

            frames.push(envelope);
        }

        Ok(frames)
    }
}

/// Fill the 4-byte length prefix. Returns `false` on a clean end of file
/// before any byte, and `InvalidData` when the prefix itself is torn.
fn read_length_prefix(reader: &mut impl Read, buf: &mut [u8; 4], frames_read: usize) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Truncated length prefix after sequence {}: {} of 4 bytes",
                        frames_read, filled
                    ),
                ))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}
