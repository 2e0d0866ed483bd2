use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::player::{PlayerId, TableId};
use crate::scoring::{EndReason, PlayerScore};

/// Outcome of one round, handed once to the history/ledger collaborator.
/// Serialized as one JSON line per round.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRecord {
    pub table_id: TableId,
    /// Stake times seats, fixed when the round started
    pub pot_amount: u64,
    pub winner_id: PlayerId,
    /// Remaining hand value per seat, in seating order
    pub players: Vec<PlayerScore>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub end_reason: EndReason,
    /// Shuffle seed, enabling deterministic replay of the deal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Appends settlement records to a JSONL file.
pub struct SettlementLogger {
    writer: Option<BufWriter<File>>,
    written: usize,
}

impl SettlementLogger {
    /// Creates (or truncates) the file at `path`, including missing parent directories.
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        Self::prepare_parent(path.as_ref());
        let f = File::create(path)?;
        Ok(Self {
            writer: Some(BufWriter::new(f)),
            written: 0,
        })
    }

    /// Opens the file at `path` for appending, creating it if needed.
    pub fn append<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        Self::prepare_parent(path.as_ref());
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Some(BufWriter::new(f)),
            written: 0,
        })
    }

    /// A logger that only counts records.
    pub fn discarding() -> Self {
        Self {
            writer: None,
            written: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn write(&mut self, record: &SettlementRecord) -> std::io::Result<()> {
        let line = serde_json::to_string(record).map_err(std::io::Error::other)?;
        if let Some(w) = &mut self.writer {
            w.write_all(line.as_bytes())?;
            w.write_all(b"\n")?;
            w.flush()?;
        }
        self.written += 1;
        Ok(())
    }

    fn prepare_parent(path: &Path) {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = create_dir_all(parent);
            }
        }
    }
}
