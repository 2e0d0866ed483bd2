use std::path::Path;
use std::sync::{Mutex, RwLock};
use thiserror::Error;
use tonk_engine::logger::{SettlementLogger, SettlementRecord};

/// Receives exactly one record per finished round.
pub trait SettlementSink: Send + Sync {
    fn record(&self, record: &SettlementRecord) -> Result<(), LedgerError>;
}

/// Settlement history kept in memory
#[derive(Debug, Default)]
pub struct SettlementStore {
    records: RwLock<Vec<SettlementRecord>>,
}

impl SettlementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent records first, 100 unless a limit is given
    pub fn recent(&self, limit: Option<usize>) -> Result<Vec<SettlementRecord>, LedgerError> {
        let records = self
            .records
            .read()
            .map_err(|_| LedgerError::StoragePoisoned)?;
        let limit = limit.unwrap_or(100);
        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    /// Every round settled at `table_id`, oldest first
    pub fn for_table(&self, table_id: &str) -> Result<Vec<SettlementRecord>, LedgerError> {
        let records = self
            .records
            .read()
            .map_err(|_| LedgerError::StoragePoisoned)?;
        Ok(records
            .iter()
            .filter(|r| r.table_id == table_id)
            .cloned()
            .collect())
    }

    pub fn total(&self) -> Result<usize, LedgerError> {
        self.records
            .read()
            .map(|r| r.len())
            .map_err(|_| LedgerError::StoragePoisoned)
    }
}

impl SettlementSink for SettlementStore {
    fn record(&self, record: &SettlementRecord) -> Result<(), LedgerError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| LedgerError::StoragePoisoned)?;
        records.push(record.clone());
        Ok(())
    }
}

/// Appends settlements to a JSONL file shared by every table
pub struct JsonlLedger {
    logger: Mutex<SettlementLogger>,
}

impl JsonlLedger {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        Ok(Self {
            logger: Mutex::new(SettlementLogger::create(path)?),
        })
    }

    pub fn append<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        Ok(Self {
            logger: Mutex::new(SettlementLogger::append(path)?),
        })
    }

    pub fn written(&self) -> Result<usize, LedgerError> {
        self.logger
            .lock()
            .map(|l| l.written())
            .map_err(|_| LedgerError::StoragePoisoned)
    }
}

impl SettlementSink for JsonlLedger {
    fn record(&self, record: &SettlementRecord) -> Result<(), LedgerError> {
        let mut logger = self
            .logger
            .lock()
            .map_err(|_| LedgerError::StoragePoisoned)?;
        logger.write(record)?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Ledger storage poisoned")]
    StoragePoisoned,
}
