//! Build log
//!
//! Records the order in which objects finished construction. Shutdown walks
//! the log backwards so an object is always closed before what it was
//! built from.

use std::sync::{Mutex, PoisonError};

use graft_domain::value_objects::Instance;

/// One completed construction
#[derive(Debug, Clone)]
pub struct BuildRecord {
    /// Position in completion order, starting at zero
    pub sequence: usize,
    /// The built object
    pub instance: Instance,
}

/// Append-only record of completed constructions
#[derive(Debug, Default)]
pub struct BuildLog {
    records: Mutex<Vec<BuildRecord>>,
}

impl BuildLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed construction
    pub fn record(&self, instance: Instance) -> usize {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let sequence = records.len();
        records.push(BuildRecord { sequence, instance });
        sequence
    }

    /// Copy of every record, in completion order
    pub fn snapshot(&self) -> Vec<BuildRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of completed constructions
    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing was built yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
