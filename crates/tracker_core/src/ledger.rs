use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, TrackerError};
use crate::store::TrackerStore;

/// Marks that a tracker was completed on a specific calendar day.
/// At most one record exists per (tracker, day) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub tracker_id: Uuid,
    pub date: NaiveDate,
}

/// In-memory view over the completion records, indexed by tracker.
///
/// Every mutation is written through the store before memory changes, so a
/// persistence failure leaves the ledger exactly as it was.
pub struct CompletionLedger {
    store: Arc<dyn TrackerStore>,
    records: HashMap<Uuid, BTreeSet<NaiveDate>>,
}

impl CompletionLedger {
    pub fn new(store: Arc<dyn TrackerStore>) -> Self {
        Self {
            store,
            records: HashMap::new(),
        }
    }

    /// Builds the ledger from whatever the store currently holds.
    pub fn load(store: Arc<dyn TrackerStore>) -> Result<Self> {
        let mut ledger = Self::new(store);
        for record in ledger.store.load_records()? {
            ledger
                .records
                .entry(record.tracker_id)
                .or_default()
                .insert(record.date);
        }
        Ok(ledger)
    }

    pub fn is_completed(&self, tracker_id: Uuid, date: NaiveDate) -> bool {
        self.records
            .get(&tracker_id)
            .map(|days| days.contains(&date))
            .unwrap_or(false)
    }

    /// Total completions for a tracker across all days ("N days" counts).
    pub fn completed_count(&self, tracker_id: Uuid) -> usize {
        self.records.get(&tracker_id).map(BTreeSet::len).unwrap_or(0)
    }

    pub fn records_for(&self, tracker_id: Uuid) -> Vec<CompletionRecord> {
        self.records
            .get(&tracker_id)
            .into_iter()
            .flatten()
            .map(|&date| CompletionRecord { tracker_id, date })
            .collect()
    }

    /// Flips the completion state of `tracker_id` on `date` and returns the
    /// new state. Days after `today` are rejected without any state change.
    pub fn toggle(&mut self, tracker_id: Uuid, date: NaiveDate, today: NaiveDate) -> Result<bool> {
        if date > today {
            return Err(TrackerError::FutureDate { date, today });
        }

        if self.is_completed(tracker_id, date) {
            self.store.delete_record(tracker_id, date)?;
            if let Some(days) = self.records.get_mut(&tracker_id) {
                days.remove(&date);
                if days.is_empty() {
                    self.records.remove(&tracker_id);
                }
            }
            debug!(%tracker_id, %date, "completion removed");
            Ok(false)
        } else {
            let record = CompletionRecord { tracker_id, date };
            self.store.save_record(&record)?;
            self.records.entry(tracker_id).or_default().insert(date);
            debug!(%tracker_id, %date, "completion recorded");
            Ok(true)
        }
    }

    /// Deletes every record for a tracker; used when the tracker itself is
    /// deleted. Returns how many records were removed.
    pub fn remove_all_for(&mut self, tracker_id: Uuid) -> Result<usize> {
        let Some(days) = self.records.get(&tracker_id) else {
            return Ok(0);
        };
        let days: Vec<NaiveDate> = days.iter().copied().collect();
        let mut removed = 0;
        for date in days {
            self.store.delete_record(tracker_id, date)?;
            if let Some(set) = self.records.get_mut(&tracker_id) {
                set.remove(&date);
            }
            removed += 1;
        }
        self.records.remove(&tracker_id);
        debug!(%tracker_id, removed, "completion history cleared");
        Ok(removed)
    }
}
