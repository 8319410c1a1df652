use anyhow::Result;
use chrono::NaiveDate;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::category::Category;
use crate::ledger::CompletionRecord;
use crate::tracker::Tracker;

/// Durable storage collaborator for the engine. Implementations own the
/// medium; the engine only sequences the calls and never retries.
///
/// `save_*` calls are upserts keyed by the entity's identity (tracker id,
/// category name, record pair). Load order is significant: categories come
/// back in declaration order and trackers in insertion order.
pub trait TrackerStore: Send + Sync {
    fn load_trackers(&self) -> Result<Vec<Tracker>>;
    fn load_categories(&self) -> Result<Vec<Category>>;
    fn load_records(&self) -> Result<Vec<CompletionRecord>>;

    fn save_tracker(&self, tracker: &Tracker) -> Result<()>;
    fn save_category(&self, category: &Category) -> Result<()>;
    fn save_record(&self, record: &CompletionRecord) -> Result<()>;

    fn delete_tracker(&self, id: Uuid) -> Result<()>;
    fn delete_category(&self, name: &str) -> Result<()>;
    fn delete_record(&self, tracker_id: Uuid, date: NaiveDate) -> Result<()>;
}

/// In-memory store, used by tests and by embedders that do their own
/// persistence elsewhere.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    trackers: Vec<Tracker>,
    categories: Vec<Category>,
    records: Vec<CompletionRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrackerStore for MemoryStore {
    fn load_trackers(&self) -> Result<Vec<Tracker>> {
        Ok(self.inner.read().trackers.clone())
    }

    fn load_categories(&self) -> Result<Vec<Category>> {
        Ok(self.inner.read().categories.clone())
    }

    fn load_records(&self) -> Result<Vec<CompletionRecord>> {
        Ok(self.inner.read().records.clone())
    }

    fn save_tracker(&self, tracker: &Tracker) -> Result<()> {
        let mut state = self.inner.write();
        match state.trackers.iter_mut().find(|t| t.id == tracker.id) {
            Some(existing) => *existing = tracker.clone(),
            None => state.trackers.push(tracker.clone()),
        }
        Ok(())
    }

    fn save_category(&self, category: &Category) -> Result<()> {
        let mut state = self.inner.write();
        match state.categories.iter_mut().find(|c| c.name == category.name) {
            Some(existing) => *existing = category.clone(),
            None => state.categories.push(category.clone()),
        }
        Ok(())
    }

    fn save_record(&self, record: &CompletionRecord) -> Result<()> {
        let mut state = self.inner.write();
        if !state.records.contains(record) {
            state.records.push(*record);
        }
        Ok(())
    }

    fn delete_tracker(&self, id: Uuid) -> Result<()> {
        self.inner.write().trackers.retain(|t| t.id != id);
        Ok(())
    }

    fn delete_category(&self, name: &str) -> Result<()> {
        self.inner.write().categories.retain(|c| c.name != name);
        Ok(())
    }

    fn delete_record(&self, tracker_id: Uuid, date: NaiveDate) -> Result<()> {
        self.inner
            .write()
            .records
            .retain(|r| !(r.tracker_id == tracker_id && r.date == date));
        Ok(())
    }
}
