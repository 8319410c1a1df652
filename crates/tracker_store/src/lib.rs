use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use tracker_core::category::Category;
use tracker_core::ledger::CompletionRecord;
use tracker_core::store::TrackerStore;
use tracker_core::tracker::Tracker;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct FileState {
    #[serde(default)]
    categories: Vec<Category>,
    #[serde(default)]
    trackers: Vec<Tracker>,
    #[serde(default)]
    records: Vec<CompletionRecord>,
}

/// `TrackerStore` backed by a single JSON document on disk.
///
/// Every mutation rewrites the document through a temp file followed by a
/// rename, so the file on disk is always one complete state. Schedules
/// serialize as integer sets and colors as `#RRGGBB` strings via the entity
/// serde impls.
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<FileState>,
}

impl JsonFileStore {
    /// Opens the store at `path`, reading the existing document if there is
    /// one and starting empty otherwise.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", path.display()))?
        } else {
            FileState::default()
        };
        debug!(path = %path.display(), "store opened");
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    fn persist(&self, state: &FileState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(state).context("encoding store state")?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    /// Applies `mutate` to a copy of the state, persists the copy, and only
    /// then commits it to memory.
    fn update(&self, mutate: impl FnOnce(&mut FileState)) -> Result<()> {
        let mut guard = self.state.lock();
        let mut next = guard.clone();
        mutate(&mut next);
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }
}

impl TrackerStore for JsonFileStore {
    fn load_trackers(&self) -> Result<Vec<Tracker>> {
        Ok(self.state.lock().trackers.clone())
    }

    fn load_categories(&self) -> Result<Vec<Category>> {
        Ok(self.state.lock().categories.clone())
    }

    fn load_records(&self) -> Result<Vec<CompletionRecord>> {
        Ok(self.state.lock().records.clone())
    }

    fn save_tracker(&self, tracker: &Tracker) -> Result<()> {
        self.update(|state| {
            match state.trackers.iter_mut().find(|t| t.id == tracker.id) {
                Some(existing) => *existing = tracker.clone(),
                None => state.trackers.push(tracker.clone()),
            }
        })
    }

    fn save_category(&self, category: &Category) -> Result<()> {
        self.update(|state| {
            match state.categories.iter_mut().find(|c| c.name == category.name) {
                Some(existing) => *existing = category.clone(),
                None => state.categories.push(category.clone()),
            }
        })
    }

    fn save_record(&self, record: &CompletionRecord) -> Result<()> {
        self.update(|state| {
            if !state.records.contains(record) {
                state.records.push(*record);
            }
        })
    }

    fn delete_tracker(&self, id: Uuid) -> Result<()> {
        self.update(|state| state.trackers.retain(|t| t.id != id))
    }

    fn delete_category(&self, name: &str) -> Result<()> {
        self.update(|state| state.categories.retain(|c| c.name != name))
    }

    fn delete_record(&self, tracker_id: Uuid, date: NaiveDate) -> Result<()> {
        self.update(|state| {
            state
                .records
                .retain(|r| !(r.tracker_id == tracker_id && r.date == date))
        })
    }
}
