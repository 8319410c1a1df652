use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use parking_lot::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::category::{self, Category};
use crate::error::{Result, TrackerError};
use crate::ledger::CompletionLedger;
use crate::query::{self, CategoryGroup, FilterMode};
use crate::store::TrackerStore;
use crate::tracker::{self, Tracker};

struct RepositoryState {
    categories: Vec<Category>,
    trackers: Vec<Tracker>,
    ledger: CompletionLedger,
}

/// Canonical owner of the tracker and category collections, with the
/// completion ledger alongside them. Every mutation persists through the
/// store before the in-memory state changes; reads serve the current
/// snapshot without blocking on an in-flight reload.
pub struct TrackerRepository {
    store: Arc<dyn TrackerStore>,
    state: RwLock<RepositoryState>,
    reload_epoch: AtomicU64,
}

pub struct TrackerRepositoryBuilder {
    store: Option<Arc<dyn TrackerStore>>,
}

impl TrackerRepositoryBuilder {
    pub fn new() -> Self {
        Self { store: None }
    }

    pub fn with_store(mut self, store: Arc<dyn TrackerStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Performs the initial load from the store.
    pub fn build(self) -> Result<TrackerRepository> {
        let store = self.store.ok_or_else(|| {
            TrackerError::Validation("a persistence store is required".into())
        })?;
        let state = TrackerRepository::load_state(&store)?;
        Ok(TrackerRepository {
            store,
            state: RwLock::new(state),
            reload_epoch: AtomicU64::new(0),
        })
    }
}

impl TrackerRepository {
    pub fn builder() -> TrackerRepositoryBuilder {
        TrackerRepositoryBuilder::new()
    }

    fn load_state(store: &Arc<dyn TrackerStore>) -> Result<RepositoryState> {
        let categories = store.load_categories()?;
        let trackers = store.load_trackers()?;
        let ledger = CompletionLedger::load(Arc::clone(store))?;
        debug!(
            categories = categories.len(),
            trackers = trackers.len(),
            "repository state loaded"
        );
        Ok(RepositoryState {
            categories,
            trackers,
            ledger,
        })
    }

    /// Discards the in-memory state and reloads it from the store.
    pub fn reload(&self) -> Result<()> {
        let epoch = self.claim_reload();
        let state = Self::load_state(&self.store)?;
        self.apply_if_current(epoch, state);
        Ok(())
    }

    /// Reloads on a worker thread. Reads keep serving the previous snapshot
    /// in the meantime; if another reload starts before this one lands, the
    /// stale result is discarded (last reload wins).
    pub fn reload_in_background(self: &Arc<Self>) -> thread::JoinHandle<()> {
        let repo = Arc::clone(self);
        let epoch = repo.claim_reload();
        thread::spawn(move || match Self::load_state(&repo.store) {
            Ok(state) => {
                if repo.apply_if_current(epoch, state) {
                    debug!(epoch, "background reload applied");
                } else {
                    debug!(epoch, "stale background reload discarded");
                }
            }
            Err(err) => warn!(%err, "background reload failed"),
        })
    }

    fn claim_reload(&self) -> u64 {
        self.reload_epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn apply_if_current(&self, epoch: u64, state: RepositoryState) -> bool {
        let mut guard = self.state.write();
        if self.reload_epoch.load(Ordering::SeqCst) != epoch {
            return false;
        }
        *guard = state;
        true
    }

    // Categories

    pub fn add_category(&self, name: &str) -> Result<Category> {
        let category = Category::new(name)?;
        let mut state = self.state.write();
        if state.categories.iter().any(|c| c.name == name) {
            return Err(TrackerError::DuplicateName(name.to_string()));
        }
        self.store.save_category(&category)?;
        debug!(name, "category added");
        state.categories.push(category.clone());
        Ok(category)
    }

    /// Renames a category and propagates the new name to every tracker that
    /// references it, so the name stays a valid key throughout.
    pub fn rename_category(&self, name: &str, new_name: &str) -> Result<()> {
        category::validate_name(new_name)?;
        let mut state = self.state.write();
        let index = state
            .categories
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| TrackerError::CategoryNotFound(name.to_string()))?;
        if new_name == name {
            return Ok(());
        }
        if state.categories.iter().any(|c| c.name == new_name) {
            return Err(TrackerError::DuplicateName(new_name.to_string()));
        }

        let mut renamed = state.categories[index].clone();
        renamed.name = new_name.to_string();
        let moved: Vec<Tracker> = state
            .trackers
            .iter()
            .filter(|t| t.category_name == name)
            .map(|t| {
                let mut t = t.clone();
                t.category_name = new_name.to_string();
                t
            })
            .collect();

        self.store.save_category(&renamed)?;
        self.store.delete_category(name)?;
        for t in &moved {
            self.store.save_tracker(t)?;
        }

        state.categories[index] = renamed;
        for updated in moved {
            if let Some(slot) = state.trackers.iter_mut().find(|t| t.id == updated.id) {
                *slot = updated;
            }
        }
        debug!(from = name, to = new_name, "category renamed");
        Ok(())
    }

    /// Marks `name` as the selected category and clears the flag on every
    /// other one. Selection is transient UI state carried as pass-through.
    pub fn select_category(&self, name: &str) -> Result<()> {
        let mut state = self.state.write();
        if !state.categories.iter().any(|c| c.name == name) {
            return Err(TrackerError::CategoryNotFound(name.to_string()));
        }
        let updated: Vec<Category> = state
            .categories
            .iter()
            .map(|c| {
                let mut c = c.clone();
                c.is_selected = c.name == name;
                c
            })
            .collect();
        for c in &updated {
            self.store.save_category(c)?;
        }
        state.categories = updated;
        Ok(())
    }

    /// Deletion is rejected while any tracker still references the category.
    pub fn delete_category(&self, name: &str) -> Result<()> {
        let mut state = self.state.write();
        if !state.categories.iter().any(|c| c.name == name) {
            return Err(TrackerError::CategoryNotFound(name.to_string()));
        }
        if state.trackers.iter().any(|t| t.category_name == name) {
            return Err(TrackerError::CategoryInUse(name.to_string()));
        }
        self.store.delete_category(name)?;
        state.categories.retain(|c| c.name != name);
        debug!(name, "category deleted");
        Ok(())
    }

    // Trackers

    pub fn add_tracker(&self, tracker: Tracker) -> Result<()> {
        tracker::validate_title(&tracker.title)?;
        let mut state = self.state.write();
        if !state
            .categories
            .iter()
            .any(|c| c.name == tracker.category_name)
        {
            return Err(TrackerError::CategoryNotFound(tracker.category_name.clone()));
        }
        if state.trackers.iter().any(|t| t.id == tracker.id) {
            return Err(TrackerError::Validation(format!(
                "tracker {} already exists",
                tracker.id
            )));
        }
        self.store.save_tracker(&tracker)?;
        debug!(id = %tracker.id, title = %tracker.title, "tracker added");
        state.trackers.push(tracker);
        Ok(())
    }

    /// Replaces a tracker's mutable fields. `created_at` is immutable once
    /// set and is carried over from the stored tracker.
    pub fn update_tracker(&self, tracker: Tracker) -> Result<()> {
        tracker::validate_title(&tracker.title)?;
        let mut state = self.state.write();
        let index = state
            .trackers
            .iter()
            .position(|t| t.id == tracker.id)
            .ok_or(TrackerError::TrackerNotFound(tracker.id))?;
        if !state
            .categories
            .iter()
            .any(|c| c.name == tracker.category_name)
        {
            return Err(TrackerError::CategoryNotFound(tracker.category_name.clone()));
        }
        let mut updated = tracker;
        updated.created_at = state.trackers[index].created_at;
        self.store.save_tracker(&updated)?;
        debug!(id = %updated.id, "tracker updated");
        state.trackers[index] = updated;
        Ok(())
    }

    /// Flips `is_pinned` and returns the new value. Pinning never affects
    /// due-date or filter logic.
    pub fn toggle_pin(&self, tracker_id: Uuid) -> Result<bool> {
        let mut state = self.state.write();
        let index = state
            .trackers
            .iter()
            .position(|t| t.id == tracker_id)
            .ok_or(TrackerError::TrackerNotFound(tracker_id))?;
        let mut updated = state.trackers[index].clone();
        updated.is_pinned = !updated.is_pinned;
        self.store.save_tracker(&updated)?;
        let pinned = updated.is_pinned;
        state.trackers[index] = updated;
        Ok(pinned)
    }

    /// Removes the tracker and cascades over its completion records.
    pub fn delete_tracker(&self, tracker_id: Uuid) -> Result<()> {
        let mut state = self.state.write();
        let index = state
            .trackers
            .iter()
            .position(|t| t.id == tracker_id)
            .ok_or(TrackerError::TrackerNotFound(tracker_id))?;
        state.ledger.remove_all_for(tracker_id)?;
        self.store.delete_tracker(tracker_id)?;
        state.trackers.remove(index);
        debug!(id = %tracker_id, "tracker deleted");
        Ok(())
    }

    // Completions

    pub fn toggle_completion(
        &self,
        tracker_id: Uuid,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<bool> {
        let mut state = self.state.write();
        if !state.trackers.iter().any(|t| t.id == tracker_id) {
            return Err(TrackerError::TrackerNotFound(tracker_id));
        }
        state.ledger.toggle(tracker_id, date, today)
    }

    pub fn is_completed(&self, tracker_id: Uuid, date: NaiveDate) -> bool {
        self.state.read().ledger.is_completed(tracker_id, date)
    }

    pub fn completed_count(&self, tracker_id: Uuid) -> usize {
        self.state.read().ledger.completed_count(tracker_id)
    }

    // Reads

    /// The canonical "everything" read: every category in declaration order
    /// with its trackers in insertion order, empty categories included.
    pub fn all_categories(&self) -> Vec<CategoryGroup> {
        let state = self.state.read();
        Self::group(&state)
    }

    /// The filtered view the presentation layer renders: trackers due on
    /// `selected_date`, narrowed by `mode`, grouped by category.
    pub fn trackers_due(
        &self,
        selected_date: NaiveDate,
        today: NaiveDate,
        mode: FilterMode,
    ) -> Vec<CategoryGroup> {
        let state = self.state.read();
        let groups = Self::group(&state);
        query::query(&groups, &state.ledger, selected_date, today, mode)
    }

    fn group(state: &RepositoryState) -> Vec<CategoryGroup> {
        state
            .categories
            .iter()
            .map(|category| CategoryGroup {
                category: category.clone(),
                trackers: state
                    .trackers
                    .iter()
                    .filter(|t| t.category_name == category.name)
                    .cloned()
                    .collect(),
            })
            .collect()
    }
}
