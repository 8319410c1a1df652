use chrono::NaiveDate;

use crate::category::Category;
use crate::ledger::CompletionLedger;
use crate::schedule;
use crate::tracker::Tracker;

/// Facet narrowing the due-tracker set for a selected date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    All,
    Today,
    Completed,
    NotCompleted,
}

/// One category together with the trackers grouped under it, in insertion
/// order. This is both the canonical "everything" read and the query result.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub category: Category,
    pub trackers: Vec<Tracker>,
}

/// Narrows `groups` to the trackers due on `selected_date` under `mode`.
///
/// Categories keep their declaration order and trackers their insertion
/// order; categories left empty are dropped. An empty overall result is the
/// caller's signal to show its empty-state placeholder.
pub fn query(
    groups: &[CategoryGroup],
    ledger: &CompletionLedger,
    selected_date: NaiveDate,
    today: NaiveDate,
    mode: FilterMode,
) -> Vec<CategoryGroup> {
    groups
        .iter()
        .filter_map(|group| {
            let trackers: Vec<Tracker> = group
                .trackers
                .iter()
                .filter(|tracker| keep(tracker, ledger, selected_date, today, mode))
                .cloned()
                .collect();
            if trackers.is_empty() {
                None
            } else {
                Some(CategoryGroup {
                    category: group.category.clone(),
                    trackers,
                })
            }
        })
        .collect()
}

fn keep(
    tracker: &Tracker,
    ledger: &CompletionLedger,
    selected_date: NaiveDate,
    today: NaiveDate,
    mode: FilterMode,
) -> bool {
    if !schedule::is_due(tracker, selected_date) {
        return false;
    }
    match mode {
        FilterMode::All => true,
        FilterMode::Today => selected_date == today,
        FilterMode::Completed => ledger.is_completed(tracker.id, selected_date),
        FilterMode::NotCompleted => !ledger.is_completed(tracker.id, selected_date),
    }
}
