use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracker_core::error::TrackerError;
use tracker_core::query::FilterMode;
use tracker_core::store::MemoryStore;
use tracker_core::tracker::{Tracker, TrackerColor, Weekday};
use tracker_core::TrackerRepository;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn repo() -> TrackerRepository {
    TrackerRepository::builder()
        .with_store(Arc::new(MemoryStore::new()))
        .build()
        .unwrap()
}

fn new_tracker(
    title: &str,
    category: &str,
    schedule: BTreeSet<Weekday>,
    created_at: NaiveDate,
) -> Tracker {
    Tracker::new(
        title,
        TrackerColor::new(0x33, 0xCF, 0x69),
        "🏃",
        schedule,
        category,
        created_at,
    )
    .unwrap()
}

#[test]
fn scheduled_tracker_appears_only_on_its_weekdays() {
    // "Run" recurs Mon/Wed/Fri starting Monday 2024-01-01.
    let repo = repo();
    repo.add_category("Health").unwrap();
    repo.add_tracker(new_tracker(
        "Run",
        "Health",
        BTreeSet::from([Weekday::Mon, Weekday::Wed, Weekday::Fri]),
        date(2024, 1, 1),
    ))
    .unwrap();

    let monday = date(2024, 1, 1);
    let groups = repo.trackers_due(monday, monday, FilterMode::All);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].category.name, "Health");
    assert_eq!(groups[0].trackers[0].title, "Run");

    let tuesday = date(2024, 1, 2);
    assert!(repo.trackers_due(tuesday, tuesday, FilterMode::All).is_empty());
}

#[test]
fn one_off_event_is_due_once_and_never_again() {
    let repo = repo();
    repo.add_category("Appointments").unwrap();
    repo.add_tracker(new_tracker(
        "Dentist",
        "Appointments",
        BTreeSet::new(),
        date(2024, 3, 5),
    ))
    .unwrap();

    let created = date(2024, 3, 5);
    assert_eq!(repo.trackers_due(created, created, FilterMode::All).len(), 1);

    for later in [date(2024, 3, 6), date(2024, 3, 12), date(2025, 3, 5)] {
        assert!(repo.trackers_due(later, later, FilterMode::All).is_empty());
    }
}

#[test]
fn completion_toggle_round_trips() {
    let repo = repo();
    repo.add_category("Health").unwrap();
    let run = new_tracker(
        "Run",
        "Health",
        BTreeSet::from([Weekday::Mon]),
        date(2024, 1, 1),
    );
    let id = run.id;
    repo.add_tracker(run).unwrap();

    let monday = date(2024, 1, 1);
    assert!(repo.toggle_completion(id, monday, monday).unwrap());
    assert!(repo.is_completed(id, monday));
    assert_eq!(repo.completed_count(id), 1);

    assert!(!repo.toggle_completion(id, monday, monday).unwrap());
    assert!(!repo.is_completed(id, monday));
    assert_eq!(repo.completed_count(id), 0);
}

#[test]
fn future_completions_are_rejected() {
    let repo = repo();
    repo.add_category("Health").unwrap();
    let run = new_tracker(
        "Run",
        "Health",
        BTreeSet::from([Weekday::Mon]),
        date(2024, 1, 1),
    );
    let id = run.id;
    repo.add_tracker(run).unwrap();

    let err = repo
        .toggle_completion(id, date(2024, 12, 31), date(2024, 1, 1))
        .unwrap_err();
    assert!(matches!(err, TrackerError::FutureDate { .. }));
    assert_eq!(repo.completed_count(id), 0);
}

#[test]
fn duplicate_category_creation_leaves_a_single_category() {
    let repo = repo();
    repo.add_category("Work").unwrap();
    assert!(matches!(
        repo.add_category("Work"),
        Err(TrackerError::DuplicateName(_))
    ));
    let groups = repo.all_categories();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].category.name, "Work");
}

#[test]
fn deleting_a_tracker_removes_its_whole_history() {
    let repo = repo();
    repo.add_category("Health").unwrap();
    let run = new_tracker(
        "Run",
        "Health",
        BTreeSet::from([Weekday::Mon, Weekday::Thu]),
        date(2024, 1, 1),
    );
    let id = run.id;
    repo.add_tracker(run).unwrap();

    let today = date(2024, 2, 1);
    for day in [date(2024, 1, 1), date(2024, 1, 4), date(2024, 1, 8)] {
        repo.toggle_completion(id, day, today).unwrap();
    }
    assert_eq!(repo.completed_count(id), 3);

    repo.delete_tracker(id).unwrap();
    assert_eq!(repo.completed_count(id), 0);
    for day in [date(2024, 1, 1), date(2024, 1, 4), date(2024, 1, 8)] {
        assert!(!repo.is_completed(id, day));
    }
}

#[test]
fn filter_modes_partition_the_all_result() {
    let repo = repo();
    repo.add_category("Health").unwrap();
    repo.add_category("Chores").unwrap();

    let monday = BTreeSet::from([Weekday::Mon]);
    let run = new_tracker("Run", "Health", monday.clone(), date(2024, 1, 1));
    let stretch = new_tracker("Stretch", "Health", monday.clone(), date(2024, 1, 1));
    let dishes = new_tracker("Dishes", "Chores", monday, date(2024, 1, 1));
    let run_id = run.id;
    for t in [run, stretch, dishes] {
        repo.add_tracker(t).unwrap();
    }

    let day = date(2024, 1, 1);
    repo.toggle_completion(run_id, day, day).unwrap();

    let count = |mode| {
        repo.trackers_due(day, day, mode)
            .iter()
            .map(|g| g.trackers.len())
            .sum::<usize>()
    };

    let all = count(FilterMode::All);
    let completed = count(FilterMode::Completed);
    let not_completed = count(FilterMode::NotCompleted);
    assert_eq!(all, 3);
    assert_eq!(completed, 1);
    assert_eq!(not_completed, 2);
    assert_eq!(completed + not_completed, all);

    // With selected date == today, `today` mode matches `all`.
    assert_eq!(count(FilterMode::Today), all);

    // Every filtered mode is a subset of `all`.
    let all_ids: Vec<_> = repo
        .trackers_due(day, day, FilterMode::All)
        .into_iter()
        .flat_map(|g| g.trackers)
        .map(|t| t.id)
        .collect();
    for mode in [FilterMode::Today, FilterMode::Completed, FilterMode::NotCompleted] {
        for group in repo.trackers_due(day, day, mode) {
            for t in group.trackers {
                assert!(all_ids.contains(&t.id));
            }
        }
    }
}
