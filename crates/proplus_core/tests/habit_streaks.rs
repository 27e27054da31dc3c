use chrono::{Duration, NaiveDate};
use proplus_core::engine::{is_done_today, recalculate_streak, weekly_completions};
use proplus_core::reconcile::{parse_import, ImportMode};
use proplus_core::service::HabitService;
use proplus_core::{default_record, HabitEntry};
use serde_json::json;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

fn days_ago(days: i64) -> NaiveDate {
    today() - Duration::days(days)
}

#[test]
fn toggling_today_extends_a_three_day_run() {
    let mut record = default_record();
    let habit = record.habit_mut("habit-4").unwrap();
    habit.history = (1..=3).map(|n| HabitEntry::new(days_ago(n), true)).collect();

    let toggle = HabitService::new(&mut record)
        .toggle_today("habit-4", today())
        .unwrap();

    assert!(toggle.done_today);
    assert_eq!(toggle.streak, 4);
    assert_eq!(record.habit("habit-4").unwrap().streak, 4);
}

#[test]
fn toggling_twice_restores_the_previous_streak() {
    let mut record = default_record();
    record.habit_mut("habit-1").unwrap().history =
        vec![HabitEntry::new(days_ago(1), true), HabitEntry::new(days_ago(2), true)];

    let mut service = HabitService::new(&mut record);
    assert_eq!(service.toggle_today("habit-1", today()).unwrap().streak, 3);
    let undone = service.toggle_today("habit-1", today()).unwrap();

    assert!(!undone.done_today);
    assert_eq!(undone.streak, 2);
    let habit = record.habit("habit-1").unwrap();
    assert_eq!(habit.history.len(), 3);
    assert!(!habit.entry_on(today()).unwrap().done);
}

#[test]
fn stale_history_resets_streak() {
    let mut record = default_record();
    let habit = record.habit_mut("habit-2").unwrap();
    habit.history = vec![HabitEntry::new(days_ago(2), true), HabitEntry::new(days_ago(3), true)];
    assert_eq!(recalculate_streak(habit, today()), 0);
}

#[test]
fn weekly_completions_cover_seven_days_oldest_first() {
    let mut record = default_record();
    record.habit_mut("habit-1").unwrap().history = vec![HabitEntry::new(today(), true)];
    record.habit_mut("habit-3").unwrap().history =
        vec![HabitEntry::new(today(), true), HabitEntry::new(days_ago(6), true)];

    let week = weekly_completions(&record.habits, today());

    assert_eq!(week.len(), 7);
    assert_eq!(week[0], (days_ago(6), 1));
    assert_eq!(week[6], (today(), 2));
    assert!(week[1..6].iter().all(|(_, count)| *count == 0));
}

#[test]
fn imported_same_day_entries_toggle_as_one() {
    let defaults = default_record();
    let mut record = default_record();
    let text = json!({
        "settings": {},
        "projects": [],
        "habits": [{
            "id": "habit-dup", "text": "Stretch", "priority": 2, "streak": 0,
            "history": [
                { "date": "2025-03-10", "done": true },
                { "date": "2025-03-10T08:00:00Z", "done": true }
            ]
        }]
    })
    .to_string();
    parse_import(&text)
        .unwrap()
        .apply(&mut record, ImportMode::Merge, &defaults, today())
        .unwrap();
    assert_eq!(record.habit("habit-dup").unwrap().history.len(), 1);
    assert_eq!(record.habit("habit-dup").unwrap().streak, 1);

    let toggle = HabitService::new(&mut record)
        .toggle_today("habit-dup", today())
        .unwrap();

    let habit = record.habit("habit-dup").unwrap();
    assert!(!toggle.done_today);
    assert!(!is_done_today(habit, today()));
    assert_eq!(toggle.streak, 0);
    assert_eq!(
        habit.history.iter().filter(|entry| entry.date == today()).count(),
        1
    );
}
