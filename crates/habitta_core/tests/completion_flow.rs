use habitta_core::db::{open_db, open_db_in_memory};
use habitta_core::engine::catalog::builtin_catalog;
use habitta_core::model::attributes::Difficulty;
use habitta_core::model::challenge::Challenge;
use habitta_core::model::habit::{Habit, ScheduledDays};
use habitta_core::model::item::{EntityKind, TrackableItem};
use habitta_core::model::task::Task;
use habitta_core::model::user::UserAggregate;
use habitta_core::repo::challenge_repo::{ChallengeRepository, SqliteChallengeRepository};
use habitta_core::repo::habit_repo::{HabitRepository, SqliteHabitRepository};
use habitta_core::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use habitta_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use habitta_core::service::completion_service::CompletionService;
use habitta_core::{CalendarDay, ServiceError};
use rusqlite::Connection;

fn day(value: &str) -> CalendarDay {
    value.parse().unwrap()
}

fn seed_user(conn: &Connection) -> UserAggregate {
    let user = UserAggregate::new("Ada");
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .create_user(&user)
        .unwrap();
    user
}

fn seed_habit(conn: &Connection, user: &UserAggregate, configure: impl FnOnce(&mut Habit)) -> Habit {
    let mut habit = Habit::new(user.id, "Stretch");
    configure(&mut habit);
    SqliteHabitRepository::try_new(conn)
        .unwrap()
        .create_habit(&habit)
        .unwrap();
    habit
}

fn load_user(conn: &Connection, user: &UserAggregate) -> UserAggregate {
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .get_user(user.id)
        .unwrap()
        .unwrap()
}

fn load_habit(conn: &Connection, habit: &Habit) -> Habit {
    SqliteHabitRepository::try_new(conn)
        .unwrap()
        .get_habit(habit.id, true)
        .unwrap()
        .unwrap()
}

#[test]
fn consecutive_habit_completions_grow_streaks_and_xp() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn);
    let habit = seed_habit(&conn, &user, |_| {});

    let mut service = CompletionService::new(&mut conn);
    let first = service
        .complete_habit(habit.id, day("2024-05-06"), Some("felt good"))
        .unwrap();
    assert_eq!(first.completion.xp_earned, 22);
    assert_eq!(first.completion.current_streak, 1);
    assert_eq!(first.user.streak, 1);
    assert_eq!(first.user.completed_habits_today, 1);

    let second = service
        .complete_habit(habit.id, day("2024-05-07"), None)
        .unwrap();
    assert_eq!(second.completion.xp_earned, 24);
    assert_eq!(second.completion.current_streak, 2);
    assert_eq!(second.user.xp, 46);
    assert_eq!(second.user.streak, 2);
    assert_eq!(second.user.level, 1);
    assert!(!second.leveled_up);

    let stored = load_habit(&conn, &habit);
    assert_eq!(stored.current_streak, 2);
    assert_eq!(stored.longest_streak, 2);
    assert_eq!(stored.total_completions, 2);
    assert_eq!(stored.last_completed, Some(day("2024-05-07")));
    assert_eq!(stored.completions[0].note.as_deref(), Some("felt good"));
    assert_eq!(load_user(&conn, &user), second.user);
}

#[test]
fn second_completion_on_same_day_is_rejected_without_writes() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn);
    let habit = seed_habit(&conn, &user, |_| {});
    let today = day("2024-05-06");

    CompletionService::new(&mut conn)
        .complete_habit(habit.id, today, None)
        .unwrap();
    let user_after_first = load_user(&conn, &user);
    let habit_after_first = load_habit(&conn, &habit);

    let err = CompletionService::new(&mut conn)
        .complete_habit(habit.id, today, None)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::AlreadyCompleted {
            kind: EntityKind::Habit,
            ..
        }
    ));
    assert_eq!(load_user(&conn, &user), user_after_first);
    assert_eq!(load_habit(&conn, &habit), habit_after_first);
}

#[test]
fn unscheduled_and_inactive_habits_are_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn);
    let weekdays_only = seed_habit(&conn, &user, |habit| {
        habit.scheduled_days = ScheduledDays::from_weekdays(&[1, 2, 3, 4, 5]).unwrap();
    });
    let retired = seed_habit(&conn, &user, |_| {});
    SqliteHabitRepository::try_new(&conn)
        .unwrap()
        .soft_delete_habit(retired.id)
        .unwrap();

    let sunday = day("2024-05-05");
    let mut service = CompletionService::new(&mut conn);
    assert!(matches!(
        service.complete_habit(weekdays_only.id, sunday, None),
        Err(ServiceError::NotScheduledToday { day, .. }) if day == sunday
    ));
    assert!(matches!(
        service.complete_habit(retired.id, sunday, None),
        Err(ServiceError::Inactive(id)) if id == retired.id
    ));

    assert_eq!(load_user(&conn, &user).xp, 0);
}

#[test]
fn gap_in_habit_history_restarts_habit_and_user_streaks() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn);
    let habit = seed_habit(&conn, &user, |habit| habit.difficulty = Difficulty::Extreme);

    let mut service = CompletionService::new(&mut conn);
    for date in ["2024-05-01", "2024-05-02", "2024-05-03"] {
        service.complete_habit(habit.id, day(date), None).unwrap();
    }
    let after_gap = service
        .complete_habit(habit.id, day("2024-05-06"), None)
        .unwrap();

    assert_eq!(after_gap.completion.current_streak, 1);
    assert_eq!(after_gap.completion.longest_streak, 3);
    assert_eq!(after_gap.completion.xp_earned, 52);
    assert_eq!(after_gap.user.streak, 1);
    assert_eq!(after_gap.user.longest_streak, 3);
}

#[test]
fn week_long_habit_streak_credits_milestone_points_once() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn);
    let habit = seed_habit(&conn, &user, |_| {});
    let start = day("2024-05-01");

    let mut service = CompletionService::new(&mut conn);
    let mut reports = Vec::new();
    for offset in 0..8 {
        let as_of = start.add_days(offset).unwrap();
        reports.push(service.complete_habit(habit.id, as_of, None).unwrap());
    }

    assert!(reports[..6].iter().all(|report| report.milestone.is_none()));
    assert_eq!(reports[5].user.reward_points, 0);

    let week = reports[6].milestone.expect("seventh day reaches the first milestone");
    assert_eq!((week.milestone, week.reward_points), (7, 10));
    assert_eq!(reports[6].user.reward_points, 10);

    assert!(reports[7].milestone.is_none());
    assert_eq!(reports[7].user.reward_points, 10);
    assert_eq!(load_user(&conn, &user).reward_points, 10);
}

#[test]
fn task_completion_awards_flat_reward_once() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn);
    let mut task = Task::new(user.id, "Ship release");
    task.xp_reward = 40;
    SqliteTaskRepository::try_new(&conn)
        .unwrap()
        .create_task(&task)
        .unwrap();

    let today = day("2024-05-06");
    let report = CompletionService::new(&mut conn)
        .complete_task(task.id, today)
        .unwrap();
    assert_eq!(report.completion.xp_earned, 40);
    assert_eq!(report.user.xp, 40);
    assert_eq!(report.user.completed_habits_today, 0);
    match &report.completion.item {
        TrackableItem::Task(done) => assert_eq!(done.completed_on, Some(today)),
        other => panic!("unexpected item: {other:?}"),
    }

    assert!(matches!(
        CompletionService::new(&mut conn).complete_task(task.id, today),
        Err(ServiceError::AlreadyCompleted {
            kind: EntityKind::Task,
            ..
        })
    ));
    assert_eq!(load_user(&conn, &user).xp, 40);
}

#[test]
fn challenges_complete_until_they_expire() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn);
    let generated = day("2024-05-06");
    let fresh = Challenge::from_template(user.id, &builtin_catalog()[0], generated);
    let stale = Challenge::from_template(user.id, &builtin_catalog()[1], generated);
    {
        let repo = SqliteChallengeRepository::try_new(&conn).unwrap();
        repo.create_challenge(&fresh).unwrap();
        repo.create_challenge(&stale).unwrap();
    }

    let report = CompletionService::new(&mut conn)
        .complete_challenge(fresh.id, generated)
        .unwrap();
    assert_eq!(report.completion.xp_earned, fresh.xp_reward);
    assert_eq!(report.user.completed_challenges_today, 1);

    let err = CompletionService::new(&mut conn)
        .complete_challenge(stale.id, generated.succ())
        .unwrap_err();
    match err {
        ServiceError::Expired { id, expires_on } => {
            assert_eq!(id, stale.id);
            assert_eq!(expires_on, generated.succ());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn grant_xp_levels_up_and_rejects_non_positive_amounts() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn);
    let today = day("2024-05-06");

    let mut service = CompletionService::new(&mut conn);
    let granted = service.grant_xp(user.id, today, 300).unwrap();
    assert_eq!(granted.xp, 300);
    assert_eq!(granted.level, 3);
    assert_eq!(granted.streak, 1);

    for amount in [0, -5] {
        assert!(matches!(
            service.grant_xp(user.id, today, amount),
            Err(ServiceError::InvalidAmount(value)) if value == amount
        ));
    }
    assert_eq!(load_user(&conn, &user).xp, 300);
}

#[test]
fn missing_items_surface_as_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let missing = uuid::Uuid::new_v4();

    assert!(matches!(
        CompletionService::new(&mut conn).complete_habit(missing, day("2024-05-06"), None),
        Err(ServiceError::NotFound {
            kind: EntityKind::Habit,
            id
        }) if id == missing
    ));
}

#[test]
fn completion_survives_reopening_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habitta.db");
    let today = day("2024-05-06");

    let (user, habit) = {
        let mut conn = open_db(&path).unwrap();
        let user = seed_user(&conn);
        let habit = seed_habit(&conn, &user, |_| {});
        CompletionService::new(&mut conn)
            .complete_habit(habit.id, today, None)
            .unwrap();
        (user, habit)
    };

    let mut conn = open_db(&path).unwrap();
    let stored = load_habit(&conn, &habit);
    assert!(stored.is_completed_on(today));
    assert_eq!(load_user(&conn, &user).xp, 22);
    assert!(matches!(
        CompletionService::new(&mut conn).complete_habit(habit.id, today, None),
        Err(ServiceError::AlreadyCompleted { .. })
    ));
}
