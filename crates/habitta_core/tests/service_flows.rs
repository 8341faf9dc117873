use habitta_core::db::open_db_in_memory;
use habitta_core::engine::catalog::builtin_catalog;
use habitta_core::model::habit::Habit;
use habitta_core::model::task::Task;
use habitta_core::repo::challenge_repo::SqliteChallengeRepository;
use habitta_core::repo::habit_repo::SqliteHabitRepository;
use habitta_core::repo::task_repo::{SqliteTaskRepository, TaskFilter};
use habitta_core::repo::user_repo::SqliteUserRepository;
use habitta_core::service::challenge_service::ChallengeService;
use habitta_core::service::completion_service::CompletionService;
use habitta_core::service::habit_service::HabitService;
use habitta_core::service::task_service::TaskService;
use habitta_core::service::user_service::UserService;
use habitta_core::{CalendarDay, ServiceError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

fn day(value: &str) -> CalendarDay {
    value.parse().unwrap()
}

#[test]
fn dashboard_expires_stale_streak_once() {
    let mut conn = open_db_in_memory().unwrap();
    let user = UserService::new(SqliteUserRepository::try_new(&conn).unwrap())
        .create_user("  Ada  ")
        .unwrap();
    assert_eq!(user.name, "Ada");

    let mut service = CompletionService::new(&mut conn);
    service.grant_xp(user.id, day("2024-05-01"), 10).unwrap();
    service.grant_xp(user.id, day("2024-05-02"), 10).unwrap();

    let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());
    let same_day = users.dashboard(user.id, day("2024-05-02")).unwrap();
    assert_eq!(same_day.user.streak, 2);
    assert_eq!(same_day.progress.earned, 20);
    assert_eq!(same_day.progress.percent, 20);

    let next_day = users.dashboard(user.id, day("2024-05-03")).unwrap();
    assert_eq!(next_day.user.streak, 2);

    let after_gap = users.dashboard(user.id, day("2024-05-05")).unwrap();
    assert_eq!(after_gap.user.streak, 0);
    assert_eq!(after_gap.user.longest_streak, 2);
    assert_eq!(after_gap.completed_habits_today, 0);
    assert_eq!(after_gap.days_to_next_milestone, Some(7));
    assert_eq!(users.get_user(user.id).unwrap().streak, 0);

    let repeated = users.dashboard(user.id, day("2024-05-06")).unwrap();
    assert_eq!(repeated.user, after_gap.user);
}

#[test]
fn rename_validates_name() {
    let conn = open_db_in_memory().unwrap();
    let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());
    let user = users.create_user("Ada").unwrap();

    assert_eq!(users.rename_user(user.id, "Grace").unwrap().name, "Grace");
    assert!(matches!(
        users.rename_user(user.id, "   "),
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        users.rename_user(user.id, &"x".repeat(51)),
        Err(ServiceError::Validation(_))
    ));
}

#[test]
fn daily_challenges_are_generated_once_per_day() {
    let conn = open_db_in_memory().unwrap();
    let user = UserService::new(SqliteUserRepository::try_new(&conn).unwrap())
        .create_user("Ada")
        .unwrap();
    let service = ChallengeService::new(
        SqliteChallengeRepository::try_new(&conn).unwrap(),
        builtin_catalog(),
        3,
    );
    let mut rng = StdRng::seed_from_u64(42);
    let today = day("2024-05-06");

    let first = service.daily_challenges(user.id, today, &mut rng).unwrap();
    assert_eq!(first.len(), 3);
    let titles: HashSet<_> = first.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles.len(), 3);
    assert!(first.iter().all(|c| c.expires_on == today.succ() && c.is_daily));

    let again = service.daily_challenges(user.id, today, &mut rng).unwrap();
    assert_eq!(again, first);

    let tomorrow = service
        .daily_challenges(user.id, today.succ(), &mut rng)
        .unwrap();
    assert_eq!(tomorrow.len(), 3);
    assert!(tomorrow.iter().all(|c| c.generated_day == today.succ()));
    assert_eq!(service.list_challenges(user.id).unwrap().len(), 6);
}

#[test]
fn challenge_stats_count_recent_and_completed() {
    let mut conn = open_db_in_memory().unwrap();
    let user = UserService::new(SqliteUserRepository::try_new(&conn).unwrap())
        .create_user("Ada")
        .unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let old_day = day("2024-04-01");
    let today = day("2024-05-06");

    let (old_batch, today_batch) = {
        let service = ChallengeService::new(
            SqliteChallengeRepository::try_new(&conn).unwrap(),
            builtin_catalog(),
            2,
        );
        (
            service.daily_challenges(user.id, old_day, &mut rng).unwrap(),
            service.daily_challenges(user.id, today, &mut rng).unwrap(),
        )
    };

    let mut completions = CompletionService::new(&mut conn);
    completions
        .complete_challenge(old_batch[0].id, old_day)
        .unwrap();
    completions
        .complete_challenge(today_batch[0].id, today)
        .unwrap();

    let service = ChallengeService::new(
        SqliteChallengeRepository::try_new(&conn).unwrap(),
        builtin_catalog(),
        2,
    );
    let stats = service.stats(user.id, today).unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.completed, 2);
    assert_eq!(stats.recent_generated, 2);
    assert_eq!(stats.recent_completed, 1);
    assert_eq!(
        stats.total_xp_earned,
        u64::from(old_batch[0].xp_reward + today_batch[0].xp_reward)
    );
    assert!((stats.completion_rate - 0.5).abs() < f64::EPSILON);
}

#[test]
fn habit_listing_and_stats_reflect_completions() {
    let mut conn = open_db_in_memory().unwrap();
    let user = UserService::new(SqliteUserRepository::try_new(&conn).unwrap())
        .create_user("Ada")
        .unwrap();
    let (read, walk) = {
        let habits = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
        (
            habits.create_habit(&Habit::new(user.id, "Read")).unwrap(),
            habits.create_habit(&Habit::new(user.id, "Walk")).unwrap(),
        )
    };

    let mut completions = CompletionService::new(&mut conn);
    for date in ["2024-05-04", "2024-05-05", "2024-05-06"] {
        completions.complete_habit(read.id, day(date), None).unwrap();
    }
    completions
        .complete_habit(walk.id, day("2024-05-06"), None)
        .unwrap();

    let habits = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
    let today = day("2024-05-06");
    let views = habits.list_habits(user.id, today).unwrap();
    assert_eq!(views.len(), 2);
    assert!(views.iter().all(|view| view.is_completed_today && view.is_scheduled_today));

    let stats = habits.stats(user.id, today).unwrap();
    assert_eq!(stats.total_habits, 2);
    assert_eq!(stats.total_completions, 4);
    assert_eq!(stats.total_streak_days, 4);
    assert_eq!(stats.longest_streak, 3);
    assert_eq!(stats.recent_days.len(), 7);
    assert_eq!(stats.recent_days.last().map(|c| (c.day, c.completed)), Some((today, 2)));
    assert_eq!(stats.recent_days[0].day, day("2024-04-30"));

    habits.delete_habit(walk.id).unwrap();
    assert_eq!(habits.stats(user.id, today).unwrap().total_habits, 1);
    assert!(matches!(
        habits.get_habit(walk.id),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn habit_reads_report_streak_as_of_requested_day() {
    let mut conn = open_db_in_memory().unwrap();
    let user = UserService::new(SqliteUserRepository::try_new(&conn).unwrap())
        .create_user("Ada")
        .unwrap();
    let habit = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap())
        .create_habit(&Habit::new(user.id, "Read"))
        .unwrap();
    let mut completions = CompletionService::new(&mut conn);
    for date in ["2024-01-01", "2024-01-02", "2024-01-03"] {
        completions.complete_habit(habit.id, day(date), None).unwrap();
    }

    let habits = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
    let next_day = habits.list_habits(user.id, day("2024-01-04")).unwrap();
    assert_eq!(next_day[0].habit.current_streak, 3);
    assert!(!next_day[0].is_completed_today);

    let week_later = day("2024-01-10");
    let views = habits.list_habits(user.id, week_later).unwrap();
    assert_eq!(views[0].habit.current_streak, 0);
    assert_eq!(views[0].habit.longest_streak, 3);

    let stats = habits.stats(user.id, week_later).unwrap();
    assert_eq!(stats.total_streak_days, 0);
    assert_eq!(stats.longest_streak, 3);
    assert_eq!(stats.total_completions, 3);
}

#[test]
fn habit_update_keeps_progress_fields() {
    let mut conn = open_db_in_memory().unwrap();
    let user = UserService::new(SqliteUserRepository::try_new(&conn).unwrap())
        .create_user("Ada")
        .unwrap();
    let habit = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap())
        .create_habit(&Habit::new(user.id, "Read"))
        .unwrap();
    CompletionService::new(&mut conn)
        .complete_habit(habit.id, day("2024-05-06"), None)
        .unwrap();

    let habits = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
    let mut edited = habit.clone();
    edited.name = "Read fiction".to_string();
    edited.current_streak = 0;
    edited.total_completions = 0;
    let updated = habits.update_habit(&edited).unwrap();

    assert_eq!(updated.name, "Read fiction");
    assert_eq!(updated.current_streak, 1);
    assert_eq!(updated.total_completions, 1);
    assert_eq!(habits.get_habit(habit.id).unwrap(), updated);
}

#[test]
fn task_update_toggles_completion_day_and_stats_track_due_dates() {
    let conn = open_db_in_memory().unwrap();
    let user = UserService::new(SqliteUserRepository::try_new(&conn).unwrap())
        .create_user("Ada")
        .unwrap();
    let tasks = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap());
    let today = day("2024-05-06");

    let mut due_today = Task::new(user.id, "Call plumber");
    due_today.due_day = Some(today);
    let mut overdue = Task::new(user.id, "Renew passport");
    overdue.due_day = Some(day("2024-05-01"));
    let loose = Task::new(user.id, "Sort photos");
    for task in [&due_today, &overdue, &loose] {
        tasks.create_task(task).unwrap();
    }

    let mut toggled = loose.clone();
    toggled.is_completed = true;
    let done = tasks.update_task(&toggled, today).unwrap();
    assert_eq!(done.completed_on, Some(today));

    let stats = tasks.stats(user.id, today).unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.due_today, 1);
    assert_eq!(stats.overdue, 1);

    let mut reopened = done.clone();
    reopened.is_completed = false;
    let reopened = tasks.update_task(&reopened, today.succ()).unwrap();
    assert_eq!(reopened.completed_on, None);
    assert_eq!(tasks.list_tasks(user.id, TaskFilter::Pending).unwrap().len(), 3);
}
