//! `habitta` command-line front end.
//!
//! # Responsibility
//! - Load configuration, start logging and open the record store.
//! - Map subcommands onto core services and print their results.

mod args;

use args::{
    ChallengeAction, Cli, Commands, HabitAction, HabitArgs, TaskAction, TaskArgs, UserAction,
    XpAction,
};
use clap::Parser;
use habitta_core::db::Connection;
use habitta_core::engine::catalog::builtin_catalog;
use habitta_core::model::habit::{Habit, ScheduledDays};
use habitta_core::model::task::Task;
use habitta_core::model::user::{UserAggregate, UserId};
use habitta_core::repo::challenge_repo::SqliteChallengeRepository;
use habitta_core::repo::habit_repo::SqliteHabitRepository;
use habitta_core::repo::task_repo::SqliteTaskRepository;
use habitta_core::repo::user_repo::SqliteUserRepository;
use habitta_core::service::challenge_service::ChallengeService;
use habitta_core::service::completion_service::{CompletionReport, CompletionService};
use habitta_core::service::habit_service::HabitService;
use habitta_core::service::task_service::TaskService;
use habitta_core::service::user_service::UserService;
use habitta_core::{open_db, CalendarDay, HabittaConfig};
use log::info;
use serde::Serialize;
use std::error::Error;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let mut config = match &cli.config {
        Some(path) => HabittaConfig::load(path)?,
        None => HabittaConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    habitta_core::init_logging_from_config(&config)?;

    let as_of = cli.on.unwrap_or_else(|| config.day_boundary.today());
    let mut conn = open_db(&config.db_path)?;
    info!("event=cli_command module=cli status=start");

    let ctx = Context {
        as_of,
        json: cli.json,
        user: cli.user,
        config: &config,
    };
    match cli.command {
        Commands::User { action } => user_command(&ctx, &conn, action),
        Commands::Habit { action } => habit_command(&ctx, &mut conn, action),
        Commands::Task { action } => task_command(&ctx, &mut conn, action),
        Commands::Challenge { action } => challenge_command(&ctx, &mut conn, action),
        Commands::Xp {
            action: XpAction::Grant { amount },
        } => {
            let user_id = ctx.resolve_user(&conn)?;
            let user = CompletionService::new(&mut conn).grant_xp(user_id, as_of, amount)?;
            ctx.emit(&user, || {
                format!("granted {amount} xp; total {} (level {})", user.xp, user.level)
            })
        }
        Commands::Dashboard => {
            let user_id = ctx.resolve_user(&conn)?;
            let dashboard =
                UserService::new(SqliteUserRepository::try_new(&conn)?).dashboard(user_id, as_of)?;
            ctx.emit(&dashboard, || {
                let mut lines = vec![
                    format!("{} · level {}", dashboard.user.name, dashboard.user.level),
                    format!(
                        "xp {} ({}/{} to next level, {}%)",
                        dashboard.user.xp,
                        dashboard.progress.earned,
                        dashboard.progress.needed_for_next,
                        dashboard.progress.percent
                    ),
                    format!(
                        "streak {} (longest {}) {}",
                        dashboard.user.streak,
                        dashboard.user.longest_streak,
                        dashboard.streak_message
                    ),
                    format!(
                        "today: {} habits, {} challenges",
                        dashboard.completed_habits_today, dashboard.completed_challenges_today
                    ),
                    format!("reward points {}", dashboard.user.reward_points),
                ];
                if let Some(days) = dashboard.days_to_next_milestone {
                    lines.push(format!("{days} days to the next milestone"));
                }
                lines.join("\n")
            })
        }
    }
}

struct Context<'a> {
    as_of: CalendarDay,
    json: bool,
    user: Option<UserId>,
    config: &'a HabittaConfig,
}

impl Context<'_> {
    fn resolve_user(&self, conn: &Connection) -> CliResult<UserId> {
        if let Some(id) = self.user {
            return Ok(id);
        }
        let users = UserService::new(SqliteUserRepository::try_new(conn)?).list_users()?;
        users
            .first()
            .map(|user| user.id)
            .ok_or_else(|| "no users yet; run `habitta user create <name>` first".into())
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> CliResult<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }

    fn emit_completion(&self, report: &CompletionReport) -> CliResult<()> {
        let summary = CompletionSummary {
            id: report.completion.item.id(),
            kind: report.completion.item.kind().as_str(),
            xp_earned: report.completion.xp_earned,
            current_streak: report.completion.current_streak,
            longest_streak: report.completion.longest_streak,
            user_xp: report.user.xp,
            user_level: report.user.level,
            user_streak: report.user.streak,
            leveled_up: report.leveled_up,
            milestone: report.milestone.map(|reward| reward.milestone),
        };
        self.emit(&summary, || {
            let mut text = format!(
                "completed {} {}: +{} xp (total {}, level {})",
                summary.kind, summary.id, summary.xp_earned, summary.user_xp, summary.user_level
            );
            if summary.leveled_up {
                text.push_str("\nlevel up!");
            }
            if let Some(milestone) = summary.milestone {
                text.push_str(&format!("\n{milestone}-day streak milestone reached"));
            }
            text
        })
    }
}

#[derive(Serialize)]
struct CompletionSummary {
    id: uuid::Uuid,
    kind: &'static str,
    xp_earned: u32,
    current_streak: u32,
    longest_streak: u32,
    user_xp: u64,
    user_level: u32,
    user_streak: u32,
    leveled_up: bool,
    milestone: Option<u32>,
}

fn user_command(ctx: &Context<'_>, conn: &Connection, action: UserAction) -> CliResult<()> {
    let service = UserService::new(SqliteUserRepository::try_new(conn)?);
    match action {
        UserAction::Create { name } => {
            let user = service.create_user(&name)?;
            ctx.emit(&user, || format!("created user {} ({})", user.name, user.id))
        }
        UserAction::Show => {
            let user = service.get_user(ctx.resolve_user(conn)?)?;
            ctx.emit(&user, || describe_user(&user))
        }
        UserAction::Rename { name } => {
            let user = service.rename_user(ctx.resolve_user(conn)?, &name)?;
            ctx.emit(&user, || format!("renamed user to {}", user.name))
        }
        UserAction::List => {
            let users = service.list_users()?;
            ctx.emit(&users, || {
                users.iter().map(describe_user).collect::<Vec<_>>().join("\n")
            })
        }
    }
}

fn describe_user(user: &UserAggregate) -> String {
    format!(
        "{} {} · level {} · {} xp · streak {} · {} points",
        user.id, user.name, user.level, user.xp, user.streak, user.reward_points
    )
}

fn habits(conn: &Connection) -> CliResult<HabitService<SqliteHabitRepository<'_>>> {
    Ok(HabitService::new(SqliteHabitRepository::try_new(conn)?))
}

fn habit_command(ctx: &Context<'_>, conn: &mut Connection, action: HabitAction) -> CliResult<()> {
    match action {
        HabitAction::Add(args) => {
            let habit = build_habit(ctx.resolve_user(conn)?, args)?;
            let habit = habits(conn)?.create_habit(&habit)?;
            ctx.emit(&habit, || format!("added habit {} ({})", habit.name, habit.id))
        }
        HabitAction::List => {
            let views = habits(conn)?.list_habits(ctx.resolve_user(conn)?, ctx.as_of)?;
            ctx.emit(&views, || {
                views
                    .iter()
                    .map(|view| {
                        let status = match (view.is_completed_today, view.is_scheduled_today) {
                            (true, _) => "done",
                            (false, true) => "due",
                            (false, false) => "rest",
                        };
                        format!(
                            "{} [{status}] {} · streak {} (longest {})",
                            view.habit.id,
                            view.habit.name,
                            view.habit.current_streak,
                            view.habit.longest_streak
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        HabitAction::Done { id, note } => {
            let report =
                CompletionService::new(conn).complete_habit(id, ctx.as_of, note.as_deref())?;
            ctx.emit_completion(&report)
        }
        HabitAction::Delete { id } => {
            habits(conn)?.delete_habit(id)?;
            ctx.emit(&id, || format!("deleted habit {id}"))
        }
        HabitAction::Stats => {
            let stats = habits(conn)?.stats(ctx.resolve_user(conn)?, ctx.as_of)?;
            ctx.emit(&stats, || {
                let recent = stats
                    .recent_days
                    .iter()
                    .map(|count| format!("{}={}", count.day, count.completed))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!(
                    "{} habits · {} completions · {} streak days · longest {}\nlast 7 days: {recent}",
                    stats.total_habits,
                    stats.total_completions,
                    stats.total_streak_days,
                    stats.longest_streak
                )
            })
        }
    }
}

fn build_habit(user_id: UserId, args: HabitArgs) -> CliResult<Habit> {
    let mut habit = Habit::new(user_id, args.name.trim());
    habit.description = args.description;
    if let Some(category) = args.category {
        habit.category = category;
    }
    if let Some(difficulty) = args.difficulty {
        habit.difficulty = difficulty;
    }
    if let Some(frequency) = args.frequency {
        habit.frequency = frequency;
    }
    if !args.days.is_empty() {
        habit.scheduled_days = ScheduledDays::from_weekdays(&args.days)?;
    }
    if let Some(color) = args.color {
        habit.color = color;
    }
    if let Some(icon) = args.icon {
        habit.icon = icon;
    }
    Ok(habit)
}

fn tasks(conn: &Connection) -> CliResult<TaskService<SqliteTaskRepository<'_>>> {
    Ok(TaskService::new(SqliteTaskRepository::try_new(conn)?))
}

fn task_command(ctx: &Context<'_>, conn: &mut Connection, action: TaskAction) -> CliResult<()> {
    match action {
        TaskAction::Add(args) => {
            let task = build_task(ctx.resolve_user(conn)?, args);
            let task = tasks(conn)?.create_task(&task)?;
            ctx.emit(&task, || format!("added task {} ({})", task.title, task.id))
        }
        TaskAction::List { filter } => {
            let listed = tasks(conn)?.list_tasks(ctx.resolve_user(conn)?, filter)?;
            ctx.emit(&listed, || {
                listed
                    .iter()
                    .map(|task| {
                        let mark = if task.is_completed { "x" } else { " " };
                        let due = task
                            .due_day
                            .map(|day| format!(" · due {day}"))
                            .unwrap_or_default();
                        format!(
                            "{} [{mark}] {} ({}){due}",
                            task.id,
                            task.title,
                            task.priority.as_str()
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        TaskAction::Done { id } => {
            let report = CompletionService::new(conn).complete_task(id, ctx.as_of)?;
            ctx.emit_completion(&report)
        }
        TaskAction::Delete { id } => {
            tasks(conn)?.delete_task(id)?;
            ctx.emit(&id, || format!("deleted task {id}"))
        }
        TaskAction::Stats => {
            let stats = tasks(conn)?.stats(ctx.resolve_user(conn)?, ctx.as_of)?;
            ctx.emit(&stats, || {
                format!(
                    "{} tasks · {} completed · {} pending · {} due today · {} overdue · {:.0}% done",
                    stats.total,
                    stats.completed,
                    stats.pending,
                    stats.due_today,
                    stats.overdue,
                    stats.completion_rate * 100.0
                )
            })
        }
    }
}

fn build_task(user_id: UserId, args: TaskArgs) -> Task {
    let mut task = Task::new(user_id, args.title.trim());
    task.description = args.description;
    if let Some(priority) = args.priority {
        task.priority = priority;
    }
    if let Some(category) = args.category {
        task.category = category;
    }
    task.due_day = args.due;
    if let Some(xp) = args.xp {
        task.xp_reward = xp;
    }
    task
}

fn challenges<'a>(
    ctx: &Context<'_>,
    conn: &'a Connection,
) -> CliResult<ChallengeService<'static, SqliteChallengeRepository<'a>>> {
    Ok(ChallengeService::new(
        SqliteChallengeRepository::try_new(conn)?,
        builtin_catalog(),
        ctx.config.daily_challenge_count,
    ))
}

fn challenge_command(
    ctx: &Context<'_>,
    conn: &mut Connection,
    action: ChallengeAction,
) -> CliResult<()> {
    match action {
        ChallengeAction::List => {
            let user_id = ctx.resolve_user(conn)?;
            let daily = challenges(ctx, conn)?.daily_challenges(
                user_id,
                ctx.as_of,
                &mut rand::thread_rng(),
            )?;
            ctx.emit(&daily, || {
                daily
                    .iter()
                    .map(|challenge| {
                        let mark = if challenge.is_completed { "x" } else { " " };
                        format!(
                            "{} [{mark}] {} · {} xp · {}",
                            challenge.id,
                            challenge.title,
                            challenge.xp_reward,
                            challenge.difficulty.as_str()
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        ChallengeAction::Done { id } => {
            let report = CompletionService::new(conn).complete_challenge(id, ctx.as_of)?;
            ctx.emit_completion(&report)
        }
        ChallengeAction::Stats => {
            let stats = challenges(ctx, conn)?.stats(ctx.resolve_user(conn)?, ctx.as_of)?;
            ctx.emit(&stats, || {
                format!(
                    "{} challenges · {} completed · {} xp earned · last 7 days {}/{} · {:.0}% done",
                    stats.total,
                    stats.completed,
                    stats.total_xp_earned,
                    stats.recent_completed,
                    stats.recent_generated,
                    stats.completion_rate * 100.0
                )
            })
        }
    }
}
