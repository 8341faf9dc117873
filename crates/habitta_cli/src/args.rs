use clap::{Args, Parser, Subcommand};
use habitta_core::model::attributes::{Category, Difficulty, Frequency, Priority, TaskCategory};
use habitta_core::repo::task_repo::TaskFilter;
use habitta_core::CalendarDay;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "habitta", version, about = "Habit, task and challenge tracker")]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file; overrides `db_path` from the config.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Act as of this day (YYYY-MM-DD) instead of today.
    #[arg(long, global = true, value_parser = parse_day)]
    pub on: Option<CalendarDay>,

    /// User to act for; defaults to the oldest user.
    #[arg(long, global = true)]
    pub user: Option<Uuid>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage users.
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage recurring habits.
    Habit {
        #[command(subcommand)]
        action: HabitAction,
    },
    /// Manage one-off tasks.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Daily challenges.
    Challenge {
        #[command(subcommand)]
        action: ChallengeAction,
    },
    /// Direct XP adjustments.
    Xp {
        #[command(subcommand)]
        action: XpAction,
    },
    /// Show level, streak and today's counters.
    Dashboard,
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Create a user.
    Create { name: String },
    /// Show the selected user.
    Show,
    /// Rename the selected user.
    Rename { name: String },
    /// List all users.
    List,
}

#[derive(Subcommand)]
pub enum HabitAction {
    /// Add a habit.
    Add(HabitArgs),
    /// List active habits with today's status.
    List,
    /// Complete a habit for the day.
    Done {
        id: Uuid,
        #[arg(long)]
        note: Option<String>,
    },
    /// Deactivate a habit.
    Delete { id: Uuid },
    /// Aggregate habit statistics.
    Stats,
}

#[derive(Args)]
pub struct HabitArgs {
    pub name: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, value_parser = parse_category)]
    pub category: Option<Category>,
    #[arg(long, value_parser = parse_difficulty)]
    pub difficulty: Option<Difficulty>,
    #[arg(long, value_parser = parse_frequency)]
    pub frequency: Option<Frequency>,
    /// Weekdays as numbers, 0 = Sunday (e.g. `1,3,5`).
    #[arg(long, value_delimiter = ',')]
    pub days: Vec<u8>,
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long)]
    pub icon: Option<String>,
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task.
    Add(TaskArgs),
    /// List tasks.
    List {
        #[arg(long, default_value = "all", value_parser = parse_filter)]
        filter: TaskFilter,
    },
    /// Complete a task.
    Done { id: Uuid },
    /// Delete a task.
    Delete { id: Uuid },
    /// Aggregate task statistics.
    Stats,
}

#[derive(Args)]
pub struct TaskArgs {
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, value_parser = parse_priority)]
    pub priority: Option<Priority>,
    #[arg(long, value_parser = parse_task_category)]
    pub category: Option<TaskCategory>,
    #[arg(long, value_parser = parse_day)]
    pub due: Option<CalendarDay>,
    #[arg(long)]
    pub xp: Option<u32>,
}

#[derive(Subcommand)]
pub enum ChallengeAction {
    /// Show today's challenges, generating them on first use.
    List,
    /// Complete a challenge.
    Done { id: Uuid },
    /// Aggregate challenge statistics.
    Stats,
}

#[derive(Subcommand)]
pub enum XpAction {
    /// Grant XP directly.
    Grant {
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
}

fn parse_day(value: &str) -> Result<CalendarDay, String> {
    value
        .parse()
        .map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}

fn parse_with<T>(value: &str, parse: fn(&str) -> Option<T>, expected: &str) -> Result<T, String> {
    parse(&value.to_ascii_lowercase()).ok_or_else(|| format!("expected one of {expected}"))
}

fn parse_category(value: &str) -> Result<Category, String> {
    parse_with(
        value,
        Category::parse,
        "health|fitness|mindset|learning|productivity|social|creative|other",
    )
}

fn parse_difficulty(value: &str) -> Result<Difficulty, String> {
    parse_with(value, Difficulty::parse, "easy|medium|hard|extreme")
}

fn parse_frequency(value: &str) -> Result<Frequency, String> {
    parse_with(value, Frequency::parse, "daily|weekly|monthly")
}

fn parse_priority(value: &str) -> Result<Priority, String> {
    parse_with(value, Priority::parse, "low|medium|high|urgent")
}

fn parse_task_category(value: &str) -> Result<TaskCategory, String> {
    parse_with(
        value,
        TaskCategory::parse,
        "personal|work|health|learning|shopping|other",
    )
}

fn parse_filter(value: &str) -> Result<TaskFilter, String> {
    parse_with(value, TaskFilter::parse, "all|completed|pending")
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, HabitAction, XpAction};
    use clap::{CommandFactory, Parser};

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_habit_add_with_schedule() {
        let cli = Cli::try_parse_from([
            "habitta",
            "--on",
            "2024-05-06",
            "habit",
            "add",
            "Stretch",
            "--difficulty",
            "hard",
            "--days",
            "1,3,5",
        ])
        .unwrap();
        assert_eq!(cli.on.map(|day| day.to_string()).as_deref(), Some("2024-05-06"));
        match cli.command {
            Commands::Habit {
                action: HabitAction::Add(args),
            } => {
                assert_eq!(args.days, vec![1, 3, 5]);
                assert_eq!(args.name, "Stretch");
            }
            _ => panic!("expected habit add"),
        }
    }

    #[test]
    fn negative_xp_reaches_the_service() {
        let cli = Cli::try_parse_from(["habitta", "xp", "grant", "-5"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Xp {
                action: XpAction::Grant { amount: -5 }
            }
        ));
    }

    #[test]
    fn rejects_unknown_difficulty() {
        assert!(Cli::try_parse_from(["habitta", "habit", "add", "x", "--difficulty", "epic"]).is_err());
    }
}
