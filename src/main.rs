//! Todolist CLI - manage task lists and share them as links

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use todolist::config::{self, TodoConfig};
use todolist::model::{parse_color, random_list_color, ListId, Task, TaskId, TaskList};
use todolist::share::{self, ImportOutcome, SharedTaskList};
use todolist::storage::SqliteStore;
use todolist::ui::{self, Icons};
use todolist::Repository;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "todolist")]
#[command(version)]
#[command(about = "Named, colored task lists with shareable import links")]
#[command(long_about = r##"
Todolist keeps task lists in a local SQLite database and can share a list
with anyone as a single link.

Example usage:
  todolist add-list "Shopping" --color "#4CAF50"
  todolist add-task 1 "Milk"
  todolist share 1
  todolist import "https://manucho89.github.io/todolist/?data=..."
"##)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file and create the database
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show all lists with their task counts
    Lists,

    /// Create a list
    AddList {
        name: String,

        /// ARGB color as #AARRGGBB, #RRGGBB or a signed integer (random if omitted)
        #[arg(long)]
        color: Option<String>,
    },

    /// Rename a list
    RenameList { id: ListId, name: String },

    /// Delete a list and all of its tasks
    DeleteList { id: ListId },

    /// Show the tasks of a list
    Tasks {
        list_id: ListId,

        /// Render as a table instead of a checklist
        #[arg(long)]
        table: bool,
    },

    /// Add a task to a list
    AddTask { list_id: ListId, title: String },

    /// Flip a task between open and completed
    Toggle { task_id: TaskId },

    /// Delete a task
    DeleteTask { task_id: TaskId },

    /// Delete every completed task of a list
    DeleteCompleted { list_id: ListId },

    /// Print a share link for a list
    Share {
        list_id: ListId,

        /// Print only the link, without the message around it
        #[arg(long)]
        link_only: bool,
    },

    /// Import a list from a share link (or a bare payload)
    Import {
        link: String,

        /// Import without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Add example lists to an empty database
    Seed,

    /// Follow the list overview, printing it after every change
    Watch,

    /// Show database statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);

    if let Commands::Init { force } = cli.command {
        return run_init(&config_path, cli.database.as_deref(), force);
    }

    let config = config::load_config(Some(&config_path))?.unwrap_or_default();
    let database = match cli.database {
        Some(db) => db,
        None => config.database_path_in(&std::env::current_dir()?),
    };
    config::ensure_db_dir(&database)?;
    tracing::debug!("Opening database {:?}", database);

    let repo = Repository::new(SqliteStore::open(&database)?)?;

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),

        Commands::Lists => {
            let rows = repo.watch_lists_with_count().snapshot().await?;
            if rows.is_empty() {
                println!("{} No lists yet. Create one with `todolist add-list <name>`.", Icons::EMPTY);
            } else {
                println!("{}", ui::lists_table(&rows));
            }
        }

        Commands::AddList { name, color } => {
            let name = non_blank(&name, "list name")?;
            let color = match color {
                Some(c) => parse_color(&c).ok_or_else(|| anyhow::anyhow!("invalid color: {c}"))?,
                None => random_list_color(),
            };
            let id = repo.insert_list(TaskList::with_color(name.clone(), color)).await?;
            ui::success(&format!("List created: {} {} (#{})", ui::swatch(color), name, id));
        }

        Commands::RenameList { id, name } => {
            let name = non_blank(&name, "list name")?;
            let list = repo.get_list(id).await?.ok_or(todolist::Error::ListNotFound(id))?;
            repo.update_list(list.renamed(name.clone())).await?;
            ui::success(&format!("List #{} renamed to {}", id, name));
        }

        Commands::DeleteList { id } => {
            let list = repo.get_list(id).await?.ok_or(todolist::Error::ListNotFound(id))?;
            let count = repo.count_tasks_for_list(id).await?;
            repo.delete_list(id).await?;
            if count > 0 {
                ui::success(&format!("{} List \"{}\" deleted ({} task(s))", Icons::DEL, list.name, count));
            } else {
                ui::success(&format!("{} List \"{}\" deleted", Icons::DEL, list.name));
            }
        }

        Commands::Tasks { list_id, table } => {
            let list = repo.get_list(list_id).await?.ok_or(todolist::Error::ListNotFound(list_id))?;
            let tasks = repo.tasks_for_list(list_id).await?;
            ui::header(&format!("{} {}", ui::swatch(list.color), list.name));
            if tasks.is_empty() {
                println!("{} No tasks.", Icons::EMPTY);
            } else if table {
                println!("{}", ui::tasks_table(&tasks));
            } else {
                for task in &tasks {
                    println!("  {}", ui::task_line(task));
                }
            }
        }

        Commands::AddTask { list_id, title } => {
            let title = non_blank(&title, "task title")?;
            repo.get_list(list_id).await?.ok_or(todolist::Error::ListNotFound(list_id))?;
            let id = repo.insert_task(Task::new(title.clone(), list_id)).await?;
            ui::success(&format!("{} Task created: {} (#{})", Icons::NEW, title, id));
        }

        Commands::Toggle { task_id } => {
            let task = repo.get_task(task_id).await?.ok_or(todolist::Error::TaskNotFound(task_id))?;
            let toggled = task.toggled();
            repo.update_task(toggled.clone()).await?;
            println!("{}", ui::task_line(&toggled));
        }

        Commands::DeleteTask { task_id } => {
            let task = repo.get_task(task_id).await?.ok_or(todolist::Error::TaskNotFound(task_id))?;
            repo.delete_task(task_id).await?;
            ui::success(&format!("{} Task \"{}\" deleted", Icons::DEL, task.title));
        }

        Commands::DeleteCompleted { list_id } => {
            let removed = repo.delete_completed(list_id).await?;
            if removed.is_empty() {
                println!("{} No completed tasks to delete.", Icons::EMPTY);
            } else {
                ui::success(&format!("{} {} task(s) deleted", Icons::DEL, removed.len()));
                for task in &removed {
                    println!("  {}", ui::dim(&task.title));
                }
            }
        }

        Commands::Share { list_id, link_only } => {
            let shared = share::export_list(&repo, list_id, config.share_base_url()).await?;
            if link_only {
                println!("{}", shared.link);
            } else {
                println!("{}", shared.message);
            }
        }

        Commands::Import { link, yes } => {
            let outcome = run_import(&repo, &link, yes).await;
            match outcome {
                Ok(ImportOutcome::Imported { list_id, task_ids }) => {
                    ui::success(&format!(
                        "{} List imported (#{}, {} task(s))",
                        Icons::INBOX,
                        list_id,
                        task_ids.len()
                    ));
                }
                Ok(ImportOutcome::Declined) => println!("Import cancelled."),
                Err(e) if e.is_import_failure() => {
                    return Err(anyhow::Error::new(e).context("Could not import the list"));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Seed => {
            if repo.seed_sample_data().await? {
                ui::success("Sample lists added");
            } else {
                ui::warn("Database already has lists; nothing seeded");
            }
        }

        Commands::Watch => {
            let mut feed = repo.watch_lists_with_count();
            println!("{} Watching lists (Ctrl-C to stop)...", Icons::EYE);
            loop {
                tokio::select! {
                    snapshot = feed.next() => match snapshot {
                        Some(rows) => {
                            ui::section("Lists");
                            for row in rows? {
                                println!("  {}", ui::list_line(&row));
                            }
                        }
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }

        Commands::Stats => {
            let stats = repo.stats().await?;
            println!("{} Todolist Statistics ({:?})", Icons::STATS, database);
            println!("{}", ui::stats_table(&stats));
        }
    }

    Ok(())
}

fn run_init(config_path: &Path, database: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let config = TodoConfig {
        database: Some(
            database
                .map(Path::to_path_buf)
                .unwrap_or_else(|| config::default_database_path_in(Path::new("")))
                .to_string_lossy()
                .to_string(),
        ),
        share_base_url: Some(share::DEFAULT_SHARE_BASE_URL.to_string()),
    };
    config::write_config(config_path, &config, force)?;

    let db_path = config.database_path_in(&std::env::current_dir()?);
    config::ensure_db_dir(&db_path)?;
    SqliteStore::open(&db_path)?;

    ui::success(&format!("Config written to {}", config_path.display()));
    ui::info(&format!("{} Database", Icons::DATABASE), &db_path.display().to_string());
    Ok(())
}

async fn run_import(repo: &Repository, input: &str, yes: bool) -> todolist::Result<ImportOutcome> {
    let confirm = move |shared: &SharedTaskList| yes || ask_import(shared);
    if input.contains("://") {
        share::import_link(repo, input, confirm).await
    } else {
        let shared = share::decode_payload(input)?;
        share::import_shared(repo, shared, confirm).await
    }
}

fn ask_import(shared: &SharedTaskList) -> bool {
    let prompt = format!(
        "Import the list '{}' with {} task(s)?",
        shared.list_name,
        shared.tasks.len()
    );
    // The prompt blocks on stdin; keep it off the async worker's hot path.
    tokio::task::block_in_place(|| {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or_else(|e| {
                tracing::warn!("Confirmation prompt failed: {}", e);
                false
            })
    })
}

fn non_blank(value: &str, what: &str) -> anyhow::Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        anyhow::bail!("{what} must not be blank");
    }
    Ok(trimmed.to_string())
}
