use tabled::{settings::Style, Table, Tabled};
use crate::model::{format_color, Task, TaskListWithCount};
use crate::storage::DbStats;

#[derive(Tabled)]
struct ListRow {
    #[tabled(rename = "Id")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Tasks")]
    tasks: usize,
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "Id")]
    id: i64,
    #[tabled(rename = "Done")]
    done: &'static str,
    #[tabled(rename = "Title")]
    title: String,
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: usize,
}

/// Overview table of lists with their task counts; empty string for no rows
pub fn lists_table(rows: &[TaskListWithCount]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let rows = rows.iter().map(|r| ListRow {
        id: r.task_list.id.0,
        name: r.task_list.name.clone(),
        color: format_color(r.task_list.color),
        tasks: r.task_count,
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn tasks_table(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return String::new();
    }
    let rows = tasks.iter().map(|t| TaskRow {
        id: t.id.0,
        done: if t.is_completed { "yes" } else { "" },
        title: t.title.clone(),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn stats_table(stats: &DbStats) -> String {
    let rows = [
        MetricRow { metric: "Lists", value: stats.lists },
        MetricRow { metric: "Tasks", value: stats.tasks },
        MetricRow { metric: "Completed", value: stats.completed },
    ];
    Table::new(rows).with(Style::rounded()).to_string()
}
