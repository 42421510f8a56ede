use crate::model::{Task, TaskListWithCount};
use crate::ui::{swatch, theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::CLIPBOARD, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim.clone()).to_string()
}

/// `● Shopping (3)  #12`
pub fn list_line(row: &TaskListWithCount) -> String {
    format!(
        "{} {} ({})  {}",
        swatch(row.task_list.color),
        row.task_list.name,
        row.task_count,
        dim(&format!("#{}", row.task_list.id))
    )
}

/// `☑ Milk  #4`, struck through when completed
pub fn task_line(task: &Task) -> String {
    let id = dim(&format!("#{}", task.id));
    if task.is_completed {
        format!("{} {}  {}", Icons::DONE, task.title.style(theme().done.clone()), id)
    } else {
        format!("{} {}  {}", Icons::OPEN, task.title, id)
    }
}
