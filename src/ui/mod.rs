pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    dim, header, info, list_line, section, success, task_line, warn,
};
pub use table::{lists_table, stats_table, tasks_table};
pub use theme::{swatch, theme, Theme};
