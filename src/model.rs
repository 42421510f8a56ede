//! Core entities - lists, tasks and the list overview row
//!
//! Ids are store-assigned. A freshly built entity carries the unassigned id
//! (0) until the store hands it back with its real one.

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default ARGB color of a list (violet).
pub const DEFAULT_LIST_COLOR: i32 = 0xFF6200EE_u32 as i32;

/// Colors handed out to newly created lists.
pub const LIST_PALETTE: [i32; 9] = [
    0xFFE91E63_u32 as i32, // pink
    0xFF9C27B0_u32 as i32, // purple
    0xFF673AB7_u32 as i32, // deep purple
    0xFF3F51B5_u32 as i32, // indigo
    0xFF2196F3_u32 as i32, // blue
    0xFF009688_u32 as i32, // teal
    0xFF4CAF50_u32 as i32, // green
    0xFFFF9800_u32 as i32, // orange
    0xFFFF5722_u32 as i32, // deep orange
];

/// Pick a palette color at random.
pub fn random_list_color() -> i32 {
    LIST_PALETTE
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(DEFAULT_LIST_COLOR)
}

/// Parse `#AARRGGBB`, `#RRGGBB`, `0xAARRGGBB` or a signed decimal into an ARGB color.
///
/// Six-digit forms get a fully opaque alpha channel.
pub fn parse_color(s: &str) -> Option<i32> {
    let s = s.trim();
    let hex = s
        .strip_prefix('#')
        .or_else(|| s.strip_prefix("0x"))
        .or_else(|| s.strip_prefix("0X"));

    match hex {
        Some(h) if h.len() == 6 => u32::from_str_radix(h, 16).ok().map(|v| (0xFF00_0000 | v) as i32),
        Some(h) if h.len() == 8 => u32::from_str_radix(h, 16).ok().map(|v| v as i32),
        Some(_) => None,
        None => s.parse::<i32>().ok(),
    }
}

/// Render an ARGB color as `#AARRGGBB`.
pub fn format_color(color: i32) -> String {
    format!("#{:08X}", color as u32)
}

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Placeholder carried by entities the store has not saved yet.
            pub const UNASSIGNED: Self = Self(0);

            /// Sentinel used by callers that failed to resolve an id.
            pub const NOT_FOUND: Self = Self(-1);

            /// Whether this id can name a stored row.
            pub fn is_valid(self) -> bool {
                self.0 > 0
            }

            /// The id as a nullable column value: `None` lets the store allocate.
            pub fn as_column(self) -> Option<i64> {
                self.is_valid().then_some(self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

row_id!(
    /// Identifier of a stored [`TaskList`].
    ListId
);

row_id!(
    /// Identifier of a stored [`Task`].
    TaskId
);

/// A named, colored container of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: ListId,
    pub name: String,
    /// ARGB color, stored as a signed 32-bit value
    pub color: i32,
}

impl TaskList {
    /// A not-yet-stored list with the default color
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_color(name, DEFAULT_LIST_COLOR)
    }

    pub fn with_color(name: impl Into<String>, color: i32) -> Self {
        Self {
            id: ListId::UNASSIGNED,
            name: name.into(),
            color,
        }
    }

    /// Copy of this list under a new name, keeping id and color.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

/// A titled, completable unit of work owned by exactly one list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub is_completed: bool,
    pub list_id: ListId,
}

impl Task {
    /// A not-yet-stored, open task in `list_id`
    pub fn new(title: impl Into<String>, list_id: ListId) -> Self {
        Self {
            id: TaskId::UNASSIGNED,
            title: title.into(),
            is_completed: false,
            list_id,
        }
    }

    pub fn completed(mut self, is_completed: bool) -> Self {
        self.is_completed = is_completed;
        self
    }

    /// Copy of this task with its completion flag flipped.
    pub fn toggled(&self) -> Self {
        Self {
            is_completed: !self.is_completed,
            ..self.clone()
        }
    }
}

/// A list paired with the number of tasks it currently holds.
///
/// Derived from the store on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskListWithCount {
    pub task_list: TaskList,
    pub task_count: usize,
}
