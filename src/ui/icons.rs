pub struct Icons;

impl Icons {
    pub const CLIPBOARD: &str = "📋";
    pub const CHECK: &str = "✅";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const EYE: &str = "👀";
    pub const NEW: &str = "✨";
    pub const DEL: &str = "🗑️";
    pub const DATABASE: &str = "🗄️";
    pub const INBOX: &str = "📥";
    pub const EMPTY: &str = "∅";
    pub const DONE: &str = "☑";
    pub const OPEN: &str = "☐";
    pub const DOT: &str = "●";
}
