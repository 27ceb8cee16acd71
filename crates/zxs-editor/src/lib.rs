pub mod history;
pub mod input;
pub mod rewrite;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod tools;

pub use history::{History, HistoryEntry};
pub use input::{InputEvent, Modifiers};
pub use rewrite::{AppliedRewrite, RewriteError, RewriteOutcome, RewriteRule, RuleRegistry};
pub use selection::Selection;
pub use session::{EditorError, EditorSession, SessionConfig};
pub use shortcuts::{Action, ShortcutMap};
pub use tools::{EventOutcome, GestureState, ToolKind};
