mod controller;
mod format;
mod state;

pub use controller::{Intent, PlaybackSession};
pub use format::format_time;
pub use state::{PlaybackState, SessionStatus};
