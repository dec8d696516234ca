//! Audio output device.
//!
//! `AudioOutput` is the contract the playback session drives. `RodioOutput`
//! implements it with a dedicated thread that owns the rodio stream and sink,
//! takes commands over one channel (so they apply in issue order) and reports
//! generation-tagged events over another.

mod output;
mod player;
mod sink;
mod thread;
mod types;

pub use output::AudioOutput;
pub use player::RodioOutput;
pub use types::{DeviceEvent, DeviceEventKind, Generation};

#[cfg(test)]
mod tests;
