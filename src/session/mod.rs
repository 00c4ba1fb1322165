//! Session lifecycle: the writer pipeline, shared state and the monitor API.

pub mod monitor;
pub mod pipeline;
pub mod state;

pub use monitor::Monitor;
pub use pipeline::Pipeline;
pub use state::{FrameCounts, SessionState, SharedSessionState, StateSnapshot};
