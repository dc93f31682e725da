//! Turn-by-turn progress tracking along a synthesised route.

pub mod session;
pub mod source;
pub mod tracker;

pub use session::{NavigationSession, Navigator};
pub use source::{ChannelSource, LocationSource, ScriptedSource};
pub use tracker::{NavigationTracker, Route, SessionState};
