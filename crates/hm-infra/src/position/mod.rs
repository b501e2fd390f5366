mod scripted;

pub use scripted::{load_positions, ScriptedPositionSource};
