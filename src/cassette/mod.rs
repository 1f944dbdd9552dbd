//! Record/replay of transport exchanges for deterministic runs without network.

pub mod config;
pub mod format;
pub mod recorder;
pub mod replayer;
