pub mod action;
pub mod board;
pub mod config;
pub mod extended;
pub mod fields;
pub mod snapshot;

pub use action::*;
pub use board::*;
pub use config::*;
pub use extended::*;
pub use snapshot::*;
