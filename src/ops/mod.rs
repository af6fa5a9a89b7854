pub mod executor;
pub mod extended_diff;
pub mod reconcile;
pub mod session;

pub use executor::{ExecuteError, ExecutionReport, execute, plan};
pub use extended_diff::{diff_extended, diff_extended_text};
pub use reconcile::{DiffError, DiffResult, diff};
pub use session::{EditSession, ExtendedSession, SessionError};
