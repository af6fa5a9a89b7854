use tracing::debug;

use crate::model::action::Action;
use crate::model::config::DateFormat;
use crate::model::extended::ExtendedTarget;
use crate::model::snapshot::ParsedBoard;
use crate::ops::executor::{self, ExecuteError, ExecutionReport};
use crate::ops::extended_diff::diff_extended_text;
use crate::ops::reconcile::{DiffError, DiffResult, diff};
use crate::parse::board_parser::{ParseError, parse_board};
use crate::parse::board_renderer::{render_board, snapshot_from_remote};
use crate::parse::extended_parser::ExtendedError;
use crate::parse::extended_renderer::render_extended;
use crate::parse::ids::{IdError, IdMapper};
use crate::remote::{BoardClient, RemoteError, fetch_board_tree};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Id(#[from] IdError),
    #[error("could not parse board document: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Diff(#[from] DiffError),
    #[error("could not parse extended document: {0}")]
    Extended(#[from] ExtendedError),
    #[error(transparent)]
    Execute(#[from] ExecuteError),
}

/// One render/edit/reconcile cycle for a board.
///
/// Owns the identity mapper for the cycle. The baseline is parsed from the
/// rendered text itself, so the diff compares like with like.
#[derive(Debug)]
pub struct EditSession {
    board_id: String,
    format: DateFormat,
    mapper: IdMapper,
    text: String,
    baseline: ParsedBoard,
}

impl EditSession {
    pub fn open(
        client: &dyn BoardClient,
        board_id: &str,
        format: DateFormat,
    ) -> Result<Self, SessionError> {
        let fetched = fetch_board_tree(client, board_id)?;
        let mut mapper = IdMapper::seed(fetched.canonical_ids())?;
        let snapshot = snapshot_from_remote(&fetched, format);
        let text = render_board(&snapshot, &mapper);
        let baseline = parse_board(&text, &mut mapper)?;
        debug!(board = %board_id, ids = mapper.len(), "opened edit session");
        Ok(EditSession {
            board_id: board_id.to_string(),
            format,
            mapper,
            text,
            baseline,
        })
    }

    /// The rendered document handed to the user
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parse the edited document and diff it against the baseline
    pub fn reconcile(&mut self, edited: &str) -> Result<DiffResult, SessionError> {
        let after = parse_board(edited, &mut self.mapper)?;
        Ok(diff(&self.baseline, &after, self.format)?)
    }

    /// Apply the reconciled actions
    pub fn apply(
        &self,
        client: &mut dyn BoardClient,
        actions: &[Action],
        on_applied: impl FnMut(&Action),
    ) -> Result<ExecutionReport, ExecuteError> {
        executor::execute(client, &self.board_id, actions, on_applied)
    }
}

/// The extended editing round for objects flagged with `!`
#[derive(Debug)]
pub struct ExtendedSession {
    format: DateFormat,
    text: String,
}

impl ExtendedSession {
    pub fn open(
        client: &dyn BoardClient,
        targets: &[ExtendedTarget],
        format: DateFormat,
    ) -> Result<Self, SessionError> {
        let text = render_extended(targets, client, format)?;
        Ok(ExtendedSession { format, text })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn reconcile(&self, edited: &str) -> Result<Vec<Action>, SessionError> {
        Ok(diff_extended_text(&self.text, edited, self.format)?)
    }
}
