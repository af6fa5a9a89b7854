pub mod board_parser;
pub mod board_renderer;
pub mod dates;
pub mod extended_parser;
pub mod extended_renderer;
pub mod ids;
pub mod line;

pub use board_parser::{ParseError, ParseErrorKind, parse_board};
pub use board_renderer::{render_board, snapshot_from_remote};
pub use extended_parser::{ExtendedError, parse_extended};
pub use extended_renderer::render_extended;
pub use ids::{IdError, IdMapper, is_placeholder};
