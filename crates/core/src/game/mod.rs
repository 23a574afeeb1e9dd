//! Live game state, move notation and PGN

pub mod pgn;
pub mod state;
pub mod uci;

pub use pgn::{parse_pgn_string, write_pgn, MovePair, PgnGame, PgnHeaders};
pub use state::{GameOutcome, GameState, PlayedMove, STARTING_FEN};
pub use uci::{decode_uci, move_to_uci};
