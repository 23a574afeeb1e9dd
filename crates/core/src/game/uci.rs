//! UCI coordinate notation: `e2e4`, `e7e8q`, castling as king moves

use shakmaty::uci::UciMove;
use shakmaty::{Chess, File, Move, Position, Rank, Role, Square};

use crate::error::{Error, Result};

/// Convert shakmaty Move to UCI string
pub fn move_to_uci(mv: &Move) -> String {
    match mv {
        Move::Normal { from, to, promotion, .. } => {
            let promo = promotion.map(|r| match r {
                Role::Queen => "q",
                Role::Rook => "r",
                Role::Bishop => "b",
                Role::Knight => "n",
                _ => "",
            }).unwrap_or("");
            format!("{}{}{}", from, to, promo)
        }
        Move::EnPassant { from, to, .. } => format!("{}{}", from, to),
        Move::Castle { king, rook } => {
            let king_to = if rook.file() > king.file() {
                Square::from_coords(File::G, king.rank())
            } else {
                Square::from_coords(File::C, king.rank())
            };
            format!("{}{}", king, king_to)
        }
        Move::Put { .. } => String::new(),
    }
}

/// Decodes a 4-5 character coordinate move and resolves it against `position`.
pub fn decode_uci(position: &Chess, text: &str) -> Result<Move> {
    let text = text.trim();
    if !(4..=5).contains(&text.len()) {
        return Err(Error::IllegalMove(format!("bad move string '{}'", text)));
    }

    let uci: UciMove = text
        .parse()
        .map_err(|_| Error::IllegalMove(format!("bad move string '{}'", text)))?;

    uci.to_move(position)
        .map_err(|_| Error::IllegalMove(format!("{} is not legal here", text)))
}

/// Builds the move for a drag from `from` to `to`.
///
/// Pawns reaching the last rank always promote to a queen.
pub fn squares_to_uci(position: &Chess, from: Square, to: Square) -> String {
    let is_pawn = position.board().role_at(from) == Some(Role::Pawn);
    let last_rank = to.rank() == Rank::Eighth || to.rank() == Rank::First;

    if is_pawn && last_rank {
        format!("{}{}q", from, to)
    } else {
        format!("{}{}", from, to)
    }
}
