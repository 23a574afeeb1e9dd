//! Board grid for the page template, built from a FEN

use chess_coach_core::{Error, Result};
use shakmaty::{fen::Fen, Color, File, Piece, Rank, Role, Square};

pub struct Cell {
    pub square: String,
    pub glyph: &'static str,
    pub piece_color: &'static str,
    pub dark: bool,
    pub highlight: bool,
}

fn glyph(role: Role) -> &'static str {
    match role {
        Role::King => "\u{265A}",
        Role::Queen => "\u{265B}",
        Role::Rook => "\u{265C}",
        Role::Bishop => "\u{265D}",
        Role::Knight => "\u{265E}",
        Role::Pawn => "\u{265F}",
    }
}

/// Row 0 is the top of the board as seen by `orientation`.
fn to_square(row: u32, col: u32, orientation: Color) -> Square {
    match orientation {
        Color::White => Square::from_coords(File::new(col), Rank::new(7 - row)),
        Color::Black => Square::from_coords(File::new(7 - col), Rank::new(row)),
    }
}

/// Eight rows of cells, top row first as seen by `orientation`.
///
/// `last_move` is a UCI string whose two squares are highlighted.
pub fn board_rows(fen: &str, orientation: Color, last_move: Option<&str>) -> Result<Vec<Vec<Cell>>> {
    let parsed: Fen = fen
        .trim()
        .parse()
        .map_err(|e| Error::Fen(format!("{}: {}", fen, e)))?;
    let board = &parsed.as_setup().board;

    let highlighted: Vec<&str> = match last_move {
        Some(uci) if uci.len() >= 4 && uci.is_char_boundary(4) => vec![&uci[0..2], &uci[2..4]],
        _ => Vec::new(),
    };

    let rows = (0..8)
        .map(|row| {
            (0..8)
                .map(|col| {
                    let square = to_square(row, col, orientation);
                    let piece: Option<Piece> = board.piece_at(square);
                    let name = square.to_string();

                    Cell {
                        highlight: highlighted.contains(&name.as_str()),
                        square: name,
                        glyph: piece.map(|p| glyph(p.role)).unwrap_or(""),
                        piece_color: match piece.map(|p| p.color) {
                            Some(Color::White) => "white",
                            Some(Color::Black) => "black",
                            None => "",
                        },
                        dark: square.is_dark(),
                    }
                })
                .collect()
        })
        .collect();

    Ok(rows)
}
