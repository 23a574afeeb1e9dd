//! The live game: an immutable position snapshot plus the moves that led to it

use serde::Serialize;
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::{Chess, Color, EnPassantMode, Move, Position, Square};

use super::pgn::{format_movetext, pair_moves, parse_pgn_string, position_from_fen, MovePair};
use super::uci::{decode_uci, move_to_uci, squares_to_uci};
use crate::error::{Error, Result};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// One ply as played
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayedMove {
    pub san: String,
    pub uci: String,
    pub fen_after: String,
}

/// How a game ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameOutcome {
    Checkmate { winner: &'static str },
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
    Resignation { winner: &'static str },
    /// Result code carried by a loaded game record
    Recorded { result: String },
}

impl GameOutcome {
    pub fn checkmate(winner: Color) -> Self {
        GameOutcome::Checkmate { winner: color_str(winner) }
    }

    pub fn resignation(winner: Color) -> Self {
        GameOutcome::Resignation { winner: color_str(winner) }
    }

    /// PGN result code
    pub fn result_code(&self) -> &str {
        match self {
            GameOutcome::Checkmate { winner } | GameOutcome::Resignation { winner } => {
                if *winner == "white" {
                    "1-0"
                } else {
                    "0-1"
                }
            }
            GameOutcome::Stalemate
            | GameOutcome::InsufficientMaterial
            | GameOutcome::FiftyMoveRule
            | GameOutcome::ThreefoldRepetition => "1/2-1/2",
            GameOutcome::Recorded { result } => result,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            GameOutcome::Checkmate { winner } => format!("Checkmate! {} wins.", capitalize(winner)),
            GameOutcome::Stalemate => "Draw by stalemate.".to_string(),
            GameOutcome::InsufficientMaterial => "Draw by insufficient material.".to_string(),
            GameOutcome::FiftyMoveRule => "Draw by the fifty-move rule.".to_string(),
            GameOutcome::ThreefoldRepetition => "Draw by threefold repetition.".to_string(),
            GameOutcome::Resignation { winner } => {
                format!("{} wins by resignation.", capitalize(winner))
            }
            GameOutcome::Recorded { result } => format!("Game over ({}).", result),
        }
    }
}

fn color_str(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Board, side to move, castling rights and en passant square
fn repetition_key(position: &Chess) -> String {
    let fen = Fen::from_position(position, EnPassantMode::Legal).to_string();
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

/// A position together with the moves that produced it.
///
/// Values are never mutated in place: every move returns a new `GameState`
/// and leaves the receiver untouched, so a rejected move cannot leave a
/// half-applied state behind.
#[derive(Debug, Clone)]
pub struct GameState {
    start: Chess,
    start_fen: Option<String>,
    position: Chess,
    moves: Vec<PlayedMove>,
    keys: Vec<String>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self::starting_from(Chess::default(), None)
    }

    fn starting_from(position: Chess, start_fen: Option<String>) -> Self {
        let key = repetition_key(&position);
        Self {
            start: position.clone(),
            start_fen,
            position,
            moves: Vec::new(),
            keys: vec![key],
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self> {
        let position = position_from_fen(fen)?;
        let normalized = Fen::from_position(&position, EnPassantMode::Legal).to_string();
        if normalized == STARTING_FEN {
            return Ok(Self::new());
        }
        Ok(Self::starting_from(position, Some(normalized)))
    }

    /// Replays PGN text from its starting position.
    pub fn from_pgn(pgn: &str) -> Result<Self> {
        if pgn.trim().is_empty() {
            return Ok(Self::new());
        }

        let parsed = parse_pgn_string(pgn)?;
        let mut state = match parsed.start_fen.as_deref() {
            Some(fen) => Self::from_fen(fen)?,
            None => Self::new(),
        };

        for san_str in &parsed.moves {
            let san: San = san_str
                .parse()
                .map_err(|_| Error::Pgn(format!("bad SAN '{}'", san_str)))?;
            let mv = san
                .to_move(&state.position)
                .map_err(|_| Error::Pgn(format!("illegal move '{}'", san_str)))?;
            state = state.play(mv)?;
        }

        Ok(state)
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn fen(&self) -> String {
        Fen::from_position(&self.position, EnPassantMode::Legal).to_string()
    }

    /// Numbered movetext, prefixed with `SetUp`/`FEN` tags for non-standard starts.
    pub fn pgn(&self) -> String {
        let movetext = self.movetext();
        match &self.start_fen {
            Some(fen) => format!("[SetUp \"1\"]\n[FEN \"{}\"]\n\n{}", fen, movetext),
            None => movetext,
        }
    }

    pub fn movetext(&self) -> String {
        let sans: Vec<String> = self.moves.iter().map(|m| m.san.clone()).collect();
        format_movetext(
            &sans,
            self.start.fullmoves().get(),
            self.start.turn() == Color::Black,
        )
    }

    /// Numbered move list starting from this game's first fullmove
    pub fn move_pairs(&self) -> Vec<MovePair> {
        let sans: Vec<String> = self.moves.iter().map(|m| m.san.clone()).collect();
        pair_moves(
            &sans,
            self.start.fullmoves().get(),
            self.start.turn() == Color::Black,
        )
    }

    pub fn start_fen(&self) -> Option<&str> {
        self.start_fen.as_deref()
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    pub fn moves(&self) -> &[PlayedMove] {
        &self.moves
    }

    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }

    pub fn last_move(&self) -> Option<&PlayedMove> {
        self.moves.last()
    }

    pub fn is_check(&self) -> bool {
        self.position.is_check()
    }

    /// Applies a legal move to a copy of this state.
    pub fn play(&self, mv: Move) -> Result<Self> {
        let uci = move_to_uci(&mv);
        let mut san = San::from_move(&self.position, mv.clone()).to_string();

        let position = self
            .position
            .clone()
            .play(mv)
            .map_err(|_| Error::IllegalMove(uci.clone()))?;

        if position.is_checkmate() {
            san.push('#');
        } else if position.is_check() {
            san.push('+');
        }

        let mut next = self.clone();
        next.keys.push(repetition_key(&position));
        next.moves.push(PlayedMove {
            san,
            uci,
            fen_after: Fen::from_position(&position, EnPassantMode::Legal).to_string(),
        });
        next.position = position;
        Ok(next)
    }

    pub fn play_uci(&self, text: &str) -> Result<Self> {
        let mv = decode_uci(&self.position, text)?;
        self.play(mv)
    }

    /// Drag-and-drop move. Promotions always become queens.
    pub fn play_squares(&self, from: Square, to: Square) -> Result<Self> {
        self.play_uci(&squares_to_uci(&self.position, from, to))
    }

    /// Terminal state reached over the board, if any
    pub fn outcome(&self) -> Option<GameOutcome> {
        let pos = &self.position;
        if pos.is_checkmate() {
            return Some(GameOutcome::checkmate(pos.turn().other()));
        }
        if pos.is_stalemate() {
            return Some(GameOutcome::Stalemate);
        }
        if pos.is_insufficient_material() {
            return Some(GameOutcome::InsufficientMaterial);
        }
        if pos.halfmoves() >= 100 {
            return Some(GameOutcome::FiftyMoveRule);
        }
        let current = self.keys.last()?;
        if self.keys.iter().filter(|k| *k == current).count() >= 3 {
            return Some(GameOutcome::ThreefoldRepetition);
        }
        None
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play_all(state: &GameState, moves: &[&str]) -> GameState {
        moves
            .iter()
            .fold(state.clone(), |s, m| s.play_uci(m).unwrap())
    }

    #[test]
    fn test_new_game() {
        let state = GameState::new();
        assert_eq!(state.fen(), STARTING_FEN);
        assert_eq!(state.pgn(), "");
        assert_eq!(state.turn(), Color::White);
        assert!(state.outcome().is_none());
    }

    #[test]
    fn test_move_returns_new_state() {
        let state = GameState::new();
        let next = state.play_squares(Square::E2, Square::E4).unwrap();

        assert_eq!(state.ply_count(), 0);
        assert_eq!(next.ply_count(), 1);
        assert_eq!(next.turn(), Color::Black);
        assert_eq!(next.pgn(), "1. e4");
        assert_eq!(next.last_move().unwrap().uci, "e2e4");
    }

    #[test]
    fn test_illegal_move_rejected() {
        let state = GameState::new();
        assert!(state.play_squares(Square::E2, Square::E5).is_err());
        assert!(state.play_squares(Square::E7, Square::E5).is_err());
        assert!(state.play_squares(Square::G1, Square::G3).is_err());
        assert!(state.play_squares(Square::G1, Square::F3).is_ok());
        assert_eq!(state.ply_count(), 0);
    }

    #[test]
    fn test_move_pairs_from_black_to_move_start() {
        let state = GameState::from_fen("4k3/8/8/8/8/8/4P3/4K3 b - - 0 10").unwrap();
        let state = play_all(&state, &["e8d7", "e2e4"]);

        assert_eq!(state.movetext(), "10... Kd7 11. e4");
        let pairs = state.move_pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].number, 10);
        assert_eq!(pairs[0].white, None);
        assert_eq!(pairs[0].black.as_deref(), Some("Kd7"));
        assert_eq!(pairs[1].number, 11);
        assert_eq!(pairs[1].white.as_deref(), Some("e4"));
    }

    #[test]
    fn test_pgn_replay_reproduces_fen() {
        // castling both sides, en passant, promotion with capture
        let lines: [&[&str]; 3] = [
            &["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6", "e1g1", "f8c5"],
            &["e2e4", "a7a6", "e4e5", "d7d5", "e5d6", "c7d6", "d2d4"],
            &["h2h4", "g7g5", "h4g5", "h7h6", "g5h6", "f8g7", "h6g7", "a7a6", "g7h8q"],
        ];

        for line in lines {
            let state = play_all(&GameState::new(), line);
            let replayed = GameState::from_pgn(&state.pgn()).unwrap();
            assert_eq!(replayed.fen(), state.fen());
            assert_eq!(replayed.ply_count(), line.len());
        }
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let state = GameState::from_fen("7k/4P3/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let next = state.play_squares(Square::E7, Square::E8).unwrap();
        let last = next.last_move().unwrap();
        assert_eq!(last.uci, "e7e8q");
        assert_eq!(last.san, "e8=Q+");
    }

    #[test]
    fn test_custom_start_pgn_is_replayable() {
        let state = GameState::from_fen("7k/4P3/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let next = state.play_uci("e7e8r").unwrap();
        let pgn = next.pgn();
        assert!(pgn.contains("[FEN \"7k/4P3/8/8/8/8/8/K7 w - - 0 1\"]"));

        let replayed = GameState::from_pgn(&pgn).unwrap();
        assert_eq!(replayed.fen(), next.fen());
    }

    #[test]
    fn test_checkmate_outcome() {
        let state = play_all(&GameState::new(), &["f2f3", "e7e5", "g2g4", "d8h4"]);
        let outcome = state.outcome().unwrap();
        assert_eq!(outcome, GameOutcome::checkmate(Color::Black));
        assert_eq!(outcome.result_code(), "0-1");
        assert!(state.pgn().ends_with("Qh4#"));
    }

    #[test]
    fn test_threefold_repetition() {
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
        let once = play_all(&GameState::new(), &shuffle);
        assert!(once.outcome().is_none());

        let twice = play_all(&once, &shuffle);
        assert_eq!(twice.outcome(), Some(GameOutcome::ThreefoldRepetition));
    }

    #[test]
    fn test_insufficient_material() {
        let state = GameState::from_fen("7k/8/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert_eq!(state.outcome(), Some(GameOutcome::InsufficientMaterial));
        assert_eq!(GameOutcome::InsufficientMaterial.result_code(), "1/2-1/2");
    }

    #[test]
    fn test_from_pgn_rejects_garbage() {
        assert!(GameState::from_pgn("1. e4 e4").is_err());
        assert_eq!(GameState::from_pgn("   ").unwrap().ply_count(), 0);
    }

    #[test]
    fn test_describe_outcomes() {
        assert_eq!(GameOutcome::checkmate(Color::White).describe(), "Checkmate! White wins.");
        assert_eq!(
            GameOutcome::resignation(Color::Black).describe(),
            "Black wins by resignation."
        );
        assert_eq!(GameOutcome::resignation(Color::Black).result_code(), "0-1");
    }
}
