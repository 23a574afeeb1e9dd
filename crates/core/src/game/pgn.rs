//! PGN reading and writing

use pgn_reader::{RawTag, SanPlus, Skip, Visitor};
use serde::Serialize;
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Position};
use std::io::Cursor;
use std::ops::ControlFlow;

use crate::error::{Error, Result};

/// A game read from PGN text, before it is replayed into a `GameState`
#[derive(Debug, Clone)]
pub struct PgnGame {
    /// Starting position when the game carries a `FEN` tag
    pub start_fen: Option<String>,
    pub moves: Vec<String>,
}

struct GameMoves {
    start_fen: Option<String>,
    moves: Vec<String>,
    current_position: Chess,
    error: Option<String>,
}

struct GameParser;

impl Visitor for GameParser {
    type Tags = Option<String>;
    type Movetext = GameMoves;
    type Output = std::result::Result<PgnGame, String>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(None)
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        if name == b"FEN" {
            *tags = Some(value.decode_utf8_lossy().to_string());
        }

        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        let current_position = match tags.as_deref() {
            Some(fen) => match position_from_fen(fen) {
                Ok(pos) => pos,
                Err(e) => return ControlFlow::Break(Err(e.to_string())),
            },
            None => Chess::default(),
        };

        ControlFlow::Continue(GameMoves {
            start_fen: tags,
            moves: Vec::new(),
            current_position,
            error: None,
        })
    }

    fn san(&mut self, movetext: &mut Self::Movetext, san: SanPlus) -> ControlFlow<Self::Output> {
        if movetext.error.is_some() {
            return ControlFlow::Continue(());
        }

        let text = san.san.to_string();

        match san.san.to_move(&movetext.current_position) {
            Ok(m) => match movetext.current_position.clone().play(m) {
                Ok(new_pos) => {
                    movetext.current_position = new_pos;
                    movetext.moves.push(text);
                }
                Err(_) => {
                    movetext.error = Some(format!("illegal move {}", text));
                }
            },
            Err(_) => {
                movetext.error = Some(format!("illegal move {}", text));
            }
        }

        ControlFlow::Continue(())
    }

    fn begin_variation(
        &mut self,
        _movetext: &mut Self::Movetext,
    ) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn end_game(&mut self, movetext: Self::Movetext) -> Self::Output {
        if let Some(error) = movetext.error {
            return Err(error);
        }

        Ok(PgnGame {
            start_fen: movetext.start_fen,
            moves: movetext.moves,
        })
    }
}

pub fn position_from_fen(fen: &str) -> Result<Chess> {
    let parsed: Fen = fen.trim().parse().map_err(|e| Error::Fen(format!("{}: {}", fen, e)))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| Error::Fen(format!("{}: {}", fen, e)))
}

/// Reads the first game from PGN text.
pub fn parse_pgn_string(pgn: &str) -> Result<PgnGame> {
    let mut parser = GameParser;

    let cursor = Cursor::new(pgn.as_bytes());
    let mut reader = pgn_reader::Reader::new(cursor);

    match reader.read_game(&mut parser) {
        Ok(Some(Ok(game))) => Ok(game),
        Ok(Some(Err(e))) => Err(Error::Pgn(e)),
        Ok(None) => Err(Error::Pgn("no game found".to_string())),
        Err(e) => Err(Error::Pgn(e.to_string())),
    }
}

/// One numbered line of a move list. `white` is empty when black moved first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovePair {
    pub number: u32,
    pub white: Option<String>,
    pub black: Option<String>,
}

/// Groups plies into numbered pairs.
///
/// `first_fullmove` and `black_first` describe the starting position so that
/// games set up from a FEN number their moves correctly.
pub fn pair_moves(sans: &[String], first_fullmove: u32, black_first: bool) -> Vec<MovePair> {
    let mut pairs: Vec<MovePair> = Vec::new();
    let mut number = first_fullmove;
    let mut white_to_move = !black_first;

    for san in sans {
        if white_to_move {
            pairs.push(MovePair { number, white: Some(san.clone()), black: None });
        } else {
            match pairs.last_mut() {
                Some(pair) if pair.number == number => pair.black = Some(san.clone()),
                _ => pairs.push(MovePair { number, white: None, black: Some(san.clone()) }),
            }
            number += 1;
        }
        white_to_move = !white_to_move;
    }

    pairs
}

/// Numbered movetext, e.g. `1. e4 e5 2. Nf3` or `7... Kd7 8. e4`.
pub fn format_movetext(sans: &[String], first_fullmove: u32, black_first: bool) -> String {
    pair_moves(sans, first_fullmove, black_first)
        .iter()
        .map(|pair| match (&pair.white, &pair.black) {
            (Some(w), Some(b)) => format!("{}. {} {}", pair.number, w, b),
            (Some(w), None) => format!("{}. {}", pair.number, w),
            (None, Some(b)) => format!("{}... {}", pair.number, b),
            (None, None) => String::new(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tag pairs written at the top of an exported game
#[derive(Debug, Clone)]
pub struct PgnHeaders {
    pub event: String,
    pub site: String,
    pub date: String,
    pub white: String,
    pub black: String,
    pub result: String,
}

/// Full PGN document: seven-tag roster (plus `SetUp`/`FEN` when needed) and movetext.
pub fn write_pgn(headers: &PgnHeaders, start_fen: Option<&str>, movetext: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("[Event \"{}\"]\n", headers.event));
    out.push_str(&format!("[Site \"{}\"]\n", headers.site));
    out.push_str(&format!("[Date \"{}\"]\n", headers.date));
    out.push_str("[Round \"-\"]\n");
    out.push_str(&format!("[White \"{}\"]\n", headers.white));
    out.push_str(&format!("[Black \"{}\"]\n", headers.black));
    out.push_str(&format!("[Result \"{}\"]\n", headers.result));
    if let Some(fen) = start_fen {
        out.push_str("[SetUp \"1\"]\n");
        out.push_str(&format!("[FEN \"{}\"]\n", fen));
    }
    out.push('\n');
    if movetext.is_empty() {
        out.push_str(&headers.result);
    } else {
        out.push_str(&format!("{} {}", movetext, headers.result));
    }
    out.push('\n');
    out
}
