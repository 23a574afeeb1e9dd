//! Error types for chess-coach-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("PGN parsing error: {0}")]
    Pgn(String),

    #[error("Invalid FEN: {0}")]
    Fen(String),

    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("Side cannot change once the game has started")]
    ColorLocked,

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
