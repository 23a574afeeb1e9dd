//! Backend API data types

use serde::{Deserialize, Serialize};
use shakmaty::Color;
use std::fmt;

/// Identifier assigned by the backend to a saved game.
///
/// Backends differ on whether ids are numeric or textual, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A finished game as stored by `GET /games`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedGame {
    pub id: RecordId,
    pub pgn: String,
    pub result: String,
    #[serde(default)]
    pub date: String,
}

impl SavedGame {
    pub fn is_finished(&self) -> bool {
        matches!(self.result.as_str(), "1-0" | "0-1" | "1/2-1/2")
    }
}

/// Body of `POST /games`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGame {
    pub pgn: String,
    pub result: String,
    pub fen: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest<'a> {
    pub fen: &'a str,
    pub depth: u8,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub best_move: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeFullRequest<'a> {
    pub pgn: &'a str,
    pub perspective: &'static str,
    pub depth: u8,
}

/// One ply of a full-game analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalStep {
    pub move_number: u32,
    pub fen: String,
    /// Raw engine score
    #[serde(default)]
    pub score: Option<f64>,
    /// Score already adjusted to the requested perspective
    #[serde(default)]
    pub score_for: Option<f64>,
}

impl EvalStep {
    /// Perspective-adjusted score if the backend supplied one, else the raw score.
    pub fn display_score(&self) -> f64 {
        self.score_for.or(self.score).unwrap_or(0.0)
    }
}

/// Body of `POST /explain`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainRequest {
    pub fen: String,
    /// Full live PGN, sent as context
    pub history: String,
    /// `None` asks the backend to use its own default prompt
    pub question: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExplainResponse {
    pub advice: String,
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}
