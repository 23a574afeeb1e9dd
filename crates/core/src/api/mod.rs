//! Backend HTTP surface: engine moves, full-game analysis, coaching and saved games

mod client;
mod types;

use shakmaty::Color;
use std::future::Future;

pub use client::ApiClient;
pub use types::*;

use crate::error::Result;

/// The remote services this client talks to.
///
/// `ApiClient` is the HTTP implementation; tests substitute an in-memory one.
pub trait Backend: Send + Sync {
    /// `POST /analyze`. `Ok(None)` when the backend returns no move.
    fn best_move(&self, fen: &str, depth: u8)
        -> impl Future<Output = Result<Option<String>>> + Send;

    /// `POST /analyze_full`
    fn analyze_full(
        &self,
        pgn: &str,
        perspective: Color,
        depth: u8,
    ) -> impl Future<Output = Result<Vec<EvalStep>>> + Send;

    /// `POST /explain`
    fn explain(&self, request: &ExplainRequest) -> impl Future<Output = Result<String>> + Send;

    /// `GET /games`
    fn list_games(&self) -> impl Future<Output = Result<Vec<SavedGame>>> + Send;

    /// `POST /games`
    fn save_game(&self, game: &NewGame) -> impl Future<Output = Result<()>> + Send;
}
