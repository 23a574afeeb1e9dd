//! Drives a `Session` against a `Backend`.
//!
//! The session lock is only held for synchronous transitions; it is always
//! released before awaiting the network.

use shakmaty::{Color, Square};
use std::sync::{Mutex, MutexGuard};

use crate::api::Backend;
use crate::config::Config;
use crate::error::Result;
use crate::session::{MoveOutcome, OpponentReply, Session, SessionView};

pub struct Controller<B> {
    backend: B,
    session: Mutex<Session>,
}

impl<B: Backend> Controller<B> {
    pub fn new(backend: B, config: &Config) -> Self {
        Self {
            backend,
            session: Mutex::new(Session::new(config.engine_depth, config.analysis_depth)),
        }
    }

    pub fn with_session(backend: B, session: Session) -> Self {
        Self {
            backend,
            session: Mutex::new(session),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Locks the session. A poisoned lock is recovered since every
    /// transition leaves the session consistent.
    pub fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn view(&self) -> SessionView {
        self.session().view()
    }

    /// Human move followed by the engine's answer or the end-of-game save.
    pub async fn play_move(&self, from: Square, to: Square) -> MoveOutcome {
        let outcome = self.session().try_human_move(from, to);

        match outcome {
            MoveOutcome::Played { game_over: true } => self.finish_game().await,
            MoveOutcome::Played { game_over: false } => self.engine_reply().await,
            MoveOutcome::Rejected(reason) => {
                tracing::debug!(?reason, "Move rejected");
            }
        }
        outcome
    }

    /// Asks the engine for a move if it is the engine's turn.
    pub async fn engine_reply(&self) {
        let request = self.session().opponent_request();
        let Some(request) = request else {
            return;
        };

        let reply = self.backend.best_move(&request.fen, request.depth).await;
        let applied = self.session().apply_opponent_move(request.generation, reply);

        if matches!(applied, OpponentReply::Played { game_over: true }) {
            self.finish_game().await;
        }
    }

    pub async fn new_game(&self, human: Color) {
        self.session().new_game(human);
        self.engine_reply().await;
    }

    /// Changes sides before the first move; the engine opens if it now plays white.
    pub async fn set_human_color(&self, human: Color) -> Result<()> {
        self.session().set_human_color(human)?;
        self.engine_reply().await;
        Ok(())
    }

    pub async fn resign(&self) {
        let resigned = self.session().resign();
        if resigned {
            self.finish_game().await;
        }
    }

    /// Saves a finished game once, then refetches the list.
    pub async fn finish_game(&self) {
        let request = self.session().save_request();
        let Some(request) = request else {
            return;
        };

        match self.backend.save_game(&request).await {
            Ok(()) => tracing::info!(result = %request.result, "Saved game"),
            Err(e) => tracing::warn!("Failed to save game: {}", e),
        }
        self.refresh_history().await;
    }

    pub async fn refresh_history(&self) {
        match self.backend.list_games().await {
            Ok(records) => {
                tracing::debug!(count = records.len(), "Fetched saved games");
                self.session().replace_history(records);
            }
            Err(e) => tracing::warn!("Failed to fetch saved games: {}", e),
        }
    }

    /// Full-game analysis; on success the review navigator is loaded.
    pub async fn analyze(&self) -> bool {
        let request = self.session().analysis_request();
        let Some(request) = request else {
            return false;
        };

        let reply = self
            .backend
            .analyze_full(&request.pgn, request.perspective, request.depth)
            .await;
        self.session().apply_analysis(request.generation, reply)
    }

    /// One coaching exchange. Ignored while another is in flight.
    pub async fn ask(&self, question: Option<&str>) -> bool {
        let request = self.session().ask(question);
        let Some(request) = request else {
            return false;
        };

        let reply = self.backend.explain(&request.request).await;
        self.session().apply_advice(request.generation, reply)
    }

    /// Loads a saved game; the engine moves if the loaded game is live and waiting on it.
    pub async fn load_record(&self, id: &str) -> Result<()> {
        self.session().load_record(id)?;
        self.engine_reply().await;
        Ok(())
    }
}
