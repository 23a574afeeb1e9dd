//! Application state for one player: live game, review, coaching chat and history.
//!
//! Every UI event maps to one transition here. Network work is split in two:
//! a `*_request` method prepares what to send and stamps it with the current
//! generation, and an `apply_*` method folds the response back in. Responses
//! stamped with an older generation are dropped.

use chrono::NaiveDateTime;
use serde::Serialize;
use shakmaty::{Color, Square};

use crate::api::{color_name, EvalStep, ExplainRequest, NewGame, SavedGame};
use crate::chat::{ChatMessage, ChatSession};
use crate::config::{DEFAULT_ANALYSIS_DEPTH, DEFAULT_ENGINE_DEPTH};
use crate::error::{Error, Result};
use crate::game::{write_pgn, GameOutcome, GameState, MovePair, PgnHeaders, PlayedMove};
use crate::history::{save_request, HistoryEntry, HistoryStore};
use crate::review::{AnalysisStep, ReviewNavigator};

pub const CONNECTION_ERROR: &str = "Connection error: could not reach the engine.";
pub const ANALYSIS_FAILED: &str = "Analysis failed: connection error.";

const NEW_GAME_INTRO: &str = "New game started. Ask me about the position at any time.";

/// Why a human move was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    ReviewActive,
    GameOver,
    NotYourTurn,
    Illegal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Rejected(Rejection),
    Played { game_over: bool },
}

impl MoveOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, MoveOutcome::Played { .. })
    }
}

/// What became of an engine reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpponentReply {
    Played { game_over: bool },
    NoMove,
    Failed,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpponentRequest {
    pub generation: u64,
    pub fen: String,
    pub depth: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub generation: u64,
    pub pgn: String,
    pub perspective: Color,
    pub depth: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoachRequest {
    pub generation: u64,
    pub request: ExplainRequest,
}

/// Everything the page needs to draw itself
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub generation: u64,
    pub fen: String,
    pub live_fen: String,
    pub pgn: String,
    pub human_color: &'static str,
    pub turn: &'static str,
    pub status: String,
    pub moves: Vec<PlayedMove>,
    pub move_pairs: Vec<MovePair>,
    pub outcome: Option<GameOutcome>,
    pub result: Option<String>,
    pub review_index: Option<usize>,
    pub steps: Vec<AnalysisStep>,
    pub scores: Vec<f64>,
    pub chat: Vec<ChatMessage>,
    pub chat_busy: bool,
    pub engine_pending: bool,
    pub analysis_pending: bool,
    pub can_change_color: bool,
    pub history: Vec<HistoryEntry>,
    pub history_loaded: bool,
}

#[derive(Debug, Clone)]
pub struct Session {
    game: GameState,
    human: Color,
    review: ReviewNavigator,
    chat: ChatSession,
    history: HistoryStore,
    status: String,
    generation: u64,
    finished: Option<GameOutcome>,
    saved: bool,
    engine_pending: bool,
    analysis_pending: bool,
    engine_depth: u8,
    analysis_depth: u8,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_ENGINE_DEPTH, DEFAULT_ANALYSIS_DEPTH)
    }
}

impl Session {
    pub fn new(engine_depth: u8, analysis_depth: u8) -> Self {
        let mut session = Self {
            game: GameState::new(),
            human: Color::White,
            review: ReviewNavigator::new(),
            chat: ChatSession::new(),
            history: HistoryStore::new(),
            status: String::new(),
            generation: 0,
            finished: None,
            saved: false,
            engine_pending: false,
            analysis_pending: false,
            engine_depth,
            analysis_depth,
        };
        session.new_game(Color::White);
        session
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn human_color(&self) -> Color {
        self.human
    }

    pub fn review(&self) -> &ReviewNavigator {
        &self.review
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.finished.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.finished.is_some()
    }

    pub fn engine_pending(&self) -> bool {
        self.engine_pending
    }

    pub fn analysis_pending(&self) -> bool {
        self.analysis_pending
    }

    /// FEN of the reviewed step when reviewing, else the live position
    pub fn displayed_fen(&self) -> String {
        match self.review.displayed_fen() {
            Some(fen) => fen.to_string(),
            None => self.game.fen(),
        }
    }

    fn turn_status(&self) -> String {
        if self.game.turn() == self.human {
            let check = if self.game.is_check() { " You are in check." } else { "" };
            format!("Your turn ({}).{}", color_name(self.human), check)
        } else {
            "Engine is thinking...".to_string()
        }
    }

    /// Starts over with `human` as the player's side.
    pub fn new_game(&mut self, human: Color) {
        self.generation += 1;
        self.game = GameState::new();
        self.human = human;
        self.review.clear();
        self.chat.reset(NEW_GAME_INTRO);
        self.finished = None;
        self.saved = false;
        self.engine_pending = false;
        self.analysis_pending = false;
        self.status = self.turn_status();
        tracing::info!(generation = self.generation, human = color_name(human), "New game");
    }

    pub fn can_change_color(&self) -> bool {
        self.game.ply_count() == 0 && !self.engine_pending && self.finished.is_none()
    }

    /// Switches sides. Only allowed before the first move has been played.
    pub fn set_human_color(&mut self, color: Color) -> Result<()> {
        if color == self.human {
            return Ok(());
        }
        if !self.can_change_color() {
            return Err(Error::ColorLocked);
        }
        self.human = color;
        self.status = self.turn_status();
        Ok(())
    }

    /// Handles a drag from `from` to `to` by the human player.
    pub fn try_human_move(&mut self, from: Square, to: Square) -> MoveOutcome {
        if self.review.is_active() {
            return MoveOutcome::Rejected(Rejection::ReviewActive);
        }
        if self.finished.is_some() {
            return MoveOutcome::Rejected(Rejection::GameOver);
        }
        if self.game.turn() != self.human || self.engine_pending {
            return MoveOutcome::Rejected(Rejection::NotYourTurn);
        }

        let next = match self.game.play_squares(from, to) {
            Ok(next) => next,
            Err(_) => return MoveOutcome::Rejected(Rejection::Illegal),
        };
        self.game = next;
        tracing::debug!(from = %from, to = %to, "Human move");

        let game_over = self.check_game_over();
        if !game_over {
            self.status = self.turn_status();
        }
        MoveOutcome::Played { game_over }
    }

    fn check_game_over(&mut self) -> bool {
        match self.game.outcome() {
            Some(outcome) => {
                self.status = outcome.describe();
                tracing::info!(result = outcome.result_code(), "Game over");
                self.finished = Some(outcome);
                true
            }
            None => false,
        }
    }

    /// Prepares an engine request if it is the engine's turn and none is outstanding.
    pub fn opponent_request(&mut self) -> Option<OpponentRequest> {
        if self.finished.is_some() || self.engine_pending || self.game.turn() == self.human {
            return None;
        }
        self.engine_pending = true;
        self.status = "Engine is thinking...".to_string();

        Some(OpponentRequest {
            generation: self.generation,
            fen: self.game.fen(),
            depth: self.engine_depth,
        })
    }

    pub fn apply_opponent_move(
        &mut self,
        generation: u64,
        reply: Result<Option<String>>,
    ) -> OpponentReply {
        if generation != self.generation || !self.engine_pending {
            tracing::debug!(generation, current = self.generation, "Dropping stale engine reply");
            return OpponentReply::Stale;
        }
        self.engine_pending = false;

        if self.finished.is_some() {
            return OpponentReply::Stale;
        }

        let uci = match reply {
            Ok(Some(uci)) => uci,
            Ok(None) => {
                tracing::warn!("Engine returned no move");
                self.status = self.turn_status();
                return OpponentReply::NoMove;
            }
            Err(e) => {
                tracing::warn!("Engine request failed: {}", e);
                self.status = CONNECTION_ERROR.to_string();
                return OpponentReply::Failed;
            }
        };

        match self.game.play_uci(&uci) {
            Ok(next) => {
                self.game = next;
                tracing::debug!(mv = %uci, "Engine move");
                let game_over = self.check_game_over();
                if !game_over {
                    self.status = self.turn_status();
                }
                OpponentReply::Played { game_over }
            }
            Err(e) => {
                tracing::warn!("Could not apply engine move {}: {}", uci, e);
                self.status = CONNECTION_ERROR.to_string();
                OpponentReply::Failed
            }
        }
    }

    /// Ends the game in the engine's favour. Requires at least one move.
    pub fn resign(&mut self) -> bool {
        if self.finished.is_some() || self.game.ply_count() == 0 {
            return false;
        }
        let outcome = GameOutcome::resignation(self.human.other());
        self.status = outcome.describe();
        self.finished = Some(outcome);
        self.engine_pending = false;
        tracing::info!("Player resigned");
        true
    }

    /// The save body for a finished game, handed out once per game.
    pub fn save_request(&mut self) -> Option<NewGame> {
        if self.saved {
            return None;
        }
        let outcome = self.finished.as_ref()?;
        let request = save_request(&self.game, outcome);
        self.saved = true;
        Some(request)
    }

    /// Prepares a full-game analysis. Discards the previous analysis.
    pub fn analysis_request(&mut self) -> Option<AnalysisRequest> {
        if self.analysis_pending || self.game.ply_count() == 0 {
            return None;
        }
        self.review.clear();
        self.analysis_pending = true;
        self.status = "Analyzing game...".to_string();

        Some(AnalysisRequest {
            generation: self.generation,
            pgn: self.game.pgn(),
            perspective: self.human,
            depth: self.analysis_depth,
        })
    }

    pub fn apply_analysis(&mut self, generation: u64, reply: Result<Vec<EvalStep>>) -> bool {
        if generation != self.generation || !self.analysis_pending {
            return false;
        }
        self.analysis_pending = false;

        match reply {
            Ok(steps) => {
                let steps: Vec<AnalysisStep> = steps.iter().map(AnalysisStep::from).collect();
                self.status = format!("Analysis ready: {} moves. Step through the game to review.", steps.len());
                self.review.load(steps);
                true
            }
            Err(e) => {
                tracing::warn!("Analysis request failed: {}", e);
                self.status = ANALYSIS_FAILED.to_string();
                false
            }
        }
    }

    pub fn review_forward(&mut self) {
        self.review.step_forward();
    }

    pub fn review_backward(&mut self) {
        self.review.step_backward();
    }

    /// Jumps to the analysis step at `index`, e.g. a point clicked on the chart.
    pub fn review_go_to(&mut self, index: usize) {
        self.review.go_to(index);
    }

    pub fn review_start(&mut self) {
        self.review.go_to_start();
    }

    pub fn review_final(&mut self) {
        self.review.go_to_final();
    }

    /// Starts a coaching exchange about the displayed position.
    ///
    /// Returns `None` while an earlier question is still unanswered.
    pub fn ask(&mut self, question: Option<&str>) -> Option<CoachRequest> {
        let question = self.chat.begin(question)?;

        Some(CoachRequest {
            generation: self.generation,
            request: ExplainRequest {
                fen: self.displayed_fen(),
                history: self.game.pgn(),
                question,
            },
        })
    }

    pub fn apply_advice(&mut self, generation: u64, reply: Result<String>) -> bool {
        if generation != self.generation || !self.chat.is_busy() {
            return false;
        }
        if let Err(e) = &reply {
            tracing::warn!("Coach request failed: {}", e);
        }
        self.chat.finish(reply);
        true
    }

    pub fn replace_history(&mut self, records: Vec<SavedGame>) {
        self.history.replace(records);
    }

    /// Replaces the live game with a saved record.
    pub fn load_record(&mut self, id: &str) -> Result<()> {
        let record = self
            .history
            .find(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("game {}", id)))?;
        let game = GameState::from_pgn(&record.pgn)?;

        self.generation += 1;
        self.game = game;
        self.review.clear();
        self.engine_pending = false;
        self.analysis_pending = false;
        self.finished = if record.is_finished() {
            Some(GameOutcome::Recorded { result: record.result.clone() })
        } else {
            self.game.outcome()
        };
        self.saved = self.finished.is_some();
        self.status = match &self.finished {
            Some(outcome) => outcome.describe(),
            None => self.turn_status(),
        };

        let when = if record.date.is_empty() { "undated".to_string() } else { record.date.clone() };
        self.chat.reset(format!(
            "Loaded game {} ({}, {}). Ask me about any position.",
            record.id, record.result, when
        ));
        tracing::info!(id = %record.id, "Loaded saved game");
        Ok(())
    }

    /// File name and contents of a PGN download
    pub fn export_pgn(&self, now: NaiveDateTime) -> (String, String) {
        let (white, black) = match self.human {
            Color::White => ("You", "Engine"),
            Color::Black => ("Engine", "You"),
        };
        let result = self
            .finished
            .as_ref()
            .map(|o| o.result_code().to_string())
            .unwrap_or_else(|| "*".to_string());

        let headers = PgnHeaders {
            event: "Casual game".to_string(),
            site: "Chess Coach".to_string(),
            date: now.format("%Y.%m.%d").to_string(),
            white: white.to_string(),
            black: black.to_string(),
            result,
        };

        let filename = format!("chess-game-{}.pgn", now.format("%Y%m%d-%H%M%S"));
        let pgn = write_pgn(&headers, self.game.start_fen(), &self.game.movetext());
        (filename, pgn)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            generation: self.generation,
            fen: self.displayed_fen(),
            live_fen: self.game.fen(),
            pgn: self.game.pgn(),
            human_color: color_name(self.human),
            turn: color_name(self.game.turn()),
            status: self.status.clone(),
            moves: self.game.moves().to_vec(),
            move_pairs: self.game.move_pairs(),
            outcome: self.finished.clone(),
            result: self.finished.as_ref().map(|o| o.result_code().to_string()),
            review_index: self.review.index(),
            steps: self.review.steps().to_vec(),
            scores: self.review.scores(),
            chat: self.chat.messages().to_vec(),
            chat_busy: self.chat.is_busy(),
            engine_pending: self.engine_pending,
            analysis_pending: self.analysis_pending,
            can_change_color: self.can_change_color(),
            history: self.history.records().to_vec(),
            history_loaded: self.history.is_loaded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RecordId;
    use crate::chat::{ChatRole, COACH_UNAVAILABLE};
    use chrono::NaiveDate;

    fn eval_steps(game: &GameState) -> Vec<EvalStep> {
        game.moves()
            .iter()
            .enumerate()
            .map(|(i, m)| EvalStep {
                move_number: i as u32 + 1,
                fen: m.fen_after.clone(),
                score: Some(0.1 * i as f64),
                score_for: None,
            })
            .collect()
    }

    fn play_pair(session: &mut Session, from: Square, to: Square, reply: &str) {
        assert!(session.try_human_move(from, to).is_accepted());
        let req = session.opponent_request().unwrap();
        session.apply_opponent_move(req.generation, Ok(Some(reply.to_string())));
    }

    #[test]
    fn test_e4_hands_turn_to_engine() {
        let mut session = Session::default();
        let outcome = session.try_human_move(Square::E2, Square::E4);
        assert_eq!(outcome, MoveOutcome::Played { game_over: false });
        assert_eq!(session.game().turn(), Color::Black);

        let req = session.opponent_request().unwrap();
        assert_eq!(req.fen, "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
        assert_eq!(req.depth, DEFAULT_ENGINE_DEPTH);
        assert!(session.engine_pending());
        assert!(session.opponent_request().is_none());

        let reply = session.apply_opponent_move(req.generation, Ok(Some("e7e5".into())));
        assert_eq!(reply, OpponentReply::Played { game_over: false });
        assert_eq!(session.game().pgn(), "1. e4 e5");
        assert_eq!(session.status(), "Your turn (white).");
    }

    #[test]
    fn test_move_out_of_turn_rejected() {
        let mut session = Session::default();
        session.new_game(Color::Black);

        let before = session.game().fen();
        assert_eq!(
            session.try_human_move(Square::E2, Square::E4),
            MoveOutcome::Rejected(Rejection::NotYourTurn)
        );
        assert_eq!(session.game().fen(), before);
    }

    #[test]
    fn test_illegal_move_rejected_silently() {
        let mut session = Session::default();
        let status = session.status().to_string();
        assert_eq!(
            session.try_human_move(Square::E2, Square::D5),
            MoveOutcome::Rejected(Rejection::Illegal)
        );
        assert_eq!(session.status(), status);
        assert_eq!(session.game().ply_count(), 0);
    }

    #[test]
    fn test_review_mode_blocks_moves() {
        let mut session = Session::default();
        play_pair(&mut session, Square::E2, Square::E4, "e7e5");

        let req = session.analysis_request().unwrap();
        assert_eq!(req.perspective, Color::White);
        assert_eq!(req.depth, DEFAULT_ANALYSIS_DEPTH);
        let steps = eval_steps(session.game());
        assert!(session.apply_analysis(req.generation, Ok(steps)));

        session.review_start();
        let live = session.game().fen();
        assert_eq!(
            session.try_human_move(Square::G1, Square::F3),
            MoveOutcome::Rejected(Rejection::ReviewActive)
        );
        assert_eq!(session.game().fen(), live);

        session.review_final();
        assert!(session.try_human_move(Square::G1, Square::F3).is_accepted());
    }

    #[test]
    fn test_ten_ply_analysis_review() {
        let mut session = Session::default();
        let replies = ["e7e5", "b8c6", "g8f6", "f8c5", "d7d6"];
        let moves = [
            (Square::E2, Square::E4),
            (Square::G1, Square::F3),
            (Square::F1, Square::C4),
            (Square::D2, Square::D3),
            (Square::C2, Square::C3),
        ];
        for ((from, to), reply) in moves.iter().zip(replies) {
            play_pair(&mut session, *from, *to, reply);
        }
        assert_eq!(session.game().ply_count(), 10);

        let req = session.analysis_request().unwrap();
        let steps = eval_steps(session.game());
        session.apply_analysis(req.generation, Ok(steps.clone()));
        assert_eq!(session.review().len(), 10);
        assert_eq!(session.review().index(), None);
        assert_eq!(session.displayed_fen(), session.game().fen());

        session.review_start();
        assert_eq!(session.displayed_fen(), steps[0].fen);
        assert_ne!(session.displayed_fen(), session.game().fen());
    }

    #[test]
    fn test_review_go_to_clamps() {
        let mut session = Session::default();
        session.review_go_to(3);
        assert_eq!(session.review().index(), None);

        play_pair(&mut session, Square::E2, Square::E4, "e7e5");
        let req = session.analysis_request().unwrap();
        let steps = eval_steps(session.game());
        session.apply_analysis(req.generation, Ok(steps.clone()));

        session.review_go_to(1);
        assert_eq!(session.review().index(), Some(1));
        assert_eq!(session.displayed_fen(), steps[1].fen);
        session.review_go_to(40);
        assert_eq!(session.review().index(), Some(1));
    }

    #[test]
    fn test_stale_analysis_dropped_after_new_game() {
        let mut session = Session::default();
        play_pair(&mut session, Square::E2, Square::E4, "e7e5");
        let req = session.analysis_request().unwrap();
        let steps = eval_steps(session.game());

        session.new_game(Color::White);
        let status = session.status().to_string();
        assert!(!session.apply_analysis(req.generation, Ok(steps)));
        assert!(session.review().is_empty());
        assert!(!session.analysis_pending());
        assert_eq!(session.status(), status);
    }

    #[test]
    fn test_analysis_failure_status() {
        let mut session = Session::default();
        play_pair(&mut session, Square::D2, Square::D4, "d7d5");
        let req = session.analysis_request().unwrap();
        assert!(!session.apply_analysis(req.generation, Err(Error::Backend("502".into()))));
        assert_eq!(session.status(), ANALYSIS_FAILED);
        assert!(!session.analysis_pending());
    }

    #[test]
    fn test_engine_failure_sets_connection_error() {
        let mut session = Session::default();
        session.try_human_move(Square::E2, Square::E4);
        let req = session.opponent_request().unwrap();

        let reply = session.apply_opponent_move(req.generation, Err(Error::Backend("down".into())));
        assert_eq!(reply, OpponentReply::Failed);
        assert_eq!(session.status(), CONNECTION_ERROR);
        assert!(!session.engine_pending());
    }

    #[test]
    fn test_undecodable_engine_move_is_a_failure() {
        let mut session = Session::default();
        session.try_human_move(Square::E2, Square::E4);
        let req = session.opponent_request().unwrap();

        let reply = session.apply_opponent_move(req.generation, Ok(Some("e2e4".into())));
        assert_eq!(reply, OpponentReply::Failed);
        assert_eq!(session.game().ply_count(), 1);
    }

    #[test]
    fn test_missing_engine_move_is_skipped() {
        let mut session = Session::default();
        session.try_human_move(Square::E2, Square::E4);
        let req = session.opponent_request().unwrap();

        assert_eq!(session.apply_opponent_move(req.generation, Ok(None)), OpponentReply::NoMove);
        assert_eq!(session.game().ply_count(), 1);
        assert!(!session.engine_pending());
    }

    #[test]
    fn test_stale_engine_reply_dropped_after_new_game() {
        let mut session = Session::default();
        session.try_human_move(Square::E2, Square::E4);
        let req = session.opponent_request().unwrap();

        session.new_game(Color::White);
        let reply = session.apply_opponent_move(req.generation, Ok(Some("e7e5".into())));
        assert_eq!(reply, OpponentReply::Stale);
        assert_eq!(session.game().ply_count(), 0);
    }

    #[test]
    fn test_engine_checkmate_finishes_game() {
        let mut session = Session::default();
        play_pair(&mut session, Square::F2, Square::F3, "e7e5");
        session.try_human_move(Square::G2, Square::G4);
        let req = session.opponent_request().unwrap();

        let reply = session.apply_opponent_move(req.generation, Ok(Some("d8h4".into())));
        assert_eq!(reply, OpponentReply::Played { game_over: true });
        assert_eq!(session.status(), "Checkmate! Black wins.");

        let save = session.save_request().unwrap();
        assert_eq!(save.result, "0-1");
        assert!(session.save_request().is_none());
        assert_eq!(
            session.try_human_move(Square::A2, Square::A3),
            MoveOutcome::Rejected(Rejection::GameOver)
        );
    }

    #[test]
    fn test_color_locked_after_first_move() {
        let mut session = Session::default();
        assert!(session.set_human_color(Color::Black).is_ok());
        assert_eq!(session.human_color(), Color::Black);
        assert!(session.set_human_color(Color::White).is_ok());

        session.try_human_move(Square::E2, Square::E4);
        assert!(matches!(session.set_human_color(Color::Black), Err(Error::ColorLocked)));
        assert_eq!(session.human_color(), Color::White);
    }

    #[test]
    fn test_resign() {
        let mut session = Session::default();
        assert!(!session.resign());

        play_pair(&mut session, Square::E2, Square::E4, "e7e5");
        assert!(session.resign());
        assert_eq!(session.outcome().unwrap().result_code(), "0-1");
        assert!(!session.resign());
        assert!(session.save_request().is_some());
    }

    #[test]
    fn test_ask_uses_displayed_position() {
        let mut session = Session::default();
        play_pair(&mut session, Square::E2, Square::E4, "e7e5");
        let req = session.analysis_request().unwrap();
        let steps = eval_steps(session.game());
        session.apply_analysis(req.generation, Ok(steps.clone()));
        session.review_start();

        let coach = session.ask(None).unwrap();
        assert_eq!(coach.request.fen, steps[0].fen);
        assert_eq!(coach.request.history, "1. e4 e5");
        assert_eq!(coach.request.question, None);

        assert!(session.ask(Some("again?")).is_none());
        assert!(session.apply_advice(coach.generation, Ok("Control the center.".into())));
        assert!(!session.chat().is_busy());
    }

    #[test]
    fn test_coach_failure_message() {
        let mut session = Session::default();
        let coach = session.ask(Some("What now?")).unwrap();
        session.apply_advice(coach.generation, Err(Error::Backend("500".into())));

        let last = session.chat().messages().last().unwrap();
        assert_eq!(last.role, ChatRole::Coach);
        assert_eq!(last.text, COACH_UNAVAILABLE);
        assert!(!session.chat().is_busy());
    }

    #[test]
    fn test_chat_survives_moves_but_not_new_game() {
        let mut session = Session::default();
        let coach = session.ask(Some("Plan?")).unwrap();
        session.apply_advice(coach.generation, Ok("Take the center.".into()));
        play_pair(&mut session, Square::E2, Square::E4, "e7e5");
        assert_eq!(session.chat().messages().len(), 3);

        session.new_game(Color::White);
        assert_eq!(session.chat().messages().len(), 1);
    }

    #[test]
    fn test_stale_advice_keeps_new_busy_flag() {
        let mut session = Session::default();
        let old = session.ask(Some("first")).unwrap();
        session.new_game(Color::White);
        let fresh = session.ask(Some("second")).unwrap();

        assert!(!session.apply_advice(old.generation, Ok("late".into())));
        assert!(session.chat().is_busy());
        assert!(session.apply_advice(fresh.generation, Ok("on time".into())));
    }

    #[test]
    fn test_load_record() {
        let mut session = Session::default();
        session.replace_history(vec![SavedGame {
            id: RecordId::Number(3),
            pgn: "1. e4 e5 2. Nf3".into(),
            result: "1-0".into(),
            date: "2024-02-02".into(),
        }]);
        play_pair(&mut session, Square::D2, Square::D4, "d7d5");
        let generation = session.generation();

        session.load_record("3").unwrap();
        assert_eq!(session.game().ply_count(), 3);
        assert!(session.generation() > generation);
        assert!(session.is_over());
        assert!(session.save_request().is_none());
        assert_eq!(session.chat().messages().len(), 1);
        assert!(session.chat().messages()[0].text.contains("Loaded game 3"));

        assert!(matches!(session.load_record("99"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_export_pgn() {
        let mut session = Session::default();
        play_pair(&mut session, Square::E2, Square::E4, "c7c5");
        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(14, 30, 5)
            .unwrap();

        let (name, pgn) = session.export_pgn(now);
        assert_eq!(name, "chess-game-20240501-143005.pgn");
        assert!(pgn.contains("[Date \"2024.05.01\"]"));
        assert!(pgn.contains("[White \"You\"]"));
        assert!(pgn.trim_end().ends_with("1. e4 c5 *"));
    }

    #[test]
    fn test_view_snapshot() {
        let mut session = Session::default();
        session.try_human_move(Square::E2, Square::E4);
        let view = session.view();

        assert_eq!(view.turn, "black");
        assert_eq!(view.human_color, "white");
        assert_eq!(view.moves.len(), 1);
        assert_eq!(view.move_pairs[0].white.as_deref(), Some("e4"));
        assert!(!view.can_change_color);
        assert!(!view.history_loaded);
        assert!(serde_json::to_string(&view).is_ok());
    }
}
