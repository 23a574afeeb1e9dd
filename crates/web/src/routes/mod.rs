use askama::Template;
use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use shakmaty::Color;
use std::sync::Arc;

use chess_coach_core::chat::ChatRole;
use chess_coach_core::SessionView;

use crate::board::{board_rows, Cell};
use crate::error::AppError;
use crate::AppState;

pub mod coach;
pub mod play;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub title: String,
    pub status: String,
    pub fen: String,
    pub rows: Vec<Vec<Cell>>,
    pub human_color: String,
    pub can_change_color: bool,
    pub game_over: bool,
    pub reviewing: bool,
    pub review_label: String,
    pub moves: Vec<MoveRow>,
    pub steps: Vec<StepRow>,
    pub scores_json: String,
    pub review_index_json: String,
    pub chat: Vec<ChatRow>,
    pub chat_busy: bool,
    pub history: Vec<HistoryRow>,
    pub history_loaded: bool,
}

pub struct MoveRow {
    pub number: u32,
    pub white: String,
    pub black: String,
}

pub struct StepRow {
    pub index: usize,
    pub move_number: u32,
    pub score: String,
    pub active: bool,
}

pub struct ChatRow {
    pub role: &'static str,
    pub text: String,
}

pub struct HistoryRow {
    pub id: String,
    pub result: String,
    pub date: String,
    pub plies: usize,
}

fn move_rows(view: &SessionView) -> Vec<MoveRow> {
    view.move_pairs
        .iter()
        .map(|pair| MoveRow {
            number: pair.number,
            white: pair.white.clone().unwrap_or_else(|| "...".to_string()),
            black: pair.black.clone().unwrap_or_default(),
        })
        .collect()
}

fn format_score(score: f64) -> String {
    if score >= 0.0 {
        format!("+{:.2}", score)
    } else {
        format!("{:.2}", score)
    }
}

fn render_index(view: SessionView) -> Result<Html<String>, AppError> {
    let orientation = if view.human_color == "black" { Color::Black } else { Color::White };
    let last_move = match view.review_index {
        Some(_) => None,
        None => view.moves.last().map(|m| m.uci.as_str()),
    };
    let rows = board_rows(&view.fen, orientation, last_move)?;

    let review_label = match view.review_index {
        Some(i) => format!("Reviewing move {} of {}", i + 1, view.steps.len()),
        None if view.steps.is_empty() => String::new(),
        None => "Final position".to_string(),
    };

    let steps = view
        .steps
        .iter()
        .enumerate()
        .map(|(i, s)| StepRow {
            index: i,
            move_number: s.move_number,
            score: format_score(s.score),
            active: view.review_index == Some(i),
        })
        .collect();

    let chat = view
        .chat
        .iter()
        .map(|m| ChatRow {
            role: match m.role {
                ChatRole::User => "user",
                ChatRole::Coach => "coach",
            },
            text: m.text.clone(),
        })
        .collect();

    let history = view
        .history
        .iter()
        .map(|entry| HistoryRow {
            id: entry.record.id.to_string(),
            result: entry.record.result.clone(),
            date: entry.record.date.clone(),
            plies: entry.plies,
        })
        .collect();

    let template = IndexTemplate {
        title: "Chess Coach".to_string(),
        status: view.status.clone(),
        fen: view.fen.clone(),
        rows,
        human_color: view.human_color.to_string(),
        can_change_color: view.can_change_color,
        game_over: view.outcome.is_some(),
        reviewing: view.review_index.is_some(),
        review_label,
        moves: move_rows(&view),
        steps,
        scores_json: serde_json::to_string(&view.scores).unwrap_or_else(|_| "[]".to_string()),
        review_index_json: serde_json::to_string(&view.review_index).unwrap_or_else(|_| "null".to_string()),
        chat,
        chat_busy: view.chat_busy,
        history,
        history_loaded: view.history_loaded,
    };
    Ok(Html(template.render()?))
}

pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    render_index(state.coach.view())
}

pub async fn api_state(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    Json(state.coach.view())
}

/// PGN download named after the current time
pub async fn export_pgn(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = chrono::Local::now().naive_local();
    let (filename, pgn) = state.coach.session().export_pgn(now);

    (
        [
            (header::CONTENT_TYPE, "application/x-chess-pgn".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        pgn,
    )
}

pub async fn health() -> &'static str {
    "OK"
}
