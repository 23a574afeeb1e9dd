//! Live game commands: moves, new game, side selection, resignation

use axum::{
    extract::State,
    response::Redirect,
    Form, Json,
};
use serde::{Deserialize, Serialize};
use shakmaty::{Color, Square};
use std::sync::Arc;

use chess_coach_core::{MoveOutcome, Rejection, SessionView};

use crate::error::AppError;
use crate::AppState;

#[derive(Deserialize)]
pub struct MoveForm {
    pub from: String,
    pub to: String,
}

#[derive(Deserialize)]
pub struct ColorForm {
    pub color: String,
}

/// Tells the board widget whether to keep the dropped piece or snap it back
#[derive(Serialize)]
pub struct MoveReply {
    pub ok: bool,
    pub reason: Option<Rejection>,
    pub fen: String,
    pub status: String,
}

pub fn parse_square(text: &str) -> Result<Square, AppError> {
    text.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid square: {}", text)))
}

pub fn parse_color(text: &str) -> Result<Color, AppError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "white" | "w" => Ok(Color::White),
        "black" | "b" => Ok(Color::Black),
        _ => Err(AppError::BadRequest(format!("Invalid color: {}", text))),
    }
}

async fn play(state: &AppState, form: &MoveForm) -> Result<MoveOutcome, AppError> {
    let from = parse_square(&form.from)?;
    let to = parse_square(&form.to)?;
    Ok(state.coach.play_move(from, to).await)
}

fn move_reply(outcome: MoveOutcome, view: SessionView) -> MoveReply {
    MoveReply {
        ok: outcome.is_accepted(),
        reason: match outcome {
            MoveOutcome::Rejected(reason) => Some(reason),
            MoveOutcome::Played { .. } => None,
        },
        fen: view.fen,
        status: view.status,
    }
}

pub async fn api_move(
    State(state): State<Arc<AppState>>,
    Json(form): Json<MoveForm>,
) -> Result<Json<MoveReply>, AppError> {
    let outcome = play(&state, &form).await?;
    Ok(Json(move_reply(outcome, state.coach.view())))
}

/// Fallback for browsers without scripting; illegal moves are ignored.
pub async fn form_move(
    State(state): State<Arc<AppState>>,
    Form(form): Form<MoveForm>,
) -> Result<Redirect, AppError> {
    play(&state, &form).await?;
    Ok(Redirect::to("/"))
}

pub async fn new_game(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ColorForm>,
) -> Result<Redirect, AppError> {
    let color = parse_color(&form.color)?;
    state.coach.new_game(color).await;
    Ok(Redirect::to("/"))
}

pub async fn set_color(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ColorForm>,
) -> Result<Redirect, AppError> {
    let color = parse_color(&form.color)?;
    state.coach.set_human_color(color).await?;
    Ok(Redirect::to("/"))
}

pub async fn resign(State(state): State<Arc<AppState>>) -> Redirect {
    state.coach.resign().await;
    Redirect::to("/")
}
