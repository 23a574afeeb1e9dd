//! Analysis, review navigation, coaching chat and saved games

use axum::{
    extract::{Path, State},
    response::Redirect,
    Form,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::AppError;
use crate::AppState;

#[derive(Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub question: Option<String>,
}

pub async fn analyze(State(state): State<Arc<AppState>>) -> Redirect {
    state.coach.analyze().await;
    Redirect::to("/")
}

pub async fn review_step(
    State(state): State<Arc<AppState>>,
    Path(step): Path<String>,
) -> Result<Redirect, AppError> {
    let mut session = state.coach.session();
    match step.as_str() {
        "start" => session.review_start(),
        "back" => session.review_backward(),
        "forward" => session.review_forward(),
        "final" => session.review_final(),
        other => return Err(AppError::NotFound(format!("Unknown review step: {}", other))),
    }
    Ok(Redirect::to("/"))
}

/// Jumps straight to one analysis step, from the chart or the step table.
pub async fn review_goto(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Redirect {
    state.coach.session().review_go_to(index);
    Redirect::to("/")
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ChatForm>,
) -> Redirect {
    if !state.coach.ask(form.question.as_deref()).await {
        tracing::debug!("Coach busy, question ignored");
    }
    Redirect::to("/#chat")
}

pub async fn refresh_history(State(state): State<Arc<AppState>>) -> Redirect {
    state.coach.refresh_history().await;
    Redirect::to("/#history")
}

pub async fn load_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    state.coach.load_record(&id).await?;
    Ok(Redirect::to("/"))
}
