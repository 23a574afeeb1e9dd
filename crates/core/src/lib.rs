//! Chess Coach Core Library
//!
//! Client-side state for playing against a remote engine, reviewing a
//! finished game and talking to a remote coach.

pub mod api;
pub mod chat;
pub mod config;
pub mod controller;
pub mod error;
pub mod game;
pub mod history;
pub mod review;
pub mod session;

pub use api::{ApiClient, Backend};
pub use config::Config;
pub use controller::Controller;
pub use error::{Error, Result};
pub use game::{GameOutcome, GameState};
pub use session::{MoveOutcome, Rejection, Session, SessionView};
