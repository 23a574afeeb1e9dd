//! HTTP client for the engine, coach and history endpoints

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shakmaty::Color;
use std::time::Duration;

use super::types::*;
use super::Backend;
use crate::config::Config;
use crate::error::{Error, Result};

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_timeout(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: Response, what: &str) -> Result<Response> {
        if !response.status().is_success() {
            return Err(Error::Backend(format!(
                "{} failed: {} - {}",
                what,
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }
        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        let response = Self::check(response, what).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl Backend for ApiClient {
    async fn best_move(&self, fen: &str, depth: u8) -> Result<Option<String>> {
        let response = self
            .client
            .post(self.url("/analyze"))
            .json(&AnalyzeRequest { fen, depth })
            .send()
            .await?;

        let body: AnalyzeResponse = Self::read_json(response, "Engine move").await?;
        Ok(body.best_move.filter(|m| !m.trim().is_empty()))
    }

    async fn analyze_full(&self, pgn: &str, perspective: Color, depth: u8) -> Result<Vec<EvalStep>> {
        let response = self
            .client
            .post(self.url("/analyze_full"))
            .json(&AnalyzeFullRequest {
                pgn,
                perspective: color_name(perspective),
                depth,
            })
            .send()
            .await?;

        Self::read_json(response, "Game analysis").await
    }

    async fn explain(&self, request: &ExplainRequest) -> Result<String> {
        let response = self
            .client
            .post(self.url("/explain"))
            .json(request)
            .send()
            .await?;

        let body: ExplainResponse = Self::read_json(response, "Coach").await?;
        Ok(body.advice)
    }

    async fn list_games(&self) -> Result<Vec<SavedGame>> {
        let response = self.client.get(self.url("/games")).send().await?;
        Self::read_json(response, "Game list").await
    }

    async fn save_game(&self, game: &NewGame) -> Result<()> {
        let response = self
            .client
            .post(self.url("/games"))
            .json(game)
            .send()
            .await?;

        Self::check(response, "Save game").await?;
        Ok(())
    }
}
