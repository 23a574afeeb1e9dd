//! In-memory copy of the saved-games list

use serde::Serialize;

use crate::api::{NewGame, SavedGame};
use crate::game::{GameOutcome, GameState};

/// A saved game plus its length, counted once when the list arrives
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub record: SavedGame,
    pub plies: usize,
}

impl From<SavedGame> for HistoryEntry {
    fn from(record: SavedGame) -> Self {
        let plies = match GameState::from_pgn(&record.pgn) {
            Ok(game) => game.ply_count(),
            Err(e) => {
                tracing::warn!(id = %record.id, "Unreadable PGN in saved game: {}", e);
                0
            }
        };
        Self { record, plies }
    }
}

/// Last list fetched from `GET /games`.
///
/// Never appended to locally: after a save the whole list is fetched again.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    records: Vec<HistoryEntry>,
    loaded: bool,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, records: Vec<SavedGame>) {
        self.records = records.into_iter().map(HistoryEntry::from).collect();
        self.loaded = true;
    }

    pub fn records(&self) -> &[HistoryEntry] {
        &self.records
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn find(&self, id: &str) -> Option<&SavedGame> {
        self.records
            .iter()
            .map(|entry| &entry.record)
            .find(|r| r.id.to_string() == id)
    }
}

/// The body posted to `POST /games` for a finished game
pub fn save_request(game: &GameState, outcome: &GameOutcome) -> NewGame {
    NewGame {
        pgn: game.pgn(),
        result: outcome.result_code().to_string(),
        fen: game.fen(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RecordId;
    use shakmaty::Color;

    fn record(id: i64) -> SavedGame {
        SavedGame {
            id: RecordId::Number(id),
            pgn: "1. e4 e5".into(),
            result: "1-0".into(),
            date: "2024-03-01T10:00:00".into(),
        }
    }

    #[test]
    fn test_replace_and_find() {
        let mut store = HistoryStore::new();
        assert!(!store.is_loaded());

        store.replace(vec![record(1), record(2)]);
        assert!(store.is_loaded());
        assert_eq!(store.records().len(), 2);
        assert!(store.find("2").is_some());
        assert!(store.find("3").is_none());
    }

    #[test]
    fn test_plies_counted_on_replace() {
        let mut store = HistoryStore::new();
        let mut broken = record(2);
        broken.pgn = "1. e5".into();
        store.replace(vec![record(1), broken]);

        assert_eq!(store.records()[0].plies, 2);
        assert_eq!(store.records()[1].plies, 0);
    }

    #[test]
    fn test_save_request() {
        let game = GameState::new().play_uci("e2e4").unwrap();
        let req = save_request(&game, &GameOutcome::resignation(Color::Black));

        assert_eq!(req.pgn, "1. e4");
        assert_eq!(req.result, "0-1");
        assert_eq!(req.fen, game.fen());
    }
}
