use cellsweep_common::models::{BoardParams, CreateResponse};
use reqwest::Client;
use url::Url;

use crate::Result;

/// HTTP client for the cellsweep server API
pub struct CellsweepClient {
    client: Client,
    base_url: Url,
}

impl CellsweepClient {
    /// Create a new client connecting to the specified server URL
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = Client::new();

        Ok(Self { client, base_url })
    }

    /// Create a new game with the specified parameters
    /// Returns the game ID that can be used to connect via WebSocket
    pub async fn create_game(&self, params: BoardParams) -> Result<String> {
        let create_url = self.base_url.join("/create")?;

        let response = self.client.post(create_url).json(&params).send().await?;

        if !response.status().is_success() {
            return Err(format!("Failed to create game: {}", response.status()).into());
        }

        let create_response: CreateResponse = response.json().await?;
        Ok(create_response.id)
    }

    /// Get the WebSocket URL for a game
    pub fn websocket_url(&self, game_id: &str) -> Result<String> {
        let mut ws_url = self.base_url.clone();
        ws_url
            .set_scheme(match self.base_url.scheme() {
                "https" => "wss",
                _ => "ws",
            })
            .map_err(|_| "Failed to set WebSocket scheme")?;
        ws_url.set_path("/ws");
        ws_url.set_query(Some(&format!("id={}", game_id)));

        Ok(ws_url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn websocket_url_switches_scheme() {
        let client = CellsweepClient::new("http://localhost:8000").unwrap();
        assert_eq!(
            client.websocket_url("abc12").unwrap(),
            "ws://localhost:8000/ws?id=abc12"
        );

        let client = CellsweepClient::new("https://play.example.com").unwrap();
        assert_eq!(
            client.websocket_url("abc12").unwrap(),
            "wss://play.example.com/ws?id=abc12"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(CellsweepClient::new("not a url").is_err());
    }
}
