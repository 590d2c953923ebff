//! Cellsweep Client Library
//!
//! This library provides a Rust client for the cellsweep multiplayer server,
//! supporting both HTTP API calls and WebSocket connections for real-time gameplay.
//!
//! ## Usage
//!
//! ### High-Level Interface (Recommended)
//!
//! The `CellsweepGame` struct provides a high-level interface that manages game state
//! locally and provides convenient methods for all cell actions:
//!
//! ```rust,no_run
//! use cellsweep_client::{CellsweepGame, BoardParams, Pos};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let game = CellsweepGame::new("http://localhost:8000")?;
//!
//!     // Start a new game
//!     let params = BoardParams { width: 8, height: 8, mines: 10 };
//!     game.start_game(params).await?;
//!
//!     // Make moves
//!     game.open(Pos { x: 0, y: 0 }).await?;
//!     game.mark(Pos { x: 1, y: 1 }).await?;
//!     game.highlight_surrounding(Pos { x: 2, y: 2 }).await?;
//!     game.open_surrounding(Pos { x: 2, y: 2 }).await?;
//!
//!     // Check game state
//!     if let Some(state) = game.get_state().await {
//!         println!("Game over: {}, Won: {}", state.is_game_over(), state.is_won());
//!     }
//!
//!     game.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! ### Low-Level Interface
//!
//! For more control, you can use the low-level `CellsweepClient` and `CellsweepWebSocket`
//! directly:
//!
//! ```rust,no_run
//! use cellsweep_client::{CellsweepClient, CellsweepWebSocket, BoardParams, ClientMessage, Pos};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let client = CellsweepClient::new("http://localhost:8000")?;
//!     let game_id = client.create_game(BoardParams { width: 8, height: 8, mines: 10 }).await?;
//!
//!     let ws_url = client.websocket_url(&game_id)?;
//!     let mut ws = CellsweepWebSocket::connect(&ws_url).await?;
//!
//!     // Receive initial state
//!     if let Some(message) = ws.receive_message().await? {
//!         println!("Received: {:?}", message);
//!     }
//!
//!     // Send actions manually
//!     ws.send_message(ClientMessage::Open { pos: Pos { x: 0, y: 0 } }).await?;
//!
//!     ws.close().await?;
//!     Ok(())
//! }
//! ```

mod client;
mod game;
mod websocket;

pub use client::CellsweepClient;
pub use game::{CellsweepGame, GameEvent, GameState};
pub use websocket::CellsweepWebSocket;

// Re-export common types for convenience
pub use cellsweep_common::{models::*, protocol::*};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
