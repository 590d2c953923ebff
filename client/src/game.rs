use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cellsweep_common::{
    models::{BoardParams, Cell, Pos},
    protocol::{ClientMessage, ServerMessage},
};
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{CellsweepClient, CellsweepWebSocket, Result};

/// Events emitted by the cellsweep game
#[derive(Debug, Clone)]
pub enum GameEvent {
    /// The game board was updated with new cell states
    BoardUpdated {
        /// List of cell positions that changed
        changed_positions: Vec<Pos>,
    },
    /// The set of highlighted cells changed (chord preview)
    HighlightChanged { highlighted: Vec<Pos> },
    /// Game status changed (won/lost)
    GameStatusChanged { won: bool, lost: bool },
    /// Game was initialized or restarted
    GameInitialized {
        width: usize,
        height: usize,
        mines: usize,
    },
    /// Connection was lost
    ConnectionLost,
}

/// Local mirror of a cellsweep board, kept in sync from server updates
#[derive(Debug, Clone)]
pub struct GameState {
    pub width: usize,
    pub height: usize,
    pub mines: usize,
    pub board: Vec<Vec<Cell>>,
    pub highlighted: HashSet<Pos>,
    pub game_over: bool,
    pub won: bool,
}

impl GameState {
    /// Create a new game state
    pub fn new(width: usize, height: usize, mines: usize, board: Vec<Vec<Cell>>) -> Self {
        Self {
            width,
            height,
            mines,
            board,
            highlighted: HashSet::new(),
            game_over: false,
            won: false,
        }
    }

    /// Get the cell at the specified position
    pub fn get_cell(&self, pos: Pos) -> Option<&Cell> {
        if pos.x < self.width && pos.y < self.height {
            self.board.get(pos.y)?.get(pos.x)
        } else {
            None
        }
    }

    /// Update a cell at the specified position
    pub fn set_cell(&mut self, pos: Pos, cell: Cell, highlight: bool) {
        if pos.x < self.width
            && pos.y < self.height
            && let Some(row) = self.board.get_mut(pos.y)
            && let Some(cell_ref) = row.get_mut(pos.x)
        {
            *cell_ref = cell;
            if highlight {
                self.highlighted.insert(pos);
            } else {
                self.highlighted.remove(&pos);
            }
        }
    }

    /// Check whether the cell at `pos` carries the chord preview highlight
    pub fn is_highlighted(&self, pos: Pos) -> bool {
        self.highlighted.contains(&pos)
    }

    /// Count the number of cells in each state
    pub fn count_cells(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for row in &self.board {
            for cell in row {
                let state = match cell {
                    Cell::Hidden => "hidden",
                    Cell::Marked => "marked",
                    Cell::Flagged => "flagged",
                    Cell::Revealed { .. } => "revealed",
                    Cell::Mine => "mine",
                };
                *counts.entry(state.to_string()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Check if the game is in a completed state (won or lost)
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Check if the player has won
    pub fn is_won(&self) -> bool {
        self.won
    }
}

/// Connection state - all fields are required when connected
struct ConnectionState {
    websocket_sender: mpsc::UnboundedSender<ClientMessage>,
    game_id: String,
    background_task: JoinHandle<()>,
}

impl ConnectionState {
    /// Send a message through the WebSocket connection
    fn send_message(&self, message: ClientMessage) -> Result<()> {
        self.websocket_sender
            .send(message)
            .map_err(|_| "WebSocket sender closed")?;
        Ok(())
    }

    /// Get the game ID
    fn get_game_id(&self) -> &String {
        &self.game_id
    }

    /// Abort the background task and wait for it to finish
    async fn abort_and_wait_background_task(self) {
        self.background_task.abort();
        let _ = self.background_task.await;
    }
}

/// High-level cellsweep game client that manages game state locally
pub struct CellsweepGame {
    client: CellsweepClient,
    connection_state: Arc<RwLock<Option<ConnectionState>>>,
    event_sender: Arc<RwLock<Option<mpsc::UnboundedSender<GameEvent>>>>,
    state: Arc<RwLock<Option<GameState>>>,
}

impl CellsweepGame {
    /// Create a new game instance
    pub fn new(server_url: &str) -> Result<Self> {
        let client = CellsweepClient::new(server_url)?;
        Ok(Self {
            client,
            connection_state: Arc::new(RwLock::new(None)),
            event_sender: Arc::new(RwLock::new(None)),
            state: Arc::new(RwLock::new(None)),
        })
    }

    /// Subscribe to game events. Returns a receiver for game events.
    pub async fn subscribe_to_events(&self) -> mpsc::UnboundedReceiver<GameEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut event_sender = self.event_sender.write().await;
        *event_sender = Some(sender);
        receiver
    }

    /// Start a new game with the specified parameters
    pub async fn start_game(&self, params: BoardParams) -> Result<()> {
        info!(
            "Starting new game: {}x{} with {} mines",
            params.width, params.height, params.mines
        );

        // Create the game via HTTP API
        let game_id = self.client.create_game(params).await?;
        info!("Created game with ID: {}", game_id);

        self.join_game(game_id).await
    }

    pub async fn join_game(&self, game_id: String) -> Result<()> {
        info!("Joining game with ID: {}", game_id);

        let mut conn_state = self.connection_state.write().await;

        // Stop any existing background task
        if let Some(existing_conn) = conn_state.take() {
            existing_conn.abort_and_wait_background_task().await;
        }
        self.state.write().await.take();

        // Connect to the game via WebSocket
        let ws_url = self.client.websocket_url(&game_id)?;
        let websocket = CellsweepWebSocket::connect(&ws_url).await?;
        let websocket_sender = websocket.get_sender();

        info!("Connected to game with ID: {}", game_id);

        // Start background message listener
        let background_task = self.start_background_listener(websocket);

        // Create new connection state
        *conn_state = Some(ConnectionState {
            websocket_sender,
            game_id,
            background_task,
        });

        Ok(())
    }

    /// Send a message to the connected game
    async fn send_client_message(&self, message: ClientMessage) -> Result<()> {
        let conn_state = self.connection_state.read().await;

        if let Some(ref conn) = *conn_state {
            conn.send_message(message)?;
        } else {
            return Err("Not connected to a game. Call start_game() first.".into());
        }

        Ok(())
    }

    /// Open a cell at the specified position
    pub async fn open(&self, pos: Pos) -> Result<()> {
        debug!("Opening cell at ({}, {})", pos.x, pos.y);

        let message = ClientMessage::Open { pos };
        self.send_client_message(message).await
    }

    /// Cycle the mark on a cell at the specified position
    pub async fn mark(&self, pos: Pos) -> Result<()> {
        debug!("Marking cell at ({}, {})", pos.x, pos.y);

        let message = ClientMessage::Mark { pos };
        self.send_client_message(message).await
    }

    /// Chord: open all unflagged neighbors of a revealed cell
    pub async fn open_surrounding(&self, pos: Pos) -> Result<()> {
        debug!("Opening cells surrounding ({}, {})", pos.x, pos.y);

        let message = ClientMessage::OpenSurrounding { pos };
        self.send_client_message(message).await
    }

    /// Toggle the chord preview highlight around the specified position
    pub async fn highlight_surrounding(&self, pos: Pos) -> Result<()> {
        debug!("Highlighting cells surrounding ({}, {})", pos.x, pos.y);

        let message = ClientMessage::HighlightSurrounding { pos };
        self.send_client_message(message).await
    }

    /// Restart the game with new parameters
    pub async fn restart(&self, params: BoardParams) -> Result<()> {
        info!(
            "Restarting game with new parameters: {}x{} with {} mines",
            params.width, params.height, params.mines
        );

        let message = ClientMessage::Restart { params };
        self.send_client_message(message).await
    }

    /// Get the current game state
    pub async fn get_state(&self) -> Option<GameState> {
        self.state.read().await.clone()
    }

    /// Get the game ID
    pub async fn get_game_id(&self) -> Option<String> {
        let conn_state = self.connection_state.read().await;
        conn_state.as_ref().map(|conn| conn.get_game_id().clone())
    }

    /// Check if we're connected to a game
    pub async fn is_connected(&self) -> bool {
        let conn_state = self.connection_state.read().await;
        conn_state.is_some()
    }

    /// Close the connection and clean up
    pub async fn disconnect(&self) -> Result<()> {
        let mut conn_state = self.connection_state.write().await;

        if let Some(conn) = conn_state.take() {
            conn.abort_and_wait_background_task().await;
        }

        // Clear event sender
        *self.event_sender.write().await = None;

        // Clear game state
        *self.state.write().await = None;

        info!("Disconnected from game");
        Ok(())
    }

    /// Start background WebSocket message listener
    fn start_background_listener(&self, mut websocket: CellsweepWebSocket) -> JoinHandle<()> {
        let state = self.state.clone();
        let event_sender = self.event_sender.clone();

        tokio::spawn(async move {
            Self::background_message_handler(&mut websocket, state, event_sender).await;
        })
    }

    /// Background task that handles incoming WebSocket messages
    async fn background_message_handler(
        websocket: &mut CellsweepWebSocket,
        state: Arc<RwLock<Option<GameState>>>,
        event_sender: Arc<RwLock<Option<mpsc::UnboundedSender<GameEvent>>>>,
    ) {
        loop {
            let message = match websocket.receive_message().await {
                Ok(Some(msg)) => msg,
                Ok(None) => {
                    // Connection closed
                    if let Some(ref sender) = *event_sender.read().await {
                        let _ = sender.send(GameEvent::ConnectionLost);
                    }
                    break;
                }
                Err(e) => {
                    warn!("Error receiving WebSocket message: {}", e);
                    if let Some(ref sender) = *event_sender.read().await {
                        let _ = sender.send(GameEvent::ConnectionLost);
                    }
                    break;
                }
            };

            match message {
                ServerMessage::Init {
                    width,
                    height,
                    mines,
                    board,
                } => {
                    info!(
                        "Received game initialization: {}x{} with {} mines",
                        width, height, mines
                    );

                    let new_state = GameState::new(width, height, mines, board);
                    *state.write().await = Some(new_state);

                    if let Some(ref sender) = *event_sender.read().await {
                        let _ = sender.send(GameEvent::GameInitialized {
                            width,
                            height,
                            mines,
                        });
                    }
                }
                ServerMessage::Update { updates, won, lost } => {
                    debug!(
                        "Received update: {} cells updated, won: {}, lost: {}",
                        updates.len(),
                        won,
                        lost
                    );

                    let changed_positions: Vec<Pos> = updates.iter().map(|u| u.pos).collect();
                    let status_changed;
                    let highlight_changed;
                    let highlighted;

                    {
                        let mut state_guard = state.write().await;
                        if let Some(ref mut game_state) = *state_guard {
                            let old_won = game_state.won;
                            let old_game_over = game_state.game_over;
                            let old_highlighted = game_state.highlighted.clone();

                            // Apply updates to local board
                            for update in updates {
                                game_state.set_cell(update.pos, update.value, update.highlight);
                            }

                            // Update game status
                            game_state.won = won;
                            game_state.game_over = won || lost;

                            status_changed =
                                game_state.won != old_won || game_state.game_over != old_game_over;
                            highlight_changed = game_state.highlighted != old_highlighted;
                            highlighted = game_state.highlighted.iter().copied().collect();
                        } else {
                            status_changed = false;
                            highlight_changed = false;
                            highlighted = Vec::new();
                        }
                    }

                    if let Some(ref sender) = *event_sender.read().await {
                        if !changed_positions.is_empty() {
                            let _ = sender.send(GameEvent::BoardUpdated { changed_positions });
                        }

                        if highlight_changed {
                            let _ = sender.send(GameEvent::HighlightChanged { highlighted });
                        }

                        if status_changed {
                            let _ = sender.send(GameEvent::GameStatusChanged { won, lost });
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_state(width: usize, height: usize) -> GameState {
        let board = vec![vec![Cell::Hidden; width]; height];
        GameState::new(width, height, 10, board)
    }

    #[test]
    fn set_cell_updates_board_and_highlight() {
        let mut state = empty_state(4, 4);
        let pos = Pos { x: 2, y: 1 };

        state.set_cell(pos, Cell::Revealed { adjacent: 3 }, false);
        assert_eq!(state.get_cell(pos), Some(&Cell::Revealed { adjacent: 3 }));
        assert!(!state.is_highlighted(pos));

        state.set_cell(pos, Cell::Hidden, true);
        assert!(state.is_highlighted(pos));

        state.set_cell(pos, Cell::Hidden, false);
        assert!(!state.is_highlighted(pos));
    }

    #[test]
    fn out_of_bounds_access_is_ignored() {
        let mut state = empty_state(2, 2);
        let outside = Pos { x: 5, y: 5 };

        assert_eq!(state.get_cell(outside), None);
        state.set_cell(outside, Cell::Mine, true);
        assert!(!state.is_highlighted(outside));
    }

    #[test]
    fn count_cells_tracks_states() {
        let mut state = empty_state(3, 3);
        state.set_cell(Pos { x: 0, y: 0 }, Cell::Flagged, false);
        state.set_cell(Pos { x: 1, y: 0 }, Cell::Revealed { adjacent: 0 }, false);
        state.set_cell(Pos { x: 2, y: 0 }, Cell::Mine, false);

        let counts = state.count_cells();
        assert_eq!(counts.get("hidden"), Some(&6));
        assert_eq!(counts.get("flagged"), Some(&1));
        assert_eq!(counts.get("revealed"), Some(&1));
        assert_eq!(counts.get("mine"), Some(&1));
    }
}
