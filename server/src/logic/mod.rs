use std::{cmp::min, collections::HashMap, sync::Arc, time::Instant};

use dashmap::DashMap;
use rand::Rng;
use rocket::futures::{SinkExt, future::join_all, stream::SplitSink};
use rocket_ws::{Message, stream::DuplexStream};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use cellsweep_common::{
    models::{BoardParams, CellState, Pos},
    protocol::{CellUpdate, ServerMessage},
};

use crate::data::{Board, Cell};

pub type Games = Arc<DashMap<String, Arc<Mutex<Game>>>>;

pub struct Game {
    board: Board,
    streams: HashMap<Uuid, SplitSink<DuplexStream, Message>>,
    created_at: Instant,
    last_activity: Instant,
}

/// The four player-facing cell mutations.
///
/// The board aggregate implements these; each operation mutates cells in
/// place and pushes the changed cells into `updates` so the caller can
/// broadcast them.
pub trait CellActions {
    /// Reveal a single cell, flood-filling from zero-adjacent cells.
    fn open_cell(&mut self, pos: Pos, updates: &mut Vec<CellUpdate>);
    /// Toggle the chord preview highlight on the unrevealed neighbors of `pos`.
    fn highlight_surrounding_cells(&mut self, pos: Pos, updates: &mut Vec<CellUpdate>);
    /// Chord: open all unflagged neighbors once the flag count matches.
    fn open_surrounding_cells(&mut self, pos: Pos, updates: &mut Vec<CellUpdate>);
    /// Cycle an unrevealed cell through Hidden -> Flagged -> Marked -> Hidden.
    fn mark_cell(&mut self, pos: Pos, updates: &mut Vec<CellUpdate>);
}

fn validate_params(params: &mut BoardParams) {
    params.mines = min(params.mines, params.width * params.height)
}

fn generate_mines(params: &BoardParams) -> Vec<bool> {
    let mut mines = Vec::new();
    let mut rng = rand::rng();

    let mut mines_left = params.mines;
    let length = params.width * params.height;
    for cells_left in (1..=length).rev() {
        let value = rng.random_ratio(mines_left as u32, cells_left as u32);
        mines.push(value);
        if value {
            mines_left -= 1;
        }
    }

    mines
}

fn count_adjacent_mines(mines: &[bool], index: usize, params: &BoardParams) -> u8 {
    let x = index % params.width;
    let y = index / params.width;
    let mut count = 0;

    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }

            let new_x = x as i32 + dx;
            let new_y = y as i32 + dy;

            if new_x >= 0
                && new_x < params.width as i32
                && new_y >= 0
                && new_y < params.height as i32
            {
                let adj_index = (new_x as usize) + (new_y as usize) * params.width;
                if adj_index < mines.len() && mines[adj_index] {
                    count += 1;
                }
            }
        }
    }

    count
}

fn cells_from_mines(mines: &[bool], params: &BoardParams) -> Vec<Cell> {
    mines
        .iter()
        .enumerate()
        .map(|(i, mine)| Cell {
            x: i % params.width,
            y: i / params.width,
            mine: *mine,
            adjacent: count_adjacent_mines(mines, i, params),
            highlight: false,
            state: CellState::Hidden,
        })
        .collect()
}

fn generate_cells(params: &BoardParams) -> Vec<Cell> {
    let mines = generate_mines(params);
    cells_from_mines(&mines, params)
}

impl From<&Cell> for cellsweep_common::models::Cell {
    fn from(value: &Cell) -> Self {
        match value.state {
            CellState::Hidden => Self::Hidden,
            CellState::Marked => Self::Marked,
            CellState::Flagged => Self::Flagged,
            CellState::Revealed if value.mine => Self::Mine,
            CellState::Revealed => Self::Revealed {
                adjacent: value.adjacent,
            },
        }
    }
}

async fn send(stream: &mut SplitSink<DuplexStream, Message>, message: &ServerMessage) {
    if let Ok(text) = serde_json::to_string(message) {
        let _ = stream.send(Message::Text(text)).await;
    }
}

async fn broadcast(
    streams: &mut HashMap<Uuid, SplitSink<DuplexStream, Message>>,
    message: &ServerMessage,
) {
    let futures: Vec<_> = streams
        .iter_mut()
        .map(|(_, stream)| send(stream, message))
        .collect();

    join_all(futures).await;
}

impl Board {
    fn new(mut params: BoardParams) -> Self {
        validate_params(&mut params);
        Self {
            width: params.width,
            height: params.height,
            mines: params.mines,
            opened: 0,
            exploded: false,
            finished: false,
            highlight_anchor: None,
            cells: generate_cells(&params),
        }
    }

    fn init_message(&self) -> ServerMessage {
        ServerMessage::Init {
            width: self.width,
            height: self.height,
            mines: self.mines,
            board: self
                .cells
                .iter()
                .map(|cell| cell.into())
                .collect::<Vec<cellsweep_common::models::Cell>>()
                .chunks(self.width)
                .map(|chunk| chunk.to_vec())
                .collect(),
        }
    }

    fn has_won(&self) -> bool {
        self.width * self.height == self.mines + self.opened
    }

    fn validate_pos(&self, pos: &Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    fn reveal_mines(&mut self, updates: &mut Vec<CellUpdate>) {
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Pos { x, y };

                if let Some(cell) = self.cells.get_mut(pos.x + pos.y * self.width)
                    && cell.mine
                {
                    cell.state = CellState::Revealed;
                    updates.push(CellUpdate {
                        pos,
                        value: (&*cell).into(),
                        highlight: cell.highlight,
                    });
                }
            }
        }
    }

    fn open_recursive(&mut self, pos: Pos, updates: &mut Vec<CellUpdate>) {
        if !self.validate_pos(&pos) {
            return;
        }

        if let Some(cell) = self.cells.get_mut(pos.x + pos.y * self.width) {
            if cell.state == CellState::Revealed {
                return;
            }

            cell.state = CellState::Revealed;
            self.opened += 1;
            updates.push(CellUpdate {
                pos,
                value: (&*cell).into(),
                highlight: cell.highlight,
            });

            if cell.adjacent != 0 {
                return;
            }

            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }

                    self.open_recursive(
                        Pos {
                            x: (pos.x as i32 + dx) as usize,
                            y: (pos.y as i32 + dy) as usize,
                        },
                        updates,
                    );
                }
            }
        }
    }

    fn clear_highlights(&mut self, updates: &mut Vec<CellUpdate>) {
        for cell in self.cells.iter_mut() {
            if cell.highlight {
                cell.highlight = false;
                updates.push(CellUpdate {
                    pos: Pos {
                        x: cell.x,
                        y: cell.y,
                    },
                    value: (&*cell).into(),
                    highlight: false,
                });
            }
        }
        self.highlight_anchor = None;
    }

    fn count_flagged_neighbors(&self, pos: Pos) -> u8 {
        let mut count = 0;

        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }

                let new_x = pos.x as i32 + dx;
                let new_y = pos.y as i32 + dy;

                if new_x >= 0
                    && new_x < self.width as i32
                    && new_y >= 0
                    && new_y < self.height as i32
                    && let Some(cell) = self
                        .cells
                        .get((new_x as usize) + (new_y as usize) * self.width)
                    && cell.state == CellState::Flagged
                {
                    count += 1;
                }
            }
        }

        count
    }
}

impl CellActions for Board {
    fn open_cell(&mut self, pos: Pos, updates: &mut Vec<CellUpdate>) {
        if !self.validate_pos(&pos) || self.finished {
            return;
        }

        let Some(cell) = self.cells.get(pos.x + pos.y * self.width) else {
            return;
        };

        if cell.state == CellState::Flagged || cell.state == CellState::Revealed {
            return;
        }

        // Acting on the board dismisses any pending chord preview.
        self.clear_highlights(updates);

        if self.cells[pos.x + pos.y * self.width].mine {
            self.exploded = true;
            self.finished = true;
            self.reveal_mines(updates);
            return;
        }

        self.open_recursive(pos, updates);
        if self.has_won() {
            self.finished = true;
        }
    }

    fn highlight_surrounding_cells(&mut self, pos: Pos, updates: &mut Vec<CellUpdate>) {
        if !self.validate_pos(&pos) || self.finished {
            return;
        }

        let toggle_off = self.highlight_anchor == Some(pos);
        self.clear_highlights(updates);
        if toggle_off {
            return;
        }

        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }

                let new_x = pos.x as i32 + dx;
                let new_y = pos.y as i32 + dy;

                if new_x < 0
                    || new_x >= self.width as i32
                    || new_y < 0
                    || new_y >= self.height as i32
                {
                    continue;
                }

                if let Some(cell) = self
                    .cells
                    .get_mut((new_x as usize) + (new_y as usize) * self.width)
                    && cell.state != CellState::Revealed
                {
                    cell.highlight = true;
                    updates.push(CellUpdate {
                        pos: Pos {
                            x: cell.x,
                            y: cell.y,
                        },
                        value: (&*cell).into(),
                        highlight: true,
                    });
                }
            }
        }

        self.highlight_anchor = Some(pos);
    }

    fn open_surrounding_cells(&mut self, pos: Pos, updates: &mut Vec<CellUpdate>) {
        if !self.validate_pos(&pos) || self.finished {
            return;
        }

        let Some(cell) = self.cells.get(pos.x + pos.y * self.width) else {
            return;
        };

        if cell.state != CellState::Revealed || cell.adjacent == 0 {
            return;
        }

        let adjacent = cell.adjacent;
        if self.count_flagged_neighbors(pos) != adjacent {
            return;
        }

        self.clear_highlights(updates);

        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }

                let new_x = pos.x as i32 + dx;
                let new_y = pos.y as i32 + dy;

                if new_x < 0
                    || new_x >= self.width as i32
                    || new_y < 0
                    || new_y >= self.height as i32
                {
                    continue;
                }

                let neighbor = Pos {
                    x: new_x as usize,
                    y: new_y as usize,
                };

                let index = neighbor.x + neighbor.y * self.width;
                let (mine, state) = match self.cells.get(index) {
                    Some(cell) => (cell.mine, cell.state),
                    None => continue,
                };

                if state == CellState::Flagged || state == CellState::Revealed {
                    continue;
                }

                if mine {
                    self.exploded = true;
                    self.finished = true;
                    self.reveal_mines(updates);
                    return;
                }

                self.open_recursive(neighbor, updates);
            }
        }

        if self.has_won() {
            self.finished = true;
        }
    }

    fn mark_cell(&mut self, pos: Pos, updates: &mut Vec<CellUpdate>) {
        if !self.validate_pos(&pos) || self.finished {
            return;
        }

        if let Some(cell) = self.cells.get_mut(pos.x + pos.y * self.width) {
            match cell.state {
                CellState::Hidden => cell.state = CellState::Flagged,
                CellState::Flagged => cell.state = CellState::Marked,
                CellState::Marked => cell.state = CellState::Hidden,
                CellState::Revealed => return,
            };

            updates.push(CellUpdate {
                pos,
                value: (&*cell).into(),
                highlight: cell.highlight,
            });
        }
    }
}

impl Game {
    #[instrument(level = "trace")]
    pub fn new(params: BoardParams) -> Self {
        info!(
            "Creating new game: {}x{} with {} mines",
            params.width, params.height, params.mines
        );
        Self {
            board: Board::new(params),
            streams: HashMap::new(),
            created_at: Instant::now(),
            last_activity: Instant::now(),
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn restart(&mut self, params: BoardParams) {
        info!(
            "Restarting game with new parameters: {}x{} with {} mines",
            params.width, params.height, params.mines
        );
        self.board = Board::new(params);
        self.last_activity = Instant::now();
        broadcast(&mut self.streams, &self.board.init_message()).await;
        info!(
            "Game restarted and broadcasted to {} connections",
            self.streams.len()
        );
    }

    #[instrument(level = "trace", skip(self, stream))]
    pub async fn add_stream(&mut self, mut stream: SplitSink<DuplexStream, Message>) -> Uuid {
        let id = Uuid::new_v4();
        debug!("Adding stream {} to game", id);
        send(&mut stream, &self.board.init_message()).await;
        self.streams.insert(id, stream);
        self.last_activity = Instant::now();
        info!(
            "Stream {} added, total connections: {}",
            id,
            self.streams.len()
        );
        id
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn remove_stream(&mut self, id: &Uuid) {
        if self.streams.remove(id).is_some() {
            info!(
                "Stream {} removed, remaining connections: {}",
                id,
                self.streams.len()
            );
        } else {
            warn!("Attempted to remove non-existent stream: {}", id);
        }
        self.last_activity = Instant::now()
    }

    pub fn has_active_connections(&self) -> bool {
        !self.streams.is_empty()
    }

    pub fn should_cleanup(&self, inactive_timeout_secs: u64, active_timeout_secs: u64) -> bool {
        let now = Instant::now();

        if now.duration_since(self.created_at).as_secs() > active_timeout_secs {
            return true;
        }

        if self.has_active_connections() {
            return false;
        }

        now.duration_since(self.last_activity).as_secs() > inactive_timeout_secs
    }

    #[instrument(level = "trace", skip(self), fields(x = pos.x, y = pos.y))]
    pub async fn open(&mut self, pos: Pos) {
        if !self.board.validate_pos(&pos) {
            warn!("Invalid open position: ({}, {})", pos.x, pos.y);
            return;
        }

        if self.board.finished {
            debug!(
                "Ignoring open action on finished board at ({}, {})",
                pos.x, pos.y
            );
            return;
        }

        self.last_activity = Instant::now();

        let mut updates = Vec::new();
        self.board.open_cell(pos, &mut updates);

        if updates.is_empty() {
            debug!("Open at ({}, {}) changed nothing", pos.x, pos.y);
            return;
        }

        let lost = self.board.exploded;
        let won = self.board.finished && !lost;

        if lost {
            warn!("Player opened a mine at ({}, {}) - game over!", pos.x, pos.y);
        } else if won {
            info!("Game won! All safe cells opened.");
        } else {
            debug!("Opened {} cells, game continues", updates.len());
        }

        broadcast(
            &mut self.streams,
            &ServerMessage::Update { updates, won, lost },
        )
        .await;
    }

    #[instrument(level = "trace", skip(self), fields(x = pos.x, y = pos.y))]
    pub async fn open_surrounding(&mut self, pos: Pos) {
        if !self.board.validate_pos(&pos) {
            warn!("Invalid chord position: ({}, {})", pos.x, pos.y);
            return;
        }

        if self.board.finished {
            debug!(
                "Ignoring chord action on finished board at ({}, {})",
                pos.x, pos.y
            );
            return;
        }

        self.last_activity = Instant::now();

        let mut updates = Vec::new();
        self.board.open_surrounding_cells(pos, &mut updates);

        if updates.is_empty() {
            debug!("Chord at ({}, {}) changed nothing", pos.x, pos.y);
            return;
        }

        let lost = self.board.exploded;
        let won = self.board.finished && !lost;

        if lost {
            warn!(
                "Chord at ({}, {}) opened a mine - game over!",
                pos.x, pos.y
            );
        } else if won {
            info!("Game won! All safe cells opened.");
        } else {
            debug!("Chord opened {} cells, game continues", updates.len());
        }

        broadcast(
            &mut self.streams,
            &ServerMessage::Update { updates, won, lost },
        )
        .await;
    }

    #[instrument(level = "trace", skip(self), fields(x = pos.x, y = pos.y))]
    pub async fn highlight_surrounding(&mut self, pos: Pos) {
        if !self.board.validate_pos(&pos) {
            warn!("Invalid highlight position: ({}, {})", pos.x, pos.y);
            return;
        }

        if self.board.finished {
            debug!(
                "Ignoring highlight action on finished board at ({}, {})",
                pos.x, pos.y
            );
            return;
        }

        self.last_activity = Instant::now();

        let mut updates = Vec::new();
        self.board.highlight_surrounding_cells(pos, &mut updates);

        if updates.is_empty() {
            return;
        }

        broadcast(
            &mut self.streams,
            &ServerMessage::Update {
                updates,
                won: false,
                lost: false,
            },
        )
        .await;
    }

    #[instrument(level = "trace", skip(self), fields(x = pos.x, y = pos.y))]
    pub async fn mark(&mut self, pos: Pos) {
        if !self.board.validate_pos(&pos) {
            warn!("Invalid mark position: ({}, {})", pos.x, pos.y);
            return;
        }

        if self.board.finished {
            debug!(
                "Ignoring mark action on finished board at ({}, {})",
                pos.x, pos.y
            );
            return;
        }

        self.last_activity = Instant::now();

        let mut updates = Vec::new();
        self.board.mark_cell(pos, &mut updates);

        if updates.is_empty() {
            debug!("Mark at ({}, {}) changed nothing", pos.x, pos.y);
            return;
        }

        broadcast(
            &mut self.streams,
            &ServerMessage::Update {
                updates,
                won: false,
                lost: false,
            },
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn board_with_mines(width: usize, height: usize, mine_positions: &[(usize, usize)]) -> Board {
        let mut mines = vec![false; width * height];
        for &(x, y) in mine_positions {
            mines[x + y * width] = true;
        }

        let params = BoardParams {
            width,
            height,
            mines: mine_positions.len(),
        };

        Board {
            width,
            height,
            mines: mine_positions.len(),
            opened: 0,
            exploded: false,
            finished: false,
            highlight_anchor: None,
            cells: cells_from_mines(&mines, &params),
        }
    }

    fn state_at(board: &Board, x: usize, y: usize) -> CellState {
        board.cells[x + y * board.width].state
    }

    #[test]
    fn open_floods_zero_region_and_wins() {
        let mut board = board_with_mines(3, 3, &[(2, 2)]);
        let mut updates = Vec::new();

        board.open_cell(Pos { x: 0, y: 0 }, &mut updates);

        assert_eq!(updates.len(), 8);
        assert_eq!(board.opened, 8);
        assert!(board.finished);
        assert!(!board.exploded);
        assert_eq!(state_at(&board, 2, 2), CellState::Hidden);
        assert_eq!(state_at(&board, 1, 1), CellState::Revealed);
    }

    #[test]
    fn open_mine_reveals_all_mines_and_loses() {
        let mut board = board_with_mines(2, 2, &[(0, 0), (1, 1)]);
        let mut updates = Vec::new();

        board.open_cell(Pos { x: 0, y: 0 }, &mut updates);

        assert!(board.exploded);
        assert!(board.finished);
        assert_eq!(updates.len(), 2);
        assert!(
            updates
                .iter()
                .all(|u| u.value == cellsweep_common::models::Cell::Mine)
        );
        assert_eq!(state_at(&board, 1, 1), CellState::Revealed);
    }

    #[test]
    fn open_flagged_cell_changes_nothing() {
        let mut board = board_with_mines(2, 2, &[(1, 1)]);
        let mut updates = Vec::new();

        board.mark_cell(Pos { x: 0, y: 0 }, &mut updates);
        updates.clear();
        board.open_cell(Pos { x: 0, y: 0 }, &mut updates);

        assert!(updates.is_empty());
        assert_eq!(state_at(&board, 0, 0), CellState::Flagged);
    }

    #[test]
    fn mark_cycles_through_flag_and_question() {
        let mut board = board_with_mines(2, 2, &[(1, 1)]);
        let mut updates = Vec::new();
        let pos = Pos { x: 0, y: 0 };

        board.mark_cell(pos, &mut updates);
        assert_eq!(state_at(&board, 0, 0), CellState::Flagged);

        board.mark_cell(pos, &mut updates);
        assert_eq!(state_at(&board, 0, 0), CellState::Marked);

        board.mark_cell(pos, &mut updates);
        assert_eq!(state_at(&board, 0, 0), CellState::Hidden);

        assert_eq!(updates.len(), 3);
    }

    #[test]
    fn mark_on_revealed_cell_changes_nothing() {
        let mut board = board_with_mines(2, 2, &[(1, 1)]);
        let mut updates = Vec::new();
        let pos = Pos { x: 0, y: 0 };

        board.open_cell(pos, &mut updates);
        updates.clear();
        board.mark_cell(pos, &mut updates);

        assert!(updates.is_empty());
        assert_eq!(state_at(&board, 0, 0), CellState::Revealed);
    }

    #[test]
    fn chord_opens_unflagged_neighbors() {
        let mut board = board_with_mines(3, 3, &[(0, 1), (2, 1)]);
        let mut updates = Vec::new();

        board.open_cell(Pos { x: 1, y: 1 }, &mut updates);
        board.mark_cell(Pos { x: 0, y: 1 }, &mut updates);
        board.mark_cell(Pos { x: 2, y: 1 }, &mut updates);
        updates.clear();

        board.open_surrounding_cells(Pos { x: 1, y: 1 }, &mut updates);

        assert_eq!(updates.len(), 6);
        assert!(board.finished);
        assert!(!board.exploded);
        assert_eq!(state_at(&board, 0, 0), CellState::Revealed);
        assert_eq!(state_at(&board, 0, 1), CellState::Flagged);
    }

    #[test]
    fn chord_requires_matching_flag_count() {
        let mut board = board_with_mines(3, 3, &[(0, 1), (2, 1)]);
        let mut updates = Vec::new();

        board.open_cell(Pos { x: 1, y: 1 }, &mut updates);
        board.mark_cell(Pos { x: 0, y: 1 }, &mut updates);
        updates.clear();

        board.open_surrounding_cells(Pos { x: 1, y: 1 }, &mut updates);

        assert!(updates.is_empty());
        assert!(!board.finished);
    }

    #[test]
    fn chord_with_wrong_flag_opens_mine() {
        let mut board = board_with_mines(3, 3, &[(0, 1)]);
        let mut updates = Vec::new();

        board.open_cell(Pos { x: 1, y: 1 }, &mut updates);
        board.mark_cell(Pos { x: 0, y: 0 }, &mut updates);
        updates.clear();

        board.open_surrounding_cells(Pos { x: 1, y: 1 }, &mut updates);

        assert!(board.exploded);
        assert!(board.finished);
        assert_eq!(state_at(&board, 0, 1), CellState::Revealed);
    }

    #[test]
    fn chord_on_hidden_cell_changes_nothing() {
        let mut board = board_with_mines(3, 3, &[(0, 1)]);
        let mut updates = Vec::new();

        board.open_surrounding_cells(Pos { x: 1, y: 1 }, &mut updates);

        assert!(updates.is_empty());
    }

    #[test]
    fn highlight_toggles_surrounding_cells() {
        let mut board = board_with_mines(3, 3, &[(0, 0)]);
        let mut updates = Vec::new();
        let pos = Pos { x: 1, y: 1 };

        board.highlight_surrounding_cells(pos, &mut updates);

        assert_eq!(updates.len(), 8);
        assert!(updates.iter().all(|u| u.highlight));
        assert_eq!(board.highlight_anchor, Some(pos));

        updates.clear();
        board.highlight_surrounding_cells(pos, &mut updates);

        assert_eq!(updates.len(), 8);
        assert!(updates.iter().all(|u| !u.highlight));
        assert_eq!(board.highlight_anchor, None);
        assert!(board.cells.iter().all(|cell| !cell.highlight));
    }

    #[test]
    fn highlight_moves_to_new_anchor() {
        let mut board = board_with_mines(3, 3, &[(0, 0)]);
        let mut updates = Vec::new();

        board.highlight_surrounding_cells(Pos { x: 0, y: 0 }, &mut updates);
        updates.clear();

        board.highlight_surrounding_cells(Pos { x: 2, y: 2 }, &mut updates);

        assert_eq!(board.highlight_anchor, Some(Pos { x: 2, y: 2 }));
        assert!(board.cells[1 + 2 * 3].highlight);
        assert!(!board.cells[1].highlight);
    }

    #[test]
    fn highlight_skips_revealed_cells() {
        let mut board = board_with_mines(3, 3, &[(0, 0), (2, 0)]);
        let mut updates = Vec::new();

        board.open_cell(Pos { x: 0, y: 2 }, &mut updates);
        assert!(!board.finished);
        updates.clear();

        board.highlight_surrounding_cells(Pos { x: 1, y: 1 }, &mut updates);

        // Only the three cells of the top row are still unrevealed.
        assert_eq!(updates.len(), 3);
        assert!(
            updates
                .iter()
                .all(|u| state_at(&board, u.pos.x, u.pos.y) != CellState::Revealed)
        );
    }

    #[test]
    fn opening_clears_highlight_preview() {
        let mut board = board_with_mines(3, 3, &[(2, 2)]);
        let mut updates = Vec::new();

        board.highlight_surrounding_cells(Pos { x: 1, y: 1 }, &mut updates);
        updates.clear();

        board.open_cell(Pos { x: 0, y: 0 }, &mut updates);

        assert!(board.cells.iter().all(|cell| !cell.highlight));
        assert_eq!(board.highlight_anchor, None);
    }

    #[test]
    fn generated_board_places_exact_mine_count() {
        let board = Board::new(BoardParams {
            width: 16,
            height: 16,
            mines: 40,
        });

        let placed = board.cells.iter().filter(|cell| cell.mine).count();
        assert_eq!(placed, 40);
        assert_eq!(board.cells.len(), 256);
    }

    #[test]
    fn mine_count_is_clamped_to_board_size() {
        let board = Board::new(BoardParams {
            width: 2,
            height: 2,
            mines: 99,
        });

        assert_eq!(board.mines, 4);
        assert!(board.cells.iter().all(|cell| cell.mine));
    }

    #[test]
    fn adjacent_counts_match_layout() {
        let board = board_with_mines(3, 3, &[(1, 1)]);

        for cell in &board.cells {
            if cell.mine {
                assert_eq!(cell.adjacent, 0);
            } else {
                assert_eq!(cell.adjacent, 1, "cell ({}, {})", cell.x, cell.y);
            }
        }
    }

    #[test]
    fn cell_coordinates_match_storage_order() {
        let board = board_with_mines(4, 2, &[]);

        for (i, cell) in board.cells.iter().enumerate() {
            assert_eq!(cell.x, i % 4);
            assert_eq!(cell.y, i / 4);
        }
    }

    #[test]
    fn stale_game_is_cleaned_up() {
        let mut game = Game::new(BoardParams::default());
        assert!(!game.should_cleanup(600, 86400));

        // checked_sub: the monotonic clock may not reach back far enough
        if let Some(stale) = Instant::now().checked_sub(Duration::from_secs(700)) {
            game.last_activity = stale;
            assert!(game.should_cleanup(600, 86400));
            assert!(!game.should_cleanup(1000, 86400));
        }

        if let Some(old) = Instant::now().checked_sub(Duration::from_secs(90000)) {
            game.last_activity = Instant::now();
            game.created_at = old;
            assert!(game.should_cleanup(600, 86400));
        }
    }
}
