use cellsweep_common::models::{CellState, Pos};

/// One grid position on the board.
///
/// `x`, `y`, `mine` and `adjacent` are fixed at board generation; only
/// `highlight` and `state` change during play.
#[derive(Debug)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
    pub mine: bool,
    pub adjacent: u8,
    pub highlight: bool,
    pub state: CellState,
}

/// Board-owned cell storage, row-major with `cells[x + y * width]`.
#[derive(Debug)]
pub struct Board {
    pub width: usize,
    pub height: usize,
    pub mines: usize,
    pub opened: usize,
    pub exploded: bool,
    pub finished: bool,
    pub highlight_anchor: Option<Pos>,
    pub cells: Vec<Cell>,
}
