use serde::{Deserialize, Serialize};

/// Lifecycle stage of a single cell on the board.
///
/// `Marked` is the question-mark stage of the mark cycle, between
/// `Flagged` and back to `Hidden`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    Hidden,
    Flagged,
    Marked,
    Revealed,
}

/// Player-visible view of a cell as sent over the wire.
///
/// Mine placement stays server-side until a cell is actually revealed,
/// so `Mine` only ever appears for revealed cells.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "state")]
pub enum Cell {
    #[serde(rename = "hidden")]
    Hidden,
    #[serde(rename = "marked")]
    Marked,
    #[serde(rename = "flagged")]
    Flagged,
    #[serde(rename = "revealed")]
    Revealed { adjacent: u8 },
    #[serde(rename = "mine")]
    Mine,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(default)]
pub struct BoardParams {
    pub width: usize,
    pub height: usize,
    pub mines: usize,
}

impl Default for BoardParams {
    fn default() -> Self {
        Self {
            width: 9,
            height: 9,
            mines: 10,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct CreateResponse {
    pub id: String,
}
