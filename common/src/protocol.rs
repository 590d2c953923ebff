use serde::{Deserialize, Serialize};

use crate::models::{BoardParams, Cell, Pos};

/// Player intents, one per cell action plus restart.
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "action")]
pub enum ClientMessage {
    #[serde(rename = "open")]
    Open { pos: Pos },
    #[serde(rename = "mark")]
    Mark { pos: Pos },
    #[serde(rename = "open_surrounding")]
    OpenSurrounding { pos: Pos },
    #[serde(rename = "highlight_surrounding")]
    HighlightSurrounding { pos: Pos },
    #[serde(rename = "restart")]
    Restart { params: BoardParams },
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct CellUpdate {
    pub pos: Pos,
    pub value: Cell,
    pub highlight: bool,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "init")]
    Init {
        width: usize,
        height: usize,
        mines: usize,
        board: Vec<Vec<Cell>>,
    },
    #[serde(rename = "update")]
    Update {
        updates: Vec<CellUpdate>,
        won: bool,
        lost: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_uses_action_tag() {
        let msg = ClientMessage::Open {
            pos: Pos { x: 3, y: 1 },
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["action"], "open");
        assert_eq!(json["pos"]["x"], 3);

        let parsed: ClientMessage =
            serde_json::from_str(r#"{"action":"highlight_surrounding","pos":{"x":0,"y":2}}"#)
                .unwrap();
        assert!(matches!(
            parsed,
            ClientMessage::HighlightSurrounding {
                pos: Pos { x: 0, y: 2 }
            }
        ));
    }

    #[test]
    fn cell_is_tagged_by_state() {
        let json = serde_json::to_value(Cell::Revealed { adjacent: 4 }).unwrap();
        assert_eq!(json["state"], "revealed");
        assert_eq!(json["adjacent"], 4);

        let mine: Cell = serde_json::from_str(r#"{"state":"mine"}"#).unwrap();
        assert_eq!(mine, Cell::Mine);
    }

    #[test]
    fn update_message_carries_highlight_flag() {
        let msg = ServerMessage::Update {
            updates: vec![CellUpdate {
                pos: Pos { x: 1, y: 1 },
                value: Cell::Hidden,
                highlight: true,
            }],
            won: false,
            lost: false,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "update");
        assert_eq!(json["updates"][0]["highlight"], true);
    }
}
