use cellsweep_client::{
    BoardParams, CellsweepClient, CellsweepWebSocket, ClientMessage, Pos, ServerMessage,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Create a client connecting to the server
    let client = CellsweepClient::new("http://localhost:8000")?;

    // Create a new game
    let params = BoardParams {
        width: 9,
        height: 9,
        mines: 10,
    };

    let game_id = client.create_game(params).await?;
    println!("Created game with ID: {}", game_id);

    // Get the WebSocket URL for the game
    let ws_url = client.websocket_url(&game_id)?;
    println!("Connecting to WebSocket: {}", ws_url);

    // Connect to the game via WebSocket
    let mut ws = CellsweepWebSocket::connect(&ws_url).await?;

    // Receive the initial game state
    if let Some(ServerMessage::Init {
        width,
        height,
        mines,
        board,
    }) = ws.receive_message().await?
    {
        println!(
            "Received game initialization: {}x{} with {} mines",
            width, height, mines
        );

        for (y, row) in board.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                print!("[{},{}:{:?}] ", x, y, cell);
            }
            println!();
        }
    }

    // Open a cell
    ws.send_message(ClientMessage::Open {
        pos: Pos { x: 0, y: 0 },
    })
    .await?;
    println!("Sent open message for position (0, 0)");

    if let Some(ServerMessage::Update { updates, won, lost }) = ws.receive_message().await? {
        println!("Received update: {} cells updated", updates.len());
        for update in updates {
            println!(
                "  Cell ({}, {}) -> {:?}",
                update.pos.x, update.pos.y, update.value
            );
        }
        println!("Game state - Won: {}, Lost: {}", won, lost);
    }

    // Preview a chord around (1, 1)
    ws.send_message(ClientMessage::HighlightSurrounding {
        pos: Pos { x: 1, y: 1 },
    })
    .await?;
    println!("Sent highlight message for position (1, 1)");

    if let Some(ServerMessage::Update { updates, .. }) = ws.receive_message().await? {
        for update in updates {
            println!(
                "  Cell ({}, {}) highlight: {}",
                update.pos.x, update.pos.y, update.highlight
            );
        }
    }

    // Mark a cell
    ws.send_message(ClientMessage::Mark {
        pos: Pos { x: 2, y: 2 },
    })
    .await?;
    println!("Sent mark message for position (2, 2)");

    if let Some(ServerMessage::Update { updates, won, lost }) = ws.receive_message().await? {
        println!("Received mark update: {} cells updated", updates.len());
        for update in updates {
            println!(
                "  Cell ({}, {}) -> {:?}",
                update.pos.x, update.pos.y, update.value
            );
        }
        println!("Game state - Won: {}, Lost: {}", won, lost);
    }

    // Close the connection
    ws.close().await?;
    println!("Connection closed");

    Ok(())
}
