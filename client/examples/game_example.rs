use cellsweep_client::{BoardParams, Cell, CellsweepGame, GameEvent, GameState, Pos};
use tokio::time::{Duration, sleep};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Create a high-level game client
    let game = CellsweepGame::new("http://localhost:8000")?;

    // Subscribe to game events for background listening
    let mut event_receiver = game.subscribe_to_events().await;

    // Spawn background task to handle events
    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_receiver.recv().await {
            match event {
                GameEvent::GameInitialized {
                    width,
                    height,
                    mines,
                } => {
                    println!(
                        "Game initialized: {}x{} with {} mines",
                        width, height, mines
                    );
                }
                GameEvent::BoardUpdated { changed_positions } => {
                    println!("{} cells updated", changed_positions.len());
                }
                GameEvent::HighlightChanged { highlighted } => {
                    println!("Highlight preview now covers {:?}", highlighted);
                }
                GameEvent::GameStatusChanged { won, lost } => {
                    if won {
                        println!("You won!");
                    } else if lost {
                        println!("Game over!");
                    }
                }
                GameEvent::ConnectionLost => {
                    println!("Connection lost!");
                    break;
                }
            }
        }
    });

    // Start a new 8x8 game with 10 mines
    let params = BoardParams {
        width: 8,
        height: 8,
        mines: 10,
    };

    game.start_game(params).await?;
    println!("Game started! Game ID: {:?}", game.get_game_id().await);

    // Give time for initialization event
    sleep(Duration::from_millis(100)).await;

    if let Some(state) = game.get_state().await {
        println!(
            "\nInitial board ({}x{} with {} mines):",
            state.width, state.height, state.mines
        );
        display_board(&state);
    }

    println!("\n=== Making some moves ===");

    println!("Opening cell (0, 0)...");
    game.open(Pos { x: 0, y: 0 }).await?;
    sleep(Duration::from_millis(100)).await;

    if let Some(state) = game.get_state().await {
        display_board(&state);
        if state.is_game_over() {
            println!("Game over! Won: {}", state.is_won());
        }
    }

    println!("\nMarking cell (1, 1)...");
    game.mark(Pos { x: 1, y: 1 }).await?;
    sleep(Duration::from_millis(100)).await;

    println!("\nPreviewing chord around (2, 2)...");
    game.highlight_surrounding(Pos { x: 2, y: 2 }).await?;
    sleep(Duration::from_millis(100)).await;

    if let Some(state) = game.get_state().await {
        display_board(&state);
    }

    println!("\nChording at (2, 2)...");
    game.open_surrounding(Pos { x: 2, y: 2 }).await?;
    sleep(Duration::from_millis(100)).await;

    if let Some(state) = game.get_state().await {
        display_board(&state);
        let cell_counts = state.count_cells();
        println!("Final cell counts: {:?}", cell_counts);
    }

    // Disconnect from the game
    game.disconnect().await?;
    println!("\nDisconnected from game");

    // Clean up event handler
    event_handler.abort();
    let _ = event_handler.await;

    Ok(())
}

fn display_board(state: &GameState) {
    println!("Board state:");
    for (y, row) in state.board.iter().enumerate() {
        print!("  ");
        for (x, cell) in row.iter().enumerate() {
            let symbol = match cell {
                Cell::Hidden => {
                    if state.is_highlighted(Pos { x, y }) {
                        "+".to_string()
                    } else {
                        "·".to_string()
                    }
                }
                Cell::Marked => "?".to_string(),
                Cell::Flagged => "F".to_string(),
                Cell::Revealed { adjacent: 0 } => " ".to_string(),
                Cell::Revealed { adjacent } => adjacent.to_string(),
                Cell::Mine => "*".to_string(),
            };
            print!("{:2}", symbol);
        }
        println!("  {}", y);
    }

    print!("  ");
    for x in 0..state.width {
        print!("{:2}", x);
    }
    println!();
}
