use clap::Parser;
use client::config::ClientConfig;
use client::game::LocalGame;
use client::input::{self, KeyEvent};
use client::network::RpcClient;
use client::reconciler::Reconciler;
use client::rendering::{self, Renderer};
use client::session::{generate_client_id, Session};
use log::{error, info, warn};
use macroquad::prelude::*;
use shared::{Grid, MapLayout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

const CELL_SIZE: f32 = 24.0;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = shared::DEFAULT_SERVER_ADDR)]
    server: String,

    /// Local map file, drawn until the server's map arrives
    #[arg(short, long, default_value = shared::DEFAULT_MAP_PATH)]
    map: PathBuf,

    /// State polling interval in milliseconds
    #[arg(long, default_value = "200")]
    poll_ms: u64,
}

fn window_conf() -> Conf {
    let (width, height) = rendering::window_size(30, 20, CELL_SIZE);
    Conf {
        window_title: "Gridwarden".to_owned(),
        window_width: width,
        window_height: height,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!("Client stopped: {}", e);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig {
        server_addr: args.server,
        map_path: args.map,
        poll_interval: Duration::from_millis(args.poll_ms),
        ..ClientConfig::default()
    };

    let grid = match MapLayout::load(&config.map_path) {
        Ok(layout) => layout.grid,
        Err(e) => {
            warn!("{}; waiting for the server's map", e);
            Grid::new(1, 1)
        }
    };
    let game = Arc::new(Mutex::new(LocalGame::new(grid)));

    // Network work runs on tokio; macroquad keeps the main thread for drawing.
    let runtime = tokio::runtime::Runtime::new()?;

    let client_id = generate_client_id(&mut ::rand::thread_rng());
    info!("Starting client {}", client_id);
    info!("Connecting to: {}", config.server_addr);
    info!("Controls: WASD/arrows to move, E to interact, R to restart, Esc to quit");

    let mut session = Session::new(client_id.clone(), RpcClient::new(&config), game.clone());
    let outcome = runtime.block_on(session.register())?;
    info!("Registration: {}", outcome);

    let (quit_tx, quit_rx) = watch::channel(false);
    let reconciler = Reconciler::new(
        client_id,
        RpcClient::new(&config),
        game.clone(),
        config.poll_interval,
    );
    let poller = runtime.spawn(reconciler.run(quit_rx));

    let mut renderer = Renderer::new(CELL_SIZE);
    let mut frame = runtime.block_on(game.lock()).clone();

    'frames: loop {
        for key in input::poll_keys() {
            if key == KeyEvent::Quit {
                break 'frames;
            }
            runtime.block_on(session.handle_key(key));
        }

        // Keep drawing the last frame while the poller holds the lock.
        if let Ok(current) = game.try_lock() {
            frame = current.clone();
        }
        renderer.render(&frame);

        next_frame().await;
    }

    quit_tx.send_replace(true);
    if let Err(e) = runtime.block_on(poller) {
        warn!("Poller task failed: {}", e);
    }
    Ok(())
}
