use clap::Parser;
use log::{error, info};
use server::{Game, PortalMode, Server, ServerConfig, TrapMode};
use shared::MapLayout;
use std::path::PathBuf;

/// Main entry point for the game server
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    #[derive(Parser, Debug)]
    #[command(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Server port to listen on
        #[arg(short, long, default_value = "1234")]
        port: u16,

        /// Map file to load
        #[arg(short, long, default_value = shared::DEFAULT_MAP_PATH)]
        map: PathBuf,

        /// How the portal behaves
        #[arg(long, value_enum, default_value_t = PortalMode::Cycle)]
        portal_mode: PortalMode,

        /// How the trap behaves
        #[arg(long, value_enum, default_value_t = TrapMode::Fixed)]
        trap_mode: TrapMode,

        /// Run without guard, portal and trap
        #[arg(long)]
        no_entities: bool,
    }

    let args = Args::parse();

    let mut config = ServerConfig {
        addr: format!("{}:{}", args.host, args.port),
        map_path: args.map,
        entities: !args.no_entities,
        ..ServerConfig::default()
    };
    config.tuning.portal_mode = args.portal_mode;
    config.tuning.trap_mode = args.trap_mode;

    let layout = MapLayout::load(&config.map_path)?;
    info!(
        "Loaded map {} ({}x{})",
        config.map_path.display(),
        layout.grid.width(),
        layout.grid.height()
    );

    let game = Game::start(layout, &config);
    let server = Server::bind(&config.addr, game.processor(), game.shutdown_token()).await?;
    let server_handle = tokio::spawn(server.run());

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }

    game.shutdown().await;
    if let Err(e) = server_handle.await {
        error!("Server task failed: {}", e);
    }

    Ok(())
}
