mod config;
mod server;
mod simulation;

use anyhow::Result;
use clap::Parser;

use config::ServerConfig;
use server::GameServer;

#[derive(Parser)]
#[command(name = "horde-server")]
#[command(about = "Horde game server")]
struct Args {
    #[arg(short, long, default_value_t = 60)]
    tick_rate: u32,

    #[arg(short, long, default_value_t = 32)]
    max_clients: usize,

    #[arg(long, default_value_t = 120, help = "Ticks between full snapshots")]
    full_state_interval: u32,

    #[arg(long, default_value_t = 64, help = "Outbound frames buffered per client")]
    queue_depth: usize,

    #[arg(long, default_value_t = 0, help = "Stop after this many ticks (0 = run forever)")]
    ticks: u64,

    #[arg(long, help = "Path to a prebuilt map blob")]
    map: Option<std::path::PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let map_data = match &args.map {
        Some(path) => std::fs::read(path)?,
        None => vec![0u8; 256],
    };

    let config = ServerConfig {
        tick_rate: args.tick_rate,
        max_clients: args.max_clients,
        full_state_interval: args.full_state_interval,
        client_queue_depth: args.queue_depth,
    };

    log::info!(
        "starting horde server at {} ticks/s ({} byte map)",
        config.tick_rate,
        map_data.len()
    );

    let mut server = GameServer::new(config, map_data);
    server.run(args.ticks);

    Ok(())
}
