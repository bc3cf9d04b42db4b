//! saavy-room - play synthetic sources through a simulated room
//!
//! Run with: cargo run --bin saavy-room [config.yaml]

mod app;

use std::path::PathBuf;

use app::RoomDemo;
use color_eyre::eyre::WrapErr;
use glam::Vec3;
use saavy_room::SimulationConfig;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => SimulationConfig::load(&path).wrap_err_with(|| format!("failed to load {:?}", path))?,
        None => SimulationConfig::default(),
    };

    // World space: y is up, the room corner sits at the origin
    RoomDemo::new(config)
        .room(6.0, 8.0, 3.0)
        .listener(Vec3::new(3.0, 1.6, 4.0))
        .source(Vec3::new(1.0, 1.2, 1.5), 220.0)
        .source(Vec3::new(5.0, 1.0, 7.0), 330.0)
        .run()
}
