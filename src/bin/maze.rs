use anyhow::Context;
use pocket_arcade::game::maze;
use pocket_arcade::{LoggingConfig, init_logging, run_with_config};

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    run_with_config(maze::config(), maze::setup).context("maze game exited with an error")
}
