use anyhow::Context;
use pocket_arcade::game::canon;
use pocket_arcade::{LoggingConfig, init_logging, run_with_config};

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    run_with_config(canon::config(), canon::setup).context("cannon game exited with an error")
}
