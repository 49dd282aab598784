mod cli;
mod commands;

use clap::Parser;

use cli::Cli;
use pin_density::config::AppConfig;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = AppConfig::load_or_default(&cli.config);
    commands::run(cli.command, &config)
}
