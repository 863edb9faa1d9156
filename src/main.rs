mod app;
mod catalog;
mod cli;
mod config;
mod core;
mod doctor;
mod evasion;
mod executors;
mod probes;
mod reporters;
mod storage;
mod ui;
mod update;
mod utils;

use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = cli::args::Cli::parse();
    if let Err(err) = app::run(cli).await {
        eprintln!("fatal: {:#}", err);
        std::process::exit(1);
    }
}
