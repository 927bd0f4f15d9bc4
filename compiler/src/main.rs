use clap::Parser;
use pzero_lang::cli::{Cli, CliHandler};
use std::process;

fn main() {
    let cli = Cli::parse();
    let handler = CliHandler::new();

    if let Err(e) = handler.handle(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
