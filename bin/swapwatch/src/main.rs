#![doc = include_str!("../README.md")]

mod cli;
mod flags;

use clap::Parser;

fn main() {
    swapwatch_cli::backtrace::enable();

    if let Err(err) = cli::Cli::parse().run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
