use clap::Parser;
use steptrader::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
