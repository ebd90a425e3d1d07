use clap::Parser;
use trendscan::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
