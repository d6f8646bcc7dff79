use clap::Parser;
use flowband::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    flowband::logging::init(cli.verbose);
    run(cli)
}
