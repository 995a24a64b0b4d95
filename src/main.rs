use clap::Parser;
use dirsort::cli::{Cli, print_usage, run_cli};
use dirsort::logging::init_logging;
use dirsort::output::OutputFormatter;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    match run_cli(&cli) {
        Ok(()) => {}
        Err(e) if e.is_usage_error() => print_usage(),
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            std::process::exit(1);
        }
    }
}
