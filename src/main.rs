use clap::Parser;
use ticklist::cli::commands::Cli;
use ticklist::cli::handlers;
use ticklist::io::logging;

fn main() {
    let cli = Cli::parse();
    let config = cli.config.clone();

    match cli.command {
        None => {
            // No subcommand → launch TUI (logging goes to a file there)
            if let Err(e) = ticklist::tui::run(config.as_deref()) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        Some(_) => {
            logging::init_cli_logging();
            if let Err(e) = handlers::dispatch(cli) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
