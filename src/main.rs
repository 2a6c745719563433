use clap::Parser;
use pass_git_helper::cli::{init_logging, skip_requested, Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.logging);

    // Checked before anything is read so a skipped helper stays silent.
    if cli.command.is_credential_action() && skip_requested() {
        tracing::info!("Skipping processing as requested via environment variable");
        std::process::exit(1);
    }

    let result = match &cli.command {
        Commands::Get => pass_git_helper::cli::commands::get::execute(&cli),
        Commands::Store | Commands::Erase => {
            tracing::info!(action = cli.command.name(), "action is currently not supported");
            std::process::exit(1);
        }
        Commands::Completions { shell } => pass_git_helper::cli::commands::completions::execute(*shell),
    };

    if let Err(e) = result {
        pass_git_helper::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
