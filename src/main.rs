use clap::Parser;
use function_operato_rs::{
    cli::{Cli, Commands, CrdCommands, RunCommands},
    consts::{DEFAULT_LOG_FILTER, PKG_NAME, PKG_VERSION},
    main_actions,
    operator::ConfigLocation,
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", DEFAULT_LOG_FILTER);
    }

    tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_level(true)
        .with_ansi(true)
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    tracing::debug!(name = PKG_NAME, version = PKG_VERSION, "Starting.");

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { command } => match command {
            RunCommands::Controller {
                config_map,
                config_map_namespace,
            } => {
                main_actions::create_and_run_operator_controller(ConfigLocation {
                    name: config_map,
                    namespace: config_map_namespace,
                })
                .await
            }
        },
        Commands::Crd { command } => match command {
            CrdCommands::Print { format } => main_actions::print_crd(format),
            CrdCommands::Write { file, format } => {
                main_actions::write_crd_to_file(file, format).await
            }
        },
    };

    if let Err(error) = result {
        tracing::error!(?error, "Exiting.");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
