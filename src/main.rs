//! webterm binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use tracing::info;
use webterm::{api, cli, config::Config, logging, session};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Try 'webterm --help' for more information.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &cli::Args) -> webterm::Result<()> {
    let config = Config::load(args)?;
    if let Err(e) = logging::init_with_level(config.log_filter()) {
        eprintln!("warning: logging already initialized: {e}");
    }

    info!("webterm v{}", env!("CARGO_PKG_VERSION"));

    let server_config = config.to_server_config()?;
    let state = config.build_state();
    if !state.auth.is_enabled() {
        tracing::warn!(
            user = config.security.auth.default_user,
            "Authentication disabled; every request acts as the default user"
        );
    }

    let sweeper = session::spawn_sweeper(
        Arc::clone(state.terminal.store()),
        config.session.sweep_interval(),
    );

    let result = api::serve_with_state(server_config, state).await;
    sweeper.abort();
    result
}
