//! Actor CLI entry point.

use std::process::ExitCode;

use actor::cli::{Cli, RunCommand, RunSettings};
use actor::ui::create_ui;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("actor=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("actor=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse_normalized();
    init_tracing(cli.debug);

    tracing::debug!("Actor starting with args: {:?}", cli);

    let settings = RunSettings::from_cli(&cli);
    let mut ui = create_ui(settings.is_interactive(), cli.output_mode(), cli.no_color);

    match RunCommand::new(settings).execute(ui.as_mut()) {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            ui.acknowledge(&format!("Error: {}", e));
            ExitCode::from(1)
        }
    }
}
