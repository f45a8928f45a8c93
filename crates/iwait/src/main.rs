use std::process::ExitCode;

use clap::Parser;
use iwait::cli::Cli;
use iwait::{report, telemetry};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = telemetry::init(cli.verbose, cli.log) {
        eprintln!("{err:#}");
    }
    let json = cli.json;

    let options = match cli.into_options() {
        Ok(options) => options,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "invalid options");
            return ExitCode::from(report::EXIT_USAGE);
        }
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, aborting wait");
            on_signal.cancel();
        }
    });

    let outcome = iwait::wait(options.with_cancellation(cancel)).await;
    let code = report::exit_code(&outcome);
    if json {
        println!("{}", report::to_json(&outcome));
    } else if code == report::EXIT_SUCCESS {
        print!("{}", report::summary(&outcome));
    } else {
        eprint!("{}", report::summary(&outcome));
    }
    ExitCode::from(code)
}
