use std::process::ExitCode;

use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _log_guard = azchat::logging::init();

    match azchat::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "chat session aborted");
            eprintln!("azchat: {err:#}");
            ExitCode::FAILURE
        }
    }
}
