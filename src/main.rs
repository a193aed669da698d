use std::process::ExitCode;

fn main() -> ExitCode {
    match symptom_checker::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Startup failed: {e}");
            eprintln!("symptom-checker: {e}");
            ExitCode::FAILURE
        }
    }
}
