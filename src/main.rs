use std::process::ExitCode;

fn main() -> ExitCode {
    match sdg_trends::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("sdg: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
