use std::process::ExitCode;

fn main() -> ExitCode {
    match xcube_labd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("xcube-labd: {error}");
            ExitCode::FAILURE
        }
    }
}
