use std::process::ExitCode;

fn main() -> ExitCode {
    match scancheck_lib::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
