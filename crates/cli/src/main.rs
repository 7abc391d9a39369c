use std::process::ExitCode;

fn main() -> ExitCode {
    spotcast_cli::run()
}
