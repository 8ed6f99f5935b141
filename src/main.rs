use std::{env::var, process::ExitCode};

use jira_branch::{command, run};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    if var("RUST_LOG").is_ok() {
        env_logger::init();
    }
    let matches = command().get_matches();
    match run(&matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}
