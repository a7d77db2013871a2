use sqs_cli::{run_cli, CliError};

#[tokio::main]
async fn main() {
    match run_cli().await {
        Ok(()) => {}
        Err(CliError::Usage(e)) => {
            // clap writes help to stdout and usage errors to stderr
            let _ = e.print();
            std::process::exit(CliError::Usage(e).exit_code());
        }
        Err(e) => {
            eprintln!("sqs: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
