use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    anihan_cli::run().await
}
