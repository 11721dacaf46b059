use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    shopdesk_cli::run().await
}
