use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    bono::cli::run().await
}
