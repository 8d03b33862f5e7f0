use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let result = icat::cli::run().await;

    // Placeholder lines must be out before the shell prompt comes back
    use std::io::{self, Write};
    let _ = io::stdout().flush();

    result
}
