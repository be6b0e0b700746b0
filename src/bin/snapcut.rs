//! snapcut command-line tool

#[cfg(feature = "cli")]
use snapcut::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("snapcut was built without the `cli` feature");
    std::process::exit(1);
}
