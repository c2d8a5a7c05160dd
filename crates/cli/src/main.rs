use clap::Parser;
use kq_cli::{cli::Cli, logging};
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Err(err) = kq_cli::run(cli).await {
        error!(target = "kq", error = %err, "fatal");
        std::process::exit(1);
    }
}
