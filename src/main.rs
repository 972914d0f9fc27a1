use clap::{Parser, Subcommand};
use robo::api::{self, ServeOptions};

#[derive(Parser)]
#[command(
    name = "robo",
    about = "Investor risk scoring, portfolio allocation and projection API"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server.
    Serve(ServeOptions),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(options) => {
            if let Err(e) = api::run_http_server(options).await {
                tracing::error!("server error: {e}");
                std::process::exit(1);
            }
        }
    }
}
