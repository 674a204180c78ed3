use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli::run() {
        cli::RunOutcome::Serve(config) => {
            if let Err(err) = stockhub_push::serve(config).await {
                tracing::error!("{err}");
                std::process::exit(1);
            }
        }
        cli::RunOutcome::Exit(code) => std::process::exit(code),
    }
}
