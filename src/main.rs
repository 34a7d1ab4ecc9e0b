mod actions;
mod app;
mod config;
mod decay;
mod emotion;
mod model;
mod progress;
mod storage;

use anyhow::Result;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codepet=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    app::run()
}
