use std::io::Write;

use tautulli_bar::config::Config;
use tautulli_bar::report;
use tautulli_bar::tautulli::TautulliClient;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging; stdout belongs to the menu-bar host
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let lines = match load() {
        Ok((config, client)) => report::run(&client, &config, &chrono::Local).await,
        Err(e) => {
            tracing::error!("startup failed: {e:#}");
            report::error_report(&e)
        }
    };

    // Always exit 0: the host shows failures from the output itself
    let mut stdout = std::io::stdout().lock();
    for line in lines {
        if writeln!(stdout, "{line}").is_err() {
            break;
        }
    }
    let _ = stdout.flush();
}

fn load() -> anyhow::Result<(Config, TautulliClient)> {
    let config = Config::load()?;
    let client = TautulliClient::new(&config)?;
    Ok((config, client))
}
