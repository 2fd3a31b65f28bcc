use std::path::PathBuf;

use tracing_subscriber::{fmt, EnvFilter};

use toopher_signer::Config;
use toopher_signer::iframe::{AuthenticationUrlOptions, ToopherIframe};

fn main() -> anyhow::Result<()> {
    let config_path = std::env::var("TOOPHER_CONFIG").ok().map(PathBuf::from);
    let config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::from_env(),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},toopher_signer=debug", config.app.log_level)));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    match &config_path {
        Some(path) => tracing::debug!(path = %path.display(), "loaded config"),
        None => tracing::debug!("config from environment"),
    }

    let mut args = std::env::args().skip(1);
    let Some(username) = args.next() else {
        anyhow::bail!("usage: toopher-signer <username> [session-token]");
    };
    let session_token = args.next().unwrap_or_default();

    let iframe = ToopherIframe::from_config(&config)?;
    tracing::info!(base_url = %config.toopher.base_url, %username, "signing authentication iframe URL");

    let options = AuthenticationUrlOptions {
        session_token,
        ttl: config.toopher.url_ttl,
        ..Default::default()
    };
    println!("{}", iframe.authentication_url(&username, &options));

    Ok(())
}
