use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use tokio::{
    net::TcpListener,
    sync::{mpsc, watch},
};
use tracing::{error, info, warn};

use countdown_common::{CountdownError, RuntimeConfig};

use crate::{
    app::{report, run_main_loop, CountdownApp},
    display::LogDisplay,
    rtc::SystemRtc,
    server,
    time_provider::{sync_with_retry, HttpTimeProvider, INITIAL_BACKOFF},
};

const REQUEST_QUEUE_DEPTH: usize = 8;

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = load_config();

    let provider = HttpTimeProvider::new(&config.time_service)
        .context("failed to build time service client")?;
    let now = sync_with_retry(&provider, config.time_service.attempts, INITIAL_BACKOFF)
        .await
        .inspect_err(|err| report(&CountdownError::from(err.clone())))
        .context("could not fetch the current time")?;
    info!("The current time is: {now}");

    let mut app = CountdownApp::new(
        SystemRtc::new(),
        LogDisplay::new(),
        config.default_target,
        config.form_variant,
        config.timezone.clone(),
    );
    match app.boot(now, config.alarm, config.display.brightness) {
        Some(remaining) => info!(
            "counting down to {}: {remaining} days remaining",
            config.default_target
        ),
        None => warn!("clock unreadable at boot; countdown waits for the first good tick"),
    }

    let (requests, inbox) = mpsc::channel(REQUEST_QUEUE_DEPTH);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind countdown server at {addr}"))?;
    info!("countdown form at http://{addr}/");

    let router = server::router(requests);
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            error!("http server stopped: {err}");
        }
    });

    let (stop, shutdown) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                let _ = stop.send(true);
            }
            Err(err) => warn!("cannot listen for ctrl-c: {err}"),
        }
    });

    run_main_loop(
        app,
        inbox,
        shutdown,
        Duration::from_millis(config.poll_interval_ms),
    )
    .await;
    Ok(())
}

fn load_config() -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    for warning in config.apply_overrides(|name| std::env::var(name).ok()) {
        warn!("{warning}");
    }
    config.sanitize();

    if !config.timezone_is_known() {
        warn!(
            "timezone {:?} is not a known IANA name; reporting it as configured",
            config.timezone
        );
    }
    if !config.time_service.has_credentials() && config.time_service.url_override.is_none() {
        warn!("time service credentials are not set; boot sync will likely fail");
    }

    config
}
