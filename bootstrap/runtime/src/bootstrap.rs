use shape_dispatch::handlers::{LoggingProcessor, MailRelayHandler, QueueHandler};
use shape_dispatch::{HandlerRegistry, Route, Router, Traced};

use crate::config::{Config, HttpHandlerKind, RUNTIME_API_ENV};
use crate::runtime_api::{self, ErrorReport, RuntimeApiClient};
use crate::ses::SesMailSender;

pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            report_init_error(&err).await;
            return Err(err);
        }
    };

    let client = RuntimeApiClient::new(cfg.runtime_base_url())?;
    let router = build_router(&cfg).await;
    tracing::info!(
        http_handler = ?cfg.http_handler,
        queue_concurrency = cfg.queue_concurrency,
        tracing = cfg.tracing,
        "runtime ready"
    );

    runtime_api::run_loop(&client, router.as_ref()).await
}

/// Wire the handler registry described by `cfg`.
pub async fn build_router(cfg: &Config) -> Box<dyn Route> {
    let mut registry = HandlerRegistry::new()
        .with_queue(QueueHandler::new(LoggingProcessor).with_concurrency(cfg.queue_concurrency));

    if let HttpHandlerKind::Mail { source } = &cfg.http_handler {
        let sender = SesMailSender::new(source.clone()).await;
        registry = registry.with_http(MailRelayHandler::new(sender));
    }

    let router = Router::new(registry);
    if cfg.tracing {
        Box::new(Traced::new(router))
    } else {
        Box::new(router)
    }
}

async fn report_init_error(err: &anyhow::Error) {
    tracing::error!(error = %err, "invalid configuration");

    let Ok(runtime_api) = std::env::var(RUNTIME_API_ENV) else {
        return;
    };
    let report = ErrorReport::new("Runtime.InitError", err);
    let result = match RuntimeApiClient::new(format!("http://{runtime_api}")) {
        Ok(client) => client.post_init_error(&report).await,
        Err(err) => Err(err),
    };
    if let Err(err) = result {
        tracing::warn!(error = %err, "failed to report init error");
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("AWS_LAMBDA_LOG_FORMAT").unwrap_or_default();
    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .without_time()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .without_time()
            .init();
    }
}
