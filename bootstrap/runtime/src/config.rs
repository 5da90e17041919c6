//! Bootstrap configuration, read from the function's environment.

use std::str::FromStr;

pub const RUNTIME_API_ENV: &str = "AWS_LAMBDA_RUNTIME_API";
const HTTP_HANDLER_ENV: &str = "DISPATCH_HTTP_HANDLER";
const MAIL_SOURCE_ENV: &str = "DISPATCH_MAIL_SOURCE";
const QUEUE_CONCURRENCY_ENV: &str = "DISPATCH_QUEUE_CONCURRENCY";
const TRACING_ENV: &str = "DISPATCH_TRACING";
/// Set by the Datadog extension setup; its presence turns invocation tracing on.
const DATADOG_SECRET_ENV: &str = "DD_API_KEY_SECRET_ARN";

/// Which leaf handler serves HTTP gateway events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpHandlerKind {
    Greeting,
    /// Relay mail through SES from a verified `source` address.
    Mail { source: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandlerName {
    Greeting,
    Mail,
}

impl FromStr for HandlerName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greeting" => Ok(Self::Greeting),
            "mail" => Ok(Self::Mail),
            other => {
                anyhow::bail!("unknown {HTTP_HANDLER_ENV} ({other}); expected greeting or mail")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `host:port` of the Lambda Runtime API.
    pub runtime_api: String,
    pub http_handler: HttpHandlerKind,
    /// Records of one queue batch processed at once.
    pub queue_concurrency: usize,
    /// Wrap the router in the tracing layer.
    pub tracing: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let runtime_api =
            var(RUNTIME_API_ENV).ok_or_else(|| anyhow::anyhow!("missing {RUNTIME_API_ENV}"))?;

        let handler = match var(HTTP_HANDLER_ENV) {
            Some(name) => name.parse::<HandlerName>()?,
            None => HandlerName::Greeting,
        };
        let http_handler = match handler {
            HandlerName::Greeting => HttpHandlerKind::Greeting,
            HandlerName::Mail => {
                let source = var(MAIL_SOURCE_ENV).ok_or_else(|| {
                    anyhow::anyhow!("{HTTP_HANDLER_ENV}=mail requires {MAIL_SOURCE_ENV}")
                })?;
                HttpHandlerKind::Mail { source }
            }
        };

        let queue_concurrency = match var(QUEUE_CONCURRENCY_ENV) {
            Some(raw) => raw.trim().parse::<usize>().map_err(|err| {
                anyhow::anyhow!("invalid {QUEUE_CONCURRENCY_ENV} ({raw}): {err}")
            })?,
            None => 1,
        }
        .max(1);

        let tracing = var(TRACING_ENV).is_some_and(|v| is_truthy(&v))
            || var(DATADOG_SECRET_ENV).is_some();

        Ok(Self {
            runtime_api,
            http_handler,
            queue_concurrency,
            tracing,
        })
    }

    pub fn runtime_base_url(&self) -> String {
        format!("http://{}", self.runtime_api)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_apply_for_optional_vars() {
        let cfg = config(&[(RUNTIME_API_ENV, "127.0.0.1:9001")]).unwrap();
        assert_eq!(cfg.runtime_api, "127.0.0.1:9001");
        assert_eq!(cfg.runtime_base_url(), "http://127.0.0.1:9001");
        assert_eq!(cfg.http_handler, HttpHandlerKind::Greeting);
        assert_eq!(cfg.queue_concurrency, 1);
        assert!(!cfg.tracing);
    }

    #[test]
    fn runtime_api_is_required() {
        assert!(config(&[]).is_err());
        assert!(config(&[(RUNTIME_API_ENV, " ")]).is_err());
    }

    #[test]
    fn mail_handler_requires_a_source() {
        let err = config(&[(RUNTIME_API_ENV, "x:1"), (HTTP_HANDLER_ENV, "mail")]).unwrap_err();
        assert!(err.to_string().contains(MAIL_SOURCE_ENV));

        let cfg = config(&[
            (RUNTIME_API_ENV, "x:1"),
            (HTTP_HANDLER_ENV, "Mail"),
            (MAIL_SOURCE_ENV, "noreply@example.com"),
        ])
        .unwrap();
        assert_eq!(
            cfg.http_handler,
            HttpHandlerKind::Mail {
                source: "noreply@example.com".to_string()
            }
        );
    }

    #[test]
    fn unknown_handler_is_an_error() {
        assert!(config(&[(RUNTIME_API_ENV, "x:1"), (HTTP_HANDLER_ENV, "smtp")]).is_err());
    }

    #[test]
    fn queue_concurrency_is_parsed_and_floored() {
        let cfg = config(&[(RUNTIME_API_ENV, "x:1"), (QUEUE_CONCURRENCY_ENV, "8")]).unwrap();
        assert_eq!(cfg.queue_concurrency, 8);
        let cfg = config(&[(RUNTIME_API_ENV, "x:1"), (QUEUE_CONCURRENCY_ENV, "0")]).unwrap();
        assert_eq!(cfg.queue_concurrency, 1);
        assert!(config(&[(RUNTIME_API_ENV, "x:1"), (QUEUE_CONCURRENCY_ENV, "many")]).is_err());
    }

    #[test]
    fn tracing_switches() {
        let on = config(&[(RUNTIME_API_ENV, "x:1"), (TRACING_ENV, "true")]).unwrap();
        assert!(on.tracing);
        let off = config(&[(RUNTIME_API_ENV, "x:1"), (TRACING_ENV, "0")]).unwrap();
        assert!(!off.tracing);
        let dd = config(&[
            (RUNTIME_API_ENV, "x:1"),
            (DATADOG_SECRET_ENV, "arn:aws:secretsmanager:us-east-1:1:secret:dd"),
        ])
        .unwrap();
        assert!(dd.tracing);
    }
}
