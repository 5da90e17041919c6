use bytes::Bytes;
use http::HeaderMap;
use serde::Serialize;
use shape_dispatch::Route;
use tracing::Instrument;

const REQUEST_ID_HEADER: &str = "Lambda-Runtime-Aws-Request-Id";
const TRACE_ID_HEADER: &str = "Lambda-Runtime-Trace-Id";
const DEADLINE_HEADER: &str = "Lambda-Runtime-Deadline-Ms";
const ERROR_TYPE_HEADER: &str = "Lambda-Runtime-Function-Error-Type";

/// Client for the Lambda Runtime API (`/2018-06-01/runtime/...`).
#[derive(Clone)]
pub struct RuntimeApiClient {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Debug)]
pub struct NextInvocation {
    pub request_id: String,
    pub trace_id: Option<String>,
    pub deadline_ms: Option<u64>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Error document accepted by the `/error` endpoints.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorReport {
    #[serde(rename = "errorMessage")]
    pub error_message: String,
    #[serde(rename = "errorType")]
    pub error_type: String,
}

impl ErrorReport {
    pub fn new(error_type: impl Into<String>, err: &anyhow::Error) -> Self {
        Self {
            error_message: format!("{err:#}"),
            error_type: error_type.into(),
        }
    }
}

impl RuntimeApiClient {
    pub fn new(base_url: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().http1_only().build()?;
        Ok(Self { base_url, http })
    }

    /// Long-poll for the next invocation.
    pub async fn next_invocation(&self) -> anyhow::Result<NextInvocation> {
        let url = format!("{}/2018-06-01/runtime/invocation/next", self.base_url);
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("runtime /next failed (status {status})");
        }

        let headers = resp.headers().clone();
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let request_id = header(REQUEST_ID_HEADER)
            .ok_or_else(|| anyhow::anyhow!("runtime /next missing {REQUEST_ID_HEADER}"))?;
        let trace_id = header(TRACE_ID_HEADER);
        let deadline_ms = header(DEADLINE_HEADER).and_then(|v| v.parse().ok());

        let body = resp.bytes().await?;

        Ok(NextInvocation {
            request_id,
            trace_id,
            deadline_ms,
            headers,
            body,
        })
    }

    pub async fn post_response(&self, request_id: &str, payload: Vec<u8>) -> anyhow::Result<()> {
        let url = format!(
            "{}/2018-06-01/runtime/invocation/{}/response",
            self.base_url, request_id
        );
        self.post_json(url, payload, None).await
    }

    pub async fn post_error(&self, request_id: &str, report: &ErrorReport) -> anyhow::Result<()> {
        let url = format!(
            "{}/2018-06-01/runtime/invocation/{}/error",
            self.base_url, request_id
        );
        self.post_json(url, serde_json::to_vec(report)?, Some(&report.error_type))
            .await
    }

    pub async fn post_init_error(&self, report: &ErrorReport) -> anyhow::Result<()> {
        let url = format!("{}/2018-06-01/runtime/init/error", self.base_url);
        self.post_json(url, serde_json::to_vec(report)?, Some(&report.error_type))
            .await
    }

    async fn post_json(
        &self,
        url: String,
        payload: Vec<u8>,
        error_type: Option<&str>,
    ) -> anyhow::Result<()> {
        let mut req = self
            .http
            .post(&url)
            .header(http::header::CONTENT_TYPE, "application/json");
        if let Some(error_type) = error_type {
            req = req.header(ERROR_TYPE_HEADER, error_type);
        }

        let resp = req.body(payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("runtime post to {url} failed (status {status})");
        }
        Ok(())
    }
}

/// Fetch one invocation, route it and post the result.
///
/// A reply is posted as the normalized JSON object; a void outcome is posted as `null`.
pub async fn serve_one<R>(client: &RuntimeApiClient, router: &R) -> anyhow::Result<()>
where
    R: Route + ?Sized,
{
    let next = client.next_invocation().await?;
    let span = tracing::info_span!(
        "request",
        request_id = %next.request_id,
        trace_id = next.trace_id.as_deref().unwrap_or_default(),
        deadline_ms = next.deadline_ms,
    );

    async {
        let response = router.route(next.body.clone()).await;
        match serde_json::to_vec(&response) {
            Ok(payload) => client.post_response(&next.request_id, payload).await,
            Err(err) => {
                let err = anyhow::Error::new(err).context("encode response");
                tracing::error!(error = %err, "failed to encode response");
                let report = ErrorReport::new("Runtime.SerializationError", &err);
                client.post_error(&next.request_id, &report).await
            }
        }
    }
    .instrument(span)
    .await
}

/// Serve invocations until the Runtime API fails.
pub async fn run_loop<R>(client: &RuntimeApiClient, router: &R) -> anyhow::Result<()>
where
    R: Route + ?Sized,
{
    loop {
        if let Err(err) = serve_one(client, router).await {
            tracing::error!(error = %err, "runtime api failure");
            return Err(err);
        }
    }
}
