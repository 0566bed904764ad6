use futures::StreamExt;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use crate::{
    error::{GenerateError, Result},
    models::gradio::{GradioCallRequest, GradioCallResponse, QueueJob},
    providers::sse::SseParser,
};

/// Client for the Gradio "call" API: a job is submitted to a queue, then its
/// output is read back from an event stream.
#[derive(Clone)]
pub struct GradioClient {
    client: Client,
}

impl GradioClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Submits then polls. The poll starts only once the submit has produced
    /// an event id.
    pub async fn call(
        &self,
        base_url: &str,
        endpoint: &str,
        data: &[Value],
        token: Option<&str>,
    ) -> Result<Vec<Value>> {
        let job = self.submit(base_url, endpoint, data, token).await?;
        self.poll(base_url, endpoint, &job, token).await
    }

    pub async fn submit(
        &self,
        base_url: &str,
        endpoint: &str,
        data: &[Value],
        token: Option<&str>,
    ) -> Result<QueueJob> {
        let url = format!("{}/gradio_api/call/{}", base_url, endpoint);
        log::debug!("Submitting Gradio job to {}", url);

        let response = with_token(self.client.post(&url), token)
            .json(&GradioCallRequest { data })
            .send()
            .await
            .map_err(|e| {
                GenerateError::RequestError(format!("Queue request to {} failed: {}", url, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Gradio queue at {} answered {}", url, status);
            return Err(GenerateError::QueueRequestFailed(status.as_u16()));
        }

        let body: GradioCallResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::ResponseError(format!("Malformed queue response: {}", e)))?;

        let event_id = body.event_id.ok_or(GenerateError::NoEventId)?;
        log::info!("Gradio job queued with event id {}", event_id);

        Ok(QueueJob { event_id })
    }

    /// Reads the job's event stream until the first terminal line.
    pub async fn poll(
        &self,
        base_url: &str,
        endpoint: &str,
        job: &QueueJob,
        token: Option<&str>,
    ) -> Result<Vec<Value>> {
        let url = format!("{}/gradio_api/call/{}/{}", base_url, endpoint, job.event_id);
        log::debug!("Polling Gradio job at {}", url);

        let response = with_token(self.client.get(&url), token)
            .send()
            .await
            .map_err(|e| {
                GenerateError::RequestError(format!("Poll request to {} failed: {}", url, e))
            })?;

        if !response.status().is_success() {
            // The body still gets parsed; whatever it holds ends up in the
            // NoCompleteEvent diagnostics.
            log::warn!("Gradio stream at {} answered {}", url, response.status());
        }

        let mut parser = SseParser::new();
        let mut pending: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                GenerateError::RequestError(format!("Event stream interrupted: {}", e))
            })?;
            pending.extend_from_slice(&chunk);

            while let Some(end) = pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = pending.drain(..=end).collect();
                if let Some(payload) = parser.feed_line(&String::from_utf8_lossy(&line))? {
                    return Ok(payload);
                }
            }
        }

        if !pending.is_empty() {
            if let Some(payload) = parser.feed_line(&String::from_utf8_lossy(&pending))? {
                return Ok(payload);
            }
        }

        log::error!("Gradio stream for {} ended without a complete event", job.event_id);
        Err(parser.finish())
    }
}

fn with_token(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}
