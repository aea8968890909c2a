use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::model::AnswerResponse;

pub const RUN_ENDPOINT: &str = "/api/run";

pub type RunOptions = Map<String, Value>;

pub trait AnswerService: Send + Sync {
    fn run(&self, query: &str, opts: &RunOptions) -> Result<AnswerResponse>;
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    query: &'a str,
    opts: &'a RunOptions,
}

pub struct HttpAnswerService {
    client: Client,
    run_url: String,
}

impl HttpAnswerService {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build answering service client")?;

        Ok(Self {
            client,
            run_url: run_url(api_url),
        })
    }

    pub fn run_url(&self) -> &str {
        &self.run_url
    }
}

impl AnswerService for HttpAnswerService {
    fn run(&self, query: &str, opts: &RunOptions) -> Result<AnswerResponse> {
        debug!(url = %self.run_url, query, "submitting query");

        let response = self
            .client
            .post(&self.run_url)
            .json(&RunRequest { query, opts })
            .send()
            .with_context(|| format!("request to {} failed", self.run_url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("answering service returned {status}: {}", body.trim());
        }

        response
            .json::<AnswerResponse>()
            .context("answering service returned an unreadable response")
    }
}

fn run_url(api_url: &str) -> String {
    format!("{}{RUN_ENDPOINT}", api_url.trim_end_matches('/'))
}
