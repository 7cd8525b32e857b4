//! Single request execution.

use crate::outcome::{FailureKind, Outcome};
use reqwest::{Client, Url};
use std::time::Instant;

/// Issue one GET against `url` and classify the result.
///
/// Latency covers the full exchange including draining the body. Any
/// received status is carried as-is; transport errors become
/// `Outcome::Failure` with zero latency. No retries.
pub async fn execute(client: &Client, url: &Url) -> Outcome {
    let start = Instant::now();

    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => return Outcome::failure(classify(&e, FailureKind::Request)),
    };

    let status_code = response.status().as_u16();

    match response.bytes().await {
        Ok(_) => Outcome::success(status_code, start.elapsed()),
        Err(e) => Outcome::failure(classify(&e, FailureKind::Body)),
    }
}

fn classify(err: &reqwest::Error, fallback: FailureKind) -> FailureKind {
    if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_connect() {
        FailureKind::Connect
    } else if err.is_body() || err.is_decode() {
        FailureKind::Body
    } else if err.is_builder() || err.is_request() {
        fallback
    } else {
        FailureKind::Other
    }
}
