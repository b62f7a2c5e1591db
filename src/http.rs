//! One-shot HTTP(S) GET used by the web-based RDDS80 and RDAP checks.
//!
//! The caller hands over an IP-literal URL plus the original domain for
//! the `Host:` header, so the virtual host is reached at the exact
//! address the test selected. Server certificates are deliberately not
//! verified, matching the probe's historical behaviour.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::constants::HTTP_USER_AGENT;
use crate::error::{Failure, HttpError, HttpPreStatusError};

/// What to do with the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyCapture {
    Discard,
    Capture,
}

/// Fetch `url` with the `Host:` header forced to `host_header`. Returns
/// the total round-trip time in milliseconds and the body when capture
/// was requested. The final status must be 200.
pub async fn http_test(
    host_header: &str,
    url: &str,
    timeout_s: u64,
    max_redirects: u32,
    capture: BodyCapture,
) -> Result<(u32, Option<Vec<u8>>), Failure<HttpError>> {
    let client = reqwest::Client::builder()
        .user_agent(HTTP_USER_AGENT)
        .danger_accept_invalid_certs(true)
        .redirect(reqwest::redirect::Policy::limited(max_redirects as usize))
        .timeout(Duration::from_secs(timeout_s))
        .build()
        .map_err(|err| {
            Failure::new(
                HttpError::PreStatus(HttpPreStatusError::Internal),
                format!("cannot init HTTP client: {}", err),
            )
        })?;

    let started = Instant::now();

    let response = client
        .get(url)
        .header(reqwest::header::HOST, host_header)
        .send()
        .await
        .map_err(|err| classify_send_error(url, &err))?;

    let status = response.status().as_u16();

    /* drain the body in any case, the transfer is part of the timing */
    let body = response
        .bytes()
        .await
        .map_err(|err| classify_send_error(url, &err))?;

    if status != 200 {
        return Err(Failure::new(
            HttpError::HttpStatus(status),
            format!("invalid HTTP response code, expected 200, got {}", status),
        ));
    }

    let rtt = started.elapsed().as_millis() as u32;

    debug!(url, rtt_ms = rtt, body_len = body.len(), "HTTP test succeeded");

    let body = match capture {
        BodyCapture::Capture => Some(body.to_vec()),
        BodyCapture::Discard => None,
    };

    Ok((rtt, body))
}

fn classify_send_error(url: &str, err: &reqwest::Error) -> Failure<HttpError> {
    let kind = if err.is_timeout() {
        HttpPreStatusError::Timeout
    } else if err.is_redirect() {
        HttpPreStatusError::EMaxRedirects
    } else if err.is_connect() {
        HttpPreStatusError::Econ
    } else if url.starts_with("http://") {
        HttpPreStatusError::EHttp
    } else {
        HttpPreStatusError::EHttps
    };

    Failure::new(HttpError::PreStatus(kind), err.to_string())
}
