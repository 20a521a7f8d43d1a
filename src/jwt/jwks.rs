use crate::error::Error;
use log::debug;
use reqwest::blocking::Client as HttpClient;
use reqwest::StatusCode;
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;
use url::Url;

use super::jwk::JwkObject;

pub(crate) const DEFAULT_JWKS_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_BODY_BYTES: usize = 128;

#[derive(Debug, Deserialize)]
struct RawJwkSet {
    #[serde(default)]
    keys: Vec<JwkObject>,
}

/// Fetches a key set with a client built for this call only.
pub(crate) fn fetch_jwks(jwks_url: &str, timeout: Duration) -> Result<Vec<JwkObject>, Error> {
    let url = Url::parse(jwks_url)?;
    let redacted = redact_url(&url);
    let http = HttpClient::builder().timeout(timeout).build()?;
    let mut resp = http.get(url).send().map_err(|err| {
        debug!("jwks request failed; uri={}: {}", redacted, err);
        Error::JwksFetch(format!("request to {redacted} failed"))
    })?;
    let status = resp.status();
    if status != StatusCode::OK {
        let body = read_body_with_limit(&mut resp, MAX_ERROR_BODY_BYTES + 1)?;
        return Err(status_error(status, &body, &redacted));
    }
    let body = resp.bytes().map_err(|err| {
        debug!("jwks body read failed; uri={}: {}", redacted, err);
        Error::JwksFetch(format!("failed to read response from {redacted}"))
    })?;
    parse_jwks(&body)
}

/// Reads at most `limit` bytes of an error response body.
pub(crate) fn read_body_with_limit<R: Read>(reader: &mut R, limit: usize) -> Result<Vec<u8>, Error> {
    let mut body = Vec::new();
    reader
        .take(limit as u64)
        .read_to_end(&mut body)
        .map_err(|err| Error::JwksFetch(format!("failed to read error response: {err}")))?;
    Ok(body)
}

pub(crate) fn status_error(status: StatusCode, body: &[u8], redacted: &str) -> Error {
    debug!(
        "jwks fetch failed; uri={}, status={}, body_read_len={}, body_preview={}",
        redacted,
        status,
        body.len(),
        sanitize_error_body(body)
    );
    Error::JwksFetch(format!("uri {redacted} returned status {status}"))
}

pub(crate) fn parse_jwks(body: &[u8]) -> Result<Vec<JwkObject>, Error> {
    let jwks: RawJwkSet =
        serde_json::from_slice(body).map_err(|err| Error::JwksParse(err.to_string()))?;
    Ok(jwks.keys)
}

pub(crate) fn select_jwk<'a>(keys: &'a [JwkObject], kid: &str) -> Result<&'a JwkObject, Error> {
    keys.iter()
        .find(|jwk| jwk.get("kid").and_then(|value| value.as_str()) == Some(kid))
        .ok_or_else(|| Error::NoMatchingJwk(kid.to_string()))
}

/// Printable, bounded preview of an HTTP error body for logs.
pub(crate) fn sanitize_error_body(body: &[u8]) -> String {
    let mut sanitized = String::new();
    for &byte in body.iter().take(MAX_ERROR_BODY_BYTES) {
        match byte {
            b'\n' => sanitized.push_str("\\n"),
            b'\r' => sanitized.push_str("\\r"),
            b'\t' => sanitized.push_str("\\t"),
            _ if byte.is_ascii_graphic() || byte == b' ' => sanitized.push(byte as char),
            _ => sanitized.push('.'),
        }
    }
    if body.len() > MAX_ERROR_BODY_BYTES {
        sanitized.push_str("...");
    }
    sanitized
}

/// The URL without credentials, query or fragment.
pub(crate) fn redact_url(url: &Url) -> String {
    let mut redacted = url.clone();
    let _ = redacted.set_username("");
    let _ = redacted.set_password(None);
    redacted.set_query(None);
    redacted.set_fragment(None);
    redacted.to_string()
}

#[cfg(feature = "async-validate")]
pub(crate) async fn fetch_jwks_async(
    jwks_url: &str,
    timeout: Duration,
) -> Result<Vec<JwkObject>, Error> {
    use reqwest::Client as AsyncHttpClient;

    let url = Url::parse(jwks_url)?;
    let redacted = redact_url(&url);
    let http = AsyncHttpClient::builder().timeout(timeout).build()?;
    let mut resp = http.get(url).send().await.map_err(|err| {
        debug!("jwks request failed; uri={}: {}", redacted, err);
        Error::JwksFetch(format!("request to {redacted} failed"))
    })?;
    let status = resp.status();
    if status != StatusCode::OK {
        let body = read_body_with_limit_async(&mut resp, MAX_ERROR_BODY_BYTES + 1).await?;
        return Err(status_error(status, &body, &redacted));
    }
    let body = resp.bytes().await.map_err(|err| {
        debug!("jwks body read failed; uri={}: {}", redacted, err);
        Error::JwksFetch(format!("failed to read response from {redacted}"))
    })?;
    parse_jwks(&body)
}

#[cfg(feature = "async-validate")]
async fn read_body_with_limit_async(
    resp: &mut reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, Error> {
    let mut body = Vec::new();
    while body.len() < limit {
        let chunk = resp
            .chunk()
            .await
            .map_err(|err| Error::JwksFetch(format!("failed to read error response: {err}")))?;
        match chunk {
            Some(chunk) => {
                let take = chunk.len().min(limit - body.len());
                body.extend_from_slice(&chunk[..take]);
            }
            None => break,
        }
    }
    Ok(body)
}
