use crate::error::Error;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{Map, Value};

/// Open string-keyed claim (or header) map.
pub type Claims = Map<String, Value>;

pub(crate) struct JwtParts<'a> {
    pub(crate) header: &'a str,
    pub(crate) payload: &'a str,
    pub(crate) signature: &'a str,
}

impl JwtParts<'_> {
    /// `header.payload`, exactly as it was signed.
    pub(crate) fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.payload)
    }

    pub(crate) fn signature_bytes(&self) -> Result<Vec<u8>, Error> {
        base64_url_decode(self.signature).map_err(|_| Error::InvalidTokenSignature)
    }
}

pub(crate) fn split_jwt(token: &str) -> Result<JwtParts<'_>, Error> {
    let mut iter = token.split('.');
    let header = iter.next().ok_or(Error::InvalidJwtFormat)?;
    let payload = iter.next().ok_or(Error::InvalidJwtFormat)?;
    let signature = iter.next().ok_or(Error::InvalidJwtFormat)?;
    if iter.next().is_some() {
        return Err(Error::InvalidJwtFormat);
    }
    Ok(JwtParts {
        header,
        payload,
        signature,
    })
}

/// Builds the `base64url(header).base64url(claims)` signing input.
pub fn encode_signing_input(header: &Claims, claims: &Claims) -> Result<String, Error> {
    let header_json = serde_json::to_vec(header)?;
    let claims_json = serde_json::to_vec(claims)?;
    Ok(format!(
        "{}.{}",
        base64_url_encode(&header_json),
        base64_url_encode(&claims_json)
    ))
}

pub fn decode_jwt_header(token: &str) -> Result<Claims, Error> {
    let parts = split_jwt(token)?;
    decode_segment(parts.header).map_err(Error::DecodeHeader)
}

pub fn decode_jwt_payload(token: &str) -> Result<Claims, Error> {
    let parts = split_jwt(token)?;
    decode_segment(parts.payload).map_err(Error::DecodePayload)
}

/// Decodes header and payload without verifying the signature.
pub fn decode_jwt(token: &str) -> Result<(Claims, Claims), Error> {
    let parts = split_jwt(token)?;
    let header = decode_segment(parts.header).map_err(Error::DecodeHeader)?;
    let payload = decode_segment(parts.payload).map_err(Error::DecodePayload)?;
    Ok((header, payload))
}

fn decode_segment(segment: &str) -> Result<Claims, String> {
    let bytes = base64_url_decode(segment).map_err(|err| format!("base64url: {err}"))?;
    serde_json::from_slice(&bytes).map_err(|err| format!("json: {err}"))
}

pub(crate) fn base64_url_decode(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(data)
}

pub(crate) fn base64_url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}
