use crate::error::Error;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

use super::codec::Claims;

pub(crate) fn unix_time_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or(0)
}

/// Checks `exp`, `nbf`, `aud` and `iss`. Both temporal claims are mandatory;
/// an empty expected audience or issuer skips that check.
pub fn validate_claims(
    payload: &Claims,
    expected_audience: &str,
    expected_issuer: &str,
) -> Result<(), Error> {
    validate_claims_at(payload, expected_audience, expected_issuer, unix_time_now())
}

pub(crate) fn validate_claims_at(
    payload: &Claims,
    expected_audience: &str,
    expected_issuer: &str,
    now: i64,
) -> Result<(), Error> {
    let exp = required_numeric_claim(payload, "exp")?;
    if now > exp {
        return Err(Error::TokenExpired);
    }

    let nbf = required_numeric_claim(payload, "nbf")?;
    if now < nbf {
        return Err(Error::TokenNotYetValid);
    }

    if !expected_audience.is_empty() {
        match payload.get("aud") {
            None => return Err(Error::MissingClaim("aud".to_string())),
            Some(Value::String(aud)) if aud == expected_audience => {}
            Some(_) => return Err(Error::InvalidAudience),
        }
    }

    if !expected_issuer.is_empty() {
        match payload.get("iss") {
            None => return Err(Error::MissingClaim("iss".to_string())),
            Some(Value::String(iss)) if iss == expected_issuer => {}
            Some(_) => return Err(Error::InvalidIssuer),
        }
    }

    Ok(())
}

fn required_numeric_claim(payload: &Claims, name: &str) -> Result<i64, Error> {
    let value = payload
        .get(name)
        .ok_or_else(|| Error::MissingClaim(name.to_string()))?;
    numeric_value(value).ok_or_else(|| Error::InvalidClaimType(name.to_string()))
}

/// JSON numbers as whole seconds; fractional values truncate toward zero.
pub(crate) fn numeric_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_u64().map(|value| value.min(i64::MAX as u64) as i64))
            .or_else(|| number.as_f64().map(|value| value as i64)),
        _ => None,
    }
}
