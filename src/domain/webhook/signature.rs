//! HMAC primitives and provider signature header parsing.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::{Choice, ConstantTimeEq};

use super::errors::VerificationError;

type HmacSha256 = Hmac<Sha256>;

/// Parsed components of a provider signature header.
///
/// Format: `t=<timestamp>,v1=<hex signature>[,v1=<hex signature>...]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Timestamp exactly as it appeared in the header; the signed string
    /// uses this text, not a re-rendered integer.
    pub timestamp_raw: String,
    /// Unix seconds parsed from `timestamp_raw`.
    pub timestamp: i64,
    /// Decoded `v1` candidates. Values that are not valid hex cannot match
    /// anything and are dropped.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a provider signature header.
    ///
    /// Items without `=` and unknown schemes are ignored for forward
    /// compatibility. The first `t` wins.
    ///
    /// # Errors
    ///
    /// Returns `VerificationError::MalformedHeader` when no timestamp or no
    /// `v1` entry is present, or the timestamp is not an integer.
    pub fn parse(header: &str) -> Result<Self, VerificationError> {
        let mut timestamp_raw: Option<&str> = None;
        let mut v1_values: Vec<&str> = Vec::new();

        for item in header.split(',') {
            let Some((key, value)) = item.split_once('=') else {
                continue;
            };
            match key.trim() {
                "t" if timestamp_raw.is_none() => timestamp_raw = Some(value.trim()),
                "v1" => v1_values.push(value.trim()),
                _ => {}
            }
        }

        let timestamp_raw =
            timestamp_raw.ok_or(VerificationError::MalformedHeader("missing timestamp"))?;
        if v1_values.is_empty() {
            return Err(VerificationError::MalformedHeader("missing v1 signature"));
        }
        let timestamp = timestamp_raw
            .parse::<i64>()
            .map_err(|_| VerificationError::MalformedHeader("invalid timestamp"))?;

        let v1_signatures = v1_values
            .into_iter()
            .filter_map(|v| hex::decode(v).ok())
            .collect();

        Ok(SignatureHeader {
            timestamp_raw: timestamp_raw.to_string(),
            timestamp,
            v1_signatures,
        })
    }
}

/// HMAC-SHA256 over the concatenation of `parts`.
pub fn hmac_sha256(secret: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().to_vec()
}

/// Constant-time comparison of two byte slices.
///
/// Length is not secret (HMAC output is fixed size), so a length mismatch
/// returns early.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Returns true if any candidate equals `expected`.
///
/// Every candidate is compared; the loop never short-circuits on a match.
pub fn any_constant_time_match(expected: &[u8], candidates: &[Vec<u8>]) -> bool {
    let matched = candidates.iter().fold(Choice::from(0u8), |acc, candidate| {
        let equal = if candidate.len() == expected.len() {
            candidate.as_slice().ct_eq(expected)
        } else {
            Choice::from(0u8)
        };
        acc | equal
    });
    matched.into()
}

/// Hex HMAC-SHA256 of `body`, as a generic-mode sender would compute it.
#[cfg(test)]
pub fn compute_test_signature(secret: &str, body: &[u8]) -> String {
    hex::encode(hmac_sha256(secret.as_bytes(), &[body]))
}

/// Hex HMAC-SHA256 of `"{timestamp}.{body}"`, as a provider would compute it.
#[cfg(test)]
pub fn compute_test_provider_signature(secret: &str, timestamp: i64, body: &[u8]) -> String {
    let ts = timestamp.to_string();
    hex::encode(hmac_sha256(secret.as_bytes(), &[ts.as_bytes(), b".", body]))
}
