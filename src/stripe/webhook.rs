//! `Stripe-Signature` verification for webhook deliveries.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::{StripeError, StripeEvent};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed timestamp, in seconds.
pub const TOLERANCE_SECS: i64 = 300;

fn mac_for(payload: &[u8], secret: &str, timestamp: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// Hex `v1` signature for `payload` signed at `timestamp`.
pub fn compute_signature(payload: &[u8], secret: &str, timestamp: &str) -> String {
    hex::encode(mac_for(payload, secret, timestamp).finalize().into_bytes())
}

/// Checks a `t=…,v1=…` header. Any one matching `v1` entry is enough.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), StripeError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", t)) => timestamp = Some(t),
            Some(("v1", sig)) => signatures.push(sig),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| StripeError::Signature("missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(StripeError::Signature("no v1 signature".into()));
    }
    let signed_at: i64 = timestamp
        .parse()
        .map_err(|_| StripeError::Signature("malformed timestamp".into()))?;
    if (now - signed_at).abs() > TOLERANCE_SECS {
        return Err(StripeError::Signature("timestamp outside tolerance".into()));
    }

    let matched = signatures.iter().any(|sig| {
        hex::decode(sig)
            .map(|bytes| mac_for(payload, secret, timestamp).verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });
    if matched {
        Ok(())
    } else {
        Err(StripeError::Signature("signature mismatch".into()))
    }
}

pub fn parse_event(payload: &[u8]) -> Result<StripeEvent, StripeError> {
    Ok(serde_json::from_slice(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test123secret456";
    const NOW: i64 = 1_792_000_000;

    fn header(payload: &[u8], secret: &str, t: i64) -> String {
        format!("t={},v1={}", t, compute_signature(payload, secret, &t.to_string()))
    }

    #[test]
    fn accepts_valid_signature() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        assert!(verify_signature(payload, &header(payload, SECRET, NOW), SECRET, NOW).is_ok());
    }

    #[test]
    fn accepts_when_any_v1_matches() {
        let payload = b"{}";
        let good = compute_signature(payload, SECRET, &NOW.to_string());
        let h = format!("t={NOW},v1=deadbeef,v0=ignored,v1={good}");
        assert!(verify_signature(payload, &h, SECRET, NOW).is_ok());
    }

    #[test]
    fn rejects_tampered_payload_wrong_secret_and_old_timestamps() {
        let payload = b"{\"amount\":100}";
        let h = header(payload, SECRET, NOW);
        assert!(verify_signature(b"{\"amount\":1}", &h, SECRET, NOW).is_err());
        let foreign = header(payload, "whsec_other", NOW);
        assert!(verify_signature(payload, &foreign, SECRET, NOW).is_err());
        let stale = header(payload, SECRET, NOW - 600);
        assert!(verify_signature(payload, &stale, SECRET, NOW).is_err());
    }

    #[test]
    fn rejects_malformed_headers() {
        assert!(verify_signature(b"{}", "v1=abc", SECRET, NOW).is_err());
        assert!(verify_signature(b"{}", &format!("t={NOW}"), SECRET, NOW).is_err());
        assert!(verify_signature(b"{}", "t=soon,v1=abc", SECRET, NOW).is_err());
    }

    #[test]
    fn parses_event_envelope() {
        let event = parse_event(
            br#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{"id":"cs_1"}}}"#,
        )
        .unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");
        assert_eq!(event.data.object["id"], "cs_1");
    }
}
