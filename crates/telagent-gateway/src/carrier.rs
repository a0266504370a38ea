// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Carrier Media Endpoint (C1, §4.1): accepts the carrier's call-setup POST,
//! verifies its signature, resolves the called number to a business, and
//! replies with a streaming directive pointing the carrier at the media
//! WebSocket (C2).

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum CarrierError {
    #[error("carrier signature verification failed")]
    BadSignature,
    #[error("malformed call-setup body: {0}")]
    MalformedBody(String),
    #[error("no business is configured for number {0}")]
    UnknownNumber(String),
}

/// Fields the carrier posts at call setup (§6: caller number, called number,
/// a call identifier).
#[derive(Debug, Clone)]
pub struct CallSetup {
    pub from: String,
    pub to: String,
    pub call_id: String,
}

/// Parses a `application/x-www-form-urlencoded` body into a [`CallSetup`].
/// Hand-rolled rather than pulled from a crate: the carrier's field set is
/// fixed and small, and percent-decoding here only needs to handle `+` and
/// `%XX` — the same scope as the rest of this form body.
pub fn parse_call_setup(body: &str) -> Result<CallSetup, CarrierError> {
    let mut from = None;
    let mut to = None;
    let mut call_id = None;

    for pair in body.split('&').filter(|s| !s.is_empty()) {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next().unwrap_or("");
        let value = percent_decode(parts.next().unwrap_or(""));
        match key {
            "from" | "From" | "Caller" => from = Some(value),
            "to" | "To" | "Called" => to = Some(value),
            "call_id" | "CallSid" | "callId" => call_id = Some(value),
            _ => {}
        }
    }

    Ok(CallSetup {
        from: from.ok_or_else(|| CarrierError::MalformedBody("missing from/caller".into()))?,
        to: to.ok_or_else(|| CarrierError::MalformedBody("missing to/called".into()))?,
        call_id: call_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
    })
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                if let Ok(byte) = u8::from_str_radix(&s[i + 1..i + 3], 16) {
                    out.push(byte);
                    i += 3;
                } else {
                    out.push(bytes[i]);
                    i += 1;
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Verifies `HMAC-SHA256(shared_secret, full_url + body)` against a
/// hex-encoded signature, in constant time (§4.1).
pub fn verify_signature(secret: &[u8], full_url: &str, body: &[u8], provided_hex: &str) -> bool {
    let Ok(provided) = hex::decode(provided_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(full_url.as_bytes());
    mac.update(body);
    let expected = mac.finalize().into_bytes();
    expected.ct_eq(&provided).into()
}

/// The XML streaming directive handed back to the carrier, pointing it at
/// the media WebSocket with per-call parameters (§4.1, §6).
pub fn streaming_directive(media_ws_url: &str, business_id: &str, from: &str, to: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
  <Connect>
    <Stream url="{media_ws_url}">
      <Parameter name="businessId" value="{business_id}"/>
      <Parameter name="from" value="{from}"/>
      <Parameter name="to" value="{to}"/>
    </Stream>
  </Connect>
</Response>"#
    )
}

/// Spoken-rejection directive for an unresolvable or not-ready business
/// (§4.1 failure semantics: never an error status the carrier would retry).
pub fn rejection_directive(message: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
  <Say>{message}</Say>
  <Hangup/>
</Response>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_field_names() {
        let setup = parse_call_setup("from=%2B15559998888&to=%2B15551110001&call_id=abc123").unwrap();
        assert_eq!(setup.from, "+15559998888");
        assert_eq!(setup.to, "+15551110001");
        assert_eq!(setup.call_id, "abc123");
    }

    #[test]
    fn missing_to_is_rejected() {
        let err = parse_call_setup("from=%2B15559998888").unwrap_err();
        assert!(matches!(err, CarrierError::MalformedBody(_)));
    }

    #[test]
    fn missing_call_id_generates_one() {
        let setup = parse_call_setup("from=%2B1&to=%2B2").unwrap();
        assert!(!setup.call_id.is_empty());
    }

    #[test]
    fn signature_roundtrips() {
        let secret = b"shared-secret";
        let url = "https://gateway.example.com/voice/incoming";
        let body = b"from=%2B1&to=%2B2";
        let mut mac = HmacSha256::new_from_slice(secret).unwrap();
        mac.update(url.as_bytes());
        mac.update(body);
        let sig = hex::encode(mac.finalize().into_bytes());
        assert!(verify_signature(secret, url, body, &sig));
    }

    #[test]
    fn tampered_body_fails_verification() {
        let secret = b"shared-secret";
        let url = "https://gateway.example.com/voice/incoming";
        let mut mac = HmacSha256::new_from_slice(secret).unwrap();
        mac.update(url.as_bytes());
        mac.update(b"from=%2B1&to=%2B2");
        let sig = hex::encode(mac.finalize().into_bytes());
        assert!(!verify_signature(secret, url, b"from=%2B1&to=%2B9", &sig));
    }

    #[test]
    fn malformed_hex_signature_fails_closed() {
        assert!(!verify_signature(b"secret", "url", b"body", "not-hex"));
    }

    #[test]
    fn streaming_directive_embeds_parameters() {
        let xml = streaming_directive("wss://gw.example.com/media", "acme", "+1", "+2");
        assert!(xml.contains("businessId"));
        assert!(xml.contains("acme"));
        assert!(xml.contains("wss://gw.example.com/media"));
    }
}
