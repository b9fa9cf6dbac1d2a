use base64::Engine as _;

use super::*;
use crate::doc::PersonId;

// =============================================================
// Encoding
// =============================================================

#[test]
fn encode_is_url_safe() {
    let encoded = encode(&Diagram::starter()).unwrap();
    assert!(encoded.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
}

#[test]
fn encode_then_decode_restores_the_diagram() {
    let d = Diagram::starter();
    assert_eq!(decode(&encode(&d).unwrap()).unwrap(), d);
}

#[test]
fn encode_strips_avatars() {
    let mut d = Diagram::starter();
    d.set_person_image(PersonId(1), "data:image/png;base64,AAAA".into()).unwrap();
    let back = decode(&encode(&d).unwrap()).unwrap();
    assert!(back.people.iter().all(|p| p.image.is_none()));
}

#[test]
fn share_query_uses_canonical_param() {
    let q = share_query(&Diagram::new()).unwrap();
    assert!(q.starts_with("d="));
}

#[test]
fn encoding_is_deterministic() {
    let d = Diagram::starter();
    assert_eq!(encode(&d).unwrap(), encode(&d).unwrap());
}

// =============================================================
// Decoding
// =============================================================

#[test]
fn malformed_compact_payload_is_an_error() {
    let err = SharePayload::Compact("not valid json".into()).decode().unwrap_err();
    assert!(matches!(err, ShareError::Base64(_)));
}

#[test]
fn malformed_legacy_payload_is_an_error() {
    let err = SharePayload::Legacy("not valid json".into()).decode().unwrap_err();
    assert!(matches!(err, ShareError::Json(_)));
}

#[test]
fn base64_of_non_diagram_is_a_json_error() {
    let encoded = URL_SAFE_NO_PAD.encode(b"[1,2,3]");
    assert!(matches!(decode(&encoded), Err(ShareError::Json(_))));
}

#[test]
fn base64_of_binary_is_a_utf8_error() {
    let encoded = URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0xfd]);
    assert!(matches!(decode(&encoded), Err(ShareError::Utf8(_))));
}

#[test]
fn padded_compact_payload_is_accepted() {
    let d = Diagram::new();
    let padded = format!("{}==", encode(&d).unwrap());
    assert_eq!(decode(&padded).unwrap(), d);
}

#[test]
fn legacy_raw_json_decodes() {
    let json = Diagram::starter().to_json().unwrap();
    assert_eq!(decode_legacy(&json).unwrap(), Diagram::starter());
}

#[test]
fn legacy_percent_encoded_json_decodes() {
    let raw = r#"{"people":[{"id":1,"name":"A B","x":100,"y":100}],"relationships":[]}"#;
    let escaped: String = raw
        .bytes()
        .map(|b| if b.is_ascii_alphanumeric() { (b as char).to_string() } else { format!("%{b:02X}") })
        .collect();
    let d = decode_legacy(&escaped).unwrap();
    assert_eq!(d.people[0].name, "A B");
}

#[test]
fn oversized_payload_is_rejected_before_decoding() {
    let big = "A".repeat(MAX_SHARE_BYTES + 1);
    let err = SharePayload::Compact(big).decode().unwrap_err();
    assert!(matches!(err, ShareError::TooLarge { .. }));
}

// =============================================================
// Parameter selection
// =============================================================

#[test]
fn from_params_prefers_compact() {
    let p = SharePayload::from_params(Some("abc".into()), Some("{}".into())).unwrap();
    assert_eq!(p, SharePayload::Compact("abc".into()));
    assert_eq!(p.param(), "d");
}

#[test]
fn from_params_falls_back_to_legacy() {
    let p = SharePayload::from_params(Some(String::new()), Some("{}".into())).unwrap();
    assert_eq!(p, SharePayload::Legacy("{}".into()));
    assert_eq!(p.raw(), "{}");
}

#[test]
fn from_params_requires_one_value() {
    assert!(matches!(SharePayload::from_params(None, None), Err(ShareError::Missing)));
}

#[test]
fn from_query_reads_share_query_output() {
    let d = Diagram::starter();
    let q = format!("?{}&utm_source=x", share_query(&d).unwrap());
    let payload = SharePayload::from_query(&q).unwrap();
    assert_eq!(payload.decode().unwrap(), d);
}

#[test]
fn from_query_decodes_legacy_param_once() {
    let q = "data=%7B%22people%22%3A%5B%5D%7D";
    let payload = SharePayload::from_query(q).unwrap();
    assert_eq!(payload, SharePayload::Legacy(r#"{"people":[]}"#.into()));
    assert_eq!(payload.decode().unwrap(), Diagram::new());
}
