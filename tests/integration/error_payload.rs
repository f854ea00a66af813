//! Failure payload decoding at the foreign boundary.

use consent_relay::payload::{decode_error, encode_error};
use consent_relay::ErrorValue;
use proptest::prelude::*;

#[test]
fn test_documented_round_trip() {
    let value = ErrorValue::new(7, "x", "y");
    let encoded = encode_error(&value).unwrap();
    assert_eq!(decode_error(Some(&encoded)), value);
}

#[test]
fn test_absent_and_truncated_payloads() {
    assert_eq!(decode_error(None), ErrorValue::new(-2, "unknown error", ""));
    assert_eq!(
        decode_error(Some(r#"{"code":7,"message":"x","dom"#)),
        ErrorValue::new(-2, "malformed error payload", "")
    );
}

#[test]
fn test_native_payload_without_domain() {
    // Shape emitted by the Android transport.
    let decoded = decode_error(Some(r#"{"Code":-1,"Message":"Unity activity is null."}"#));
    assert_eq!(decoded.code, -1);
    assert_eq!(decoded.message, "Unity activity is null.");
    assert_eq!(decoded.domain, "");
}

proptest! {
    #[test]
    fn prop_strict_prefix_never_decodes_as_original(
        code in any::<i32>(),
        message in "[a-z ]{0,12}",
        domain in "[a-z.]{0,8}",
        cut in 1usize..8,
    ) {
        let value = ErrorValue::new(code, message, domain);
        let encoded = encode_error(&value).unwrap();
        let cut = cut.min(encoded.len() - 1);
        let truncated = &encoded[..encoded.len() - cut];
        prop_assert_eq!(decode_error(Some(truncated)), ErrorValue::malformed());
    }
}
