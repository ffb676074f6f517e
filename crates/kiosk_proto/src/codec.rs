//! Envelope codec — JSON payload ⇄ `Envelope`.
//!
//! encrypt: serialize → fresh salt + iv → HKDF key → AES-256-GCM(aad = path)
//! decrypt: decode fields → check aad → HKDF key → AES-256-GCM open → JSON
//!
//! Every message gets its own salt and therefore its own key. The codec keeps
//! no session state and can be shared freely between concurrent callers.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use kiosk_crypto::{aead, kdf, SharedSecret, KDF_INFO};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use zeroize::Zeroizing;

use crate::envelope::Envelope;
use crate::error::CodecError;

#[derive(Debug, Clone)]
pub struct EnvelopeCodec {
    secret: SharedSecret,
}

impl EnvelopeCodec {
    pub fn new(secret: SharedSecret) -> Self {
        Self { secret }
    }

    /// Encrypt `payload` for the API path `path`.
    pub fn encrypt<T: Serialize + ?Sized>(
        &self,
        payload: &T,
        path: &str,
    ) -> Result<Envelope, CodecError> {
        if path.is_empty() {
            return Err(CodecError::InvalidPath("path must not be empty".into()));
        }
        let plaintext = canonical_plaintext(payload)?;

        let salt = kdf::generate_salt();
        let iv = kdf::generate_iv();
        let key = kdf::derive(&self.secret, &salt, KDF_INFO)?;
        let ciphertext = aead::seal(&key, &iv, &plaintext, path.as_bytes())?;

        Ok(Envelope {
            iv: STANDARD.encode(iv),
            salt: STANDARD.encode(salt),
            ciphertext: STANDARD.encode(ciphertext),
            aad: path.to_owned(),
        })
    }

    /// Decrypt an envelope into a JSON value.
    ///
    /// When `expected_path` is given it must equal the envelope's `aad`; the
    /// comparison happens before any key is derived.
    pub fn decrypt(
        &self,
        envelope: &Envelope,
        expected_path: Option<&str>,
    ) -> Result<Value, CodecError> {
        let plaintext = self.open(envelope, expected_path)?;
        serde_json::from_slice(&plaintext).map_err(CodecError::Decode)
    }

    /// Decrypt straight into a typed payload.
    pub fn decrypt_as<T: DeserializeOwned>(
        &self,
        envelope: &Envelope,
        expected_path: Option<&str>,
    ) -> Result<T, CodecError> {
        let plaintext = self.open(envelope, expected_path)?;
        serde_json::from_slice(&plaintext).map_err(CodecError::Decode)
    }

    fn open(
        &self,
        envelope: &Envelope,
        expected_path: Option<&str>,
    ) -> Result<Zeroizing<Vec<u8>>, CodecError> {
        let parts = envelope.decode_parts()?;
        if let Some(expected) = expected_path {
            if expected != envelope.aad {
                return Err(CodecError::AadMismatch {
                    expected: expected.to_owned(),
                    actual: envelope.aad.clone(),
                });
            }
        }
        let key = kdf::derive(&self.secret, &parts.salt, KDF_INFO)?;
        Ok(aead::open(&key, &parts.iv, &parts.ciphertext, envelope.aad.as_bytes())?)
    }
}

/// Serialise a payload for sealing. Going through `Value` sorts object keys.
fn canonical_plaintext<T: Serialize + ?Sized>(
    payload: &T,
) -> Result<Zeroizing<Vec<u8>>, CodecError> {
    let value = serde_json::to_value(payload).map_err(CodecError::Serialisation)?;
    let bytes = serde_json::to_vec(&value).map_err(CodecError::Serialisation)?;
    Ok(Zeroizing::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    const LOGIN: &str = "/v1/auth/login";
    const HEALTH: &str = "/v1/health";

    fn codec() -> EnvelopeCodec {
        let secret = SharedSecret::from_utf8("TEST_MASTER_SECRET_1234567890_CHANGE_ME").unwrap();
        EnvelopeCodec::new(secret)
    }

    fn flip_bit(b64: &str, byte: usize, bit: u8) -> String {
        let mut raw = STANDARD.decode(b64).unwrap();
        raw[byte] ^= 1 << bit;
        STANDARD.encode(raw)
    }

    #[test]
    fn login_payload_roundtrip() {
        let payload = json!({"userId": "admin", "pin": "1234"});
        let env = codec().encrypt(&payload, LOGIN).unwrap();
        assert_eq!(env.aad(), LOGIN);
        let back = codec().decrypt(&env, Some(LOGIN)).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn roundtrip_assorted_payloads() {
        let payloads = [
            json!(null),
            json!(true),
            json!(42),
            json!("plain string"),
            json!([1, "two", {"three": 3}]),
            json!({"nested": {"list": [], "unicode": "ünïcödé ✓"}}),
        ];
        for payload in payloads {
            let env = codec().encrypt(&payload, HEALTH).unwrap();
            assert_eq!(codec().decrypt(&env, Some(HEALTH)).unwrap(), payload);
        }
    }

    #[test]
    fn typed_roundtrip() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Login {
            user_id: String,
            pin: String,
        }
        let login = Login { user_id: "admin".into(), pin: "1234".into() };
        let env = codec().encrypt(&login, LOGIN).unwrap();
        let back: Login = codec().decrypt_as(&env, Some(LOGIN)).unwrap();
        assert_eq!(back, login);
    }

    #[test]
    fn wire_sizes_match_protocol() {
        let payload = json!({"status": "ok"});
        let plaintext_len = serde_json::to_vec(&payload).unwrap().len();
        let env = codec().encrypt(&payload, HEALTH).unwrap();
        assert_eq!(STANDARD.decode(env.salt()).unwrap().len(), 16);
        assert_eq!(STANDARD.decode(env.iv()).unwrap().len(), 12);
        assert_eq!(STANDARD.decode(env.ciphertext()).unwrap().len(), plaintext_len + 16);
    }

    #[test]
    fn each_encryption_is_fresh() {
        let payload = json!({"userId": "admin", "pin": "1234"});
        let a = codec().encrypt(&payload, LOGIN).unwrap();
        let b = codec().encrypt(&payload, LOGIN).unwrap();
        assert_ne!(a.salt(), b.salt());
        assert_ne!(a.iv(), b.iv());
        assert_ne!(a.ciphertext(), b.ciphertext());
    }

    #[test]
    fn envelope_for_login_rejected_as_health() {
        let env = codec().encrypt(&json!({"pin": "1234"}), LOGIN).unwrap();
        let err = codec().decrypt(&env, Some(HEALTH)).unwrap_err();
        match err {
            CodecError::AadMismatch { expected, actual } => {
                assert_eq!(expected, HEALTH);
                assert_eq!(actual, LOGIN);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn without_expected_path_aad_is_still_authenticated() {
        let env = codec().encrypt(&json!({"status": "ok"}), HEALTH).unwrap();
        assert_eq!(codec().decrypt(&env, None).unwrap(), json!({"status": "ok"}));

        let mut moved = env.clone();
        moved.aad = LOGIN.into();
        assert!(matches!(codec().decrypt(&moved, None), Err(CodecError::Authentication)));
    }

    #[test]
    fn single_bit_flips_are_detected() {
        let env = codec().encrypt(&json!({"userId": "admin", "pin": "1234"}), LOGIN).unwrap();
        let ct_len = STANDARD.decode(env.ciphertext()).unwrap().len();

        for byte in 0..16 {
            let mut t = env.clone();
            t.salt = flip_bit(&env.salt, byte, (byte % 8) as u8);
            assert!(matches!(codec().decrypt(&t, Some(LOGIN)), Err(CodecError::Authentication)));
        }
        for byte in 0..12 {
            let mut t = env.clone();
            t.iv = flip_bit(&env.iv, byte, 7);
            assert!(matches!(codec().decrypt(&t, Some(LOGIN)), Err(CodecError::Authentication)));
        }
        for byte in 0..ct_len {
            let mut t = env.clone();
            t.ciphertext = flip_bit(&env.ciphertext, byte, 0);
            assert!(matches!(codec().decrypt(&t, Some(LOGIN)), Err(CodecError::Authentication)));
        }

        let mut t = env.clone();
        let mut aad = env.aad.clone().into_bytes();
        aad[1] ^= 0x01;
        t.aad = String::from_utf8(aad).unwrap();
        assert!(matches!(
            codec().decrypt(&t, Some(LOGIN)),
            Err(CodecError::AadMismatch { .. })
        ));
        assert!(matches!(codec().decrypt(&t, None), Err(CodecError::Authentication)));
    }

    #[test]
    fn wrong_secret_fails_authentication() {
        let env = codec().encrypt(&json!({"status": "ok"}), HEALTH).unwrap();
        let other = EnvelopeCodec::new(SharedSecret::from_utf8("DEFAULT_INSECURE_SECRET").unwrap());
        let err = other.decrypt(&env, Some(HEALTH)).unwrap_err();
        assert!(err.is_integrity_failure());
    }

    #[test]
    fn missing_salt_never_reaches_crypto() {
        let env = codec().encrypt(&json!({"status": "ok"}), HEALTH).unwrap();
        let mut wire = env.to_value().unwrap();
        wire.as_object_mut().unwrap().remove("salt");
        let err = Envelope::from_value(&wire).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEnvelope(_)));
    }

    #[test]
    fn malformed_fields_fail_before_aad_check() {
        let env = codec().encrypt(&json!({"status": "ok"}), HEALTH).unwrap();
        let mut broken = env.clone();
        broken.iv = "***".into();
        assert!(matches!(
            codec().decrypt(&broken, Some(LOGIN)),
            Err(CodecError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn authentic_non_json_plaintext_is_decode_error() {
        let codec = codec();
        let salt = kdf::generate_salt();
        let iv = kdf::generate_iv();
        let key = kdf::derive(&codec.secret, &salt, KDF_INFO).unwrap();
        let ct = aead::seal(&key, &iv, b"<html>not json</html>", HEALTH.as_bytes()).unwrap();
        let env = Envelope {
            iv: STANDARD.encode(iv),
            salt: STANDARD.encode(salt),
            ciphertext: STANDARD.encode(ct),
            aad: HEALTH.into(),
        };
        assert!(matches!(codec.decrypt(&env, Some(HEALTH)), Err(CodecError::Decode(_))));
    }

    #[test]
    fn plaintext_buffer_is_zeroizing_and_key_sorted() {
        let plaintext: Zeroizing<Vec<u8>> =
            canonical_plaintext(&json!({"password": "hunter2", "email": "a@b.c"})).unwrap();
        assert_eq!(&plaintext[..], br#"{"email":"a@b.c","password":"hunter2"}"#);
    }

    #[test]
    fn empty_path_rejected() {
        assert!(matches!(
            codec().encrypt(&json!({}), ""),
            Err(CodecError::InvalidPath(_))
        ));
    }

    #[test]
    fn wire_json_roundtrip_through_text() {
        let env = codec().encrypt(&json!({"status": "ok"}), HEALTH).unwrap();
        let text = env.to_json().unwrap();
        let parsed = Envelope::from_json(&text).unwrap();
        assert_eq!(parsed, env);
        assert_eq!(codec().decrypt(&parsed, Some(HEALTH)).unwrap(), json!({"status": "ok"}));
    }

    #[test]
    fn concurrent_callers_share_one_codec() {
        let codec = std::sync::Arc::new(codec());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let codec = codec.clone();
                std::thread::spawn(move || {
                    let payload = json!({"n": i});
                    let env = codec.encrypt(&payload, LOGIN).unwrap();
                    codec.decrypt(&env, Some(LOGIN)).unwrap() == payload
                })
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap());
        }
    }
}
