use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;

use crate::models::Session;

pub const SESSION_COOKIE: &str = "inbox_summary_session";
pub const STATE_COOKIE: &str = "inbox_summary_oauth_state";
pub const SESSION_KEY_BYTES: usize = 32;
const SESSION_ENVELOPE_VERSION: u8 = 1;
const STATE_COOKIE_MAX_AGE_SECS: u32 = 600;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session key must be 64 hex characters (32 bytes)")]
    InvalidKey,

    #[error("generate random bytes for session sealing")]
    Random,

    #[error("encrypt session payload")]
    Seal,

    #[error("session cookie is not valid base64")]
    Encoding,

    #[error("unsupported session envelope version {0}")]
    Version(u8),

    #[error("session cookie is truncated")]
    Truncated,

    #[error("session cookie failed authentication")]
    Open,

    #[error("session payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Seals a [`Session`] into an opaque cookie value and opens it again.
///
/// Layout before base64url: `version || nonce || AES-256-GCM(ciphertext || tag)`.
/// Any bit flip makes [`SessionSealer::open`] fail, so the cookie is both
/// encrypted and signed.
pub struct SessionSealer {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl SessionSealer {
    pub fn new(key: &[u8; SESSION_KEY_BYTES]) -> Result<Self, SessionError> {
        let unbound = UnboundKey::new(&AES_256_GCM, key).map_err(|_| SessionError::InvalidKey)?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }

    pub fn from_hex(raw: &str) -> Result<Self, SessionError> {
        Self::new(&parse_session_key_hex(raw)?)
    }

    /// Random per-process key; sessions are lost on restart.
    pub fn generate() -> Result<Self, SessionError> {
        let mut key = [0u8; SESSION_KEY_BYTES];
        SystemRandom::new()
            .fill(&mut key)
            .map_err(|_| SessionError::Random)?;
        Self::new(&key)
    }

    pub fn seal(&self, session: &Session) -> Result<String, SessionError> {
        let mut payload = serde_json::to_vec(session)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| SessionError::Random)?;

        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::from([SESSION_ENVELOPE_VERSION]),
                &mut payload,
            )
            .map_err(|_| SessionError::Seal)?;

        let mut envelope = Vec::with_capacity(1 + NONCE_LEN + payload.len());
        envelope.push(SESSION_ENVELOPE_VERSION);
        envelope.extend_from_slice(&nonce_bytes);
        envelope.extend_from_slice(&payload);
        Ok(URL_SAFE_NO_PAD.encode(envelope))
    }

    pub fn open(&self, cookie_value: &str) -> Result<Session, SessionError> {
        let mut envelope = URL_SAFE_NO_PAD
            .decode(cookie_value.trim())
            .map_err(|_| SessionError::Encoding)?;

        let Some((&version, _)) = envelope.split_first() else {
            return Err(SessionError::Truncated);
        };
        if version != SESSION_ENVELOPE_VERSION {
            return Err(SessionError::Version(version));
        }
        if envelope.len() < 1 + NONCE_LEN + AES_256_GCM.tag_len() {
            return Err(SessionError::Truncated);
        }

        let nonce_bytes: [u8; NONCE_LEN] = envelope[1..1 + NONCE_LEN]
            .try_into()
            .map_err(|_| SessionError::Truncated)?;
        let ciphertext = &mut envelope[1 + NONCE_LEN..];

        let plaintext = self
            .key
            .open_in_place(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::from([version]),
                ciphertext,
            )
            .map_err(|_| SessionError::Open)?;

        Ok(serde_json::from_slice(plaintext)?)
    }
}

pub fn parse_session_key_hex(raw: &str) -> Result<[u8; SESSION_KEY_BYTES], SessionError> {
    hex_decode(raw)
        .ok_or(SessionError::InvalidKey)?
        .try_into()
        .map_err(|_| SessionError::InvalidKey)
}

fn hex_decode(raw: &str) -> Option<Vec<u8>> {
    let bytes = raw.trim().as_bytes();
    if bytes.len() % 2 != 0 {
        return None;
    }
    bytes
        .chunks_exact(2)
        .map(|pair| Some((decode_hex_nibble(pair[0])? << 4) | decode_hex_nibble(pair[1])?))
        .collect()
}

fn decode_hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

// --- cookies ---

/// First value of cookie `name` in the request's `Cookie` headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Browser-session cookie: no `Max-Age`, dropped when the browser closes.
pub fn session_cookie(value: &str, secure: bool) -> String {
    build_cookie(SESSION_COOKIE, value, None, secure)
}

pub fn state_cookie(value: &str, secure: bool) -> String {
    build_cookie(STATE_COOKIE, value, Some(STATE_COOKIE_MAX_AGE_SECS), secure)
}

pub fn expired_cookie(name: &str, secure: bool) -> String {
    build_cookie(name, "", Some(0), secure)
}

fn build_cookie(name: &str, value: &str, max_age: Option<u32>, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
