use std::sync::LazyLock;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore as _;
use sha2::{Digest, Sha256};

const TOKEN_LABEL: &[u8] = b"LatteToken";

static TOKEN_HEADER: LazyLock<String> = LazyLock::new(|| STANDARD.encode(TOKEN_LABEL));

/// Issues tokens of the form `<header>.<payload>`.
///
/// The header is a fixed base64 label; the payload is the base64 SHA-256 of 32
/// random bytes. [`verify`](Self::verify) only checks the header and the
/// delimiter, so any string carrying the right prefix passes. Use
/// [`IssuedTokenValidator`](crate::token::IssuedTokenValidator) to also require
/// that the token was actually issued.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenGenerator;

impl TokenGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn header() -> &'static str {
        TOKEN_HEADER.as_str()
    }

    pub fn generate(&self) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let payload = STANDARD.encode(Sha256::digest(bytes));
        format!("{}.{}", Self::header(), payload)
    }

    pub fn verify(&self, token: &str) -> bool {
        token
            .strip_prefix(Self::header())
            .is_some_and(|rest| rest.starts_with('.'))
    }
}
