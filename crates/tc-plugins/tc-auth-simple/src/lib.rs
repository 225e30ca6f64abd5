//! # tc-auth-simple
//!
//! SHA-256 signed bearer tokens implementing `AuthProvider`.
//! A token is `<user uuid>.<hex digest of secret + uuid>`; whoever holds the
//! secret can mint them, everyone else can only present them.

use sha2::{Digest, Sha256};
use tc_core::traits::AuthProvider;
use uuid::Uuid;

pub struct SimpleAuthProvider {
    /// Server-side signing secret (e.g., from an environment variable)
    secret: String,
}

impl SimpleAuthProvider {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
        }
    }

    fn signature(&self, user_id: &Uuid) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b":");
        hasher.update(user_id.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Mints a token for `user_id`.
    pub fn issue_token(&self, user_id: Uuid) -> String {
        format!("{}.{}", user_id, self.signature(&user_id))
    }
}

/// Compares without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl AuthProvider for SimpleAuthProvider {
    fn authenticate(&self, token: &str) -> Option<Uuid> {
        let (id, signature) = token.trim().split_once('.')?;
        let user_id = Uuid::parse_str(id).ok()?;
        if constant_time_eq(self.signature(&user_id).as_bytes(), signature.as_bytes()) {
            Some(user_id)
        } else {
            log::debug!("rejected token for {}", user_id);
            None
        }
    }
}
