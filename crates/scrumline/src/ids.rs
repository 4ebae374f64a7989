//! Hash-based entity id minting.
//!
//! Projects, sprints and issues get ids of the form `{kind}-{hash}`, e.g.
//! "issue-a3f8": a SHA-256 of the seed content plus timestamp and nonce,
//! base36-encoded to an adaptive 4-6 character suffix. Collisions are
//! resolved by retrying with a fresh nonce, falling back to a longer
//! suffix.

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::debug;

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_NONCE: u32 = 100;

/// Id generator with collision tracking across all entity kinds.
#[derive(Debug, Default)]
pub(crate) struct IdMinter {
    existing: HashSet<String>,
}

impl IdMinter {
    /// Create a minter with no known ids.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh id of the form `{kind}-{hash}` that collides with no
    /// previously minted id.
    ///
    /// `seed` is any stable-ish content for the entity (name, title); the
    /// timestamp and nonce mixed into the hash make repeated identical
    /// seeds produce distinct ids.
    pub(crate) fn mint(&mut self, kind: &str, seed: &str) -> String {
        let length = self.adaptive_length();

        for nonce in 0..MAX_NONCE {
            let id = hash_id(kind, seed, nonce, length);
            if self.existing.insert(id.clone()) {
                if nonce > 0 {
                    debug!(nonce, kind, "minted id after collision retries");
                }
                return id;
            }
        }

        // All nonces collided at this length; a longer suffix over the full
        // nonce range cannot realistically collide as well.
        let id = hash_id(kind, seed, 0, length + 1);
        self.existing.insert(id.clone());
        id
    }

    /// Suffix length grows with the number of known ids:
    /// 4 chars up to 500, 5 up to 1500, 6 beyond.
    fn adaptive_length(&self) -> usize {
        match self.existing.len() {
            0..=500 => 4,
            501..=1500 => 5,
            _ => 6,
        }
    }
}

fn hash_id(kind: &str, seed: &str, nonce: u32, length: usize) -> String {
    let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let content = format!("{kind}|{seed}|{timestamp}|{nonce}");

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let hash = hasher.finalize();

    format!("{}-{}", kind, encode_base36(&hash[..8], length))
}

/// Encode the first bytes of a hash as a fixed-length base36 string.
///
/// Wrapping arithmetic is intentional: the input is capped at 8 bytes and
/// any overflow still yields a deterministic value that the base36 step
/// normalizes to the requested length.
fn encode_base36(bytes: &[u8], length: usize) -> String {
    let mut num: u64 = 0;
    for &byte in bytes {
        num = num.wrapping_shl(8).wrapping_add(u64::from(byte));
    }

    let mut result = Vec::with_capacity(length);
    let mut n = num;
    while result.len() < length {
        result.push(BASE36_CHARS[(n % 36) as usize]);
        n /= 36;
    }
    result.reverse();

    // BASE36_CHARS is ASCII, so the bytes are always valid UTF-8.
    String::from_utf8(result).unwrap_or_default()
}
