//! Session token and voter hash helpers
//!
//! Sessions are carried in a cookie as an opaque random token and resolved
//! server-side against the `sessions` table. The cookie never encodes
//! identity; parsing a user id out of a cookie value is exactly what this
//! replaces.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Length of a session token in hex characters (32 random bytes).
pub const TOKEN_HEX_LEN: usize = 64;

/// Namespace prefix for voter hashes, so they can never collide with raw
/// user ids stored elsewhere.
const VOTER_HASH_PREFIX: &str = "arbourne-voter:";

/// Generate a new opaque session token (64 hex chars from 32 random bytes).
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

/// Quick well-formedness check before hitting the sessions table.
pub fn is_well_formed_token(token: &str) -> bool {
    token.len() == TOKEN_HEX_LEN && token.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Derive the stable per-voter hash recorded against a vote.
///
/// One vote per (album, voter) is enforced on this value, so it must be a
/// pure function of the user id.
pub fn voter_hash(user_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(VOTER_HASH_PREFIX.as_bytes());
    hasher.update(user_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
