//! ID generation for issues.
//!
//! Issue IDs are 24 lowercase hex characters: the leading bytes of a SHA256
//! digest over the creation inputs plus a nonce. Collisions are resolved by
//! bumping the nonce until the candidate is free.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Length of an issue ID in hex characters.
pub const ID_LENGTH: usize = 24;

/// Upper bound on nonce attempts before giving up on a seed.
const MAX_NONCE: u32 = 1000;

/// ID generator that produces unique issue IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator;

impl IdGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Generate a candidate ID with the given parameters.
    #[must_use]
    pub fn generate_candidate(
        &self,
        project: &str,
        title: &str,
        creator: &str,
        created_at: DateTime<Utc>,
        nonce: u32,
    ) -> String {
        let seed = generate_id_seed(project, title, creator, created_at, nonce);
        compute_id_hash(&seed)
    }

    /// Generate an ID, checking for collisions with the provided checker.
    ///
    /// The checker should return `true` if the ID is already taken. Returns
    /// `None` only when every nonce up to the internal bound collided.
    pub fn generate<F>(
        &self,
        project: &str,
        title: &str,
        creator: &str,
        created_at: DateTime<Utc>,
        mut exists: F,
    ) -> Option<String>
    where
        F: FnMut(&str) -> bool,
    {
        (0..MAX_NONCE)
            .map(|nonce| self.generate_candidate(project, title, creator, created_at, nonce))
            .find(|id| !exists(id))
    }
}

/// Generate the seed string for ID generation.
///
/// Inputs: `project | title | creator | created_at (ns) | nonce`
#[must_use]
pub fn generate_id_seed(
    project: &str,
    title: &str,
    creator: &str,
    created_at: DateTime<Utc>,
    nonce: u32,
) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        project,
        title,
        creator,
        created_at.timestamp_nanos_opt().unwrap_or(0),
        nonce
    )
}

/// Hex-encode the first [`ID_LENGTH`] / 2 bytes of the SHA256 of `input`.
#[must_use]
pub fn compute_id_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest
        .iter()
        .take(ID_LENGTH / 2)
        .fold(String::with_capacity(ID_LENGTH), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
}

/// Check whether `id` has the shape of an issue ID.
///
/// Anything else can never match a stored record.
#[must_use]
pub fn is_valid_id_format(id: &str) -> bool {
    id.len() == ID_LENGTH
        && id
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b.to_ascii_lowercase()))
}

/// Normalize a client-supplied ID (trim + lowercase).
#[must_use]
pub fn normalize_id(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}
