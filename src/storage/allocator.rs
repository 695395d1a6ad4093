//! Path allocation
//!
//! Derives the date-partitioned directory and the generated file name for an
//! upload. Names look like `<millis>-<token>.<ext>` and live under
//! `/YYYY/MM/DD/`.

use chrono::{DateTime, Datelike, TimeZone};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

use crate::storage::results::AllocatedPath;

/// Token alphabet. The digit range appears twice, so digits are drawn with
/// double the weight of letters.
pub const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz0123456789";
pub const TOKEN_LENGTH: usize = 6;

/// Process-wide allocator shared by all request handlers.
///
/// The generator is seeded once from OS entropy; handlers that run in the
/// same millisecond draw from one stream instead of identically seeded ones.
pub struct PathAllocator {
    rng: Mutex<StdRng>,
}

impl Default for PathAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl PathAllocator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic generator, for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Allocate the relative directory and new file name for `origin_name`
    /// uploaded at `now`.
    pub fn allocate<Tz: TimeZone>(&self, origin_name: &str, now: &DateTime<Tz>) -> AllocatedPath {
        let ext = extension_of(origin_name);
        let file_name = format!("{}-{}.{}", now.timestamp_millis(), self.token(), ext);

        AllocatedPath {
            relative_dir: date_directory(now),
            file_name,
        }
    }

    /// Draws a fresh random token.
    pub fn token(&self) -> String {
        // A poisoned lock only means another handler panicked mid-draw; the
        // generator state is still usable.
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        (0..TOKEN_LENGTH)
            .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
            .collect()
    }
}

/// `/YYYY/MM/DD/` for the given instant.
pub fn date_directory<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    format!("/{:04}/{:02}/{:02}/", now.year(), now.month(), now.day())
}

/// Substring after the last `.` of the final path component, or empty.
///
/// Only the final component is considered, so directory segments in a
/// client-supplied name never leak into the generated name.
pub fn extension_of(origin_name: &str) -> &str {
    let base = origin_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(origin_name);

    match base.rfind('.') {
        Some(index) => &base[index + 1..],
        None => "",
    }
}
