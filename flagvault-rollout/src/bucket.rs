//! Consistent percentage-rollout bucketing.
//!
//! A subject is placed in one of [`RESOLUTION`] buckets by hashing
//! `(subject_id, flag_key, rollout_seed)` with SHA-256. A rollout percentage is
//! scaled onto the same resolution and the subject is enrolled when its bucket
//! falls below that threshold.
//!
//! # Hash input encoding
//!
//! Each field is written as its UTF-8 byte length (4 bytes, big-endian)
//! followed by its bytes, in the order subject, flag, seed. The encoding is
//! injective, so `("ab", "c")` and `("a", "bc")` hash differently and no
//! character is reserved in any field.
//!
//! # Bucket derivation
//!
//! The first [`HASH_PREFIX_BYTES`] bytes of the digest are read as a
//! big-endian `u64` and reduced modulo [`RESOLUTION`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{Result, RolloutError};

/// Number of buckets. One bucket is 0.01% of the population.
pub const RESOLUTION: u16 = 10_000;

/// Number of leading digest bytes used to derive the bucket.
pub const HASH_PREFIX_BYTES: usize = 8;

/// Position of a subject in the bucket space, always in `[0, RESOLUTION)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketIndex(u16);

impl BucketIndex {
    /// Raw bucket value.
    pub fn value(self) -> u16 {
        self.0
    }

    /// Smallest rollout percentage that enrolls this bucket.
    ///
    /// ```
    /// use flagvault_rollout::RolloutBucketer;
    ///
    /// let bucket = RolloutBucketer::new().bucket("user-1", "rollout-demo", "seed-1").unwrap();
    /// assert!(RolloutBucketer::new()
    ///     .is_in_rollout("user-1", "rollout-demo", "seed-1", bucket.min_percentage())
    ///     .unwrap());
    /// ```
    pub fn min_percentage(self) -> f64 {
        f64::from(self.0 + 1) / 100.0
    }
}

impl fmt::Display for BucketIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rollout percentage scaled onto the bucket space, in `[0, RESOLUTION]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Threshold(u16);

impl Threshold {
    /// Threshold that enrolls nobody.
    pub const NONE: Threshold = Threshold(0);

    /// Threshold that enrolls everybody.
    pub const ALL: Threshold = Threshold(RESOLUTION);

    /// Scale a percentage onto the bucket space.
    ///
    /// Percentages outside `[0, 100]` are clamped. NaN has no meaningful
    /// clamp and is rejected.
    pub fn from_percentage(percentage: f64) -> Result<Self> {
        if percentage.is_nan() {
            return Err(RolloutError::InvalidInput {
                field: "rollout_percentage",
                reason: "must be a number",
            });
        }

        let clamped = clamp_percentage(percentage);
        if clamped != percentage {
            tracing::debug!(percentage, clamped, "rollout percentage clamped");
        }

        // clamped * 100 is within [0, 10000], so the cast cannot truncate.
        Ok(Self((clamped * 100.0).round() as u16))
    }

    /// Raw threshold value.
    pub fn value(self) -> u16 {
        self.0
    }

    /// Percentage this threshold represents, to 0.01.
    pub fn as_percentage(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Whether a bucket falls inside the enrolled range.
    #[inline]
    pub fn contains(self, bucket: BucketIndex) -> bool {
        bucket.0 < self.0
    }
}

/// Clamp a percentage into `[0, 100]`. NaN passes through unchanged.
pub fn clamp_percentage(percentage: f64) -> f64 {
    percentage.clamp(0.0, 100.0)
}

/// Validated bucketing input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolloutKey<'a> {
    subject_id: &'a str,
    flag_key: &'a str,
    seed: &'a str,
}

impl<'a> RolloutKey<'a> {
    /// Validate the identifiers. The seed may be empty.
    pub fn new(subject_id: &'a str, flag_key: &'a str, seed: &'a str) -> Result<Self> {
        if subject_id.is_empty() {
            return Err(RolloutError::empty("subject_id"));
        }
        if flag_key.is_empty() {
            return Err(RolloutError::empty("flag_key"));
        }

        Ok(Self {
            subject_id,
            flag_key,
            seed,
        })
    }

    /// Length-prefixed hash input.
    pub fn encode(&self) -> Vec<u8> {
        let fields = [self.subject_id, self.flag_key, self.seed];
        let capacity = fields.iter().map(|f| f.len() + 4).sum();
        let mut buf = Vec::with_capacity(capacity);

        for field in fields {
            // Lengths beyond u32::MAX saturate.
            let len = u32::try_from(field.len()).unwrap_or(u32::MAX);
            buf.extend_from_slice(&len.to_be_bytes());
            buf.extend_from_slice(field.as_bytes());
        }

        buf
    }

    /// SHA-256 digest of the encoded input.
    pub fn digest(&self) -> [u8; 32] {
        Sha256::digest(self.encode()).into()
    }

    /// Bucket for this input.
    pub fn bucket(&self) -> BucketIndex {
        bucket_from_digest(&self.digest())
    }
}

fn bucket_from_digest(digest: &[u8; 32]) -> BucketIndex {
    let mut prefix = [0u8; HASH_PREFIX_BYTES];
    prefix.copy_from_slice(&digest[..HASH_PREFIX_BYTES]);
    let value = u64::from_be_bytes(prefix) % u64::from(RESOLUTION);

    // value < RESOLUTION, which fits in u16.
    BucketIndex(value as u16)
}

/// Full account of a single rollout decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloutDecision {
    pub subject_id: String,
    pub flag_key: String,
    pub seed: String,
    pub digest: String,
    pub bucket: BucketIndex,
    pub threshold: Threshold,
    pub included: bool,
}

/// Deterministic rollout bucketer.
///
/// Stateless and `Copy`; share it freely across threads.
///
/// ```
/// use flagvault_rollout::RolloutBucketer;
///
/// let bucketer = RolloutBucketer::new();
/// let first = bucketer.is_in_rollout("user-123", "new-ui", "seed-a", 50.0).unwrap();
/// let second = bucketer.is_in_rollout("user-123", "new-ui", "seed-a", 50.0).unwrap();
/// assert_eq!(first, second);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RolloutBucketer;

impl RolloutBucketer {
    pub fn new() -> Self {
        Self
    }

    /// Bucket index for a subject under a flag and seed.
    pub fn bucket(&self, subject_id: &str, flag_key: &str, seed: &str) -> Result<BucketIndex> {
        Ok(RolloutKey::new(subject_id, flag_key, seed)?.bucket())
    }

    /// Whether the subject falls inside the rollout.
    pub fn is_in_rollout(
        &self,
        subject_id: &str,
        flag_key: &str,
        seed: &str,
        percentage: f64,
    ) -> Result<bool> {
        let key = RolloutKey::new(subject_id, flag_key, seed)?;
        let threshold = Threshold::from_percentage(percentage)?;
        let bucket = key.bucket();
        let included = threshold.contains(bucket);

        tracing::trace!(
            subject_id,
            flag_key,
            bucket = bucket.value(),
            threshold = threshold.value(),
            included,
            "rollout evaluated"
        );

        Ok(included)
    }

    /// Same decision as [`is_in_rollout`](Self::is_in_rollout), with the
    /// intermediate values exposed.
    pub fn explain(
        &self,
        subject_id: &str,
        flag_key: &str,
        seed: &str,
        percentage: f64,
    ) -> Result<RolloutDecision> {
        let key = RolloutKey::new(subject_id, flag_key, seed)?;
        let threshold = Threshold::from_percentage(percentage)?;
        let digest = key.digest();
        let bucket = bucket_from_digest(&digest);

        Ok(RolloutDecision {
            subject_id: subject_id.to_string(),
            flag_key: flag_key.to_string(),
            seed: seed.to_string(),
            digest: hex::encode(digest),
            bucket,
            threshold,
            included: threshold.contains(bucket),
        })
    }
}

/// Whether `subject_id` is enrolled in the rollout of `flag_key`.
///
/// Shorthand for [`RolloutBucketer::is_in_rollout`].
pub fn is_in_rollout(
    subject_id: &str,
    flag_key: &str,
    rollout_seed: &str,
    rollout_percentage: f64,
) -> Result<bool> {
    RolloutBucketer::new().is_in_rollout(subject_id, flag_key, rollout_seed, rollout_percentage)
}
