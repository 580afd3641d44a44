//! Time-windowed code and seed derivation.
//!
//! Time is counted in 100 ns ticks since the 1601-01-01 epoch and
//! quantized to fixed windows. A secret is "stamped" by overwriting its
//! first 8 bytes with the window start, then hashed; the digest drives
//! both the human-readable grouped code and the 31-bit pattern seed.
//! Identical (secret, window) pairs always yield identical output.

#[cfg(not(feature = "std"))]
use alloc::string::String;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::secret::Secret;
use crate::Error;

/// 100 ns ticks per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Seconds between the 1601-01-01 tick epoch and the Unix epoch.
pub const UNIX_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

const CODE_GROUPS: usize = 4;
const GROUP_BYTES: usize = 4;

/// Token alphabet for code groups. Duplicated entries are intentional:
/// the mapping is `chunk mod 20`, and changing the table changes every
/// issued code.
const ALPHABET: [&str; 20] = [
    "..", ".-", "-.", "--", "..-", ".-.", ".--", "-..", "-.-", "--.", //
    "..", ".-", "-.", "--", "..-", ".-.", ".--", "-..", "-.-", "--.",
];

/// Derives grouped codes and pattern seeds for discrete time windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeGenerator {
    /// Window length in seconds. Codes rotate once per window.
    pub window_seconds: u32,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self { window_seconds: 60 }
    }
}

impl CodeGenerator {
    /// Create with a custom window length.
    ///
    /// # Panics
    /// Panics if `window_seconds` is 0. Use
    /// [`CodeGenerator::try_new`] to reject it as an error instead.
    pub fn new(window_seconds: u32) -> Self {
        assert!(window_seconds > 0, "window_seconds must be greater than 0");
        Self { window_seconds }
    }

    /// Fallible counterpart of [`CodeGenerator::new`].
    pub fn try_new(window_seconds: u32) -> Result<Self, Error> {
        if window_seconds == 0 {
            return Err(Error::ZeroWindow);
        }
        Ok(Self { window_seconds })
    }

    /// Window length in ticks.
    pub fn window_ticks(&self) -> i64 {
        self.window_seconds as i64 * TICKS_PER_SECOND
    }

    /// Quantize an absolute tick count down to its window start.
    pub fn quantize(&self, ticks: i64) -> i64 {
        ticks - ticks % self.window_ticks()
    }

    /// Hash of the secret with its first 8 bytes replaced by the
    /// little-endian window start.
    fn stamped_digest(&self, secret: &Secret, window_start: i64) -> [u8; 32] {
        let mut stamped = Zeroizing::new(secret.as_bytes().to_vec());
        stamped[..8].copy_from_slice(&window_start.to_le_bytes());
        Sha256::digest(stamped.as_slice()).into()
    }

    /// Grouped code for the window containing `ticks`: four alphabet
    /// tokens joined by single spaces.
    pub fn code_for(&self, secret: &Secret, ticks: i64) -> String {
        let digest = self.stamped_digest(secret, self.quantize(ticks));

        let mut groups = Vec::with_capacity(CODE_GROUPS);
        for chunk in digest[..CODE_GROUPS * GROUP_BYTES].chunks_exact(GROUP_BYTES) {
            let value = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            groups.push(ALPHABET[value as usize % ALPHABET.len()]);
        }
        groups.join(" ")
    }

    /// 31-bit pattern seed for the window containing `ticks`: the XOR
    /// of the first four little-endian words of the stamped digest,
    /// top bit cleared.
    pub fn seed_for(&self, secret: &Secret, ticks: i64) -> u32 {
        let digest = self.stamped_digest(secret, self.quantize(ticks));

        let mut seed = 0u32;
        for chunk in digest[..16].chunks_exact(4) {
            seed ^= u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        seed & 0x7fff_ffff
    }

    /// Code for the current wall-clock window.
    #[cfg(feature = "std")]
    pub fn code_now(&self, secret: &Secret) -> String {
        self.code_for(secret, now_ticks())
    }

    /// Seed for the current wall-clock window.
    #[cfg(feature = "std")]
    pub fn seed_now(&self, secret: &Secret) -> u32 {
        self.seed_for(secret, now_ticks())
    }
}

/// Accepts a presented code if it matches any window in a small range
/// around "now", compensating for clock skew and entry delay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeValidator {
    /// Generator whose codes are being checked.
    pub generator: CodeGenerator,
    /// Windows checked before the current one.
    pub backwards_checks: u32,
    /// Windows checked after the current one.
    pub forwards_checks: u32,
}

impl Default for CodeValidator {
    fn default() -> Self {
        Self {
            generator: CodeGenerator::default(),
            backwards_checks: 2,
            forwards_checks: 4,
        }
    }
}

impl CodeValidator {
    /// Check `presented` against every window in the acceptance range
    /// around `now_ticks`. Absence of a match is a normal `false`, not
    /// an error. Comparison per candidate is constant-time.
    pub fn is_valid(&self, secret: &Secret, presented: &str, now_ticks: i64) -> bool {
        let window_ticks = self.generator.window_ticks();
        let base = self.generator.quantize(now_ticks);

        let mut matched = false;
        for i in -(self.backwards_checks as i64)..=(self.forwards_checks as i64) {
            let candidate = self.generator.code_for(secret, base + i * window_ticks);
            matched |= bool::from(presented.as_bytes().ct_eq(candidate.as_bytes()));
        }
        matched
    }

    /// [`CodeValidator::is_valid`] against the current wall clock.
    #[cfg(feature = "std")]
    pub fn is_valid_now(&self, secret: &Secret, presented: &str) -> bool {
        self.is_valid(secret, presented, now_ticks())
    }
}

/// Convert a Unix timestamp to 100 ns ticks since 1601-01-01.
pub fn ticks_from_unix(unix_secs: i64, subsec_nanos: u32) -> i64 {
    (unix_secs + UNIX_EPOCH_OFFSET_SECS) * TICKS_PER_SECOND + (subsec_nanos / 100) as i64
}

/// Current wall-clock time in 100 ns ticks since 1601-01-01.
///
/// Returns 0 if the system clock is set before the Unix epoch, which
/// should not occur on properly configured systems.
#[cfg(feature = "std")]
pub fn now_ticks() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| ticks_from_unix(d.as_secs() as i64, d.subsec_nanos()))
        .unwrap_or(0)
}
