//! Local mirror of the program's reward-forfeiture arithmetic.
//!
//! The program is the source of truth for what a withdrawal actually pays
//! out; this module re-derives the same three-zone rule so the audit trail
//! can report it without another round trip. It must track the on-chain
//! rules exactly.

use std::fmt;

use crate::error::StakeClientError;

/// How much of the lock window had elapsed when the position was closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DurationCompletion {
    Full,
    Half,
    LessThanHalf,
    /// Used on records (e.g. Stake) where no window has been closed yet.
    /// Distinct from `LessThanHalf`: "unknown yet", not "known to be zero".
    NotApplicable,
}

impl DurationCompletion {
    pub fn as_str(self) -> &'static str {
        match self {
            DurationCompletion::Full => "Full",
            DurationCompletion::Half => "Half",
            DurationCompletion::LessThanHalf => "Less than half",
            DurationCompletion::NotApplicable => "N/A",
        }
    }
}

impl fmt::Display for DurationCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    /// Reward released by the program, in base units.
    pub released: u64,
    pub completion: DurationCompletion,
    /// Seconds the lock was held, clamped to zero under clock skew.
    pub elapsed: i64,
}

/// Computes the reward released when a lock is closed at `now`.
///
/// Zones over `elapsed = now - lock_start` against
/// `full = unlock_time - lock_start`:
/// full or more releases everything, at least `full / 2` releases half
/// (floored), anything less releases nothing. `full / 2` uses integer
/// division, so an elapsed time of exactly the floored half duration
/// already counts as reaching the half threshold.
///
/// A negative elapsed time can only come from clock skew between this host
/// and the cluster; it is clamped to zero rather than rejected.
pub fn settle(
    lock_start: i64,
    unlock_time: i64,
    locked_reward: u64,
    now: i64,
) -> Result<Settlement, StakeClientError> {
    let full_duration = unlock_time
        .checked_sub(lock_start)
        .filter(|d| *d > 0)
        .ok_or(StakeClientError::InvalidLockWindow {
            lock_start,
            unlock_time,
        })?;

    let elapsed = now.saturating_sub(lock_start).max(0);
    let half_duration = full_duration / 2;

    let (released, completion) = if elapsed >= full_duration {
        (locked_reward, DurationCompletion::Full)
    } else if elapsed >= half_duration {
        (locked_reward / 2, DurationCompletion::Half)
    } else {
        (0, DurationCompletion::LessThanHalf)
    };

    Ok(Settlement {
        released,
        completion,
        elapsed,
    })
}
