//! Audit records: a denormalized, human-readable summary of each confirmed
//! operation, assembled locally and shipped to the logging sink. Fields that
//! do not apply to an operation are `None`, never a numeric zero, so "no
//! reward yet" can never be confused with "zero reward".

use solana_sdk::pubkey::Pubkey;

use crate::forfeiture::{DurationCompletion, Settlement};
use crate::state::LockInfo;
use crate::tier::LockTag;

/// Token amounts travel as base units; display divides by 10^9.
pub const TOKEN_DECIMALS: u32 = 9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Stake,
    Unstake,
    Autocompound,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Stake => "Stake",
            Operation::Unstake => "Unstake",
            Operation::Autocompound => "Autocompound",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of one completed operation. Created once, transmitted
/// downstream, never persisted locally.
#[derive(Clone, Debug, PartialEq)]
pub struct AuditRecord {
    pub operation: Operation,
    pub user_address: Pubkey,
    pub amount_staked: u64,
    pub tier: LockTag,
    /// Seconds the position was held; `None` for a fresh stake.
    pub stake_duration: Option<i64>,
    /// Effective reward percentage for the tier, 10^4-scaled.
    pub reward_percentage: u64,
    pub stake_start_time: i64,
    pub unlock_time: Option<i64>,
    pub stake_end_time: Option<i64>,
    pub locked_reward: Option<u64>,
    pub released_reward: Option<u64>,
    pub completion: DurationCompletion,
}

impl AuditRecord {
    /// A fresh stake: the lock window and reward are not known yet, so every
    /// window-derived field is explicitly not applicable.
    pub fn for_stake(
        user: Pubkey,
        amount: u64,
        tier: LockTag,
        reward_percentage: u64,
        now: i64,
    ) -> Self {
        AuditRecord {
            operation: Operation::Stake,
            user_address: user,
            amount_staked: amount,
            tier,
            stake_duration: None,
            reward_percentage,
            stake_start_time: now,
            unlock_time: None,
            stake_end_time: None,
            locked_reward: None,
            released_reward: None,
            completion: DurationCompletion::NotApplicable,
        }
    }

    /// An unstake, reported against the pre-operation lock snapshot and the
    /// forfeiture settlement computed at confirmation time.
    pub fn for_unstake(
        user: Pubkey,
        lock: &LockInfo,
        tier: LockTag,
        reward_percentage: u64,
        settlement: Settlement,
        now: i64,
    ) -> Self {
        AuditRecord {
            operation: Operation::Unstake,
            user_address: user,
            amount_staked: lock.locked_amount,
            tier,
            stake_duration: Some(settlement.elapsed),
            reward_percentage,
            stake_start_time: lock.lock_start_time,
            unlock_time: Some(lock.unlock_time),
            stake_end_time: Some(now),
            locked_reward: Some(lock.locked_reward),
            released_reward: Some(settlement.released),
            completion: settlement.completion,
        }
    }

    /// An autocompound extends the position instead of withdrawing it, so
    /// completion is Full by definition and the "released" reward is the
    /// pre-compound locked reward being rolled into the new lock.
    pub fn for_autocompound(
        user: Pubkey,
        before: &LockInfo,
        after: &LockInfo,
        tier: LockTag,
        reward_percentage: u64,
        now: i64,
    ) -> Self {
        AuditRecord {
            operation: Operation::Autocompound,
            user_address: user,
            amount_staked: after.locked_amount,
            tier,
            stake_duration: Some(now.saturating_sub(before.lock_start_time).max(0)),
            reward_percentage,
            stake_start_time: before.lock_start_time,
            unlock_time: Some(after.unlock_time),
            stake_end_time: Some(now),
            locked_reward: Some(before.locked_reward),
            released_reward: Some(before.locked_reward),
            completion: DurationCompletion::Full,
        }
    }
}

/// "1,234.5" style base-unit formatting: grouped integer part, fractional
/// part trimmed of trailing zeros.
pub fn format_token_amount(base_units: u64) -> String {
    let scale = 10u64.pow(TOKEN_DECIMALS);
    let whole = group_thousands(base_units / scale);
    let frac = base_units % scale;
    if frac == 0 {
        whole
    } else {
        let digits = format!("{frac:09}");
        format!("{whole}.{}", digits.trim_end_matches('0'))
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - offset) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// 10^4-scaled percentage to "15.77%".
pub fn format_percentage(scaled: u64) -> String {
    format!("{}.{:02}%", scaled / 100, scaled % 100)
}

/// Unix timestamp to "Jan 2, 2025, 3:04 PM" (UTC).
pub fn format_time(timestamp: i64) -> String {
    match chrono::DateTime::from_timestamp(timestamp, 0) {
        Some(dt) => dt.format("%b %-d, %Y, %-I:%M %p").to_string(),
        None => timestamp.to_string(),
    }
}

/// Seconds to "1d 2h 3m 4s"; empty spans collapse to "0s".
pub fn format_duration(total_seconds: i64) -> String {
    let mut seconds = total_seconds.max(0);
    let days = seconds / 86_400;
    seconds %= 86_400;
    let hours = seconds / 3_600;
    seconds %= 3_600;
    let minutes = seconds / 60;
    seconds %= 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if seconds > 0 {
        parts.push(format!("{seconds}s"));
    }

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}
