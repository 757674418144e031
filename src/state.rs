//! Read-only mirrors of the staking program's accounts. Layouts follow the
//! anchor convention: an 8-byte discriminator, then borsh-encoded fields.
//! This client only ever reads snapshots of these accounts; it never writes
//! them back.

use anchor_lang::prelude::borsh;
use anchor_lang::{AnchorDeserialize, AnchorSerialize};
use solana_sdk::pubkey::Pubkey;

use crate::tier::{LockTag, LOCK_SLOT_COUNT, TIER_COUNT};

pub const USER_LOCK_INFO_SEED: &str = "user_lock_info";

/// One stake position. A slot is active iff `locked_amount > 0`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LockInfo {
    pub locked_amount: u64,
    pub locked_reward: u64,
    pub unlock_time: i64,
    pub lock_start_time: i64,
}

impl LockInfo {
    pub fn is_active(&self) -> bool {
        self.locked_amount > 0
    }
}

/// Per-user lock account, PDA of
/// `[b"user_lock_info", user, staking_pool]` under the staking program.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UserLockInfo {
    pub bump: u8,
    pub owner: Pubkey,
    /// Indexed `[tier][slot]`, tier order matching `LockTag`.
    pub locks: [[LockInfo; LOCK_SLOT_COUNT]; TIER_COUNT],
}

impl UserLockInfo {
    pub fn lock(&self, tag: LockTag, slot: u8) -> &LockInfo {
        &self.locks[tag.index()][slot as usize]
    }
}

/// Pool-wide configuration and totals.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct StakingPool {
    pub bump: u8,
    pub manager: Pubkey,
    pub token_mint: Pubkey,
    pub stake_vault: Pubkey,
    pub reward_vault: Pubkey,
    pub stake_authority: Pubkey,
    /// Bronze lock period in seconds; other tiers scale from it.
    pub bronze_lock_period: i64,
    /// Bronze reward percentage, 10^4-scaled; other tiers multiply it.
    pub bronze_reward_percentage: u64,
    pub total_locked_balance: u64,
    pub total_locked_reward: u64,
    pub unassigned_reward_balance: u64,
    pub program_paused: bool,
    pub staking_paused: bool,
}
