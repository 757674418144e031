use std::fmt;
use std::str::FromStr;

use anchor_lang::prelude::borsh;
use anchor_lang::{AnchorDeserialize, AnchorSerialize};

use crate::error::StakeClientError;

/// Concurrent lock positions a user may hold per tier.
pub const LOCK_SLOT_COUNT: usize = 2;

pub const TIER_COUNT: usize = 4;

/// Reward percentages are fixed-point integers scaled by 10^4
/// (1577 = 15.77%). The scale is part of the program's reporting contract.
pub const PERCENTAGE_SCALE: u64 = 10_000;

/// Staking lock category. Variant order matches the on-chain enum and the
/// `locks` array layout of the user lock account, so the borsh discriminant
/// doubles as the tier index.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockTag {
    Bronze,
    Silver,
    Gold,
    Diamond,
}

impl LockTag {
    pub const ALL: [LockTag; TIER_COUNT] = [
        LockTag::Bronze,
        LockTag::Silver,
        LockTag::Gold,
        LockTag::Diamond,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Multiple applied to the pool's bronze reward percentage.
    pub fn reward_multiplier(self) -> u64 {
        match self {
            LockTag::Bronze => 1,
            LockTag::Silver => 3,
            LockTag::Gold => 9,
            LockTag::Diamond => 27,
        }
    }

    /// Multiple applied to the pool's bronze lock period
    /// (15 / 30 / 60 / 120 days on the original deployment).
    pub fn lock_period_scale(self) -> i64 {
        match self {
            LockTag::Bronze => 1,
            LockTag::Silver => 2,
            LockTag::Gold => 4,
            LockTag::Diamond => 8,
        }
    }

    pub fn lock_period(self, bronze_lock_period: i64) -> i64 {
        bronze_lock_period.saturating_mul(self.lock_period_scale())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LockTag::Bronze => "Bronze",
            LockTag::Silver => "Silver",
            LockTag::Gold => "Gold",
            LockTag::Diamond => "Diamond",
        }
    }
}

impl fmt::Display for LockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tier input is normalized here, once, at the orchestration boundary; past
/// this point the closed enum makes an invalid tier unrepresentable.
impl FromStr for LockTag {
    type Err = StakeClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bronze" => Ok(LockTag::Bronze),
            "silver" => Ok(LockTag::Silver),
            "gold" => Ok(LockTag::Gold),
            "diamond" => Ok(LockTag::Diamond),
            _ => Err(StakeClientError::InvalidTier(s.to_string())),
        }
    }
}

/// Effective reward percentage for a tier, given the pool's base bronze
/// percentage (10^4-scaled).
pub fn resolve_reward_percentage(base_bronze_percentage: u64, tag: LockTag) -> u64 {
    base_bronze_percentage.saturating_mul(tag.reward_multiplier())
}

pub fn validate_slot(slot: u8) -> Result<(), StakeClientError> {
    if (slot as usize) < LOCK_SLOT_COUNT {
        Ok(())
    } else {
        Err(StakeClientError::InvalidSlot(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipliers_are_strictly_increasing() {
        let mut previous = 0;
        for tag in LockTag::ALL {
            assert!(tag.reward_multiplier() > previous);
            previous = tag.reward_multiplier();
        }
    }

    #[test]
    fn resolve_scales_base_percentage() {
        for p in [0u64, 1, 1577, 250_000] {
            assert_eq!(resolve_reward_percentage(p, LockTag::Bronze), p);
            assert_eq!(resolve_reward_percentage(p, LockTag::Silver), 3 * p);
            assert_eq!(resolve_reward_percentage(p, LockTag::Gold), 9 * p);
            assert_eq!(resolve_reward_percentage(p, LockTag::Diamond), 27 * p);
        }
    }

    #[test]
    fn diamond_percentage_matches_deployment_figures() {
        // base bronze 15.77% on the 10^4 scale
        assert_eq!(resolve_reward_percentage(1577, LockTag::Diamond), 42_579);
    }

    #[test]
    fn lock_periods_scale_from_bronze() {
        let bronze = 15 * 86_400;
        assert_eq!(LockTag::Bronze.lock_period(bronze), 15 * 86_400);
        assert_eq!(LockTag::Silver.lock_period(bronze), 30 * 86_400);
        assert_eq!(LockTag::Gold.lock_period(bronze), 60 * 86_400);
        assert_eq!(LockTag::Diamond.lock_period(bronze), 120 * 86_400);
    }

    #[test]
    fn parse_is_case_insensitive_and_total() {
        assert_eq!("Bronze".parse::<LockTag>().unwrap(), LockTag::Bronze);
        assert_eq!("DIAMOND".parse::<LockTag>().unwrap(), LockTag::Diamond);
        assert!(matches!(
            "platinum".parse::<LockTag>(),
            Err(StakeClientError::InvalidTier(_))
        ));
    }

    #[test]
    fn slot_bounds() {
        assert!(validate_slot(0).is_ok());
        assert!(validate_slot(1).is_ok());
        assert!(matches!(
            validate_slot(2),
            Err(StakeClientError::InvalidSlot(2))
        ));
    }
}
