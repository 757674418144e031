//! Ties one user action together: validate, submit the remote call, mirror
//! the reward arithmetic, and hand the audit record to the delivery
//! pipeline. Each invocation is stateless; every prior-state read is a fresh
//! fetch, never a cache.

use solana_sdk::{pubkey::Pubkey, signature::Signature};
use tracing::info;

use crate::audit::AuditRecord;
use crate::delivery::DeliveryPipeline;
use crate::error::StakeClientError;
use crate::forfeiture::{self, Settlement};
use crate::state::{LockInfo, StakingPool, UserLockInfo};
use crate::tier::{resolve_reward_percentage, validate_slot, LockTag};

/// Injected so operations are deterministic under test. The "now" used for
/// settlement and audit timestamps is taken once, after confirmation.
pub trait Clock: Send + Sync {
    fn unix_now(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_now(&self) -> i64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// Seam to the on-chain program. The production implementation signs and
/// submits over RPC; tests substitute an in-memory fake.
pub trait StakingProtocol {
    fn user(&self) -> Pubkey;
    fn staking_pool(&self) -> Result<StakingPool, StakeClientError>;
    fn user_lock_info(&self, user: &Pubkey) -> Result<Option<UserLockInfo>, StakeClientError>;
    fn token_account_exists(&self, owner: &Pubkey) -> Result<bool, StakeClientError>;
    fn stake(&self, amount: u64, lock_tag: LockTag, slot: u8)
        -> Result<Signature, StakeClientError>;
    fn unstake(&self, lock_tag: LockTag, slot: u8) -> Result<Signature, StakeClientError>;
    fn autocompound(&self, lock_tag: LockTag, slot: u8) -> Result<Signature, StakeClientError>;
}

/// What a completed operation reports back: the confirmed signature and the
/// audit record that was handed to the pipeline.
#[derive(Clone, Debug)]
pub struct OperationOutcome {
    pub signature: Signature,
    pub record: AuditRecord,
}

pub struct Orchestrator<P> {
    protocol: P,
    pipeline: DeliveryPipeline,
    clock: Box<dyn Clock>,
}

impl<P: StakingProtocol> Orchestrator<P> {
    pub fn new(protocol: P, pipeline: DeliveryPipeline) -> Self {
        Orchestrator::with_clock(protocol, pipeline, Box::new(SystemClock))
    }

    pub fn with_clock(protocol: P, pipeline: DeliveryPipeline, clock: Box<dyn Clock>) -> Self {
        Orchestrator {
            protocol,
            pipeline,
            clock,
        }
    }

    /// Stake `amount` base units into (tier, slot). Requires the user's
    /// token account to already exist.
    pub fn stake(
        &self,
        amount: u64,
        lock_tag: LockTag,
        slot: u8,
    ) -> Result<OperationOutcome, StakeClientError> {
        validate_slot(slot)?;
        let user = self.protocol.user();
        if !self.protocol.token_account_exists(&user)? {
            return Err(StakeClientError::AccountNotInitialized(user));
        }

        let signature = self.protocol.stake(amount, lock_tag, slot)?;

        let pool = self.protocol.staking_pool()?;
        let reward_percentage =
            resolve_reward_percentage(pool.bronze_reward_percentage, lock_tag);
        let now = self.clock.unix_now();
        let record = AuditRecord::for_stake(user, amount, lock_tag, reward_percentage, now);
        self.pipeline.deliver(&record);
        info!(%signature, %lock_tag, slot, "stake confirmed");

        Ok(OperationOutcome { signature, record })
    }

    /// Close the lock in (tier, slot) and report the forfeiture settlement
    /// computed against the pre-operation snapshot.
    pub fn unstake(
        &self,
        lock_tag: LockTag,
        slot: u8,
    ) -> Result<OperationOutcome, StakeClientError> {
        validate_slot(slot)?;
        let user = self.protocol.user();
        let lock = self.fetch_active_lock(&user, lock_tag, slot)?;

        // validate the lock window before submitting; the settlement itself
        // is recomputed at confirmation time
        forfeiture::settle(
            lock.lock_start_time,
            lock.unlock_time,
            lock.locked_reward,
            self.clock.unix_now(),
        )?;

        let signature = self.protocol.unstake(lock_tag, slot)?;

        let pool = self.protocol.staking_pool()?;
        let reward_percentage =
            resolve_reward_percentage(pool.bronze_reward_percentage, lock_tag);
        let now = self.clock.unix_now();
        let settlement: Settlement = forfeiture::settle(
            lock.lock_start_time,
            lock.unlock_time,
            lock.locked_reward,
            now,
        )?;
        let record =
            AuditRecord::for_unstake(user, &lock, lock_tag, reward_percentage, settlement, now);
        self.pipeline.deliver(&record);
        info!(%signature, %lock_tag, slot, completion = %settlement.completion, "unstake confirmed");

        Ok(OperationOutcome { signature, record })
    }

    /// Roll the accrued reward of (tier, slot) into a new lock window. The
    /// post-operation snapshot supplies the new unlock time.
    pub fn autocompound(
        &self,
        lock_tag: LockTag,
        slot: u8,
    ) -> Result<OperationOutcome, StakeClientError> {
        validate_slot(slot)?;
        let user = self.protocol.user();
        let before = self.fetch_active_lock(&user, lock_tag, slot)?;

        let signature = self.protocol.autocompound(lock_tag, slot)?;

        let after = self.fetch_active_lock(&user, lock_tag, slot)?;
        let pool = self.protocol.staking_pool()?;
        let reward_percentage =
            resolve_reward_percentage(pool.bronze_reward_percentage, lock_tag);
        let now = self.clock.unix_now();
        let record = AuditRecord::for_autocompound(
            user,
            &before,
            &after,
            lock_tag,
            reward_percentage,
            now,
        );
        self.pipeline.deliver(&record);
        info!(%signature, %lock_tag, slot, "autocompound confirmed");

        Ok(OperationOutcome { signature, record })
    }

    fn fetch_active_lock(
        &self,
        user: &Pubkey,
        lock_tag: LockTag,
        slot: u8,
    ) -> Result<LockInfo, StakeClientError> {
        let not_found = || StakeClientError::RecordNotFound {
            tier: lock_tag,
            slot,
        };
        let info = self.protocol.user_lock_info(user)?.ok_or_else(not_found)?;
        let lock = *info.lock(lock_tag, slot);
        if lock.is_active() {
            Ok(lock)
        } else {
            Err(not_found())
        }
    }
}
