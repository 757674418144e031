//! End-to-end orchestration against in-memory fakes: no cluster, no sink.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use solana_sdk::{pubkey::Pubkey, signature::Signature};

use vgr_stake_client::audit::Operation;
use vgr_stake_client::delivery::{AuditTransport, DeliveryError, DeliveryPipeline};
use vgr_stake_client::forfeiture::DurationCompletion;
use vgr_stake_client::orchestrator::{Clock, Orchestrator, StakingProtocol};
use vgr_stake_client::state::{LockInfo, StakingPool, UserLockInfo};
use vgr_stake_client::tier::LockTag;
use vgr_stake_client::StakeClientError;

const DAY: i64 = 86_400;

struct FixedClock(i64);

impl Clock for FixedClock {
    fn unix_now(&self) -> i64 {
        self.0
    }
}

struct TestPool {
    user: Pubkey,
    pool: StakingPool,
    lock_info: Mutex<Option<UserLockInfo>>,
    post_compound: Option<UserLockInfo>,
    submissions: AtomicUsize,
}

impl TestPool {
    fn new(bronze_reward_percentage: u64) -> Self {
        TestPool {
            user: Pubkey::new_unique(),
            pool: StakingPool {
                bump: 255,
                manager: Pubkey::new_unique(),
                token_mint: Pubkey::new_unique(),
                stake_vault: Pubkey::new_unique(),
                reward_vault: Pubkey::new_unique(),
                stake_authority: Pubkey::new_unique(),
                bronze_lock_period: 15 * DAY,
                bronze_reward_percentage,
                total_locked_balance: 0,
                total_locked_reward: 0,
                unassigned_reward_balance: 0,
                program_paused: false,
                staking_paused: false,
            },
            lock_info: Mutex::new(None),
            post_compound: None,
            submissions: AtomicUsize::new(0),
        }
    }

    fn with_lock(self, tag: LockTag, slot: u8, lock: LockInfo) -> Self {
        let mut info = UserLockInfo::default();
        info.locks[tag.index()][slot as usize] = lock;
        *self.lock_info.lock().unwrap() = Some(info);
        self
    }
}

impl StakingProtocol for TestPool {
    fn user(&self) -> Pubkey {
        self.user
    }

    fn staking_pool(&self) -> Result<StakingPool, StakeClientError> {
        Ok(self.pool)
    }

    fn user_lock_info(&self, _user: &Pubkey) -> Result<Option<UserLockInfo>, StakeClientError> {
        Ok(*self.lock_info.lock().unwrap())
    }

    fn token_account_exists(&self, _owner: &Pubkey) -> Result<bool, StakeClientError> {
        Ok(true)
    }

    fn stake(
        &self,
        _amount: u64,
        _lock_tag: LockTag,
        _slot: u8,
    ) -> Result<Signature, StakeClientError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        Ok(Signature::default())
    }

    fn unstake(&self, _lock_tag: LockTag, _slot: u8) -> Result<Signature, StakeClientError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        Ok(Signature::default())
    }

    fn autocompound(&self, _lock_tag: LockTag, _slot: u8) -> Result<Signature, StakeClientError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        *self.lock_info.lock().unwrap() = self.post_compound;
        Ok(Signature::default())
    }
}

struct CapturingTransport {
    sender: Mutex<mpsc::Sender<Vec<(&'static str, String)>>>,
}

impl AuditTransport for CapturingTransport {
    fn submit(&self, _url: &str, form: &[(&'static str, String)]) -> Result<(), DeliveryError> {
        self.sender
            .lock()
            .unwrap()
            .send(form.to_vec())
            .map_err(|e| DeliveryError::Rejected(e.to_string()))
    }
}

fn capturing_pipeline() -> (DeliveryPipeline, mpsc::Receiver<Vec<(&'static str, String)>>) {
    let (tx, rx) = mpsc::channel();
    let pipeline = DeliveryPipeline::new(
        "http://sink.invalid/form",
        Arc::new(CapturingTransport {
            sender: Mutex::new(tx),
        }),
    );
    (pipeline, rx)
}

fn value_of<'a>(form: &'a [(&'static str, String)], key: &str) -> &'a str {
    &form.iter().find(|(k, _)| *k == key).unwrap().1
}

#[test]
fn full_stake_then_unstake_cycle_produces_two_audit_records() {
    let lock = LockInfo {
        locked_amount: 10_000_000_000,
        locked_reward: 1_000_000,
        unlock_time: 30 * DAY,
        lock_start_time: 0,
    };

    // stake
    let (pipeline, rx) = capturing_pipeline();
    let orchestrator = Orchestrator::with_clock(
        TestPool::new(1577),
        pipeline.clone(),
        Box::new(FixedClock(0)),
    );
    let outcome = orchestrator.stake(10_000_000_000, LockTag::Bronze, 0).unwrap();
    assert_eq!(outcome.record.operation, Operation::Stake);

    let stake_form = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(value_of(&stake_form, "entry.789225441"), "Stake");
    assert_eq!(value_of(&stake_form, "entry.1258731213"), "10");
    assert_eq!(value_of(&stake_form, "entry.49812710"), "15.77%");
    assert_eq!(value_of(&stake_form, "entry.932689884"), "N/A");
    assert_eq!(value_of(&stake_form, "entry.744966987"), "N/A");

    // unstake 35 days later: past the full window, everything vests
    let orchestrator = Orchestrator::with_clock(
        TestPool::new(1577).with_lock(LockTag::Bronze, 0, lock),
        pipeline,
        Box::new(FixedClock(35 * DAY)),
    );
    let outcome = orchestrator.unstake(LockTag::Bronze, 0).unwrap();
    assert_eq!(outcome.record.completion, DurationCompletion::Full);
    assert_eq!(outcome.record.released_reward, Some(1_000_000));

    let unstake_form = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(value_of(&unstake_form, "entry.789225441"), "Unstake");
    assert_eq!(value_of(&unstake_form, "entry.1984049138"), "0.001");
    assert_eq!(value_of(&unstake_form, "entry.744966987"), "Full");
    assert_eq!(value_of(&unstake_form, "entry.932689884"), "35d");
}

#[test]
fn early_unstake_forfeits_everything() {
    let lock = LockInfo {
        locked_amount: 10_000_000_000,
        locked_reward: 1_000_000,
        unlock_time: 30 * DAY,
        lock_start_time: 0,
    };
    let (pipeline, rx) = capturing_pipeline();
    let orchestrator = Orchestrator::with_clock(
        TestPool::new(1577).with_lock(LockTag::Bronze, 1, lock),
        pipeline,
        Box::new(FixedClock(10 * DAY)),
    );

    let outcome = orchestrator.unstake(LockTag::Bronze, 1).unwrap();
    assert_eq!(outcome.record.completion, DurationCompletion::LessThanHalf);
    assert_eq!(outcome.record.released_reward, Some(0));

    let form = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(value_of(&form, "entry.744966987"), "Less than half");
    assert_eq!(value_of(&form, "entry.1984049138"), "0");
}

#[test]
fn autocompound_reports_full_completion_and_the_new_window() {
    let before = LockInfo {
        locked_amount: 10_000_000_000,
        locked_reward: 1_000_000,
        unlock_time: 30 * DAY,
        lock_start_time: 0,
    };
    let after = LockInfo {
        locked_amount: 10_001_000_000,
        locked_reward: 1_577_157,
        unlock_time: 50 * DAY,
        lock_start_time: 20 * DAY,
    };
    let mut pool = TestPool::new(1577).with_lock(LockTag::Diamond, 0, before);
    let mut post = UserLockInfo::default();
    post.locks[LockTag::Diamond.index()][0] = after;
    pool.post_compound = Some(post);

    let (pipeline, rx) = capturing_pipeline();
    let orchestrator = Orchestrator::with_clock(pool, pipeline, Box::new(FixedClock(20 * DAY)));

    let outcome = orchestrator.autocompound(LockTag::Diamond, 0).unwrap();
    assert_eq!(outcome.record.reward_percentage, 42_579);

    let form = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(value_of(&form, "entry.789225441"), "Autocompound");
    assert_eq!(value_of(&form, "entry.241253245"), "Diamond");
    assert_eq!(value_of(&form, "entry.49812710"), "425.79%");
    assert_eq!(value_of(&form, "entry.744966987"), "Full");
}

#[test]
fn missing_lock_record_aborts_before_any_submission() {
    let pool = TestPool::new(1577);
    let (pipeline, rx) = capturing_pipeline();
    let orchestrator = Orchestrator::new(pool, pipeline);

    let err = orchestrator.unstake(LockTag::Silver, 0).unwrap_err();
    assert!(matches!(err, StakeClientError::RecordNotFound { .. }));
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
}
