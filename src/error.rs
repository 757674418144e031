use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::tier::LockTag;

/// Errors surfaced to the caller of a staking operation. Audit-delivery
/// failures are deliberately absent: they are logged and swallowed inside
/// the delivery pipeline and never fail the operation they document.
#[derive(Debug, Error)]
pub enum StakeClientError {
    #[error("unknown lock tier `{0}` (expected bronze, silver, gold or diamond)")]
    InvalidTier(String),

    #[error("lock slot {0} out of range (slots 0 and 1 are available per tier)")]
    InvalidSlot(u8),

    #[error("lock window is empty or inverted: start {lock_start}, unlock {unlock_time}")]
    InvalidLockWindow { lock_start: i64, unlock_time: i64 },

    #[error("no initialized token account for {0}; create the associated token account first")]
    AccountNotInitialized(Pubkey),

    #[error("no active {tier} lock in slot {slot}")]
    RecordNotFound { tier: LockTag, slot: u8 },

    #[error("remote call failed: {0}")]
    RemoteCallFailed(String),
}

impl From<solana_client::client_error::ClientError> for StakeClientError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        StakeClientError::RemoteCallFailed(err.to_string())
    }
}
