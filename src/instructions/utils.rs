use anchor_lang::AnchorDeserialize;
use solana_sdk::{account::Account, pubkey::Pubkey};

use crate::error::StakeClientError;
use crate::state::USER_LOCK_INFO_SEED;

/// Decodes an anchor account: skip the 8-byte discriminator, then borsh.
pub fn deserialize_anchor_account<T: AnchorDeserialize>(
    account: &Account,
) -> Result<T, StakeClientError> {
    let mut data: &[u8] = account.data.get(8..).ok_or_else(|| {
        StakeClientError::RemoteCallFailed(
            "account data shorter than the anchor discriminator".to_string(),
        )
    })?;
    T::deserialize(&mut data)
        .map_err(|e| StakeClientError::RemoteCallFailed(format!("malformed account data: {e}")))
}

/// PDA holding a user's lock slots. Seed tag, user and pool order must match
/// the program's derivation exactly.
pub fn get_user_lock_info_address(
    user: &Pubkey,
    staking_pool: &Pubkey,
    program_id: &Pubkey,
) -> Pubkey {
    let (user_lock_info, _bump) = Pubkey::find_program_address(
        &[
            USER_LOCK_INFO_SEED.as_bytes(),
            user.as_ref(),
            staking_pool.as_ref(),
        ],
        program_id,
    );
    user_lock_info
}

pub fn get_user_token_address(user: &Pubkey, token_mint: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address(user, token_mint)
}
