use anchor_lang::prelude::borsh;
use anchor_lang::{AnchorSerialize, AnchorDeserialize};
use solana_sdk::{
    hash::hash,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

use crate::error::StakeClientError;
use crate::instructions::utils::{get_user_lock_info_address, get_user_token_address};
use crate::tier::LockTag;
use crate::ClientConfig;

/// Anchor method discriminator: first 8 bytes of sha256("global:<name>").
fn sighash(name: &str) -> [u8; 8] {
    let digest = hash(format!("global:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest.to_bytes()[..8]);
    out
}

fn instruction_data<T: AnchorSerialize>(name: &str, args: &T) -> Result<Vec<u8>, StakeClientError> {
    let mut data = sighash(name).to_vec();
    data.extend(args.try_to_vec().map_err(|e| {
        StakeClientError::RemoteCallFailed(format!("failed to encode {name} args: {e}"))
    })?);
    Ok(data)
}

fn plain_instruction(config: &ClientConfig, name: &str, accounts: Vec<AccountMeta>) -> Instruction {
    Instruction {
        program_id: config.staking_program,
        accounts,
        data: sighash(name).to_vec(),
    }
}

#[derive(AnchorSerialize, AnchorDeserialize)]
struct StakeArgs {
    amount: u64,
    lock_tag: LockTag,
    slot: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize)]
struct LockSelectorArgs {
    lock_tag: LockTag,
    slot: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize)]
struct AmountArgs {
    amount: u64,
}

pub fn stake_instr(
    config: &ClientConfig,
    user: &Pubkey,
    amount: u64,
    lock_tag: LockTag,
    slot: u8,
) -> Result<Instruction, StakeClientError> {
    let user_lock_info =
        get_user_lock_info_address(user, &config.staking_pool, &config.staking_program);
    let user_token_account = get_user_token_address(user, &config.token_mint);

    Ok(Instruction {
        program_id: config.staking_program,
        accounts: vec![
            AccountMeta::new(config.staking_pool, false),
            AccountMeta::new(*user, true),
            AccountMeta::new(user_token_account, false),
            AccountMeta::new(config.stake_vault, false),
            AccountMeta::new(user_lock_info, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: instruction_data(
            "stake",
            &StakeArgs {
                amount,
                lock_tag,
                slot,
            },
        )?,
    })
}

pub fn unstake_instr(
    config: &ClientConfig,
    user: &Pubkey,
    lock_tag: LockTag,
    slot: u8,
) -> Result<Instruction, StakeClientError> {
    let user_lock_info =
        get_user_lock_info_address(user, &config.staking_pool, &config.staking_program);
    let user_token_account = get_user_token_address(user, &config.token_mint);

    Ok(Instruction {
        program_id: config.staking_program,
        accounts: vec![
            AccountMeta::new(config.staking_pool, false),
            AccountMeta::new(*user, true),
            AccountMeta::new(user_token_account, false),
            AccountMeta::new(config.stake_vault, false),
            AccountMeta::new(config.reward_vault, false),
            AccountMeta::new(user_lock_info, false),
            AccountMeta::new_readonly(config.stake_authority, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data: instruction_data("unstake", &LockSelectorArgs { lock_tag, slot })?,
    })
}

pub fn autocompound_instr(
    config: &ClientConfig,
    user: &Pubkey,
    lock_tag: LockTag,
    slot: u8,
) -> Result<Instruction, StakeClientError> {
    let user_lock_info =
        get_user_lock_info_address(user, &config.staking_pool, &config.staking_program);

    Ok(Instruction {
        program_id: config.staking_program,
        accounts: vec![
            AccountMeta::new(config.staking_pool, false),
            AccountMeta::new(*user, true),
            AccountMeta::new(user_lock_info, false),
        ],
        data: instruction_data("autocompound", &LockSelectorArgs { lock_tag, slot })?,
    })
}

pub fn pause_instr(config: &ClientConfig, manager: &Pubkey) -> Instruction {
    plain_instruction(config, "pause", manager_accounts(config, manager))
}

pub fn unpause_instr(config: &ClientConfig, manager: &Pubkey) -> Instruction {
    plain_instruction(config, "unpause", manager_accounts(config, manager))
}

pub fn staking_pause_instr(config: &ClientConfig, manager: &Pubkey) -> Instruction {
    plain_instruction(config, "staking_pause", manager_accounts(config, manager))
}

pub fn staking_unpause_instr(config: &ClientConfig, manager: &Pubkey) -> Instruction {
    plain_instruction(config, "staking_unpause", manager_accounts(config, manager))
}

pub fn update_reward_percentage_instr(
    config: &ClientConfig,
    manager: &Pubkey,
    new_percentage: u64,
) -> Result<Instruction, StakeClientError> {
    Ok(Instruction {
        program_id: config.staking_program,
        accounts: manager_accounts(config, manager),
        data: instruction_data(
            "update_reward_percentage",
            &AmountArgs {
                amount: new_percentage,
            },
        )?,
    })
}

pub fn update_lock_time_instr(
    config: &ClientConfig,
    manager: &Pubkey,
    new_lock_time: i64,
) -> Result<Instruction, StakeClientError> {
    #[derive(AnchorSerialize, AnchorDeserialize)]
    struct UpdateLockTimeArgs {
        new_lock_time: i64,
    }

    Ok(Instruction {
        program_id: config.staking_program,
        accounts: manager_accounts(config, manager),
        data: instruction_data("update_lock_time", &UpdateLockTimeArgs { new_lock_time })?,
    })
}

pub fn deposit_rewards_instr(
    config: &ClientConfig,
    manager: &Pubkey,
    amount: u64,
) -> Result<Instruction, StakeClientError> {
    let manager_token_account = get_user_token_address(manager, &config.token_mint);

    Ok(Instruction {
        program_id: config.staking_program,
        accounts: vec![
            AccountMeta::new(config.staking_pool, false),
            AccountMeta::new(*manager, true),
            AccountMeta::new(manager_token_account, false),
            AccountMeta::new(config.reward_vault, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data: instruction_data("deposit_rewards", &AmountArgs { amount })?,
    })
}

pub fn withdraw_unassigned_rewards_instr(config: &ClientConfig, manager: &Pubkey) -> Instruction {
    let manager_token_account = get_user_token_address(manager, &config.token_mint);

    plain_instruction(
        config,
        "withdraw_unassigned_rewards",
        vec![
            AccountMeta::new(config.staking_pool, false),
            AccountMeta::new(*manager, true),
            AccountMeta::new(manager_token_account, false),
            AccountMeta::new(config.reward_vault, false),
            AccountMeta::new_readonly(config.stake_authority, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
    )
}

fn manager_accounts(config: &ClientConfig, manager: &Pubkey) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(config.staking_pool, false),
        AccountMeta::new(*manager, true),
    ]
}
