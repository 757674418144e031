use anchor_lang::AnchorDeserialize;
use anyhow::{format_err, Result};
use solana_client::{rpc_client::RpcClient, rpc_config::RpcSendTransactionConfig};
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use tracing::{debug, info};

use crate::error::StakeClientError;
use crate::instructions::staking_instructions::*;
use crate::instructions::utils::{
    deserialize_anchor_account, get_user_lock_info_address, get_user_token_address,
};
use crate::orchestrator::StakingProtocol;
use crate::state::{StakingPool, UserLockInfo};
use crate::tier::LockTag;
use crate::ClientConfig;

pub fn read_keypair_file(s: &str) -> Result<Keypair> {
    solana_sdk::signature::read_keypair_file(s)
        .map_err(|_| format_err!("failed to read keypair from {}", s))
}

pub fn send_txn(
    client: &RpcClient,
    txn: &Transaction,
    wait_confirm: bool,
) -> Result<Signature, StakeClientError> {
    Ok(client.send_and_confirm_transaction_with_spinner_and_config(
        txn,
        CommitmentConfig::confirmed(),
        RpcSendTransactionConfig {
            skip_preflight: false,
            preflight_commitment: Some(if wait_confirm {
                CommitmentLevel::Confirmed
            } else {
                CommitmentLevel::Processed
            }),
            ..RpcSendTransactionConfig::default()
        },
    )?)
}

pub fn get_anchor_account<T: AnchorDeserialize>(
    client: &RpcClient,
    address: &Pubkey,
) -> Result<Option<T>, StakeClientError> {
    let account = client
        .get_account_with_commitment(address, CommitmentConfig::confirmed())?
        .value;
    account
        .map(|account| deserialize_anchor_account(&account))
        .transpose()
}

/// RPC-backed implementation of the protocol seam: builds the instruction,
/// signs with the configured payer, submits, and waits for confirmation.
pub struct RpcStakingProtocol {
    config: ClientConfig,
    rpc_client: RpcClient,
    payer: Keypair,
}

impl RpcStakingProtocol {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let payer = read_keypair_file(&config.payer_path)?;
        let rpc_client = RpcClient::new_with_commitment(
            config.http_url.clone(),
            CommitmentConfig::confirmed(),
        );
        Ok(RpcStakingProtocol {
            config,
            rpc_client,
            payer,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn send_instruction(&self, instruction: Instruction) -> Result<Signature, StakeClientError> {
        let recent_hash = self.rpc_client.get_latest_blockhash()?;
        let txn = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&self.payer.pubkey()),
            &[&self.payer],
            recent_hash,
        );
        let signature = send_txn(&self.rpc_client, &txn, true)?;
        debug!(%signature, "transaction confirmed");
        Ok(signature)
    }

    // manager controls; these bypass the orchestrator because they carry no
    // audit record

    pub fn pause(&self) -> Result<Signature, StakeClientError> {
        self.send_instruction(pause_instr(&self.config, &self.payer.pubkey()))
    }

    pub fn unpause(&self) -> Result<Signature, StakeClientError> {
        self.send_instruction(unpause_instr(&self.config, &self.payer.pubkey()))
    }

    pub fn staking_pause(&self) -> Result<Signature, StakeClientError> {
        self.send_instruction(staking_pause_instr(&self.config, &self.payer.pubkey()))
    }

    pub fn staking_unpause(&self) -> Result<Signature, StakeClientError> {
        self.send_instruction(staking_unpause_instr(&self.config, &self.payer.pubkey()))
    }

    pub fn update_reward_percentage(
        &self,
        new_percentage: u64,
    ) -> Result<Signature, StakeClientError> {
        self.send_instruction(update_reward_percentage_instr(
            &self.config,
            &self.payer.pubkey(),
            new_percentage,
        )?)
    }

    pub fn update_lock_time(&self, new_lock_time: i64) -> Result<Signature, StakeClientError> {
        self.send_instruction(update_lock_time_instr(
            &self.config,
            &self.payer.pubkey(),
            new_lock_time,
        )?)
    }

    pub fn deposit_rewards(&self, amount: u64) -> Result<Signature, StakeClientError> {
        self.send_instruction(deposit_rewards_instr(
            &self.config,
            &self.payer.pubkey(),
            amount,
        )?)
    }

    pub fn withdraw_unassigned_rewards(&self) -> Result<Signature, StakeClientError> {
        self.send_instruction(withdraw_unassigned_rewards_instr(
            &self.config,
            &self.payer.pubkey(),
        ))
    }
}

impl StakingProtocol for RpcStakingProtocol {
    fn user(&self) -> Pubkey {
        self.payer.pubkey()
    }

    fn staking_pool(&self) -> Result<StakingPool, StakeClientError> {
        get_anchor_account(&self.rpc_client, &self.config.staking_pool)?.ok_or_else(|| {
            StakeClientError::RemoteCallFailed(format!(
                "staking pool account {} not found",
                self.config.staking_pool
            ))
        })
    }

    fn user_lock_info(&self, user: &Pubkey) -> Result<Option<UserLockInfo>, StakeClientError> {
        let address =
            get_user_lock_info_address(user, &self.config.staking_pool, &self.config.staking_program);
        get_anchor_account(&self.rpc_client, &address)
    }

    fn token_account_exists(&self, owner: &Pubkey) -> Result<bool, StakeClientError> {
        let token_account = get_user_token_address(owner, &self.config.token_mint);
        Ok(self
            .rpc_client
            .get_account_with_commitment(&token_account, CommitmentConfig::confirmed())?
            .value
            .is_some())
    }

    fn stake(&self, amount: u64, lock_tag: LockTag, slot: u8) -> Result<Signature, StakeClientError> {
        info!(amount, %lock_tag, slot, "submitting stake");
        self.send_instruction(stake_instr(
            &self.config,
            &self.payer.pubkey(),
            amount,
            lock_tag,
            slot,
        )?)
    }

    fn unstake(&self, lock_tag: LockTag, slot: u8) -> Result<Signature, StakeClientError> {
        info!(%lock_tag, slot, "submitting unstake");
        self.send_instruction(unstake_instr(
            &self.config,
            &self.payer.pubkey(),
            lock_tag,
            slot,
        )?)
    }

    fn autocompound(&self, lock_tag: LockTag, slot: u8) -> Result<Signature, StakeClientError> {
        info!(%lock_tag, slot, "submitting autocompound");
        self.send_instruction(autocompound_instr(
            &self.config,
            &self.payer.pubkey(),
            lock_tag,
            slot,
        )?)
    }
}
