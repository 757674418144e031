use std::str::FromStr;

use anyhow::{format_err, Result};
use configparser::ini::Ini;
use solana_sdk::pubkey::Pubkey;

/// Everything the client needs to reach the cluster, the staking program's
/// fixed accounts, and the audit sink. Loaded from `client_config.ini`.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub http_url: String,
    pub payer_path: String,
    pub staking_program: Pubkey,
    pub staking_pool: Pubkey,
    pub token_mint: Pubkey,
    pub stake_vault: Pubkey,
    pub reward_vault: Pubkey,
    pub stake_authority: Pubkey,
    pub audit_form_url: String,
    pub audit_timeout_secs: u64,
}

fn get_key(config: &Ini, key: &str) -> Result<String> {
    config
        .get("Global", key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format_err!("{} must be set in client_config.ini", key))
}

fn get_pubkey(config: &Ini, key: &str) -> Result<Pubkey> {
    let value = get_key(config, key)?;
    Pubkey::from_str(&value).map_err(|_| format_err!("{} is not a valid pubkey: {}", key, value))
}

pub fn load_cfg(client_config: &str) -> Result<ClientConfig> {
    let mut config = Ini::new();
    config
        .load(client_config)
        .map_err(|e| format_err!("failed to load {}: {}", client_config, e))?;

    let audit_timeout_value = get_key(&config, "audit_timeout_secs")?;
    let audit_timeout_secs = audit_timeout_value.parse().map_err(|_| {
        format_err!(
            "audit_timeout_secs is not a number: {}",
            audit_timeout_value
        )
    })?;

    Ok(ClientConfig {
        http_url: get_key(&config, "http_url")?,
        payer_path: get_key(&config, "payer_path")?,
        staking_program: get_pubkey(&config, "staking_program")?,
        staking_pool: get_pubkey(&config, "staking_pool")?,
        token_mint: get_pubkey(&config, "token_mint")?,
        stake_vault: get_pubkey(&config, "stake_vault")?,
        reward_vault: get_pubkey(&config, "reward_vault")?,
        stake_authority: get_pubkey(&config, "stake_authority")?,
        audit_form_url: get_key(&config, "audit_form_url")?,
        audit_timeout_secs,
    })
}
