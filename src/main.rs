use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use colorful::{Color, Colorful};
use solana_sdk::pubkey::Pubkey;
use tracing_subscriber::EnvFilter;

use vgr_stake_client::audit::{
    format_duration, format_percentage, format_time, format_token_amount,
};
use vgr_stake_client::delivery::DeliveryPipeline;
use vgr_stake_client::instructions::RpcStakingProtocol;
use vgr_stake_client::load_cfg;
use vgr_stake_client::orchestrator::{OperationOutcome, Orchestrator, StakingProtocol};
use vgr_stake_client::tier::{resolve_reward_percentage, LockTag, LOCK_SLOT_COUNT};

#[derive(Debug, Parser)]
#[command(name = "vgr-stake", about = "Client for the VGR staking pool")]
pub struct Opts {
    #[clap(subcommand)]
    pub command: VgrStakeCommands,
}

#[derive(Debug, Parser)]
pub enum VgrStakeCommands {
    /// Lock tokens into a tier slot. Amount is in base units (10^-9).
    Stake {
        #[arg(long)]
        amount: u64,
        #[arg(long)]
        tier: LockTag,
        #[arg(long)]
        slot: u8,
    },
    /// Close a lock slot, forfeiting reward per the duration policy.
    Unstake {
        #[arg(long)]
        tier: LockTag,
        #[arg(long)]
        slot: u8,
    },
    /// Roll the accrued reward of a slot into a new lock window.
    Autocompound {
        #[arg(long)]
        tier: LockTag,
        #[arg(long)]
        slot: u8,
    },
    /// Per-tier lock periods and effective reward percentages.
    GetStakeInfo {},
    /// Active lock slots of a user (defaults to the payer).
    GetUserInfo {
        #[arg(long)]
        user: Option<Pubkey>,
    },
    GetTotalStakedBalance {},
    GetRewardBalance {},
    GetManagerAddress {},
    GetPauseStatus {},
    Pause {},
    Unpause {},
    StakingPause {},
    StakingUnpause {},
    /// New bronze reward percentage, 10^4-scaled (1577 = 15.77%).
    UpdateRewardPercentage {
        #[arg(long)]
        percentage: u64,
    },
    /// New bronze lock period in seconds; other tiers scale from it.
    UpdateLockTime {
        #[arg(long)]
        seconds: i64,
    },
    DepositRewards {
        #[arg(long)]
        amount: u64,
    },
    WithdrawUnassignedRewards {},
}

fn print_outcome(outcome: &OperationOutcome) {
    let record = &outcome.record;
    println!(
        "{}",
        format!("{} confirmed: {}", record.operation, outcome.signature).color(Color::Green)
    );
    println!(
        "  {} VGR in {} slot, reward percentage {}",
        format_token_amount(record.amount_staked),
        record.tier,
        format_percentage(record.reward_percentage),
    );
    if let (Some(locked), Some(released)) = (record.locked_reward, record.released_reward) {
        println!(
            "  locked reward {} VGR, released {} VGR ({})",
            format_token_amount(locked),
            format_token_amount(released),
            record.completion,
        );
    }
}

fn print_signature(signature: &solana_sdk::signature::Signature) {
    println!("{}", signature.to_string().color(Color::Green));
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client_config = "client_config.ini";
    let pool_config = load_cfg(client_config)?;
    let protocol = RpcStakingProtocol::new(pool_config.clone())?;
    let audit_timeout = Duration::from_secs(pool_config.audit_timeout_secs);
    // capability detection for the audit transport happens once, here
    let pipeline =
        DeliveryPipeline::from_environment(pool_config.audit_form_url.clone(), audit_timeout);

    // the dispatch thread is detached, so the process must drain it before
    // exiting; the outcome is printed first and the wait is bounded
    let opts = Opts::parse();
    match opts.command {
        VgrStakeCommands::Stake { amount, tier, slot } => {
            let orchestrator = Orchestrator::new(protocol, pipeline.clone());
            let outcome = orchestrator.stake(amount, tier, slot)?;
            print_outcome(&outcome);
            pipeline.flush(audit_timeout);
        }
        VgrStakeCommands::Unstake { tier, slot } => {
            let orchestrator = Orchestrator::new(protocol, pipeline.clone());
            let outcome = orchestrator.unstake(tier, slot)?;
            print_outcome(&outcome);
            pipeline.flush(audit_timeout);
        }
        VgrStakeCommands::Autocompound { tier, slot } => {
            let orchestrator = Orchestrator::new(protocol, pipeline.clone());
            let outcome = orchestrator.autocompound(tier, slot)?;
            print_outcome(&outcome);
            pipeline.flush(audit_timeout);
        }
        VgrStakeCommands::GetStakeInfo {} => {
            let pool = protocol.staking_pool()?;
            for tag in LockTag::ALL {
                println!(
                    "{}: lock period {}, reward percentage {}",
                    tag,
                    format_duration(tag.lock_period(pool.bronze_lock_period)),
                    format_percentage(resolve_reward_percentage(
                        pool.bronze_reward_percentage,
                        tag
                    )),
                );
            }
        }
        VgrStakeCommands::GetUserInfo { user } => {
            let target = user.unwrap_or_else(|| protocol.user());
            match protocol.user_lock_info(&target)? {
                None => println!("No staking information found for this address."),
                Some(info) => {
                    let mut any = false;
                    for tag in LockTag::ALL {
                        for slot in 0..LOCK_SLOT_COUNT as u8 {
                            let lock = info.lock(tag, slot);
                            if !lock.is_active() {
                                continue;
                            }
                            any = true;
                            println!("{} - Slot {}", tag, slot);
                            println!(
                                "  locked amount: {} VGR",
                                format_token_amount(lock.locked_amount)
                            );
                            println!(
                                "  locked reward: {} VGR",
                                format_token_amount(lock.locked_reward)
                            );
                            println!("  locked time:   {}", format_time(lock.lock_start_time));
                            println!("  unlock time:   {}", format_time(lock.unlock_time));
                        }
                    }
                    if !any {
                        println!("No active locks for this address.");
                    }
                }
            }
        }
        VgrStakeCommands::GetTotalStakedBalance {} => {
            let pool = protocol.staking_pool()?;
            println!(
                "total locked balance: {} VGR",
                format_token_amount(pool.total_locked_balance)
            );
            println!(
                "total locked reward:  {} VGR",
                format_token_amount(pool.total_locked_reward)
            );
        }
        VgrStakeCommands::GetRewardBalance {} => {
            let pool = protocol.staking_pool()?;
            println!(
                "unassigned reward balance: {} VGR",
                format_token_amount(pool.unassigned_reward_balance)
            );
        }
        VgrStakeCommands::GetManagerAddress {} => {
            let pool = protocol.staking_pool()?;
            println!("{}", pool.manager);
        }
        VgrStakeCommands::GetPauseStatus {} => {
            let pool = protocol.staking_pool()?;
            println!(
                "program: {}",
                if pool.program_paused { "Paused" } else { "Not Paused" }
            );
            println!(
                "staking: {}",
                if pool.staking_paused { "Paused" } else { "Not Paused" }
            );
        }
        VgrStakeCommands::Pause {} => print_signature(&protocol.pause()?),
        VgrStakeCommands::Unpause {} => print_signature(&protocol.unpause()?),
        VgrStakeCommands::StakingPause {} => print_signature(&protocol.staking_pause()?),
        VgrStakeCommands::StakingUnpause {} => print_signature(&protocol.staking_unpause()?),
        VgrStakeCommands::UpdateRewardPercentage { percentage } => {
            print_signature(&protocol.update_reward_percentage(percentage)?)
        }
        VgrStakeCommands::UpdateLockTime { seconds } => {
            print_signature(&protocol.update_lock_time(seconds)?)
        }
        VgrStakeCommands::DepositRewards { amount } => {
            print_signature(&protocol.deposit_rewards(amount)?)
        }
        VgrStakeCommands::WithdrawUnassignedRewards {} => {
            print_signature(&protocol.withdraw_unassigned_rewards()?)
        }
    }
    Ok(())
}
