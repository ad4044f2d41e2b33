use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use solana_sdk::{pubkey::Pubkey, signature::Keypair, signer::Signer};
use staking_pool_sdk::{PoolProvisioner, RpcLedger};

use pool_provisioner::{
    load_keypair, provision_lines, PoolStatus, ProvisionSummary, ProvisionerConfig,
};

#[derive(Parser, Debug)]
#[command(name = "pool-provisioner")]
#[command(about = "Creates a staking pool account unless it already exists")]
struct Args {
    /// Path to provisioner configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Keypair file path
    #[arg(short, long, env = "ANCHOR_WALLET")]
    keypair: Option<String>,

    /// RPC URL for Solana cluster
    #[arg(short = 'u', long, env = "ANCHOR_PROVIDER_URL")]
    rpc_url: Option<String>,

    /// Staking pool manager program ID
    #[arg(long)]
    program_id: Option<Pubkey>,

    /// Pool to provision or inspect
    #[arg(long)]
    pool_id: Option<u64>,

    /// Do not ensure the global state account first
    #[arg(long)]
    skip_state_init: bool,

    /// Dry run mode - read the ledger but don't submit transactions
    #[arg(long)]
    dry_run: bool,

    /// Print the outcome of `provision` or `status` as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ensure global state and pool exist (default)
    Provision,
    /// Show whether the pool exists without writing anything
    Status,
    /// Deposit the pool's asset and receive pool tokens
    Deposit {
        /// Amount in the asset's base units
        #[arg(long)]
        amount: u64,

        /// Mint of the pool token
        #[arg(long)]
        lp_mint: Pubkey,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    let mut config = match &args.config {
        Some(path) => ProvisionerConfig::load(path)?,
        None => ProvisionerConfig::default(),
    };
    apply_overrides(&mut config, &args);
    config.validate()?;

    let command = args.command.unwrap_or(Command::Provision);
    let rpc_url = config.rpc_url()?;
    log::info!("RPC URL: {}", rpc_url);
    log::info!("Program ID: {}", config.program_id);

    if args.dry_run {
        log::warn!("Running in DRY RUN mode - no transactions will be submitted");
    }

    let read_only = args.dry_run || matches!(command, Command::Status);
    let keypair = signing_keypair(&config, read_only)?;
    log::info!("Authority: {}", keypair.pubkey());

    let ledger = Arc::new(RpcLedger::new(rpc_url, config.commitment.to_config()));
    if let Err(e) = ledger.health_check().await {
        log::warn!("RPC health check failed: {}", e);
    }

    let provisioner = PoolProvisioner::new(
        ledger,
        config.program_id,
        Arc::new(keypair),
        config.provisioner_options(args.dry_run),
    );
    let pool_id = config.pool.id;

    match command {
        Command::Provision => {
            let report = provisioner.provision(pool_id).await?;
            if args.json {
                let summary = ProvisionSummary::new(
                    &provisioner.program_id(),
                    &provisioner.authority(),
                    &report,
                );
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                for line in provision_lines(&report) {
                    println!("{}", line);
                }
            }
        }
        Command::Status => {
            let address = provisioner.pool_address(pool_id);
            let lookup = provisioner.inspect_pool(pool_id).await;
            let status = PoolStatus::from_lookup(pool_id, &address, lookup)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("{}", status);
            }
        }
        Command::Deposit { amount, lp_mint } => {
            let signature = provisioner.deposit(pool_id, lp_mint, amount).await?;
            println!("Deposited {} into pool {}, tx: {}", amount, pool_id, signature);
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut ProvisionerConfig, args: &Args) {
    if let Some(url) = &args.rpc_url {
        config.rpc_url = Some(url.clone());
    }
    if let Some(path) = &args.keypair {
        config.keypair_path = path.clone();
    }
    if let Some(program_id) = args.program_id {
        config.program_id = program_id;
    }
    if let Some(pool_id) = args.pool_id {
        config.pool.id = pool_id;
    }
    if args.skip_state_init {
        config.provisioning.initialize_state = false;
    }
}

/// Read-only runs may proceed without a wallet
fn signing_keypair(config: &ProvisionerConfig, read_only: bool) -> Result<Keypair> {
    let path = config.keypair_path();
    if read_only && !Path::new(&path).exists() {
        log::warn!("No keypair at {}, using an ephemeral keypair (read-only run)", path);
        return Ok(Keypair::new());
    }
    Ok(load_keypair(&path)?)
}
