//! Idempotent provisioning of pools and the program's global state.
//!
//! Per invocation a pool goes through
//! `START -> ADDRESS_DERIVED -> {EXISTS | ABSENT -> SUBMITTED -> {CONFIRMED | FAILED}}`.
//! At most one transaction is submitted per call and nothing is retried.
//! A failed submission is followed by one more read: if the account is now
//! present, another provisioner won the race and the call reports it as
//! existing.

use serde::{Deserialize, Serialize};
use solana_sdk::{
    account::Account,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use std::fmt;
use std::sync::Arc;

use crate::constants::DEFAULT_POOL_ASSET;
use crate::errors::{SdkError, SdkResult};
use crate::instructions;
use crate::instructions::DepositAccounts;
use crate::ledger::Ledger;
use crate::pda::PdaBuilder;
use crate::state::{GlobalStateAccount, PoolAccount};

/// What to do when an account read fails for a reason other than absence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadFailurePolicy {
    /// Surface the failure and submit nothing
    #[default]
    Strict,
    /// Assume the account is absent and go on to create it
    TreatAsAbsent,
}

/// Outcome of reading one account
#[derive(Debug)]
pub enum Lookup<T> {
    /// Present and decoded as the expected record
    Found(T),
    /// The cluster reported no account at the address
    ConfirmedAbsent,
    /// Something occupies the address but it is not the expected record
    Unreadable(SdkError),
    /// The read failed; existence is unknown
    Transient(SdkError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PoolProvisioning {
    AlreadyExists { address: Pubkey, pool: PoolAccount },
    Created { address: Pubkey, pool_id: u64, signature: Signature },
    /// Dry run: the pool is missing and would have been created
    WouldCreate { address: Pubkey, pool_id: u64 },
}

impl PoolProvisioning {
    pub fn address(&self) -> Pubkey {
        match self {
            PoolProvisioning::AlreadyExists { address, .. }
            | PoolProvisioning::Created { address, .. }
            | PoolProvisioning::WouldCreate { address, .. } => *address,
        }
    }

    pub fn pool_id(&self) -> u64 {
        match self {
            PoolProvisioning::AlreadyExists { pool, .. } => pool.id,
            PoolProvisioning::Created { pool_id, .. }
            | PoolProvisioning::WouldCreate { pool_id, .. } => *pool_id,
        }
    }

    pub fn signature(&self) -> Option<Signature> {
        match self {
            PoolProvisioning::Created { signature, .. } => Some(*signature),
            _ => None,
        }
    }
}

impl fmt::Display for PoolProvisioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolProvisioning::AlreadyExists { address, pool } => write!(
                f,
                "Pool already exists, id: {}, accountAddress: {}",
                pool.id, address
            ),
            PoolProvisioning::Created { address, pool_id, .. } => write!(
                f,
                "Created new pool id: {}, accountAddress: {}",
                pool_id, address
            ),
            PoolProvisioning::WouldCreate { address, pool_id } => write!(
                f,
                "Would create pool id: {}, accountAddress: {}",
                pool_id, address
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StateProvisioning {
    AlreadyInitialized { address: Pubkey },
    Initialized { address: Pubkey, signature: Signature },
    WouldInitialize { address: Pubkey },
}

impl StateProvisioning {
    pub fn address(&self) -> Pubkey {
        match self {
            StateProvisioning::AlreadyInitialized { address }
            | StateProvisioning::Initialized { address, .. }
            | StateProvisioning::WouldInitialize { address } => *address,
        }
    }
}

impl fmt::Display for StateProvisioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateProvisioning::AlreadyInitialized { address } => {
                write!(f, "Global state already initialized, accountAddress: {}", address)
            }
            StateProvisioning::Initialized { address, .. } => {
                write!(f, "Initialized global state, accountAddress: {}", address)
            }
            StateProvisioning::WouldInitialize { address } => {
                write!(f, "Would initialize global state, accountAddress: {}", address)
            }
        }
    }
}

/// Result of a full provisioning run
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionReport {
    /// `None` when global state initialization was skipped
    pub state: Option<StateProvisioning>,
    pub pool: PoolProvisioning,
}

#[derive(Debug, Clone)]
pub struct ProvisionerOptions {
    /// Second `create_pool` argument
    pub asset: Pubkey,
    pub read_failure_policy: ReadFailurePolicy,
    /// Ensure the global state before the pool
    pub initialize_state: bool,
    /// Read but never submit
    pub dry_run: bool,
}

impl Default for ProvisionerOptions {
    fn default() -> Self {
        Self {
            asset: DEFAULT_POOL_ASSET,
            read_failure_policy: ReadFailurePolicy::Strict,
            initialize_state: true,
            dry_run: false,
        }
    }
}

/// Ensures program accounts exist without ever creating one twice
pub struct PoolProvisioner {
    ledger: Arc<dyn Ledger>,
    pda: PdaBuilder,
    authority: Arc<Keypair>,
    options: ProvisionerOptions,
}

impl PoolProvisioner {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        program_id: Pubkey,
        authority: Arc<Keypair>,
        options: ProvisionerOptions,
    ) -> Self {
        Self {
            ledger,
            pda: PdaBuilder::new(program_id),
            authority,
            options,
        }
    }

    pub fn program_id(&self) -> Pubkey {
        self.pda.program_id
    }

    pub fn authority(&self) -> Pubkey {
        self.authority.pubkey()
    }

    pub fn options(&self) -> &ProvisionerOptions {
        &self.options
    }

    /// Expected address of pool `pool_id`. Local, no network access.
    pub fn pool_address(&self, pool_id: u64) -> Pubkey {
        self.pda.pool(pool_id).0
    }

    pub fn state_address(&self) -> Pubkey {
        self.pda.state().0
    }

    /// Read-only view of pool `pool_id`
    pub async fn inspect_pool(&self, pool_id: u64) -> Lookup<PoolAccount> {
        let address = self.pool_address(pool_id);
        self.lookup(&address, PoolAccount::try_from_account).await
    }

    pub async fn inspect_state(&self) -> Lookup<GlobalStateAccount> {
        let address = self.state_address();
        self.lookup(&address, GlobalStateAccount::try_from_account).await
    }

    /// Make sure pool `pool_id` exists, creating it when it is confirmed absent
    pub async fn ensure_pool_exists(&self, pool_id: u64) -> SdkResult<PoolProvisioning> {
        let address = self.pool_address(pool_id);
        log::info!("Finding pool {} at {}", pool_id, address);

        match self.inspect_pool(pool_id).await {
            Lookup::Found(pool) => {
                log::info!("Pool {} already exists at {}", pool.id, address);
                return Ok(PoolProvisioning::AlreadyExists { address, pool });
            }
            Lookup::ConfirmedAbsent => {
                log::debug!("Pool {} is absent", pool_id);
            }
            Lookup::Unreadable(err) => return Err(err),
            Lookup::Transient(err) => self.absorb_read_failure(&address, err)?,
        }

        if self.options.dry_run {
            log::info!("DRY RUN: Would create pool {} at {}", pool_id, address);
            return Ok(PoolProvisioning::WouldCreate { address, pool_id });
        }

        let ix = instructions::create_pool(
            &self.pda,
            self.authority.pubkey(),
            pool_id,
            self.options.asset,
        )?;
        log::info!("Submitting create_pool for pool {}", pool_id);

        let signature = match self
            .ledger
            .submit(&[ix], &self.authority, &[&*self.authority])
            .await
        {
            Ok(signature) => signature,
            Err(err) => {
                // Another provisioner may have created it since our read
                if let Lookup::Found(pool) = self.inspect_pool(pool_id).await {
                    log::info!("Pool {} was created concurrently at {}", pool.id, address);
                    return Ok(PoolProvisioning::AlreadyExists { address, pool });
                }
                return Err(SdkError::transaction_failed(address, err));
            }
        };

        log::info!("Created pool {} at {}, tx: {}", pool_id, address, signature);
        Ok(PoolProvisioning::Created {
            address,
            pool_id,
            signature,
        })
    }

    /// Make sure the global state singleton exists. Running it twice is a no-op.
    pub async fn ensure_global_state_initialized(&self) -> SdkResult<StateProvisioning> {
        let address = self.state_address();

        match self.inspect_state().await {
            Lookup::Found(_) => {
                log::info!("Global state already initialized at {}", address);
                return Ok(StateProvisioning::AlreadyInitialized { address });
            }
            Lookup::ConfirmedAbsent => {
                log::debug!("Global state is absent");
            }
            Lookup::Unreadable(err) => return Err(err),
            Lookup::Transient(err) => self.absorb_read_failure(&address, err)?,
        }

        if self.options.dry_run {
            log::info!("DRY RUN: Would initialize global state at {}", address);
            return Ok(StateProvisioning::WouldInitialize { address });
        }

        let ix = instructions::initialize_state(&self.pda, self.authority.pubkey())?;
        log::info!("Submitting initialize_state");

        let signature = match self
            .ledger
            .submit(&[ix], &self.authority, &[&*self.authority])
            .await
        {
            Ok(signature) => signature,
            Err(err) => {
                if let Lookup::Found(_) = self.inspect_state().await {
                    log::info!("Global state was initialized concurrently at {}", address);
                    return Ok(StateProvisioning::AlreadyInitialized { address });
                }
                return Err(SdkError::transaction_failed(address, err));
            }
        };

        log::info!("Initialized global state at {}, tx: {}", address, signature);
        Ok(StateProvisioning::Initialized { address, signature })
    }

    /// Global state (unless disabled) followed by the pool.
    /// A state failure aborts before the pool is touched.
    pub async fn provision(&self, pool_id: u64) -> SdkResult<ProvisionReport> {
        let state = if self.options.initialize_state {
            Some(self.ensure_global_state_initialized().await?)
        } else {
            None
        };

        let pool = self.ensure_pool_exists(pool_id).await?;
        Ok(ProvisionReport { state, pool })
    }

    /// Deposit `amount` of the pool's asset, receiving `lp_mint` tokens
    pub async fn deposit(
        &self,
        pool_id: u64,
        lp_mint: Pubkey,
        amount: u64,
    ) -> SdkResult<Signature> {
        if self.options.dry_run {
            return Err(SdkError::InvalidParameters(
                "deposits cannot be dry run".to_string(),
            ));
        }

        let address = self.pool_address(pool_id);
        let pool = match self.inspect_pool(pool_id).await {
            Lookup::Found(pool) => pool,
            Lookup::ConfirmedAbsent => {
                return Err(SdkError::InvalidParameters(format!(
                    "pool {} does not exist at {}",
                    pool_id, address
                )))
            }
            Lookup::Unreadable(err) | Lookup::Transient(err) => return Err(err),
        };

        if !pool.accepts_deposits() {
            return Err(SdkError::InvalidParameters(format!(
                "pool {} is {}",
                pool_id,
                if pool.is_closed { "closed" } else { "frozen" }
            )));
        }

        let accounts = DepositAccounts::derive(
            &self.pda,
            self.authority.pubkey(),
            pool_id,
            pool.asset,
            lp_mint,
        );
        let ix = instructions::deposit(&self.pda, &accounts, amount)?;

        log::info!("Depositing {} into pool {}", amount, pool_id);
        self.ledger
            .submit(&[ix], &self.authority, &[&*self.authority])
            .await
            .map_err(|e| SdkError::transaction_failed(address, e))
    }

    async fn lookup<T, F>(&self, address: &Pubkey, decode: F) -> Lookup<T>
    where
        F: Fn(&Pubkey, &Account, &Pubkey) -> SdkResult<T>,
    {
        match self.ledger.fetch_account(address).await {
            Ok(Some(account)) => match decode(address, &account, &self.pda.program_id) {
                Ok(record) => Lookup::Found(record),
                Err(err) => Lookup::Unreadable(err),
            },
            Ok(None) => Lookup::ConfirmedAbsent,
            Err(err) => Lookup::Transient(err),
        }
    }

    /// Apply the read-failure policy to a failed read of `address`
    fn absorb_read_failure(&self, address: &Pubkey, err: SdkError) -> SdkResult<()> {
        match self.options.read_failure_policy {
            ReadFailurePolicy::Strict => Err(SdkError::LookupFailed {
                address: *address,
                cause: err.to_string(),
            }),
            ReadFailurePolicy::TreatAsAbsent => {
                log::warn!(
                    "Could not read {} ({}), treating it as absent",
                    address,
                    err
                );
                Ok(())
            }
        }
    }
}
