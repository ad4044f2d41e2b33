//! Testing utilities for the staking pool SDK
//!
//! [`InMemoryLedger`] stands in for a cluster: it keeps an account map,
//! executes `initialize_state` and `create_pool` the way the program does
//! (refusing to initialize an occupied address) and records every
//! submission so tests can count writes.

use anchor_lang::AnchorDeserialize;
use async_trait::async_trait;
use solana_sdk::{
    account::Account,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::errors::{SdkError, SdkResult};
use crate::instructions::{CreatePoolArgs, InstructionArgs, InitializeStateArgs};
use crate::ledger::Ledger;
use crate::state::{GlobalStateAccount, PoolAccount};
use crate::utils::instruction_discriminator;

/// Rent-exempt balance given to accounts created by the ledger
const ACCOUNT_LAMPORTS: u64 = 1_461_600;

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<Pubkey, Account>,
    /// Errors handed out by upcoming reads, oldest first
    read_failures: VecDeque<String>,
    /// Upcoming reads that report absence whatever the account map holds
    stale_reads: usize,
    /// Error handed out by every submission while set
    submit_failure: Option<String>,
    /// Skip executing instructions, as if the transaction landed nowhere
    drop_submissions: bool,
    submissions: Vec<Vec<Instruction>>,
    reads: usize,
}

/// Deterministic in-process [`Ledger`]
pub struct InMemoryLedger {
    program_id: Pubkey,
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            state: Mutex::new(LedgerState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Place an account directly, bypassing the program
    pub fn insert_account(&self, address: Pubkey, account: Account) {
        self.lock().accounts.insert(address, account);
    }

    /// Place a pool account owned by the program
    pub fn insert_pool(&self, address: Pubkey, pool: &PoolAccount) -> SdkResult<()> {
        let data = pool.to_account_data()?;
        self.insert_account(address, self.program_account(data));
        Ok(())
    }

    pub fn account(&self, address: &Pubkey) -> Option<Account> {
        self.lock().accounts.get(address).cloned()
    }

    /// Make the next read fail with a transport error
    pub fn fail_next_read(&self, cause: &str) {
        self.lock().read_failures.push_back(cause.to_string());
    }

    /// Make the next `count` reads report every account as absent,
    /// like an RPC node lagging behind the cluster
    pub fn stale_reads(&self, count: usize) {
        self.lock().stale_reads = count;
    }

    /// Make every submission fail until cleared with `None`
    pub fn fail_submissions(&self, cause: Option<&str>) {
        self.lock().submit_failure = cause.map(str::to_string);
    }

    /// Accept submissions without applying them
    pub fn drop_submissions(&self, drop: bool) {
        self.lock().drop_submissions = drop;
    }

    /// Submissions attempted so far, failed ones included
    pub fn submission_count(&self) -> usize {
        self.lock().submissions.len()
    }

    pub fn submissions(&self) -> Vec<Vec<Instruction>> {
        self.lock().submissions.clone()
    }

    pub fn read_count(&self) -> usize {
        self.lock().reads
    }

    fn program_account(&self, data: Vec<u8>) -> Account {
        Account {
            lamports: ACCOUNT_LAMPORTS,
            data,
            owner: self.program_id,
            executable: false,
            rent_epoch: 0,
        }
    }

    /// Execute one instruction against `accounts`
    fn apply(
        &self,
        accounts: &mut HashMap<Pubkey, Account>,
        ix: &Instruction,
    ) -> SdkResult<()> {
        if ix.program_id != self.program_id {
            return Err(SdkError::Rpc(format!("unknown program {}", ix.program_id)));
        }
        if ix.data.len() < 8 {
            return Err(SdkError::Rpc("instruction data too short".to_string()));
        }
        let (disc, mut args) = ix.data.split_at(8);

        if disc == instruction_discriminator(CreatePoolArgs::NAME) {
            let args = CreatePoolArgs::deserialize(&mut args)?;
            let authority = account_key(ix, 0)?;
            let pool_address = account_key(ix, 1)?;
            self.init_account(
                accounts,
                pool_address,
                PoolAccount {
                    id: args.id,
                    creator: authority,
                    asset: args.asset,
                    is_closed: false,
                    is_frozen: false,
                }
                .to_account_data()?,
            )
        } else if disc == instruction_discriminator(InitializeStateArgs::NAME) {
            let state_address = account_key(ix, 0)?;
            let authority = account_key(ix, 1)?;
            let mut data = GlobalStateAccount::discriminator().to_vec();
            data.extend_from_slice(authority.as_ref());
            data.extend_from_slice(&0u64.to_le_bytes());
            self.init_account(accounts, state_address, data)
        } else {
            Err(SdkError::Rpc("unsupported instruction".to_string()))
        }
    }

    fn init_account(
        &self,
        accounts: &mut HashMap<Pubkey, Account>,
        address: Pubkey,
        data: Vec<u8>,
    ) -> SdkResult<()> {
        if accounts.contains_key(&address) {
            return Err(SdkError::Rpc(format!(
                "Allocate: account {} already in use",
                address
            )));
        }
        accounts.insert(address, self.program_account(data));
        Ok(())
    }
}

fn account_key(ix: &Instruction, index: usize) -> SdkResult<Pubkey> {
    ix.accounts
        .get(index)
        .map(|meta| meta.pubkey)
        .ok_or_else(|| SdkError::Rpc(format!("missing account #{}", index)))
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn fetch_account(&self, address: &Pubkey) -> SdkResult<Option<Account>> {
        let mut state = self.lock();
        state.reads += 1;
        if let Some(cause) = state.read_failures.pop_front() {
            return Err(SdkError::Rpc(cause));
        }
        if state.stale_reads > 0 {
            state.stale_reads -= 1;
            return Ok(None);
        }
        Ok(state.accounts.get(address).cloned())
    }

    async fn submit(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
        signers: &[&Keypair],
    ) -> SdkResult<Signature> {
        let mut state = self.lock();
        state.submissions.push(instructions.to_vec());

        if let Some(cause) = state.submit_failure.clone() {
            return Err(SdkError::Rpc(cause));
        }
        if !signers.iter().any(|s| s.pubkey() == payer.pubkey()) {
            return Err(SdkError::Rpc("fee payer did not sign".to_string()));
        }
        if state.drop_submissions {
            return Ok(Signature::new_unique());
        }

        // All or nothing, like a transaction
        let mut accounts = state.accounts.clone();
        for ix in instructions {
            self.apply(&mut accounts, ix)?;
        }
        state.accounts = accounts;

        Ok(Signature::new_unique())
    }
}
