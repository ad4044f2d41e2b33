//! The remote ledger as seen by the provisioner.

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    account::Account,
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};

use crate::errors::SdkResult;

/// Account reads and transaction submission against a cluster
#[async_trait]
pub trait Ledger: Send + Sync {
    /// `Ok(None)` means the cluster answered that no account exists.
    /// `Err` means the question went unanswered.
    async fn fetch_account(&self, address: &Pubkey) -> SdkResult<Option<Account>>;

    /// Sign, send and confirm one transaction
    async fn submit(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
        signers: &[&Keypair],
    ) -> SdkResult<Signature>;
}

/// [`Ledger`] backed by a JSON RPC endpoint
pub struct RpcLedger {
    rpc: RpcClient,
}

impl RpcLedger {
    pub fn new(rpc_url: String, commitment: CommitmentConfig) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url, commitment),
        }
    }

    /// Check RPC connection health
    pub async fn health_check(&self) -> SdkResult<()> {
        self.rpc.get_health().await?;
        Ok(())
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn fetch_account(&self, address: &Pubkey) -> SdkResult<Option<Account>> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.rpc.commitment())
            .await?;
        Ok(response.value)
    }

    async fn submit(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
        signers: &[&Keypair],
    ) -> SdkResult<Signature> {
        let recent_blockhash = self.rpc.get_latest_blockhash().await?;

        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&payer.pubkey()),
            signers,
            recent_blockhash,
        );

        // Program error codes are decoded by the `ClientError` conversion
        Ok(self.rpc.send_and_confirm_transaction(&tx).await?)
    }
}
