use anchor_lang::prelude::*;
use solana_sdk::{instruction::Instruction, system_program};

use crate::errors::{SdkError, SdkResult};
use crate::instructions::{InstructionArgs, PoolInstructionBuilder};
use crate::pda::PdaBuilder;
use crate::utils::token_account;

// ============================================================================
// create_pool
// ============================================================================

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct CreatePoolArgs {
    pub id: u64,
    /// Opaque to the client; its meaning is defined by the program
    pub asset: Pubkey,
}

impl InstructionArgs for CreatePoolArgs {
    const NAME: &'static str = "create_pool";
}

/// Build the instruction creating pool `pool_id` at its derived address
pub fn create_pool(
    pda: &PdaBuilder,
    authority: Pubkey,
    pool_id: u64,
    asset: Pubkey,
) -> SdkResult<Instruction> {
    let (pool, _) = pda.pool(pool_id);
    let (state, _) = pda.state();

    Ok(PoolInstructionBuilder::new(pda.program_id)
        .add_signer(authority)
        .add_writable(pool)
        .add_writable(state)
        .add_readonly(system_program::ID)
        .with_args(&CreatePoolArgs { id: pool_id, asset })?
        .build())
}

// ============================================================================
// deposit
// ============================================================================

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct DepositArgs {
    pub amount: u64,
}

impl InstructionArgs for DepositArgs {
    const NAME: &'static str = "deposit";
}

/// Accounts touched by a deposit, all derived from the depositor, the pool
/// and the two mints involved
#[derive(Debug, Clone, PartialEq)]
pub struct DepositAccounts {
    pub signer: Pubkey,
    pub pool: Pubkey,
    pub pool_token_account: Pubkey,
    pub user_token_account: Pubkey,
    pub user_pool_token_account: Pubkey,
    pub lp_mint: Pubkey,
    pub mint_authority: Pubkey,
}

impl DepositAccounts {
    pub fn derive(
        pda: &PdaBuilder,
        signer: Pubkey,
        pool_id: u64,
        asset: Pubkey,
        lp_mint: Pubkey,
    ) -> Self {
        let (pool, _) = pda.pool(pool_id);
        let (mint_authority, _) = pda.mint_authority();

        Self {
            signer,
            pool,
            pool_token_account: token_account(&pool, &asset),
            user_token_account: token_account(&signer, &asset),
            user_pool_token_account: token_account(&signer, &lp_mint),
            lp_mint,
            mint_authority,
        }
    }
}

/// Build a deposit of `amount` asset tokens into a pool, minting pool tokens
/// to the depositor
pub fn deposit(
    pda: &PdaBuilder,
    accounts: &DepositAccounts,
    amount: u64,
) -> SdkResult<Instruction> {
    if amount == 0 {
        return Err(SdkError::InvalidParameters(
            "deposit amount must be greater than 0".to_string(),
        ));
    }

    Ok(PoolInstructionBuilder::new(pda.program_id)
        .add_signer(accounts.signer)
        .add_writable(accounts.pool)
        .add_writable(accounts.pool_token_account)
        .add_writable(accounts.user_token_account)
        .add_writable(accounts.user_pool_token_account)
        .add_writable(accounts.lp_mint)
        .add_readonly(accounts.mint_authority)
        .add_readonly(spl_associated_token_account::ID)
        .add_readonly(spl_token::ID)
        .add_readonly(system_program::ID)
        .with_args(&DepositArgs { amount })?
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::instruction_discriminator;

    #[test]
    fn test_create_pool_layout() {
        let pda = PdaBuilder::default();
        let authority = Pubkey::new_unique();
        let asset = Pubkey::new_unique();
        let ix = create_pool(&pda, authority, 1, asset).unwrap();

        // discriminator, little-endian id, then the asset key
        assert_eq!(ix.data.len(), 8 + 8 + 32);
        assert_eq!(&ix.data[..8], &instruction_discriminator("create_pool"));
        assert_eq!(&ix.data[8..16], &1u64.to_le_bytes());
        assert_eq!(&ix.data[16..], asset.as_ref());

        let keys: Vec<Pubkey> = ix.accounts.iter().map(|m| m.pubkey).collect();
        assert_eq!(
            keys,
            vec![authority, pda.pool(1).0, pda.state().0, system_program::ID]
        );
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert!(ix.accounts[1].is_writable && !ix.accounts[1].is_signer);
        assert!(ix.accounts[2].is_writable);
        assert!(!ix.accounts[3].is_writable);
    }

    #[test]
    fn test_create_pool_args_decode() {
        let pda = PdaBuilder::default();
        let asset = Pubkey::new_unique();
        let ix = create_pool(&pda, Pubkey::new_unique(), 42, asset).unwrap();

        let args = CreatePoolArgs::deserialize(&mut &ix.data[8..]).unwrap();
        assert_eq!(args, CreatePoolArgs { id: 42, asset });
    }

    #[test]
    fn test_deposit_layout() {
        let pda = PdaBuilder::default();
        let signer = Pubkey::new_unique();
        let asset = Pubkey::new_unique();
        let lp_mint = Pubkey::new_unique();
        let accounts = DepositAccounts::derive(&pda, signer, 1, asset, lp_mint);

        assert_eq!(accounts.pool, pda.pool(1).0);
        assert_eq!(accounts.pool_token_account, token_account(&accounts.pool, &asset));
        assert_eq!(accounts.user_pool_token_account, token_account(&signer, &lp_mint));

        let ix = deposit(&pda, &accounts, 500).unwrap();
        assert_eq!(ix.accounts.len(), 10);
        assert_eq!(&ix.data[..8], &instruction_discriminator("deposit"));
        assert_eq!(&ix.data[8..], &500u64.to_le_bytes());
        assert_eq!(ix.accounts[6].pubkey, pda.mint_authority().0);
        assert!(!ix.accounts[6].is_writable);
        assert_eq!(ix.accounts[8].pubkey, spl_token::ID);
    }

    #[test]
    fn test_deposit_rejects_zero_amount() {
        let pda = PdaBuilder::default();
        let accounts = DepositAccounts::derive(
            &pda,
            Pubkey::new_unique(),
            1,
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        );
        assert!(matches!(
            deposit(&pda, &accounts, 0),
            Err(SdkError::InvalidParameters(_))
        ));
    }
}
