use anchor_lang::AnchorSerialize;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

use crate::errors::{SdkError, SdkResult};
use crate::utils::instruction_discriminator;

/// Arguments of one program instruction
pub trait InstructionArgs: AnchorSerialize {
    /// Handler name on the program, e.g. `create_pool`
    const NAME: &'static str;

    /// Build the instruction data (discriminator + serialized args)
    fn build_data(&self) -> SdkResult<Vec<u8>> {
        let mut data = instruction_discriminator(Self::NAME).to_vec();
        self.serialize(&mut data)
            .map_err(|e| SdkError::SerializationError(e.to_string()))?;
        Ok(data)
    }
}

/// Builder for constructing program instructions
pub struct PoolInstructionBuilder {
    program_id: Pubkey,
    accounts: Vec<AccountMeta>,
    data: Vec<u8>,
}

impl PoolInstructionBuilder {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            accounts: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Add a writable signer account
    pub fn add_signer(mut self, pubkey: Pubkey) -> Self {
        self.accounts.push(AccountMeta::new(pubkey, true));
        self
    }

    /// Add a writable non-signer account
    pub fn add_writable(mut self, pubkey: Pubkey) -> Self {
        self.accounts.push(AccountMeta::new(pubkey, false));
        self
    }

    /// Add a readonly account
    pub fn add_readonly(mut self, pubkey: Pubkey) -> Self {
        self.accounts.push(AccountMeta::new_readonly(pubkey, false));
        self
    }

    /// Set the instruction data from typed args
    pub fn with_args<A: InstructionArgs>(mut self, args: &A) -> SdkResult<Self> {
        self.data = args.build_data()?;
        Ok(self)
    }

    /// Build the final instruction
    pub fn build(self) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: self.accounts,
            data: self.data,
        }
    }
}
