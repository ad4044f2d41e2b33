use anchor_lang::prelude::*;
use solana_sdk::{instruction::Instruction, system_program};

use crate::errors::SdkResult;
use crate::instructions::{InstructionArgs, PoolInstructionBuilder};
use crate::pda::PdaBuilder;

/// `initialize_state` takes no arguments
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default)]
pub struct InitializeStateArgs {}

impl InstructionArgs for InitializeStateArgs {
    const NAME: &'static str = "initialize_state";
}

/// Build the instruction creating the program's global state singleton
pub fn initialize_state(pda: &PdaBuilder, authority: Pubkey) -> SdkResult<Instruction> {
    let (state, _) = pda.state();

    Ok(PoolInstructionBuilder::new(pda.program_id)
        .add_writable(state)
        .add_signer(authority)
        .add_readonly(system_program::ID)
        .with_args(&InitializeStateArgs::default())?
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::instruction_discriminator;

    #[test]
    fn test_initialize_state_layout() {
        let pda = PdaBuilder::default();
        let authority = Pubkey::new_unique();
        let ix = initialize_state(&pda, authority).unwrap();

        assert_eq!(ix.program_id, pda.program_id);
        assert_eq!(ix.data, instruction_discriminator("initialize_state").to_vec());
        assert_eq!(ix.accounts.len(), 3);
        assert_eq!(ix.accounts[0].pubkey, pda.state().0);
        assert!(ix.accounts[0].is_writable && !ix.accounts[0].is_signer);
        assert_eq!(ix.accounts[1].pubkey, authority);
        assert!(ix.accounts[1].is_signer);
        assert_eq!(ix.accounts[2].pubkey, system_program::ID);
    }
}
