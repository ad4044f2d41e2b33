use solana_sdk::{hash::hashv, pubkey::Pubkey};
use spl_associated_token_account::get_associated_token_address;

use crate::constants::{namespaces, DISCRIMINATOR_LEN};

/// Anchor discriminator: `sha256("<namespace>:<name>")[..8]`
pub fn discriminator(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let preimage = format!("{}:{}", namespace, name);
    let h = hashv(&[preimage.as_bytes()]);
    let mut disc = [0u8; DISCRIMINATOR_LEN];
    disc.copy_from_slice(&h.to_bytes()[..DISCRIMINATOR_LEN]);
    disc
}

/// Discriminator of an instruction handler, e.g. `create_pool`
pub fn instruction_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    discriminator(namespaces::INSTRUCTION, name)
}

/// Discriminator of an account type, e.g. `Pool`
pub fn account_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    discriminator(namespaces::ACCOUNT, name)
}

/// Associated token account of `wallet` for `mint` under the classic token program
pub fn token_account(wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address(wallet, mint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_discriminators() {
        assert_eq!(
            instruction_discriminator("create_pool"),
            [233, 146, 209, 142, 207, 104, 64, 188]
        );
        assert_eq!(
            instruction_discriminator("initialize_state"),
            [190, 171, 224, 219, 217, 72, 199, 176]
        );
        assert_eq!(
            instruction_discriminator("deposit"),
            [242, 35, 198, 137, 82, 225, 242, 182]
        );
    }

    #[test]
    fn test_account_discriminators() {
        assert_eq!(account_discriminator("Pool"), [241, 154, 109, 4, 17, 177, 109, 188]);
        assert_eq!(account_discriminator("State"), [216, 146, 107, 94, 104, 75, 182, 177]);
    }

    #[test]
    fn test_token_account_depends_on_wallet_and_mint() {
        let wallet = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        assert_eq!(token_account(&wallet, &mint), token_account(&wallet, &mint));
        assert_ne!(token_account(&wallet, &mint), token_account(&mint, &wallet));
    }
}
