use solana_sdk::{pubkey, pubkey::Pubkey};

/// Deployed staking pool manager program
pub const PROGRAM_ID: Pubkey = pubkey!("69Qd1B33Uo7PR2JzfC7finFDaccts85pdpoCSMYbNf8K");

/// Asset passed to `create_pool` when none is configured
pub const DEFAULT_POOL_ASSET: Pubkey = pubkey!("4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU");

/// Pool provisioned when no id is given
pub const DEFAULT_POOL_ID: u64 = 1;

/// Seeds for program derived addresses
pub mod seeds {
    pub const POOL: &[u8] = b"pool";
    pub const STATE: &[u8] = b"state";
    pub const MINT_AUTHORITY: &[u8] = b"mint_authority";
}

/// Anchor discriminator namespaces
pub mod namespaces {
    pub const INSTRUCTION: &str = "global";
    pub const ACCOUNT: &str = "account";
}

/// Length of an Anchor discriminator
pub const DISCRIMINATOR_LEN: usize = 8;
