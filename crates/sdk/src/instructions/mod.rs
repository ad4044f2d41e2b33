/// Instruction builders for the staking pool program
pub mod builder;
pub mod pool;
pub mod state;

pub use builder::{InstructionArgs, PoolInstructionBuilder};
pub use pool::{create_pool, deposit, CreatePoolArgs, DepositAccounts, DepositArgs};
pub use state::{initialize_state, InitializeStateArgs};
