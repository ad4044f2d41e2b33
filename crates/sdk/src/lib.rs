/// Staking Pool SDK
///
/// Client-side access to the staking pool manager program:
/// - Program derived addresses
/// - Account decoding
/// - Instruction building
/// - Idempotent pool and global state provisioning

pub mod constants;
pub mod errors;
pub mod instructions;
pub mod ledger;
pub mod pda;
pub mod provisioner;
pub mod state;
pub mod testing;
pub mod utils;

pub use constants::{DEFAULT_POOL_ASSET, DEFAULT_POOL_ID, PROGRAM_ID};
pub use errors::*;
pub use ledger::{Ledger, RpcLedger};
pub use pda::PdaBuilder;
pub use provisioner::{
    Lookup, PoolProvisioner, PoolProvisioning, ProvisionReport, ProvisionerOptions,
    ReadFailurePolicy, StateProvisioning,
};
pub use state::{GlobalStateAccount, PoolAccount};
