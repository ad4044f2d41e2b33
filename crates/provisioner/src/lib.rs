pub mod config;
pub mod error;
pub mod report;

pub use config::{Commitment, PoolConfig, ProvisionerConfig, ProvisioningConfig};
pub use error::{ProvisionerError, ProvisionerResult};
pub use report::{load_keypair, provision_lines, PoolDetails, PoolStatus, ProvisionSummary};
