//! Human and JSON renderings of provisioning outcomes

use serde::Serialize;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair},
};
use staking_pool_sdk::{
    Lookup, PoolAccount, PoolProvisioning, ProvisionReport, StateProvisioning,
};

use std::fmt;

use crate::error::{ProvisionerError, ProvisionerResult};

/// Load the signing identity from a JSON keypair file
pub fn load_keypair(path: &str) -> ProvisionerResult<Keypair> {
    read_keypair_file(path).map_err(|e| {
        ProvisionerError::Keypair(format!("Failed to load keypair from {}: {}", path, e))
    })
}

/// Status lines printed after a provisioning run
pub fn provision_lines(report: &ProvisionReport) -> Vec<String> {
    let mut lines = Vec::with_capacity(2);
    if let Some(state) = &report.state {
        lines.push(state.to_string());
    }
    lines.push(report.pool.to_string());
    if let Some(signature) = report.pool.signature() {
        lines.push(format!("Transaction: {}", signature));
    }
    lines
}

/// Result of a read-only pool lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolStatus {
    pub pool_id: u64,
    pub address: String,
    /// `None` when the pool does not exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolDetails {
    pub creator: String,
    pub asset: String,
    pub is_closed: bool,
    pub is_frozen: bool,
}

impl PoolStatus {
    /// Read failures and foreign accounts are errors, not statuses
    pub fn from_lookup(
        pool_id: u64,
        address: &Pubkey,
        lookup: Lookup<PoolAccount>,
    ) -> ProvisionerResult<Self> {
        let pool = match lookup {
            Lookup::Found(pool) => Some(PoolDetails {
                creator: pool.creator.to_string(),
                asset: pool.asset.to_string(),
                is_closed: pool.is_closed,
                is_frozen: pool.is_frozen,
            }),
            Lookup::ConfirmedAbsent => None,
            Lookup::Unreadable(err) | Lookup::Transient(err) => return Err(err.into()),
        };
        Ok(Self {
            pool_id,
            address: address.to_string(),
            pool,
        })
    }

    pub fn exists(&self) -> bool {
        self.pool.is_some()
    }
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pool {
            Some(pool) => write!(
                f,
                "Pool exists, id: {}, creator: {}, asset: {}, closed: {}, frozen: {}, \
                 accountAddress: {}",
                self.pool_id, pool.creator, pool.asset, pool.is_closed, pool.is_frozen, self.address
            ),
            None => write!(
                f,
                "Pool {} not found, expected accountAddress: {}",
                self.pool_id, self.address
            ),
        }
    }
}

/// One provisioning step in machine-readable form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepSummary {
    pub outcome: &'static str,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvisionSummary {
    pub program_id: String,
    pub authority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<StepSummary>,
    pub pool: StepSummary,
}

impl ProvisionSummary {
    pub fn new(program_id: &Pubkey, authority: &Pubkey, report: &ProvisionReport) -> Self {
        Self {
            program_id: program_id.to_string(),
            authority: authority.to_string(),
            state: report.state.as_ref().map(StepSummary::from),
            pool: StepSummary::from(&report.pool),
        }
    }
}

impl From<&PoolProvisioning> for StepSummary {
    fn from(outcome: &PoolProvisioning) -> Self {
        let label = match outcome {
            PoolProvisioning::AlreadyExists { .. } => "exists",
            PoolProvisioning::Created { .. } => "created",
            PoolProvisioning::WouldCreate { .. } => "would-create",
        };
        Self {
            outcome: label,
            address: outcome.address().to_string(),
            pool_id: Some(outcome.pool_id()),
            signature: outcome.signature().map(|s| s.to_string()),
        }
    }
}

impl From<&StateProvisioning> for StepSummary {
    fn from(outcome: &StateProvisioning) -> Self {
        let (label, signature) = match outcome {
            StateProvisioning::AlreadyInitialized { .. } => ("exists", None),
            StateProvisioning::Initialized { signature, .. } => {
                ("created", Some(signature.to_string()))
            }
            StateProvisioning::WouldInitialize { .. } => ("would-create", None),
        };
        Self {
            outcome: label,
            address: outcome.address().to_string(),
            pool_id: None,
            signature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::{write_keypair_file, Signature};
    use solana_sdk::signer::Signer;
    use staking_pool_sdk::SdkError;

    fn created_report() -> ProvisionReport {
        ProvisionReport {
            state: Some(StateProvisioning::AlreadyInitialized {
                address: Pubkey::new_unique(),
            }),
            pool: PoolProvisioning::Created {
                address: Pubkey::new_unique(),
                pool_id: 1,
                signature: Signature::default(),
            },
        }
    }

    #[test]
    fn test_provision_lines() {
        let report = created_report();
        let lines = provision_lines(&report);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Global state already initialized"));
        assert_eq!(
            lines[1],
            format!("Created new pool id: 1, accountAddress: {}", report.pool.address())
        );
        assert!(lines[2].starts_with("Transaction: "));
    }

    #[test]
    fn test_existing_pool_line() {
        let address = Pubkey::new_unique();
        let report = ProvisionReport {
            state: None,
            pool: PoolProvisioning::AlreadyExists {
                address,
                pool: PoolAccount {
                    id: 1,
                    ..Default::default()
                },
            },
        };
        assert_eq!(
            provision_lines(&report),
            vec![format!("Pool already exists, id: 1, accountAddress: {}", address)]
        );
    }

    #[test]
    fn test_pool_status() {
        let address = Pubkey::new_unique();
        let absent = PoolStatus::from_lookup(3, &address, Lookup::ConfirmedAbsent).unwrap();
        assert!(!absent.exists());
        assert!(absent.to_string().contains("Pool 3 not found"));

        let found = PoolStatus::from_lookup(
            3,
            &address,
            Lookup::Found(PoolAccount {
                id: 3,
                is_frozen: true,
                ..Default::default()
            }),
        )
        .unwrap();
        assert!(found.exists());
        assert!(found.to_string().contains("frozen: true"));
        assert!(found.to_string().ends_with(&format!("accountAddress: {}", address)));

        let err = PoolStatus::from_lookup(
            3,
            &address,
            Lookup::Transient(SdkError::Rpc("timeout".to_string())),
        );
        assert!(matches!(err, Err(ProvisionerError::Sdk(SdkError::Rpc(_)))));
    }

    #[test]
    fn test_pool_status_json() {
        let address = Pubkey::new_unique();
        let absent = PoolStatus::from_lookup(3, &address, Lookup::ConfirmedAbsent).unwrap();
        let json = serde_json::to_value(&absent).unwrap();
        assert_eq!(json["pool_id"], 3);
        assert_eq!(json["address"], address.to_string());
        assert!(json.get("pool").is_none());

        let found = PoolStatus::from_lookup(
            3,
            &address,
            Lookup::Found(PoolAccount {
                id: 3,
                is_closed: true,
                ..Default::default()
            }),
        )
        .unwrap();
        let json = serde_json::to_value(&found).unwrap();
        assert_eq!(json["pool"]["is_closed"], true);
        assert_eq!(json["pool"]["is_frozen"], false);
    }

    #[test]
    fn test_summary_json() {
        let program_id = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let summary = ProvisionSummary::new(&program_id, &authority, &created_report());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["program_id"], program_id.to_string());
        assert_eq!(json["pool"]["outcome"], "created");
        assert_eq!(json["pool"]["pool_id"], 1);
        assert_eq!(json["state"]["outcome"], "exists");
        assert!(json["state"].get("signature").is_none());
    }

    #[test]
    fn test_load_keypair() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        let path = path.to_str().unwrap();
        let keypair = Keypair::new();
        write_keypair_file(&keypair, path).unwrap();

        assert_eq!(load_keypair(path).unwrap().pubkey(), keypair.pubkey());
        assert!(matches!(
            load_keypair("/nonexistent/id.json"),
            Err(ProvisionerError::Keypair(_))
        ));
    }
}
