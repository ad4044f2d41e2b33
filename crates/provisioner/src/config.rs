use serde::{Deserialize, Serialize};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use staking_pool_sdk::{
    ProvisionerOptions, ReadFailurePolicy, DEFAULT_POOL_ASSET, DEFAULT_POOL_ID, PROGRAM_ID,
};
use std::fs;

use crate::error::{ProvisionerError, ProvisionerResult};

/// Keypair used when none is configured, as the Solana CLI does
pub const DEFAULT_KEYPAIR_PATH: &str = "~/.config/solana/id.json";

/// Provisioner configuration loaded from TOML file
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProvisionerConfig {
    /// `localnet`, `devnet`, `testnet`, `mainnet` or an RPC URL
    pub cluster: String,

    /// Overrides the URL implied by `cluster`
    pub rpc_url: Option<String>,

    /// Staking pool manager program ID
    #[serde(with = "pubkey_serde")]
    pub program_id: Pubkey,

    pub commitment: Commitment,

    /// Signing identity, `~` is expanded
    pub keypair_path: String,

    pub pool: PoolConfig,

    pub provisioning: ProvisioningConfig,
}

/// The pool to provision
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    pub id: u64,

    /// Passed through to `create_pool` untouched
    #[serde(with = "pubkey_serde")]
    pub asset: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Ensure the global state account before the pool
    pub initialize_state: bool,

    pub read_failure_policy: ReadFailurePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn to_config(self) -> CommitmentConfig {
        match self {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }
}

impl ProvisionerConfig {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> ProvisionerResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ProvisionerError::InvalidConfig(format!("Failed to read config file {}: {}", path, e))
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            ProvisionerError::InvalidConfig(msg) => {
                ProvisionerError::InvalidConfig(format!("{}: {}", path, msg))
            }
            other => other,
        })
    }

    pub fn from_toml(content: &str) -> ProvisionerResult<Self> {
        let config: ProvisionerConfig = toml::from_str(content).map_err(|e| {
            ProvisionerError::InvalidConfig(format!("Failed to parse config: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &str) -> ProvisionerResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            ProvisionerError::SerializationError(format!("Failed to serialize config: {}", e))
        })?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ProvisionerResult<()> {
        if self.cluster.is_empty() {
            return Err(ProvisionerError::InvalidConfig("cluster must not be empty".to_string()));
        }

        if self.rpc_url.is_none() && cluster_url(&self.cluster).is_none() {
            return Err(ProvisionerError::InvalidConfig(format!(
                "unknown cluster '{}', expected a cluster name or an http(s) URL",
                self.cluster
            )));
        }

        if let Some(url) = &self.rpc_url {
            if !is_http_url(url) {
                return Err(ProvisionerError::InvalidConfig(format!(
                    "rpc_url '{}' is not an http(s) URL",
                    url
                )));
            }
        }

        if self.program_id == Pubkey::default() {
            return Err(ProvisionerError::InvalidConfig("program_id must be set".to_string()));
        }

        if self.keypair_path.trim().is_empty() {
            return Err(ProvisionerError::InvalidConfig(
                "keypair_path must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// RPC endpoint, explicit URL first
    pub fn rpc_url(&self) -> ProvisionerResult<String> {
        if let Some(url) = &self.rpc_url {
            return Ok(url.clone());
        }
        cluster_url(&self.cluster).ok_or_else(|| {
            ProvisionerError::InvalidConfig(format!("unknown cluster '{}'", self.cluster))
        })
    }

    pub fn keypair_path(&self) -> String {
        shellexpand::tilde(&self.keypair_path).to_string()
    }

    pub fn provisioner_options(&self, dry_run: bool) -> ProvisionerOptions {
        ProvisionerOptions {
            asset: self.pool.asset,
            read_failure_policy: self.provisioning.read_failure_policy,
            initialize_state: self.provisioning.initialize_state,
            dry_run,
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Public RPC URL of a named cluster; URLs pass through
pub fn cluster_url(cluster: &str) -> Option<String> {
    let url = match cluster {
        "localnet" | "localhost" => "http://localhost:8899",
        "devnet" => "https://api.devnet.solana.com",
        "testnet" => "https://api.testnet.solana.com",
        "mainnet" | "mainnet-beta" => "https://api.mainnet-beta.solana.com",
        other if is_http_url(other) => other,
        _ => return None,
    };
    Some(url.to_string())
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            cluster: "localnet".to_string(),
            rpc_url: None,
            program_id: PROGRAM_ID,
            commitment: Commitment::default(),
            keypair_path: DEFAULT_KEYPAIR_PATH.to_string(),
            pool: PoolConfig::default(),
            provisioning: ProvisioningConfig::default(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_POOL_ID,
            asset: DEFAULT_POOL_ASSET,
        }
    }
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            initialize_state: true,
            read_failure_policy: ReadFailurePolicy::default(),
        }
    }
}

// Custom serde module for Pubkey
mod pubkey_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S>(pubkey: &Pubkey, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&pubkey.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Pubkey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Pubkey::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_script_constants() {
        let config = ProvisionerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pool.id, 1);
        assert_eq!(
            config.pool.asset.to_string(),
            "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU"
        );
        assert_eq!(
            config.program_id.to_string(),
            "69Qd1B33Uo7PR2JzfC7finFDaccts85pdpoCSMYbNf8K"
        );
        assert_eq!(config.rpc_url().unwrap(), "http://localhost:8899");
        assert!(config.provisioning.initialize_state);
        assert_eq!(config.provisioning.read_failure_policy, ReadFailurePolicy::Strict);
    }

    #[test]
    fn test_example_file_matches_defaults() {
        let config =
            ProvisionerConfig::from_toml(include_str!("../provisioner.example.toml")).unwrap();
        assert_eq!(config, ProvisionerConfig::default());
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config = ProvisionerConfig::from_toml(
            r#"
            cluster = "devnet"

            [pool]
            id = 7

            [provisioning]
            read_failure_policy = "treat-as-absent"
            "#,
        )
        .unwrap();

        assert_eq!(config.rpc_url().unwrap(), "https://api.devnet.solana.com");
        assert_eq!(config.pool.id, 7);
        assert_eq!(config.pool.asset, DEFAULT_POOL_ASSET);
        assert_eq!(
            config.provisioning.read_failure_policy,
            ReadFailurePolicy::TreatAsAbsent
        );
        assert!(config.provisioning.initialize_state);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ProvisionerConfig::default();

        config.cluster = "moonnet".to_string();
        assert!(config.validate().is_err());

        // An explicit URL makes the cluster name irrelevant
        config.rpc_url = Some("http://127.0.0.1:8899".to_string());
        assert!(config.validate().is_ok());

        config.rpc_url = Some("127.0.0.1:8899".to_string());
        assert!(config.validate().is_err());

        let mut config = ProvisionerConfig::default();
        config.program_id = Pubkey::default();
        assert!(config.validate().is_err());

        let mut config = ProvisionerConfig::default();
        config.keypair_path = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_pubkey_is_rejected() {
        let err = ProvisionerConfig::from_toml(r#"program_id = "not-a-key""#).unwrap_err();
        assert!(matches!(err, ProvisionerError::InvalidConfig(_)));
    }

    #[test]
    fn test_cluster_urls() {
        assert_eq!(cluster_url("mainnet").unwrap(), "https://api.mainnet-beta.solana.com");
        assert_eq!(cluster_url("testnet").unwrap(), "https://api.testnet.solana.com");
        assert_eq!(
            cluster_url("https://rpc.example.org").unwrap(),
            "https://rpc.example.org"
        );
        assert!(cluster_url("ws://localhost:8900").is_none());
    }

    #[test]
    fn test_commitment_mapping() {
        assert_eq!(Commitment::Finalized.to_config(), CommitmentConfig::finalized());
        let config = ProvisionerConfig::from_toml(r#"commitment = "processed""#).unwrap();
        assert_eq!(config.commitment, Commitment::Processed);
    }

    #[test]
    fn test_keypair_path_expands_tilde() {
        let config = ProvisionerConfig::default();
        assert!(!config.keypair_path().starts_with('~'));
        assert!(config.keypair_path().ends_with(".config/solana/id.json"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("provisioner.toml");
        let path = path.to_str().unwrap();

        let mut config = ProvisionerConfig::default();
        config.pool.id = 42;
        config.provisioning.initialize_state = false;
        config.save(path).unwrap();

        assert_eq!(ProvisionerConfig::load(path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        let err = ProvisionerConfig::load("/nonexistent/provisioner.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
