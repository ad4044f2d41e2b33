use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::constants::{seeds, PROGRAM_ID};

/// PDA cache to avoid repeating the bump search
pub struct PdaCache {
    cache: RwLock<HashMap<String, (Pubkey, u8)>>,
}

impl PdaCache {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_or_compute<F>(&self, key: &str, compute: F) -> (Pubkey, u8)
    where
        F: FnOnce() -> (Pubkey, u8),
    {
        if let Some(cached) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return *cached;
        }

        let result = compute();
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), result);
        result
    }

    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PdaCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives every address the staking pool program uses
pub struct PdaBuilder {
    cache: PdaCache,
    pub program_id: Pubkey,
}

impl PdaBuilder {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            cache: PdaCache::new(),
            program_id,
        }
    }

    /// Pool account for `pool_id`. The id is seeded as 8 little-endian bytes.
    pub fn pool(&self, pool_id: u64) -> (Pubkey, u8) {
        let key = format!("pool:{}", pool_id);
        self.cache.get_or_compute(&key, || {
            Pubkey::find_program_address(
                &[seeds::POOL, &pool_id.to_le_bytes()],
                &self.program_id,
            )
        })
    }

    /// Singleton global state account
    pub fn state(&self) -> (Pubkey, u8) {
        self.cache.get_or_compute("state", || {
            Pubkey::find_program_address(&[seeds::STATE], &self.program_id)
        })
    }

    /// Authority allowed to mint pool tokens on deposit
    pub fn mint_authority(&self) -> (Pubkey, u8) {
        self.cache.get_or_compute("mint_authority", || {
            Pubkey::find_program_address(&[seeds::MINT_AUTHORITY], &self.program_id)
        })
    }

    pub fn cache(&self) -> &PdaCache {
        &self.cache
    }
}

impl Default for PdaBuilder {
    fn default() -> Self {
        Self::new(PROGRAM_ID)
    }
}

/// Convenience functions for one-off PDA derivations
pub fn find_pool_address(program_id: &Pubkey, pool_id: u64) -> (Pubkey, u8) {
    PdaBuilder::new(*program_id).pool(pool_id)
}

pub fn find_state_address(program_id: &Pubkey) -> (Pubkey, u8) {
    PdaBuilder::new(*program_id).state()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_address_is_deterministic() {
        let builder = PdaBuilder::default();
        let first = builder.pool(1);
        let second = builder.pool(1);
        assert_eq!(first, second);

        // A fresh builder (no shared cache) must agree
        assert_eq!(find_pool_address(&PROGRAM_ID, 1), first);
    }

    #[test]
    fn test_pool_seed_matches_raw_derivation() {
        let builder = PdaBuilder::default();
        let expected =
            Pubkey::find_program_address(&[b"pool", &1u64.to_le_bytes()], &PROGRAM_ID);
        assert_eq!(builder.pool(1), expected);
    }

    #[test]
    fn test_distinct_ids_give_distinct_addresses() {
        let builder = PdaBuilder::default();
        assert_ne!(builder.pool(1).0, builder.pool(2).0);
        assert_ne!(builder.pool(0).0, builder.pool(u64::MAX).0);
        assert_ne!(builder.pool(1).0, builder.state().0);
    }

    #[test]
    fn test_program_id_changes_address() {
        let other = Pubkey::new_unique();
        assert_ne!(
            find_pool_address(&PROGRAM_ID, 1).0,
            find_pool_address(&other, 1).0
        );
        assert_ne!(find_state_address(&PROGRAM_ID).0, find_state_address(&other).0);
    }

    #[test]
    fn test_cache_is_populated_once_per_key() {
        let builder = PdaBuilder::default();
        assert!(builder.cache().is_empty());
        builder.pool(7);
        builder.pool(7);
        builder.state();
        assert_eq!(builder.cache().len(), 2);
    }
}
