//! Client-side views of the program's accounts.
//!
//! The program is Anchor based: every account starts with an 8 byte
//! discriminator followed by the Borsh encoded fields.

use anchor_lang::{AnchorDeserialize, AnchorSerialize};
use solana_sdk::{account::Account, pubkey::Pubkey};

use crate::constants::DISCRIMINATOR_LEN;
use crate::errors::{SdkError, SdkResult};
use crate::utils::account_discriminator;

/// A staking pool as stored on chain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolAccount {
    pub id: u64,
    pub creator: Pubkey,
    pub asset: Pubkey,
    pub is_closed: bool,
    pub is_frozen: bool,
}

impl PoolAccount {
    pub const NAME: &'static str = "Pool";

    /// 8 bytes for the id, 32 bytes for the creator, 32 bytes for the asset
    pub const BASE_SIZE: usize = 8 + 32 + 32;

    /// `is_closed` and `is_frozen`
    pub const FLAGS_SIZE: usize = 2;

    pub fn discriminator() -> [u8; DISCRIMINATOR_LEN] {
        account_discriminator(Self::NAME)
    }

    /// Decode raw account data.
    ///
    /// Builds of the program that predate the `is_closed`/`is_frozen` flags
    /// store only the base fields; in that case both flags read as `false`.
    pub fn try_from_bytes(data: &[u8]) -> SdkResult<Self> {
        let body = check_discriminator(data, Self::NAME)?;
        if body.len() < Self::BASE_SIZE {
            return Err(SdkError::DeserializationError(format!(
                "pool data is {} bytes, need at least {}",
                body.len(),
                Self::BASE_SIZE
            )));
        }

        let mut rest = body;
        let id = u64::deserialize(&mut rest)?;
        let creator = Pubkey::deserialize(&mut rest)?;
        let asset = Pubkey::deserialize(&mut rest)?;

        let (is_closed, is_frozen) = if rest.len() >= Self::FLAGS_SIZE {
            (bool::deserialize(&mut rest)?, bool::deserialize(&mut rest)?)
        } else {
            (false, false)
        };

        Ok(Self {
            id,
            creator,
            asset,
            is_closed,
            is_frozen,
        })
    }

    /// Decode a fetched account, checking it belongs to `program_id`
    pub fn try_from_account(
        address: &Pubkey,
        account: &Account,
        program_id: &Pubkey,
    ) -> SdkResult<Self> {
        check_owner(address, account, program_id, Self::NAME)?;
        Self::try_from_bytes(&account.data).map_err(|e| SdkError::UnexpectedAccount {
            address: *address,
            expected: Self::NAME,
            reason: e.to_string(),
        })
    }

    /// Encode in the on-chain layout, discriminator included
    pub fn to_account_data(&self) -> SdkResult<Vec<u8>> {
        let mut data = Vec::with_capacity(DISCRIMINATOR_LEN + Self::BASE_SIZE + Self::FLAGS_SIZE);
        data.extend_from_slice(&Self::discriminator());
        (
            self.id,
            self.creator,
            self.asset,
            self.is_closed,
            self.is_frozen,
        )
            .serialize(&mut data)
            .map_err(|e| SdkError::SerializationError(e.to_string()))?;
        Ok(data)
    }

    /// Whether the pool currently accepts deposits
    pub fn accepts_deposits(&self) -> bool {
        !self.is_closed && !self.is_frozen
    }
}

/// The program-wide state singleton.
///
/// Its field layout belongs to the program; the client only needs to know
/// that a well-formed state account is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalStateAccount {
    pub lamports: u64,
    pub data_len: usize,
}

impl GlobalStateAccount {
    pub const NAME: &'static str = "State";

    pub fn discriminator() -> [u8; DISCRIMINATOR_LEN] {
        account_discriminator(Self::NAME)
    }

    pub fn try_from_account(
        address: &Pubkey,
        account: &Account,
        program_id: &Pubkey,
    ) -> SdkResult<Self> {
        check_owner(address, account, program_id, Self::NAME)?;
        check_discriminator(&account.data, Self::NAME).map_err(|e| {
            SdkError::UnexpectedAccount {
                address: *address,
                expected: Self::NAME,
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            lamports: account.lamports,
            data_len: account.data.len(),
        })
    }
}

fn check_owner(
    address: &Pubkey,
    account: &Account,
    program_id: &Pubkey,
    expected: &'static str,
) -> SdkResult<()> {
    if account.owner != *program_id {
        return Err(SdkError::UnexpectedAccount {
            address: *address,
            expected,
            reason: format!("owned by {}, not {}", account.owner, program_id),
        });
    }
    Ok(())
}

/// Strip and verify the discriminator, returning the account body
fn check_discriminator<'a>(data: &'a [u8], name: &str) -> SdkResult<&'a [u8]> {
    if data.len() < DISCRIMINATOR_LEN {
        return Err(SdkError::DeserializationError(format!(
            "account data is {} bytes, shorter than a discriminator",
            data.len()
        )));
    }

    let (disc, body) = data.split_at(DISCRIMINATOR_LEN);
    if disc != account_discriminator(name) {
        return Err(SdkError::DeserializationError(format!(
            "discriminator does not match {}",
            name
        )));
    }
    Ok(body)
}
