//! SDK error types

use solana_sdk::{
    instruction::InstructionError, pubkey::Pubkey, transaction::TransactionError,
};
use thiserror::Error;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// RPC or transport failure. Says nothing about whether an account exists.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// An account occupies the address but is not the expected record
    #[error("Account {address} is not a valid {expected} account: {reason}")]
    UnexpectedAccount {
        address: Pubkey,
        expected: &'static str,
        reason: String,
    },

    /// Reading the account failed, so its existence is unknown
    #[error("Could not determine whether {address} exists: {cause}")]
    LookupFailed { address: Pubkey, cause: String },

    /// The program rejected an instruction with one of its own error codes
    #[error("Program error: {0}")]
    Program(ProgramError),

    /// Transaction submission or confirmation failed
    #[error("Transaction targeting {address} failed: {cause}")]
    TransactionFailed {
        address: Pubkey,
        cause: String,
        /// Set when the failure was raised by the program itself
        program_error: Option<ProgramError>,
    },

    /// Deserialization error
    #[error("Failed to deserialize account: {0}")]
    DeserializationError(String),

    /// Serialization error
    #[error("Failed to serialize data: {0}")]
    SerializationError(String),

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

impl SdkError {
    /// Wrap a failed submission against `address`
    pub fn transaction_failed(address: Pubkey, err: SdkError) -> Self {
        let program_error = match &err {
            SdkError::Program(code) => Some(*code),
            _ => None,
        };
        SdkError::TransactionFailed {
            address,
            cause: err.to_string(),
            program_error,
        }
    }
}

/// Custom error codes of the staking pool manager program
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramError {
    #[error("Signer is not the owner of the token account")]
    InvalidTokenAccountOwner,

    #[error("Invalid associated token account")]
    InvalidAssociatedTokenAccount,

    #[error("State already initialized")]
    StateAlreadyInitialized,

    #[error("Pool is closed")]
    PoolClosed,

    #[error("Pool is frozen")]
    PoolFrozen,
}

impl ProgramError {
    /// Anchor numbers custom errors from 6000
    pub const OFFSET: u32 = 6000;

    pub fn code(self) -> u32 {
        Self::OFFSET + self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code.checked_sub(Self::OFFSET)? {
            0 => Some(ProgramError::InvalidTokenAccountOwner),
            1 => Some(ProgramError::InvalidAssociatedTokenAccount),
            2 => Some(ProgramError::StateAlreadyInitialized),
            3 => Some(ProgramError::PoolClosed),
            4 => Some(ProgramError::PoolFrozen),
            _ => None,
        }
    }
}

impl From<solana_client::client_error::ClientError> for SdkError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        if let Some(TransactionError::InstructionError(_, InstructionError::Custom(code))) =
            err.get_transaction_error()
        {
            if let Some(program_error) = ProgramError::from_code(code) {
                return SdkError::Program(program_error);
            }
        }
        SdkError::Rpc(err.to_string())
    }
}

impl From<std::io::Error> for SdkError {
    fn from(err: std::io::Error) -> Self {
        SdkError::DeserializationError(err.to_string())
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
