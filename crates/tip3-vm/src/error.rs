//! Error taxonomy.
//!
//! [`ContractError`] is what a handler fails with. It maps to the numeric exit
//! code a test expects (`dispatch_one(Some(1050))`). [`SimError`] covers
//! everything the harness side can get wrong, including the fatal
//! [`SimError::TestIntegrityMismatch`].

use crate::address::Address;
use crate::message::MessageId;

pub type ExitCode = u32;

/// Exit code of a successful compute phase.
pub const SUCCESS: ExitCode = 0;

pub mod exit_code {
    use super::ExitCode;

    pub const INTEGER_OVERFLOW: ExitCode = 4;
    pub const NOT_ENOUGH_FUNDS: ExitCode = 37;
    pub const CONSTRUCTOR_ALREADY_CALLED: ExitCode = 51;
    pub const UNKNOWN_METHOD: ExitCode = 60;

    pub const NOT_OWNER: ExitCode = 1000;
    pub const NOT_ROOT: ExitCode = 1010;
    pub const NOT_TOKEN_WALLET: ExitCode = 1020;
    pub const WRONG_RECIPIENT: ExitCode = 1030;
    pub const WRONG_WALLET_OWNER: ExitCode = 1040;
    pub const WRONG_AMOUNT: ExitCode = 1050;
    pub const NOT_ENOUGH_BALANCE: ExitCode = 1060;
    pub const NON_EMPTY_BALANCE: ExitCode = 1070;
    pub const SENDER_IS_NOT_VALID_WALLET: ExitCode = 1100;
    pub const MINT_DISABLED: ExitCode = 2100;
    pub const BURN_PAUSED: ExitCode = 2200;
    pub const BURN_BY_ROOT_DISABLED: ExitCode = 2210;
    pub const INCOMPATIBLE_CODE: ExitCode = 2300;
}

/// Coarse classification of contract failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    InvalidAmount,
    InvalidArgument,
    InsufficientBalance,
    OperationPaused,
    OperationDisabled,
    Vm,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("sender is not the owner")]
    NotOwner,
    #[error("sender is not the token root")]
    NotRoot,
    #[error("sender is not a token wallet")]
    NotTokenWallet,
    #[error("wrong recipient")]
    WrongRecipient,
    #[error("wrong wallet owner")]
    WrongWalletOwner,
    #[error("amount must be positive")]
    WrongAmount,
    #[error("not enough token balance")]
    NotEnoughBalance,
    #[error("token balance is not empty")]
    NonEmptyBalance,
    #[error("sender is not a valid wallet of this root")]
    SenderIsNotValidWallet,
    #[error("minting is disabled")]
    MintDisabled,
    #[error("burning is paused")]
    BurnPaused,
    #[error("burning by root is disabled")]
    BurnByRootDisabled,
    #[error("code is not compatible with this contract")]
    IncompatibleCode,
    #[error("not enough funds to send {requested} (available {available})")]
    NotEnoughFunds { requested: u128, available: u128 },
    #[error("constructor already called")]
    ConstructorAlreadyCalled,
    #[error("method `{0}` is not supported")]
    UnknownMethod(&'static str),
    #[error("integer overflow")]
    IntegerOverflow,
}

impl ContractError {
    pub fn exit_code(&self) -> ExitCode {
        use exit_code::*;
        match self {
            ContractError::NotOwner => NOT_OWNER,
            ContractError::NotRoot => NOT_ROOT,
            ContractError::NotTokenWallet => NOT_TOKEN_WALLET,
            ContractError::WrongRecipient => WRONG_RECIPIENT,
            ContractError::WrongWalletOwner => WRONG_WALLET_OWNER,
            ContractError::WrongAmount => WRONG_AMOUNT,
            ContractError::NotEnoughBalance => NOT_ENOUGH_BALANCE,
            ContractError::NonEmptyBalance => NON_EMPTY_BALANCE,
            ContractError::SenderIsNotValidWallet => SENDER_IS_NOT_VALID_WALLET,
            ContractError::MintDisabled => MINT_DISABLED,
            ContractError::BurnPaused => BURN_PAUSED,
            ContractError::BurnByRootDisabled => BURN_BY_ROOT_DISABLED,
            ContractError::IncompatibleCode => INCOMPATIBLE_CODE,
            ContractError::NotEnoughFunds { .. } => NOT_ENOUGH_FUNDS,
            ContractError::ConstructorAlreadyCalled => CONSTRUCTOR_ALREADY_CALLED,
            ContractError::UnknownMethod(_) => UNKNOWN_METHOD,
            ContractError::IntegerOverflow => INTEGER_OVERFLOW,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ContractError::NotOwner
            | ContractError::NotRoot
            | ContractError::NotTokenWallet
            | ContractError::SenderIsNotValidWallet => ErrorKind::Unauthorized,
            ContractError::WrongAmount => ErrorKind::InvalidAmount,
            ContractError::WrongRecipient
            | ContractError::WrongWalletOwner
            | ContractError::IncompatibleCode => ErrorKind::InvalidArgument,
            ContractError::NotEnoughBalance
            | ContractError::NonEmptyBalance
            | ContractError::NotEnoughFunds { .. } => ErrorKind::InsufficientBalance,
            ContractError::BurnPaused => ErrorKind::OperationPaused,
            ContractError::MintDisabled | ContractError::BurnByRootDisabled => {
                ErrorKind::OperationDisabled
            }
            ContractError::ConstructorAlreadyCalled
            | ContractError::UnknownMethod(_)
            | ContractError::IntegerOverflow => ErrorKind::Vm,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("unknown code `{0}`")]
    UnknownCode(String),
    #[error("no contract at {0}")]
    NoContract(Address),
    #[error("address {0} is already occupied")]
    AddressCollision(Address),
    #[error("code `{code}` cannot be deployed with {args} arguments")]
    ConstructorMismatch { code: String, args: &'static str },
    #[error("expected exit code {expected} for message {message:?}, got {actual:?}")]
    TestIntegrityMismatch {
        expected: ExitCode,
        actual: Option<ExitCode>,
        message: Option<MessageId>,
    },
    #[error("message {message} failed with exit code {exit_code}")]
    UnexpectedFailure {
        message: MessageId,
        exit_code: ExitCode,
    },
    #[error("queue did not drain within {0} dispatch steps")]
    DispatchLimit(usize),
    #[error("expected a {expected} value, got {found}")]
    UnexpectedValue { expected: &'static str, found: String },
    #[error("contract error: {0}")]
    Contract(#[from] ContractError),
    #[error("assertion failed: {0}")]
    Assertion(String),
    #[error("invariant violated: {0}")]
    InvariantViolated(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("scenario error: {0}")]
    Scenario(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SimError {
    /// Exit code carried by a contract failure, if this is one.
    pub fn exit_code(&self) -> Option<ExitCode> {
        match self {
            SimError::Contract(err) => Some(err.exit_code()),
            _ => None,
        }
    }
}
