use core::fmt;

use thiserror::Error;

pub static ERROR_ASSET_NOT_SUPPORTED: &str = "Asset not supported.";

pub static ERROR_RISK_PARAMETER_NOT_FOUND: &str = "Risk parameter not found for this asset.";

pub static ERROR_MARKET_STATUS_NOT_FOUND: &str = "Market status not found for this asset.";

pub static ERROR_PRICE_NOT_FOUND: &str = "Price not found for this asset.";

pub static ERROR_AMOUNT_MUST_BE_GREATER_THAN_ZERO: &str = "Amount must be greater than zero.";

pub static ERROR_ASSET_NOT_SUPPORTED_AS_COLLATERAL: &str = "Asset not supported as collateral.";

pub static ERROR_COLLATERAL_FLAG_MISMATCH: &str =
    "Collateral flag is different from the existing supply.";

pub static ERROR_POSITION_NOT_FOUND: &str = "Position not found.";

pub static ERROR_INSUFFICIENT_DEPOSIT: &str = "Not enough tokens deposited for this account.";

pub static ERROR_HEALTH_FACTOR_WITHDRAW: &str = "Health factor will be too low after withdrawal.";

pub static ERROR_HEALTH_FACTOR_TOO_LOW: &str = "Health factor lower than liquidation threshold.";

pub static ERROR_ASSET_NOT_BORROWABLE: &str = "Asset not borrowable.";

pub static ERROR_STABLE_BORROW_NOT_ENABLED: &str = "Stable borrowing not enabled for this asset.";

pub static ERROR_COLLATERAL_SAME_AS_BORROWING: &str = "Collateral same as borrowing currency.";

pub static ERROR_NO_COLLATERAL: &str = "Collateral balance is zero.";

pub static ERROR_LTV_VALIDATION_FAILED: &str = "Loan-to-value validation failed.";

pub static ERROR_INSUFFICIENT_COLLATERAL: &str = "Not enough collateral available for this loan.";

pub static ERROR_NO_DEBT: &str = "No debt of the selected type.";

pub static ERROR_AMOUNT_EXCEEDS_DEBT: &str = "Amount exceeds the outstanding debt.";

pub static ERROR_INSUFFICIENT_BALANCE: &str = "Not enough balance in the wallet.";

pub static ERROR_INVALID_LIQUIDATION_THRESHOLD: &str =
    "Invalid liquidation threshold has to be higher than the loan-to-value.";

pub static ERROR_INVALID_THRESHOLD_ABOVE_ONE: &str =
    "Invalid liquidation threshold has to be at most 100%.";

pub static ERROR_INVALID_LIQUIDATION_BONUS: &str = "Liquidation bonus above the allowed maximum.";

pub static ERROR_INVALID_LIQUIDATION_PROBABILITY: &str =
    "Liquidation probability has to be between 0 and 10000 basis points.";

pub static ERROR_ASSET_ALREADY_SUPPORTED: &str = "Asset already supported.";

pub static ERROR_MARKET_ALREADY_EXISTS: &str = "Market already exists.";

pub static ERROR_MARKET_NOT_FOUND: &str = "Market not found.";

pub static ERROR_EMPTY_POSITION: &str = "Stored position has a zero base amount.";

pub static ERROR_INVALID_DECIMAL: &str = "Invalid decimal amount.";

/// The operation a failure was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Supply,
    Withdraw,
    Borrow,
    Repay,
    ChangeCollateral,
    Liquidation,
    Query,
    Transfer,
    Setup,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Supply => "supply",
            Operation::Withdraw => "withdraw",
            Operation::Borrow => "borrow",
            Operation::Repay => "repay",
            Operation::ChangeCollateral => "change_collateral",
            Operation::Liquidation => "liquidation",
            Operation::Query => "query",
            Operation::Transfer => "transfer",
            Operation::Setup => "setup",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    InsufficientFunds,
    SolvencyViolation,
    InvalidRequest,
}

/// Failure of a market operation. A failed operation leaves the ledger, the wallet and the
/// action log exactly as they were before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LendingError {
    #[error("{operation} {token}: {reason}")]
    Configuration {
        operation: Operation,
        token: String,
        reason: &'static str,
    },
    #[error("{operation} {token}: {reason}")]
    InsufficientFunds {
        operation: Operation,
        token: String,
        reason: &'static str,
    },
    #[error("{operation} {token}: {reason}")]
    SolvencyViolation {
        operation: Operation,
        token: String,
        reason: &'static str,
    },
    #[error("{operation} {token}: {reason}")]
    InvalidRequest {
        operation: Operation,
        token: String,
        reason: &'static str,
    },
}

impl LendingError {
    pub fn configuration(
        operation: Operation,
        token: impl Into<String>,
        reason: &'static str,
    ) -> Self {
        LendingError::Configuration {
            operation,
            token: token.into(),
            reason,
        }
    }

    pub fn insufficient_funds(
        operation: Operation,
        token: impl Into<String>,
        reason: &'static str,
    ) -> Self {
        LendingError::InsufficientFunds {
            operation,
            token: token.into(),
            reason,
        }
    }

    pub fn solvency(operation: Operation, token: impl Into<String>, reason: &'static str) -> Self {
        LendingError::SolvencyViolation {
            operation,
            token: token.into(),
            reason,
        }
    }

    pub fn invalid(operation: Operation, token: impl Into<String>, reason: &'static str) -> Self {
        LendingError::InvalidRequest {
            operation,
            token: token.into(),
            reason,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LendingError::Configuration { .. } => ErrorKind::Configuration,
            LendingError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LendingError::SolvencyViolation { .. } => ErrorKind::SolvencyViolation,
            LendingError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            LendingError::Configuration { operation, .. }
            | LendingError::InsufficientFunds { operation, .. }
            | LendingError::SolvencyViolation { operation, .. }
            | LendingError::InvalidRequest { operation, .. } => *operation,
        }
    }

    pub fn token(&self) -> &str {
        match self {
            LendingError::Configuration { token, .. }
            | LendingError::InsufficientFunds { token, .. }
            | LendingError::SolvencyViolation { token, .. }
            | LendingError::InvalidRequest { token, .. } => token,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            LendingError::Configuration { reason, .. }
            | LendingError::InsufficientFunds { reason, .. }
            | LendingError::SolvencyViolation { reason, .. }
            | LendingError::InvalidRequest { reason, .. } => reason,
        }
    }

    /// Re-attributes a collaborator failure (e.g. a wallet debit) to the operation that
    /// triggered it.
    pub fn with_operation(mut self, new_operation: Operation) -> Self {
        match &mut self {
            LendingError::Configuration { operation, .. }
            | LendingError::InsufficientFunds { operation, .. }
            | LendingError::SolvencyViolation { operation, .. }
            | LendingError::InvalidRequest { operation, .. } => *operation = new_operation,
        }
        self
    }
}
