use stylus_sdk::alloy_primitives::{Address, FixedBytes, U256};

use smaug_guard_types::BudgetScope;

/// Errors during balance acquisition.
pub use smaug_guard_types::BalanceError;

/// A budget scope that an outflow would overrun.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitBreach {
    pub scope: BudgetScope,
    /// Projected amount for the scope, including the outflow being checked.
    pub attempted: U256,
    pub limit: U256,
}

/// Errors raised by the guard state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    NotMySafe { sender: Address },
    Unauthorized { account: Address },
    DelegatecallNotAllowed,
    UnsupportedOperation(u8),
    GuardReentered,
    BudgetExceeded { asset: Address, breach: LimitBreach },
    UpdateAlreadyScheduled,
    AlreadyProtected(Address),
    UnknownAsset(Address),
    AlreadyApproved(FixedBytes<32>),
    NotApproved(FixedBytes<32>),
    AlreadyInitialized,
    InvalidConfiguration,
    BalanceUnavailable { asset: Address, reason: BalanceError },
}

impl GuardError {
    /// Budget scope behind the failure, if it is a budget failure.
    pub fn budget_scope(&self) -> Option<BudgetScope> {
        match self {
            GuardError::BudgetExceeded { breach, .. } => Some(breach.scope),
            _ => None,
        }
    }
}
