//! Caller authorisation for privileged guard operations.

use stylus_sdk::alloy_primitives::Address;

use crate::{errors::GuardError, store::GuardStore};

/// Principals the guard recognises.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Configures budgets, TTL and pre-approvals.
    Admin,
    /// The Safe whose transactions are guarded.
    Safe,
}

pub fn authorize<S: GuardStore + ?Sized>(
    store: &S,
    caller: Address,
    role: Role,
) -> Result<(), GuardError> {
    match role {
        Role::Admin if caller != store.admin() => Err(GuardError::Unauthorized { account: caller }),
        Role::Safe if caller != store.safe() => Err(GuardError::NotMySafe { sender: caller }),
        _ => Ok(()),
    }
}
