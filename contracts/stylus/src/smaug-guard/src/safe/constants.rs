//! Safe constants and the guard's static capability set.

use stylus_sdk::alloy_primitives::FixedBytes;

/// ERC-165 `supportsInterface(bytes4)`.
pub const ERC165_INTERFACE_ID: FixedBytes<4> = FixedBytes([0x01, 0xff, 0xc9, 0xa7]);

/// Safe `ITransactionGuard` (`checkTransaction` ^ `checkAfterExecution`).
pub const GUARD_INTERFACE_ID: FixedBytes<4> = FixedBytes([0xe6, 0xd7, 0xa8, 0x3a]);

/// Everything `supportsInterface` answers `true` for.
pub const SUPPORTED_INTERFACES: [FixedBytes<4>; 2] = [ERC165_INTERFACE_ID, GUARD_INTERFACE_ID];

pub fn supports_interface(interface_id: FixedBytes<4>) -> bool {
    SUPPORTED_INTERFACES.contains(&interface_id)
}

/// Safe `Enum.Operation`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Operation {
    Call = 0,
    DelegateCall = 1,
}

impl TryFrom<u8> for Operation {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Operation::Call),
            1 => Ok(Operation::DelegateCall),
            other => Err(other),
        }
    }
}
