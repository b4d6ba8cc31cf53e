//! Solidity ABI interface scaffolding for the Safe guard hook.
//!
//! The Safe calls the guard through `ITransactionGuard`. Balances are read through `IERC20`.

use stylus_sdk::alloy_sol_types::sol;

sol! {
    interface IERC165 {
        function supportsInterface(bytes4 interfaceId) external view returns (bool);
    }

    interface ITransactionGuard is IERC165 {
        function checkTransaction(
            address to,
            uint256 value,
            bytes data,
            uint8 operation,
            uint256 safeTxGas,
            uint256 baseGas,
            uint256 gasPrice,
            address gasToken,
            address refundReceiver,
            bytes signatures,
            address msgSender
        ) external;

        function checkAfterExecution(bytes32 hash, bool success) external;
    }

    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
    }
}
