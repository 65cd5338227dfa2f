//! Balance and allowance sufficiency checks before value-moving calls.
//!
//! The check is advisory: a concurrent external transfer can invalidate
//! it between the read and the subsequent send. The ledger's own
//! atomic acceptance/rejection is the authoritative guard; this check
//! only avoids submitting a transaction that is already doomed.

use alloy::primitives::{Address, U256};

use bondfi_evm::Ledger;

use crate::error::OrchestrationError;
use crate::onchain::token::TokenClient;

/// Fail unless `owner` holds at least `required` of the token AND has
/// approved `spender` for at least `required`.
///
/// Balance is checked first: an insufficient balance is reported as
/// such regardless of the allowance, and the allowance read is skipped
/// entirely. Comparison is integer ordering on raw base units.
pub async fn check_sufficiency<L: Ledger>(
    token: &TokenClient<L>,
    owner: Address,
    spender: Address,
    required: U256,
) -> Result<(), OrchestrationError> {
    let balance = token.balance_of(owner).await?;
    if balance < required {
        return Err(OrchestrationError::InsufficientBalance { balance, required });
    }

    let allowance = token.allowance(owner, spender).await?;
    if allowance < required {
        return Err(OrchestrationError::InsufficientAllowance {
            allowance,
            required,
        });
    }

    Ok(())
}
