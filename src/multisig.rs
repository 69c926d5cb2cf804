//! Copayer/signature limit tables for multisig wallets.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/* For compressed keys, m*73 + n*34 <= 496 */
const COPAYER_PAIR_LIMITS: [u8; 12] = [1, 2, 3, 4, 4, 4, 3, 3, 2, 2, 1, 1];

/// Smallest supported copayer count.
pub const MIN_COPAYERS: u8 = 1;
/// Largest copayer count that still fits the redeem script budget.
pub const MAX_COPAYERS: u8 = 12;

/// Maximum required signatures for a wallet of `total_copayers` keys.
///
/// # Panics
///
/// Panics if `total_copayers` is outside `1..=12`. Out-of-range counts are a
/// caller contract violation and must be prevented by input constraints.
pub fn max_allowed(total_copayers: u8) -> u8 {
    COPAYER_PAIR_LIMITS[usize::from(total_copayers) - 1]
}

/// The valid choices for required signatures given a copayer count.
pub fn signature_range(total_copayers: u8) -> RangeInclusive<u8> {
    1..=max_allowed(total_copayers)
}

/// Default required-signature count: a simple majority, capped by the table.
pub fn default_required(total_copayers: u8) -> u8 {
    (total_copayers / 2 + 1).min(max_allowed(total_copayers))
}

/// An m-of-n signing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigPolicy {
    pub total_copayers: u8,
    pub required_signatures: u8,
}

impl MultisigPolicy {
    /// Policy with the default required-signature count for `total_copayers`.
    pub fn with_default_required(total_copayers: u8) -> Self {
        Self {
            total_copayers,
            required_signatures: default_required(total_copayers),
        }
    }

    /// Check the policy against the signature-size budget.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_COPAYERS..=MAX_COPAYERS).contains(&self.total_copayers)
            || !signature_range(self.total_copayers).contains(&self.required_signatures)
        {
            return Err(ValidationError::InvalidPolicy {
                total: self.total_copayers,
                required: self.required_signatures,
            });
        }
        Ok(())
    }

    /// Whether more than one copayer holds keys.
    pub fn is_shared(&self) -> bool {
        self.total_copayers > 1
    }
}
