//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::types::AccountId;

/// Gas charged for calls that never reach pricing (unrecognized selectors, decode failures).
pub const DEFAULT_GAS_COST: u64 = 10_000;

/// Dynamic properties of the token service engine.
///
/// These mirror network-level feature flags: they gate whole selector families rather than
/// individual calls, and flipping one changes which selectors resolve at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineProperties {
    /// Whether the allowance/approval selector family is enabled.
    pub allowances_enabled: bool,
    /// Whether token creation through the system contract is enabled.
    pub create_enabled: bool,
    /// Gas charged when a call fails before pricing.
    pub default_gas_cost: u64,
    /// Whether call results are exported into records.
    pub export_record_results: bool,
    /// The account funding node rewards, credited by token create fees.
    pub funding_account: AccountId,
}

impl Default for EngineProperties {
    fn default() -> Self {
        Self {
            allowances_enabled: true,
            create_enabled: true,
            default_gas_cost: DEFAULT_GAS_COST,
            export_record_results: true,
            funding_account: AccountId(98),
        }
    }
}
