//! Quota admission policy.
//!
//! The gate compares an account's remaining page allowance against a
//! prospective batch total and admits or denies ingestion. Admission is
//! advisory: nothing is reserved or decremented here — the backend decrements
//! after successful processing and stays the final authority, so a race
//! between two concurrent admission checks on the same account is tolerated.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// Read-only view of an account's allowance for the current billing period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    /// Plan tier identifier, e.g. `"free"` or `"pro"`.
    pub tier: String,
    /// Pages the account may process in the current period.
    pub allowance: u64,
    /// Pages already consumed in the current period.
    pub consumed: u64,
}

impl QuotaSnapshot {
    /// Pages still available, floored at zero.
    pub fn remaining(&self) -> u64 {
        self.allowance.saturating_sub(self.consumed)
    }
}

/// Why admission was denied. The two reasons are distinct so the caller can
/// render a precise upgrade prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenyReason {
    /// No allowance left at all this period.
    AllowanceExhausted,
    /// There is allowance left, but this batch is larger than it.
    ExceedsRemaining { requested: u64, remaining: u64 },
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenyReason::AllowanceExhausted => {
                write!(f, "no page allowance left this period")
            }
            DenyReason::ExceedsRemaining {
                requested,
                remaining,
            } => write!(
                f,
                "batch exceeds remaining allowance ({requested} pages requested, {remaining} remaining)"
            ),
        }
    }
}

/// Admission decision for a prospective batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Deny(DenyReason),
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allow)
    }
}

/// Decide whether a batch of `pages_requested` pages may be ingested.
pub fn admit(snapshot: &QuotaSnapshot, pages_requested: u64) -> Admission {
    let remaining = snapshot.remaining();
    if remaining == 0 {
        return Admission::Deny(DenyReason::AllowanceExhausted);
    }
    if pages_requested > remaining {
        return Admission::Deny(DenyReason::ExceedsRemaining {
            requested: pages_requested,
            remaining,
        });
    }
    Admission::Allow
}

/// External supplier of quota snapshots, keyed by account identifier.
///
/// The lookup itself (billing storage, API, cache) is an external
/// collaborator; the gate only consumes the snapshot.
#[async_trait]
pub trait QuotaSource: Send + Sync {
    async fn snapshot(&self, account_id: &str) -> Result<QuotaSnapshot, IngestError>;
}
