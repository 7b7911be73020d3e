use tracing::{debug, warn};

use crate::client::{CreditBalance, JobClient};

/// Client-side view of the account's credit balance. The cached value
/// is optimistically decremented the moment a submission is accepted,
/// then unconditionally overwritten by the next authoritative fetch.
/// The optimistic step is tracked as an explicit pending debit so an
/// authoritative read always supersedes it regardless of arrival
/// order.
#[derive(Debug, Default)]
pub struct CreditLedger {
    balance: Option<CreditBalance>,
    pending_debit: Option<u32>,
    stale_warning: bool,
}

impl CreditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self) -> Option<&CreditBalance> {
        self.balance.as_ref()
    }

    /// True while an optimistic debit has not yet been confirmed by an
    /// authoritative read.
    pub fn has_pending_debit(&self) -> bool {
        self.pending_debit.is_some()
    }

    /// Set after a failed refresh: the displayed balance is the
    /// last-known value, not a fresh server read.
    pub fn stale_warning(&self) -> bool {
        self.stale_warning
    }

    pub fn dismiss_stale_warning(&mut self) {
        self.stale_warning = false;
    }

    /// Sufficiency gate consulted before a submission is allowed.
    /// With no balance loaded yet the gate stays open; the server
    /// still enforces the real limit.
    pub fn can_afford(&self, cost: u32) -> bool {
        self.balance
            .as_ref()
            .is_none_or(|b| b.total_credits >= cost)
    }

    /// Best-effort UI responsiveness: decrement the cached total and
    /// purchased pools, floored at zero. Subscription and promotional
    /// pools are only ever adjusted by an authoritative read.
    pub fn apply_optimistic_debit(&mut self, cost: u32) {
        if cost == 0 {
            return;
        }
        let Some(balance) = self.balance.as_mut() else {
            return;
        };
        balance.total_credits = balance.total_credits.saturating_sub(cost);
        balance.purchased_credits = balance.purchased_credits.saturating_sub(cost);
        self.pending_debit = Some(self.pending_debit.unwrap_or(0).saturating_add(cost));
        debug!(cost, total = balance.total_credits, "applied optimistic credit debit");
    }

    /// Last-authoritative-write-wins: the server value replaces the
    /// cache outright and clears any pending debit. No merge logic.
    pub fn apply_authoritative(&mut self, balance: CreditBalance) {
        self.balance = Some(balance);
        self.pending_debit = None;
        self.stale_warning = false;
    }

    /// Fetch the authoritative balance and reconcile. A fetch error is
    /// non-fatal: the last-known balance stays displayed with a
    /// dismissible warning.
    pub async fn refresh(&mut self, client: &dyn JobClient) {
        match client.fetch_balance().await {
            Ok(balance) => self.apply_authoritative(balance),
            Err(err) => {
                warn!("balance refresh failed: {err:#}");
                self.stale_warning = true;
            }
        }
    }

    /// The debit-then-reconcile sequence run after a successful
    /// submission with a known credit cost.
    pub async fn debit_and_reconcile(&mut self, cost: u32, client: &dyn JobClient) {
        self.apply_optimistic_debit(cost);
        self.refresh(client).await;
    }
}
