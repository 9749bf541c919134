//! Resource accounting for one scene session.

/// Counts the scene objects a session has created and disposed.
///
/// Every allocation a rebuild or unmount is obliged to release goes through
/// this ledger, so forgetting a disposal shows up as a nonzero [`live`]
/// count instead of a silent leak. Lifecycle tests assert against it.
///
/// [`live`]: ResourceLedger::live
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLedger {
    created: usize,
    disposed: usize,
}

impl ResourceLedger {
    pub fn record_created(&mut self, count: usize) {
        self.created += count;
    }

    pub fn record_disposed(&mut self, count: usize) {
        self.disposed += count;
    }

    /// Objects created but not yet disposed.
    pub fn live(&self) -> usize {
        self.created.saturating_sub(self.disposed)
    }

    pub fn created(&self) -> usize {
        self.created
    }

    pub fn disposed(&self) -> usize {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_balances_creations_against_disposals() {
        let mut ledger = ResourceLedger::default();
        ledger.record_created(6);
        assert_eq!(ledger.live(), 6);

        ledger.record_disposed(6);
        assert_eq!(ledger.live(), 0);
        assert_eq!(ledger.created(), 6);
        assert_eq!(ledger.disposed(), 6);
    }
}
