use std::sync::Arc;

use parking_lot::Mutex;

use crate::account::AccountId;
use crate::error::LedgerResult;
use crate::events::{EventSink, LedgerEvent};
use crate::ledger::IssuanceLedger;
use crate::operation::Operation;
use crate::snapshot::LedgerSnapshot;

/// Cloneable handle that serializes every operation behind one lock.
///
/// Limit checks and the mutations they guard run under the same critical
/// section, so racing callers can never jointly overrun a per-account limit
/// or the supply cap.
#[derive(Clone, Debug)]
pub struct SharedLedger {
    inner: Arc<Mutex<IssuanceLedger>>,
}

impl SharedLedger {
    pub fn new(ledger: IssuanceLedger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Apply `operation` and return the events it produced.
    pub fn execute(&self, caller: &AccountId, operation: &Operation) -> LedgerResult<Vec<LedgerEvent>> {
        let mut events = Vec::new();
        self.inner.lock().apply(caller, operation, &mut events)?;
        Ok(events)
    }

    pub fn execute_into(
        &self,
        caller: &AccountId,
        operation: &Operation,
        sink: &mut dyn EventSink,
    ) -> LedgerResult<()> {
        self.inner.lock().apply(caller, operation, sink)
    }

    /// Run a read-only closure against a consistent view of the ledger.
    pub fn read<R>(&self, f: impl FnOnce(&IssuanceLedger) -> R) -> R {
        f(&self.inner.lock())
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.inner.lock().snapshot()
    }
}
