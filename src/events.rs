use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{LoanId, RecycleMode};

/// all events that can be emitted while recycling a mortgage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecycleEvent {
    // lump-sum events
    ExtraPaymentApplied {
        loan_id: LoanId,
        amount: Money,
        mode: RecycleMode,
        new_amount: Money,
        new_term_months: u32,
    },
    LoanRepaid {
        loan_id: LoanId,
        final_amount: Money,
    },
    SurplusReturned {
        amount: Money,
    },

    // monthly payment events
    FirstPaymentChanged {
        loan_id: LoanId,
        old_payment: Money,
        new_payment: Money,
        old_term_months: u32,
        new_term_months: u32,
    },
    LoanSaturated {
        loan_id: LoanId,
        reason: String,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<RecycleEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: RecycleEvent) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = RecycleEvent>) {
        self.events.extend(events);
    }

    pub fn take_events(&mut self) -> Vec<RecycleEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_event_store() {
        let mut store = EventStore::new();
        let loan_id = Uuid::new_v4();

        store.emit(RecycleEvent::LoanRepaid {
            loan_id,
            final_amount: Money::from_major(100),
        });
        store.emit(RecycleEvent::SurplusReturned {
            amount: Money::from_major(5),
        });
        store.extend(vec![RecycleEvent::LoanSaturated {
            loan_id,
            reason: "term cap".to_string(),
        }]);

        let taken = store.take_events();
        assert_eq!(taken.len(), 3);
        assert!(matches!(taken[2], RecycleEvent::LoanSaturated { .. }));
        assert!(store.take_events().is_empty());
    }
}
