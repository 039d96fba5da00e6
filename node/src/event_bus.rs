//! Fan-out of committed governance events to subscribers.

use kycdao_governance::GovernanceEvent;

/// Synchronous fan-out event bus for governance events.
///
/// Listeners are invoked inline on the emitting task, after the engine
/// lock has been released; keep handlers fast.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&GovernanceEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&GovernanceEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &GovernanceEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kycdao_types::Address;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn member() -> Address {
        Address::from_low_u64(7)
    }

    #[test]
    fn emit_calls_all_listeners() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();

        let c1 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        }));

        let c2 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c2.fetch_add(10, Ordering::SeqCst);
        }));

        bus.emit(&GovernanceEvent::MemberRemoved { member: member() });

        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn emit_with_no_listeners_is_noop() {
        let bus = EventBus::default();
        assert_eq!(bus.listener_count(), 0);
        bus.emit(&GovernanceEvent::MemberRemoved { member: member() });
    }

    #[test]
    fn listener_sees_event_variant() {
        let added = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();

        let seen = Arc::clone(&added);
        bus.subscribe(Box::new(move |event| {
            if let GovernanceEvent::MemberAdded {
                base_voting_weight, ..
            } = event
            {
                seen.fetch_add(*base_voting_weight as usize, Ordering::SeqCst);
            }
        }));

        bus.emit(&GovernanceEvent::MemberAdded {
            member: member(),
            base_voting_weight: 3,
        });
        bus.emit(&GovernanceEvent::MemberRemoved { member: member() });

        assert_eq!(added.load(Ordering::SeqCst), 3);
    }
}
