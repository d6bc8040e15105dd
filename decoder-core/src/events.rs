//! Event delivery to any number of subscribers

use alloc::boxed::Box;
use alloc::vec::Vec;
use crate::types::DecoderEvent;

/// Anything decoding output can be pushed into
pub trait EventSink {
    fn emit(&mut self, event: DecoderEvent);
}

impl EventSink for Vec<DecoderEvent> {
    fn emit(&mut self, event: DecoderEvent) {
        self.push(event);
    }
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct ListenerId(u32);

type Listener = Box<dyn FnMut(&DecoderEvent) + Send>;

/// Listener list; every subscriber sees every event in emission order
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u32,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&DecoderEvent) + Send + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; returns false if it was not registered
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl EventSink for EventBus {
    fn emit(&mut self, event: DecoderEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}
