//! Decoder controller: wires the press FSM, classifier, sequence decoder and
//! pause scheduler together behind a single writer

use alloc::string::String;
use crate::decoder::SequenceDecoder;
use crate::events::{EventBus, EventSink, ListenerId};
use crate::fsm::{KeyPressFsm, PressOutcome};
use crate::hal::{CustomTable, Duration, Instant, MappingStore};
use crate::scheduler::PauseScheduler;
use crate::timing::{TimingClassifier, TimingProfile};
use crate::types::{
    Boundary, DecoderConfig, DecoderError, DecoderEvent, KeyCode, KeyEvent, MappingError, PressClass,
    PressState,
};

/// Complete decoding pipeline for one designated key.
///
/// Input edges go through [`handle_event`](Self::handle_event); silence is
/// turned into boundaries by [`poll`](Self::poll), which the host calls at
/// [`next_deadline`](Self::next_deadline) or whenever convenient.
pub struct DecoderController<S: MappingStore> {
    timing: TimingClassifier,
    fsm: KeyPressFsm,
    decoder: SequenceDecoder<S>,
    scheduler: PauseScheduler,
    events: EventBus,
}

impl<S: MappingStore> DecoderController<S> {
    /// Build the pipeline and load custom mappings from `store`
    pub fn new(config: DecoderConfig, store: S) -> Result<Self, DecoderError> {
        let timing = TimingClassifier::new(config.wpm)?;
        let decoder = SequenceDecoder::with_config(store, &config)?;

        Ok(Self {
            timing,
            fsm: KeyPressFsm::from_config(&config),
            decoder,
            scheduler: PauseScheduler::new(),
            events: EventBus::new(),
        })
    }

    /// Register an output listener
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&DecoderEvent) + Send + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Feed one key edge. Deadlines due at or before the edge fire first.
    pub fn handle_event(&mut self, event: KeyEvent) {
        self.poll(event.at);

        match self.fsm.handle(&event, &self.timing) {
            PressOutcome::Ignored => {}
            // Key down breaks the silence
            PressOutcome::Started => self.scheduler.suspend(),
            // A bounce was never an action; the previous silence carries on
            PressOutcome::Debounced => self.scheduler.resume(),
            PressOutcome::Classified { class, duration_ms, released_at } => {
                self.on_classified(class, duration_ms, released_at);
            }
        }
    }

    fn on_classified(&mut self, class: PressClass, duration_ms: u64, at: Instant) {
        match class.symbol() {
            Some(symbol) => {
                self.events.emit(DecoderEvent::PressClassified(symbol));
                self.decoder.add_element(symbol);
            }
            None => self.events.emit(DecoderEvent::InvalidPress(duration_ms)),
        }
        self.scheduler.arm(at, &self.timing.thresholds());
    }

    /// Advance time: settle the FSM and fire every boundary due by `now`
    pub fn poll(&mut self, now: Instant) {
        self.fsm.poll(now);

        while let Some(boundary) = self.scheduler.poll(now) {
            match boundary {
                Boundary::Letter => self.decoder.end_letter(&mut self.events),
                Boundary::Word => self.decoder.end_word(&mut self.events),
            }
        }
    }

    /// Earliest instant at which [`poll`](Self::poll) has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.fsm.next_deadline(), self.scheduler.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Change speed; takes effect on the next classification
    pub fn set_speed(&mut self, wpm: u32) -> Result<(), DecoderError> {
        self.timing.set_speed(wpm)
    }

    pub fn wpm(&self) -> u32 {
        self.timing.wpm()
    }

    pub fn thresholds(&self) -> TimingProfile {
        self.timing.thresholds()
    }

    pub fn timing(&self) -> &TimingClassifier {
        &self.timing
    }

    /// Rebind the designated key
    pub fn set_key(&mut self, key: KeyCode) {
        self.fsm.set_key(key);
        if self.scheduler.is_suspended() {
            self.scheduler.resume();
        }
    }

    pub fn key(&self) -> KeyCode {
        self.fsm.key()
    }

    pub fn press_state(&self) -> PressState {
        self.fsm.current_state()
    }

    pub fn last_press_duration(&self) -> Option<u64> {
        self.fsm.last_press_duration()
    }

    pub fn add_custom_mapping(&mut self, character: char, sequence: &str) -> Result<(), MappingError> {
        self.decoder.add_custom_mapping(character, sequence)
    }

    pub fn remove_custom_mapping(&mut self, sequence: &str) -> Result<(), MappingError> {
        self.decoder.remove_custom_mapping(sequence)
    }

    pub fn custom_mappings(&self) -> &CustomTable {
        self.decoder.custom_mappings()
    }

    pub fn set_custom_lookup_enabled(&mut self, enabled: bool) {
        self.decoder.set_custom_lookup_enabled(enabled);
    }

    pub fn set_represent_unknown_enabled(&mut self, enabled: bool) {
        self.decoder.set_represent_unknown_enabled(enabled);
    }

    pub fn current_sequence(&self) -> String {
        self.decoder.current_sequence()
    }

    pub fn current_word(&self) -> &str {
        self.decoder.current_word()
    }

    pub fn preview(&self) -> Option<char> {
        self.decoder.preview()
    }

    /// Drop buffered input and pending boundaries without emitting events
    pub fn clear(&mut self) {
        self.decoder.clear();
        self.scheduler.cancel();
        self.fsm.reset();
    }

    pub fn decoder(&self) -> &SequenceDecoder<S> {
        &self.decoder
    }

    pub fn store(&self) -> &S {
        self.decoder.store()
    }
}

/// Drain queued edges into `controller`, fire what is due at `now` and return
/// the instant the caller should wake: the next deadline, capped at `now + tick`.
pub fn service_queue<S: MappingStore, const N: usize>(
    controller: &mut DecoderController<S>,
    input: &mut heapless::spsc::Consumer<'_, KeyEvent, N>,
    now: Instant,
    tick: Duration,
) -> Instant {
    while let Some(event) = input.dequeue() {
        controller.handle_event(event);
    }
    controller.poll(now);

    match controller.next_deadline() {
        Some(deadline) => deadline.min(now + tick),
        None => now + tick,
    }
}

/// Async task driving a controller from an input queue.
///
/// Edges are drained from `input` as they arrive; between them the task sleeps
/// until the controller's next deadline, waking at least every `tick`.
#[cfg(feature = "embassy-time")]
pub async fn decoder_task<S: MappingStore, const N: usize>(
    controller: &mut DecoderController<S>,
    mut input: heapless::spsc::Consumer<'_, KeyEvent, N>,
    tick: Duration,
) {
    use embassy_time::Timer;

    loop {
        let wake = service_queue(controller, &mut input, Instant::now(), tick);

        #[cfg(feature = "defmt")]
        defmt::trace!("decoder sleeping until {}", wake.as_millis());

        Timer::at(wake).await;
    }
}
