//! Host runtime for the decoder core: async task wiring, file-backed custom
//! mappings and keying script replay

pub use decoder_core::*;

pub use crate::clock::HostClock;
pub use crate::json_store::JsonFileStore;
pub use crate::script::{parse_script, ScriptError};
pub use crate::tasks::*;

pub mod clock;
pub mod json_store;
pub mod script;

/// Decoder task, its command set and the handle returned by [`spawn_decoder`]
pub mod tasks {
    use super::*;
    use tokio::sync::{broadcast, mpsc, oneshot};
    use tokio::task::JoinHandle;
    use tracing::{debug, info, warn};

    /// Requests accepted by the decoder task
    #[derive(Debug)]
    pub enum Command {
        Key(KeyEvent),
        SetSpeed {
            wpm: u32,
            reply: oneshot::Sender<Result<(), DecoderError>>,
        },
        SetKey(KeyCode),
        SetCustomLookup(bool),
        SetRepresentUnknown(bool),
        AddMapping {
            character: char,
            sequence: String,
            reply: oneshot::Sender<Result<(), MappingError>>,
        },
        RemoveMapping {
            sequence: String,
            reply: oneshot::Sender<Result<(), MappingError>>,
        },
        Clear,
    }

    /// Handle to a running decoder task
    pub struct DecoderHandle<S: MappingStore> {
        pub commands: mpsc::Sender<Command>,
        pub events: broadcast::Sender<DecoderEvent>,
        pub clock: HostClock,
        pub task: JoinHandle<DecoderController<S>>,
    }

    impl<S: MappingStore> DecoderHandle<S> {
        /// New receiver for decoder output
        pub fn subscribe(&self) -> broadcast::Receiver<DecoderEvent> {
            self.events.subscribe()
        }

        /// Send a key edge stamped with the current host time
        pub async fn key(&self, action: KeyAction, key: KeyCode) -> bool {
            let event = KeyEvent { key, action, at: self.clock.now() };
            self.commands.send(Command::Key(event)).await.is_ok()
        }

        pub async fn set_speed(&self, wpm: u32) -> Option<Result<(), DecoderError>> {
            let (reply, rx) = oneshot::channel();
            self.commands.send(Command::SetSpeed { wpm, reply }).await.ok()?;
            rx.await.ok()
        }

        pub async fn add_mapping(&self, character: char, sequence: &str) -> Option<Result<(), MappingError>> {
            let (reply, rx) = oneshot::channel();
            let sequence = sequence.to_string();
            self.commands.send(Command::AddMapping { character, sequence, reply }).await.ok()?;
            rx.await.ok()
        }

        pub async fn remove_mapping(&self, sequence: &str) -> Option<Result<(), MappingError>> {
            let (reply, rx) = oneshot::channel();
            let sequence = sequence.to_string();
            self.commands.send(Command::RemoveMapping { sequence, reply }).await.ok()?;
            rx.await.ok()
        }

        /// Close the command channel and wait for the task to hand back its controller
        pub async fn shutdown(self) -> Option<DecoderController<S>> {
            drop(self.commands);
            self.task.await.ok()
        }
    }

    /// Build a controller, forward its events to a broadcast channel and
    /// spawn [`decoder_task`] on the current tokio runtime
    pub fn spawn_decoder<S>(config: DecoderConfig, store: S, capacity: usize) -> Result<DecoderHandle<S>, DecoderError>
    where
        S: MappingStore + Send + 'static,
    {
        let mut controller = DecoderController::new(config, store)?;

        let (events, _) = broadcast::channel(capacity.max(1));
        let forward = events.clone();
        controller.subscribe(move |event| {
            // No receivers is not an error; output is simply unobserved
            let _ = forward.send(event.clone());
        });

        let (commands, rx) = mpsc::channel(capacity.max(1));
        let clock = HostClock::new();

        info!(wpm = config.wpm, key = config.key.0, "decoder task starting");
        let task = tokio::spawn(decoder_task(controller, rx, clock));

        Ok(DecoderHandle { commands, events, clock, task })
    }

    /// Async task for running the decoder.
    ///
    /// Sleeps until the controller's next deadline or the next command,
    /// whichever comes first. Returns the controller when the command
    /// channel closes.
    pub async fn decoder_task<S: MappingStore>(
        mut controller: DecoderController<S>,
        mut commands: mpsc::Receiver<Command>,
        clock: HostClock,
    ) -> DecoderController<S> {
        loop {
            let deadline = controller.next_deadline().map(|d| clock.to_tokio(d));

            // Queued edges carry their own timestamps; they must reach the
            // controller before an overdue deadline is polled at `now`
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(command) => apply(&mut controller, command, &clock),
                    None => break,
                },
                _ = sleep_until(deadline) => {
                    controller.poll(clock.now());
                }
            }
        }

        debug!("decoder task stopped");
        controller
    }

    async fn sleep_until(deadline: Option<tokio::time::Instant>) {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }

    fn apply<S: MappingStore>(controller: &mut DecoderController<S>, command: Command, clock: &HostClock) {
        match command {
            Command::Key(event) => controller.handle_event(event),
            setting => {
                // Settings apply after every boundary already due
                controller.poll(clock.now());
                apply_setting(controller, setting);
            }
        }
    }

    fn apply_setting<S: MappingStore>(controller: &mut DecoderController<S>, command: Command) {
        match command {
            Command::Key(event) => controller.handle_event(event),
            Command::SetSpeed { wpm, reply } => {
                let result = controller.set_speed(wpm);
                if let Err(e) = &result {
                    warn!(wpm, error = %e, "speed change rejected");
                }
                let _ = reply.send(result);
            }
            Command::SetKey(key) => controller.set_key(key),
            Command::SetCustomLookup(enabled) => controller.set_custom_lookup_enabled(enabled),
            Command::SetRepresentUnknown(enabled) => controller.set_represent_unknown_enabled(enabled),
            Command::AddMapping { character, sequence, reply } => {
                let result = controller.add_custom_mapping(character, &sequence);
                match &result {
                    Ok(()) => info!(%sequence, %character, "custom mapping added"),
                    Err(e) => warn!(%sequence, %character, error = %e, "custom mapping rejected"),
                }
                let _ = reply.send(result);
            }
            Command::RemoveMapping { sequence, reply } => {
                let result = controller.remove_custom_mapping(&sequence);
                if let Err(e) = &result {
                    warn!(%sequence, error = %e, "custom mapping removal failed");
                }
                let _ = reply.send(result);
            }
            Command::Clear => controller.clear(),
        }
    }
}
