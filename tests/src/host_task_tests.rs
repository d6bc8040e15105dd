//! Async decoder task tests on paused tokio time

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use tokio::sync::{broadcast, mpsc};
    use tokio::time::sleep;

    use decoder_host::{
        decoder_task, spawn_decoder, Command, DecoderConfig, DecoderController, DecoderError, DecoderEvent,
        DecoderHandle, HostClock, JsonFileStore, KeyAction, KeyCode, KeyEvent, MappingError, MappingStore,
        MemoryStore, Symbol,
    };

    fn at(ms: u64) -> decoder_host::Instant {
        decoder_host::Instant::from_millis(ms)
    }

    /// Controller holding one dot released at 100ms; its letter is due at 600ms
    fn controller_with_dot() -> DecoderController<MemoryStore> {
        let mut controller = DecoderController::new(DecoderConfig::default(), MemoryStore::new()).unwrap();
        controller.handle_event(KeyEvent::press(KeyCode::SPACE, at(0)));
        controller.handle_event(KeyEvent::release(KeyCode::SPACE, at(100)));
        controller
    }

    /// Collect events until a word completes
    async fn next_word(events: &mut broadcast::Receiver<DecoderEvent>) -> (Vec<DecoderEvent>, String) {
        let mut seen = Vec::new();
        loop {
            match events.recv().await {
                Ok(DecoderEvent::WordCompleted(word)) => return (seen, word),
                Ok(event) => seen.push(event),
                Err(e) => panic!("event stream ended: {:?}", e),
            }
        }
    }

    /// Key a `.`/`-` letter at 10 WPM through the handle
    async fn key_letter<S: MappingStore>(handle: &DecoderHandle<S>, sequence: &str) {
        for (i, c) in sequence.chars().enumerate() {
            if i > 0 {
                sleep(Duration::from_millis(150)).await;
            }
            let hold = if c == '.' { 100 } else { 400 };
            assert!(handle.key(KeyAction::Press, KeyCode::SPACE).await);
            sleep(Duration::from_millis(hold)).await;
            assert!(handle.key(KeyAction::Release, KeyCode::SPACE).await);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_decodes_from_silence() {
        let handle = spawn_decoder(DecoderConfig::default(), MemoryStore::new(), 32).unwrap();
        let mut events = handle.subscribe();

        key_letter(&handle, ".-").await;
        let released = handle.clock.now();

        let (seen, word) = next_word(&mut events).await;
        assert_eq!(word, "A");
        assert_eq!(
            seen,
            vec![
                DecoderEvent::PressClassified(Symbol::Dot),
                DecoderEvent::PressClassified(Symbol::Dash),
                DecoderEvent::CharacterDecoded { character: 'A', sequence: ".-".into() },
                DecoderEvent::LetterBoundary,
            ]
        );

        // Word closes exactly one word separator after the last release
        assert_eq!(handle.clock.now().saturating_duration_since(released).as_millis(), 1_500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_two_letters_one_word() {
        let handle = spawn_decoder(DecoderConfig::default(), MemoryStore::new(), 32).unwrap();
        let mut events = handle.subscribe();

        key_letter(&handle, "-").await;
        sleep(Duration::from_millis(700)).await;
        key_letter(&handle, "..").await;

        let (seen, word) = next_word(&mut events).await;
        assert_eq!(word, "TI");
        assert_eq!(seen.iter().filter(|e| **e == DecoderEvent::LetterBoundary).count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_speed_change() {
        let handle = spawn_decoder(DecoderConfig::default(), MemoryStore::new(), 32).unwrap();
        let mut events = handle.subscribe();

        assert_eq!(handle.set_speed(0).await, Some(Err(DecoderError::InvalidSpeed)));
        assert_eq!(handle.set_speed(20).await, Some(Ok(())));

        // 150ms is a dash at 20 WPM
        assert!(handle.key(KeyAction::Press, KeyCode::SPACE).await);
        sleep(Duration::from_millis(150)).await;
        assert!(handle.key(KeyAction::Release, KeyCode::SPACE).await);

        let (_, word) = next_word(&mut events).await;
        assert_eq!(word, "T");

        let controller = handle.shutdown().await.unwrap();
        assert_eq!(controller.wpm(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_custom_mappings() {
        let handle = spawn_decoder(DecoderConfig::default(), MemoryStore::new(), 32).unwrap();
        let mut events = handle.subscribe();

        assert_eq!(handle.add_mapping('[', "-.--.-.").await, Some(Ok(())));
        assert_eq!(handle.add_mapping('A', "-.--.-.").await, Some(Err(MappingError::DuplicateSequence)));
        assert_eq!(handle.add_mapping('[', "..--..").await, Some(Err(MappingError::DuplicateCharacter)));

        key_letter(&handle, "-.--.-.").await;
        let (_, word) = next_word(&mut events).await;
        assert_eq!(word, "[");

        assert_eq!(handle.remove_mapping("-.--.-.").await, Some(Ok(())));
        assert_eq!(handle.remove_mapping("-.--.-.").await, Some(Ok(())));

        let controller = handle.shutdown().await.unwrap();
        assert!(controller.custom_mappings().is_empty());
        assert_eq!(controller.store().save_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_policy_commands() {
        let handle = spawn_decoder(DecoderConfig::default(), MemoryStore::new(), 32).unwrap();
        let mut events = handle.subscribe();

        handle.commands.send(Command::SetRepresentUnknown(false)).await.unwrap();
        key_letter(&handle, "......").await;
        sleep(Duration::from_millis(5_000)).await;

        handle.commands.send(Command::SetRepresentUnknown(true)).await.unwrap();
        key_letter(&handle, "......").await;

        let (seen, word) = next_word(&mut events).await;
        assert_eq!(word, decoder_host::PLACEHOLDER.to_string());
        // The dropped letter still closed
        assert_eq!(seen.iter().filter(|e| **e == DecoderEvent::LetterBoundary).count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_clear_drops_pending_word() {
        let handle = spawn_decoder(DecoderConfig::default(), MemoryStore::new(), 32).unwrap();
        let mut events = handle.subscribe();

        key_letter(&handle, "...").await;
        handle.commands.send(Command::Clear).await.unwrap();
        sleep(Duration::from_millis(5_000)).await;

        key_letter(&handle, "---").await;
        let (_, word) = next_word(&mut events).await;
        assert_eq!(word, "O");
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_persists_to_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mappings.json");

        let handle = spawn_decoder(DecoderConfig::default(), JsonFileStore::new(&path), 8).unwrap();
        assert_eq!(handle.add_mapping('+', ".-.-.").await, Some(Ok(())));
        handle.shutdown().await.unwrap();

        let saved: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved, serde_json::json!({ ".-.-.": "+" }));

        // A fresh task picks the mapping back up
        let mut store = JsonFileStore::new(&path);
        assert_eq!(store.load().unwrap().get(".-.-."), Some(&'+'));
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_stops_when_commands_close() {
        let handle = spawn_decoder(DecoderConfig::default(), MemoryStore::new(), 8).unwrap();

        key_letter(&handle, ".").await;
        let controller = handle.shutdown().await.unwrap();

        // Pending boundaries are not flushed on shutdown
        assert_eq!(controller.current_sequence(), ".");
        assert_eq!(controller.current_word(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_corrupt_file_fails_spawn() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mappings.json");
        std::fs::write(&path, r#"{ ".-": "X" }"#).unwrap();

        let result = spawn_decoder(DecoderConfig::default(), JsonFileStore::new(&path), 8);
        assert!(matches!(result, Err(DecoderError::Store(decoder_host::StoreError::Corrupt))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_edges_precede_overdue_deadline() {
        // Both branches are ready on every run; the outcome must not depend on the pick
        for _ in 0..32 {
            let clock = HostClock::new();
            let controller = controller_with_dot();
            tokio::time::advance(Duration::from_millis(700)).await;

            // Edges stamped before the 600ms letter deadline, delivered late
            let (tx, rx) = mpsc::channel(8);
            tx.send(Command::Key(KeyEvent::press(KeyCode::SPACE, at(450)))).await.unwrap();
            tx.send(Command::Key(KeyEvent::release(KeyCode::SPACE, at(550)))).await.unwrap();
            drop(tx);

            let controller = decoder_task(controller, rx, clock).await;
            assert_eq!(controller.current_sequence(), "..");
            assert_eq!(controller.current_word(), "");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_settings_follow_overdue_boundaries() {
        let clock = HostClock::new();
        let controller = controller_with_dot();
        tokio::time::advance(Duration::from_millis(700)).await;

        let (tx, rx) = mpsc::channel(8);
        tx.send(Command::SetRepresentUnknown(false)).await.unwrap();
        drop(tx);

        // The letter was due at 600ms, before the setting arrived
        let controller = decoder_task(controller, rx, clock).await;
        assert_eq!(controller.current_word(), "E");
        assert_eq!(controller.current_sequence(), "");
        assert!(!controller.decoder().represent_unknown_enabled());
    }
}
