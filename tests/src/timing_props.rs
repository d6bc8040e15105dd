//! Property tests for thresholds, press classification and the idle-period model

#[cfg(test)]
mod tests {
    use decoder_core::test_utils::keying_simulator::KeyingScript;
    use decoder_core::test_utils::output_capture::EventRecorder;
    use decoder_core::test_utils::replay::replay;
    use decoder_core::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn thresholds_ordered_for_any_speed(wpm in 1u32..=100_000) {
            let timing = TimingClassifier::new(wpm).unwrap();
            let p = timing.thresholds();

            prop_assert!(p.is_ordered(), "unordered profile at {} WPM: {:?}", wpm, p);
            prop_assert!((timing.unit_ms() - 1200.0 / wpm as f32).abs() < 1e-3);
        }

        #[test]
        fn set_speed_replaces_whole_profile(first in 1u32..500, second in 1u32..500) {
            let mut timing = TimingClassifier::new(first).unwrap();
            timing.set_speed(second).unwrap();

            prop_assert_eq!(timing.thresholds(), TimingClassifier::new(second).unwrap().thresholds());
            prop_assert!(timing.set_speed(0).is_err());
            prop_assert_eq!(timing.wpm(), second);
        }

        #[test]
        fn press_classes_partition_durations(wpm in 1u32..=200, duration in 0u64..50_000) {
            let timing = TimingClassifier::new(wpm).unwrap();
            let p = timing.thresholds();

            let in_dot = p.dot_min <= duration && duration <= p.dot_max;
            let in_dash = p.dash_min <= duration && duration <= p.dash_max;
            prop_assert!(!(in_dot && in_dash));

            let expected = match (in_dot, in_dash) {
                (true, _) => PressClass::Dot,
                (_, true) => PressClass::Dash,
                _ => PressClass::Invalid,
            };
            prop_assert_eq!(timing.classify_press(duration), expected);
        }

        #[test]
        fn band_edges_are_inclusive(wpm in 1u32..=200) {
            let timing = TimingClassifier::new(wpm).unwrap();
            let p = timing.thresholds();

            prop_assert_eq!(timing.classify_press(p.dot_min), PressClass::Dot);
            prop_assert_eq!(timing.classify_press(p.dot_max), PressClass::Dot);
            prop_assert_eq!(timing.classify_press(p.dash_min), PressClass::Dash);
            prop_assert_eq!(timing.classify_press(p.dash_max), PressClass::Dash);
            prop_assert_eq!(timing.classify_press(p.dash_max + 1), PressClass::Invalid);
        }

        #[test]
        fn standard_sequences_round_trip(index in 0usize..STANDARD_TABLE.len()) {
            let (sequence, character) = STANDARD_TABLE[index];
            let mut decoder = SequenceDecoder::new(MemoryStore::new()).unwrap();
            let mut events: Vec<DecoderEvent> = Vec::new();

            for symbol in parse_sequence(sequence).unwrap() {
                decoder.add_element(symbol);
            }
            decoder.end_letter(&mut events);

            prop_assert_eq!(decoder.current_word(), character.to_string());
            prop_assert_eq!(decoder.current_sequence(), "");
        }

        /// Any run of actions separated by sub-letter gaps is one idle period
        /// once the key goes quiet: one letter boundary, one word
        #[test]
        fn one_boundary_per_idle_period(
            holds in prop::collection::vec(60u64..=900, 1..12),
            gaps in prop::collection::vec(60u64..450, 12),
        ) {
            let mut controller = DecoderController::new(DecoderConfig::default(), MemoryStore::new()).unwrap();
            let recorder = EventRecorder::new();
            recorder.attach(&mut controller);

            let mut script = KeyingScript::new(KeyCode::SPACE);
            for (i, hold) in holds.iter().enumerate() {
                if i > 0 {
                    script = script.gap(gaps[i]);
                }
                script = script.hold(*hold);
            }
            let until = script.end() + Duration::from_millis(30_000);
            replay(&mut controller, script.events(), until);

            prop_assert_eq!(recorder.count(&DecoderEvent::LetterBoundary), 1);
            prop_assert_eq!(recorder.words().len(), 1);
            prop_assert_eq!(controller.next_deadline(), None);
        }

        #[test]
        fn rejected_mapping_leaves_table_unchanged(
            sequence in "[.-]{1,8}",
            character in prop::char::range('!', '~'),
        ) {
            let mut decoder = SequenceDecoder::new(MemoryStore::new()).unwrap();
            decoder.add_custom_mapping('[', "-.--.-.").unwrap();
            let before = decoder.custom_mappings().clone();

            if decoder.add_custom_mapping(character, &sequence).is_err() {
                prop_assert_eq!(decoder.custom_mappings(), &before);
                prop_assert_eq!(decoder.store().table(), &before);
            } else {
                prop_assert_eq!(decoder.custom_mappings().get(&sequence), Some(&character.to_ascii_uppercase()));
            }
        }
    }
}
