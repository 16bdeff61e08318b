//! Property tests for telemetry and the command/feedback protocol

use proptest::prelude::*;

use meshnode_core::{
    sim::{SimClock, SimGpio},
    telemetry::{SensorSample, TelemetryConfig, TelemetryEncoder},
    ActuatorState, Classification, CommandProtocol, Distance,
};

fn leds() -> CommandProtocol {
    CommandProtocol::default()
}

fn gpio() -> SimGpio {
    SimGpio::new(SimClock::default())
}

/// Values already rounded to one decimal, as the sensors report them
fn tenths(range: core::ops::Range<i32>) -> impl Strategy<Value = f32> {
    range.prop_map(|t| t as f32 / 10.0)
}

fn distance() -> impl Strategy<Value = Distance> {
    prop_oneof![Just(Distance::Invalid), tenths(0..4000).prop_map(Distance::Valid)]
}

fn command() -> impl Strategy<Value = String> {
    let field = (prop_oneof![Just("led1"), Just("LED1"), Just("led2"), Just("Led2")], any::<bool>(), any::<bool>())
        .prop_map(|(key, on, quoted)| {
            if quoted {
                format!("\"{key}\":\"{on}\"")
            } else {
                format!("\"{key}\":{on}")
            }
        });
    prop::collection::vec(field, 1..4).prop_map(|fields| format!("{{{}}}", fields.join(",")))
}

proptest! {
    #[test]
    fn telemetry_round_trips(
        humidity in tenths(0..1000),
        temperature in tenths(-400..800),
        lux in any::<u16>(),
        distance in distance(),
        verbose in any::<bool>(),
    ) {
        let config = if verbose { TelemetryConfig::verbose() } else { TelemetryConfig::compact() };
        let sample = SensorSample { humidity, temperature, lux, distance };
        let payload = TelemetryEncoder::new(config).encode(&sample);
        prop_assert!(!payload.is_truncated());

        let back = SensorSample::parse(payload.as_str(), &config).unwrap();
        prop_assert!((back.humidity - humidity).abs() < 1e-3);
        prop_assert!((back.temperature - temperature).abs() < 1e-3);
        prop_assert_eq!(back.lux, lux);
        match (back.distance, distance) {
            (Distance::Valid(a), Distance::Valid(b)) => prop_assert!((a - b).abs() < 1e-3),
            (a, b) => prop_assert_eq!(a, b),
        }
    }

    #[test]
    fn emitted_feedback_never_loops(commands in prop::collection::vec(command(), 1..8)) {
        let mut protocol = leds();
        let mut pins = gpio();

        for raw in &commands {
            let feedback = protocol.classify_and_apply(raw.as_bytes(), &mut pins).unwrap();
            let state = *protocol.state();

            // Heard back any number of times: no state change, no emission
            for _ in 0..3 {
                prop_assert_eq!(protocol.classify(feedback.as_bytes()), Classification::Feedback);
                prop_assert!(protocol.classify_and_apply(feedback.as_bytes(), &mut pins).is_none());
                prop_assert_eq!(protocol.state(), &state);
            }
        }
    }

    #[test]
    fn single_key_command_leaves_other_output(first in any::<bool>(), second in any::<bool>(), update in any::<bool>()) {
        let mut protocol = leds();
        let mut pins = gpio();
        protocol.classify_and_apply(format!("{{\"led1\":{first},\"led2\":{second}}}").as_bytes(), &mut pins);

        let feedback = protocol.classify_and_apply(format!("{{\"led1\":{update}}}").as_bytes(), &mut pins).unwrap();
        prop_assert_eq!(
            feedback.as_str(),
            format!("{{\"feedbackled1\":{update},\"feedbackled2\":{second}}}")
        );
    }

    #[test]
    fn arbitrary_bytes_never_panic_or_loop(raw in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut protocol = leds();
        let mut pins = gpio();
        if let Some(feedback) = protocol.classify_and_apply(&raw, &mut pins) {
            prop_assert!(protocol.classify_and_apply(feedback.as_bytes(), &mut pins).is_none());
        } else {
            prop_assert_eq!(protocol.state(), &ActuatorState::<2>::new());
        }
    }
}
