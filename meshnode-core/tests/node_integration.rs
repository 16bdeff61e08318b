//! End-to-end tests of the sensor and actuator node loops
//!
//! Runs whole ticks against the simulated board and radio: readiness
//! gating, telemetry pacing, stale DHT values, command handling, feedback
//! echo and the telemetry indicator.

mod common;

use meshnode_core::{
    config::{ActuatorNodeConfig, IndicatorConfig, SensorNodeConfig},
    constants::pins::{LED1_PIN, LED2_PIN},
    constants::protocol::MAX_RX_PER_TICK,
    sim::{DhtWaveform, SimClock, SimGpio, SimTransport},
    telemetry::{SensorSample, TelemetryConfig},
    ActuatorNode, Classification, DecodeError, Distance, Inbound, Level, SensorNode,
    TransportError,
};

use common::{assert_close, echo_us_for_cm, SensorBench};

#[test]
fn sensor_node_waits_for_transport() {
    let mut bench = SensorBench::new();
    bench.transport.ready = false;
    let mut node = SensorNode::default();
    node.setup(&mut bench.gpio);

    for _ in 0..5 {
        let tick = node.tick(&mut bench.gpio, &bench.clock, &mut bench.transport);
        assert!(tick.cycle.is_none());
        bench.clock.advance_ms(10_000);
    }
    assert_eq!(bench.transport.channel_joins, 0);
    assert!(bench.transport.sent.is_empty());

    bench.transport.ready = true;
    let tick = node.tick(&mut bench.gpio, &bench.clock, &mut bench.transport);
    assert!(tick.joined_channel);
    assert!(tick.cycle.is_some());
    assert_eq!(bench.transport.channel_joins, 1);
}

#[test]
fn sensor_node_sends_every_interval() {
    let mut bench = SensorBench::new()
        .with_dht(DhtWaveform::from_values(40, 0, 25, 5))
        .with_echo(echo_us_for_cm(12.0))
        .with_lux(812);
    let mut node = SensorNode::default();
    node.setup(&mut bench.gpio);

    for _ in 0..10 {
        node.tick(&mut bench.gpio, &bench.clock, &mut bench.transport);
        bench.clock.advance_ms(10_000);
    }
    // Sends at 0s, 30s, 60s and 90s of the 100s run
    assert_eq!(bench.transport.sent.len(), 4);
    assert_eq!(bench.transport.channel_joins, 1);

    let text = &bench.transport.sent_text()[0];
    let sample = SensorSample::parse(text, &TelemetryConfig::compact()).unwrap();
    assert_close(sample.humidity, 40.0, 1e-4);
    assert_close(sample.temperature, 25.5, 1e-4);
    assert_eq!(sample.lux, 812);
    assert_close(sample.distance.cm().unwrap(), 12.0, 0.1);
}

#[test]
fn failed_dht_read_still_sends_stale_values() {
    let mut bench = SensorBench::new();
    let mut node = SensorNode::default();
    node.setup(&mut bench.gpio);

    let cycle = node.tick(&mut bench.gpio, &bench.clock, &mut bench.transport).cycle.unwrap();
    assert_eq!(cycle.dht_error, Some(DecodeError::NoResponse));
    assert_eq!(cycle.sample.humidity, 0.0);
    assert_eq!(cycle.sample.temperature, 0.0);
    assert_eq!(cycle.sample.distance, Distance::Invalid);
    assert_eq!(cycle.sent, Ok(()));
    assert_eq!(
        bench.transport.sent_text()[0],
        "{\"temp\":0.0,\"hum\":0.0,\"lux\":0,\"dist\":-1.0}"
    );

    // Sensor comes back, then drops out again: last good values are reused
    bench = bench.with_dht(DhtWaveform::from_values(55, 0, 21, 0));
    bench.clock.advance_ms(30_000);
    node.tick(&mut bench.gpio, &bench.clock, &mut bench.transport);
    bench.gpio.clear_script(meshnode_core::constants::pins::DHT_PIN);
    bench.clock.advance_ms(30_000);
    let cycle = node.tick(&mut bench.gpio, &bench.clock, &mut bench.transport).cycle.unwrap();
    assert_eq!(cycle.dht_error, Some(DecodeError::NoResponse));
    assert_eq!(cycle.sample.humidity, 55.0);
    assert_eq!(cycle.sample.temperature, 21.0);
}

#[test]
fn sensor_node_drops_failed_broadcast() {
    let mut bench = SensorBench::new();
    bench.transport.fail_next = Some(TransportError::NoBuffer);
    let mut node = SensorNode::default();

    let cycle = node.tick(&mut bench.gpio, &bench.clock, &mut bench.transport).cycle.unwrap();
    assert_eq!(cycle.sent, Err(TransportError::NoBuffer));
    assert!(bench.transport.sent.is_empty());

    // No retry before the next interval
    bench.clock.advance_ms(1_000);
    assert!(node.tick(&mut bench.gpio, &bench.clock, &mut bench.transport).cycle.is_none());
}

#[test]
fn sensor_node_reports_transport_dropping_out() {
    let mut bench = SensorBench::new();
    let mut node = SensorNode::default();
    node.tick(&mut bench.gpio, &bench.clock, &mut bench.transport);

    bench.transport.ready = false;
    bench.clock.advance_ms(30_000);
    let cycle = node.tick(&mut bench.gpio, &bench.clock, &mut bench.transport).cycle.unwrap();
    assert_eq!(cycle.sent, Err(TransportError::NotReady));
    assert_eq!(bench.transport.sent.len(), 1);
}

#[test]
fn verbose_sensor_node_quotes_values() {
    let mut bench = SensorBench::new().with_dht(DhtWaveform::from_values(40, 0, 25, 0));
    let config = SensorNodeConfig::default().with_telemetry(TelemetryConfig::verbose());
    let mut node = SensorNode::new(config);

    node.tick(&mut bench.gpio, &bench.clock, &mut bench.transport);
    let text = &bench.transport.sent_text()[0];
    assert!(text.contains("\"humidity\":\"40.0\""));
    assert!(text.contains("\"distance\":\"-1.0\""));
}

fn actuator_bench() -> (SimClock, SimGpio, SimTransport) {
    let clock = SimClock::new(0);
    let gpio = SimGpio::new(clock.clone());
    let transport = SimTransport { hear_own: true, ..SimTransport::ready() };
    (clock, gpio, transport)
}

#[test]
fn actuator_applies_command_and_ignores_own_feedback() {
    let (clock, mut gpio, mut transport) = actuator_bench();
    let mut node: ActuatorNode = ActuatorNode::default();
    node.setup(&mut gpio);
    assert_eq!(gpio.output(LED1_PIN), Some(Level::Low));
    assert_eq!(gpio.output(LED2_PIN), Some(Level::Low));

    transport.deliver(b"{\"led1\":true}");
    let tick = node.tick(&mut gpio, &clock, &mut transport);

    // The command and then our own echoed feedback
    assert!(tick.joined_channel);
    assert_eq!(tick.received, 2);
    assert_eq!(tick.applied, 1);
    assert_eq!(transport.sent_text(), vec!["{\"feedbackled1\":true,\"feedbackled2\":false}"]);
    assert!(node.state().output1());
    assert!(!node.state().output2());
    assert_eq!(gpio.output(LED1_PIN), Some(Level::High));

    // Nothing left to do
    let tick = node.tick(&mut gpio, &clock, &mut transport);
    assert_eq!(tick.received, 0);
}

#[test]
fn actuator_tick_handles_a_bounded_batch() {
    let (clock, mut gpio, mut transport) = actuator_bench();
    let mut node: ActuatorNode = ActuatorNode::default();

    for _ in 0..MAX_RX_PER_TICK + 4 {
        transport.deliver(b"{\"hello\":\"world\"}");
    }

    let tick = node.tick(&mut gpio, &clock, &mut transport);
    assert_eq!(tick.received, MAX_RX_PER_TICK);
    assert_eq!(transport.inbox.len(), 4);

    let tick = node.tick(&mut gpio, &clock, &mut transport);
    assert_eq!(tick.received, 4);
    assert!(transport.inbox.is_empty());
}

#[test]
fn actuator_ignores_feedback_and_unrelated_traffic() {
    let (clock, mut gpio, mut transport) = actuator_bench();
    let mut node: ActuatorNode = ActuatorNode::default();

    let feedback = b"{\"feedbackled1\":true,\"feedbackled2\":false}";
    assert_eq!(
        node.handle_incoming(feedback, &mut gpio, &clock, &mut transport),
        Inbound::Ignored(Classification::Feedback)
    );
    assert_eq!(
        node.handle_incoming(b"{\"hello\":\"world\"}", &mut gpio, &clock, &mut transport),
        Inbound::Ignored(Classification::Unrelated)
    );
    assert_eq!(
        node.handle_incoming(&[0xc3, 0x28], &mut gpio, &clock, &mut transport),
        Inbound::Ignored(Classification::Malformed)
    );
    assert!(transport.sent.is_empty());
    assert!(gpio.writes().is_empty());
}

#[test]
fn actuator_feedback_needs_ready_transport() {
    let (clock, mut gpio, mut transport) = actuator_bench();
    transport.ready = false;
    let mut node: ActuatorNode = ActuatorNode::default();

    let handled = node.handle_incoming(b"{\"led2\":\"true\"}", &mut gpio, &clock, &mut transport);
    assert_eq!(handled, Inbound::Applied(Err(TransportError::NotReady)));
    assert!(node.state().output2());
    assert!(transport.sent.is_empty());
}

#[test]
fn indicator_pulses_for_telemetry() {
    let (clock, mut gpio, mut transport) = actuator_bench();
    let indicator = IndicatorConfig::default();
    let config: ActuatorNodeConfig = ActuatorNodeConfig::default().with_indicator(indicator);
    let mut node = ActuatorNode::new(config);
    node.setup(&mut gpio);

    let telemetry = b"{\"temp\":21.0,\"hum\":50.0,\"lux\":100,\"dist\":-1.0}";
    let start = clock.now_us();
    assert_eq!(
        node.handle_incoming(telemetry, &mut gpio, &clock, &mut transport),
        Inbound::Indicated
    );

    let pulses: Vec<_> = gpio.writes_to(indicator.pin).collect();
    // setup() low, then high and low again
    assert_eq!(pulses.len(), 3);
    assert_eq!(pulses[1], (start, Level::High));
    assert_eq!(pulses[2], (start + 250_000, Level::Low));
    assert!(transport.sent.is_empty());
}

#[test]
fn indicator_disabled_by_default() {
    let (clock, mut gpio, mut transport) = actuator_bench();
    let mut node: ActuatorNode = ActuatorNode::default();
    let telemetry = b"{\"temp\":21.0,\"hum\":50.0,\"lux\":100,\"dist\":-1.0}";
    assert_eq!(
        node.handle_incoming(telemetry, &mut gpio, &clock, &mut transport),
        Inbound::Ignored(Classification::Unrelated)
    );
}

#[test]
fn sensor_and_actuator_share_a_channel() {
    let mut bench = SensorBench::new().with_dht(DhtWaveform::from_values(40, 0, 25, 0));
    let mut sensor = SensorNode::default();
    let mut actuator: ActuatorNode = ActuatorNode::default();
    let (clock, mut gpio, mut radio) = actuator_bench();

    sensor.tick(&mut bench.gpio, &bench.clock, &mut bench.transport);
    for payload in bench.transport.sent.drain(..) {
        radio.deliver(&payload);
    }
    radio.deliver(b"{\"led2\":true}");

    let tick = actuator.tick(&mut gpio, &clock, &mut radio);
    assert_eq!(tick.received, 3);
    assert_eq!(tick.applied, 1);
    assert!(actuator.state().output2());
    assert_eq!(radio.sent.len(), 1);
}
