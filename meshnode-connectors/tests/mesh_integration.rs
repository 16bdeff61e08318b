//! Sensor node, actuator node and gateway logger on one loopback mesh
//!
//! Every payload reaches every port, senders included, so these tests
//! exercise the broadcast echo the command protocol must not react to.

use meshnode_connectors::{read_records, Connector, JsonLinesLogger, LoopbackMesh, LoopbackPort};
use meshnode_core::{
    sim::{DhtWaveform, SimClock, SimGpio, Trigger},
    constants::pins::DHT_PIN,
    ActuatorNode, Distance, SensorNode, TelemetryConfig, Transport,
};

/// Drain a port into the gateway log, returning how many messages arrived
fn gateway_drain(port: &mut LoopbackPort, logger: &mut JsonLinesLogger) -> usize {
    let mut buf = [0u8; 256];
    let mut count = 0;
    while let Some(len) = port.receive(&mut buf) {
        logger.send("!gateway-heard", &buf[..len]).unwrap();
        count += 1;
    }
    count
}

#[test]
fn command_round_trip_settles() {
    let mesh = LoopbackMesh::new();
    let mut actuator_port = mesh.port("!actuator");
    let mut controller = mesh.port("!controller");

    let clock = SimClock::new(0);
    let mut gpio = SimGpio::new(clock.clone());
    let mut actuator: ActuatorNode = ActuatorNode::default();
    actuator.setup(&mut gpio);

    controller.broadcast(b"{\"led1\":true,\"led2\":true}").unwrap();

    // Keep ticking until nothing new is broadcast
    for _ in 0..5 {
        actuator.tick(&mut gpio, &clock, &mut actuator_port);
    }

    let history = mesh.history();
    assert_eq!(history.len(), 2, "exactly one feedback for one command: {history:?}");
    assert_eq!(history[1].0, "!actuator");
    assert_eq!(history[1].1, b"{\"feedbackled1\":true,\"feedbackled2\":true}".to_vec());
    assert!(actuator.state().output1() && actuator.state().output2());
    assert_eq!(actuator_port.pending(), 0);
}

#[test]
fn two_actuators_do_not_ping_pong() {
    let mesh = LoopbackMesh::new();
    let mut port_a = mesh.port("!a");
    let mut port_b = mesh.port("!b");
    let mut controller = mesh.port("!controller");

    let clock = SimClock::new(0);
    let mut gpio_a = SimGpio::new(clock.clone());
    let mut gpio_b = SimGpio::new(clock.clone());
    let mut a: ActuatorNode = ActuatorNode::default();
    let mut b: ActuatorNode = ActuatorNode::default();

    controller.broadcast(b"{\"led2\":true}").unwrap();
    for _ in 0..10 {
        a.tick(&mut gpio_a, &clock, &mut port_a);
        b.tick(&mut gpio_b, &clock, &mut port_b);
    }

    // One command, one feedback from each actuator, then silence
    assert_eq!(mesh.history().len(), 3);
    assert!(a.state().output2() && b.state().output2());
}

#[test]
fn gateway_logs_telemetry_and_feedback() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("messages.jsonl");
    let mut logger = JsonLinesLogger::open(&log_path).unwrap();

    let mesh = LoopbackMesh::new();
    let mut sensor_port = mesh.port("!sensor");
    let mut actuator_port = mesh.port("!actuator");
    let mut gateway_port = mesh.port("!gateway");

    let clock = SimClock::new(0);
    let mut sensor_gpio = SimGpio::new(clock.clone());
    sensor_gpio.script(DHT_PIN, DhtWaveform::from_values(48, 0, 22, 5).build(), Trigger::InputMode);
    let mut sensor = SensorNode::default();
    sensor.setup(&mut sensor_gpio);

    let mut actuator_gpio = SimGpio::new(clock.clone());
    let mut actuator: ActuatorNode = ActuatorNode::default();

    sensor.tick(&mut sensor_gpio, &clock, &mut sensor_port);
    gateway_port.broadcast(b"{\"led1\":true}").unwrap();
    actuator.tick(&mut actuator_gpio, &clock, &mut actuator_port);
    sensor.tick(&mut sensor_gpio, &clock, &mut sensor_port);

    // telemetry, command, feedback
    assert_eq!(gateway_drain(&mut gateway_port, &mut logger), 3);

    let records = read_records(&log_path).unwrap();
    let telemetry: Vec<_> = records
        .iter()
        .filter_map(|r| r.telemetry(&TelemetryConfig::compact()))
        .collect();
    assert_eq!(telemetry.len(), 1);
    assert!((telemetry[0].sample.temperature - 22.5).abs() < 1e-4);
    assert_eq!(telemetry[0].sample.distance, Distance::Invalid);

    let feedback = records[2].message.as_deref().unwrap();
    assert_eq!(feedback, "{\"feedbackled1\":true,\"feedbackled2\":false}");
}
