//! Actuator Node Simulation
//!
//! Feeds an actuator node a mix of commands, its own echoed feedback,
//! sensor telemetry and garbage, the way a shared broadcast channel
//! delivers them, and shows which ones change the outputs.
//!
//! ## What You'll Learn
//!
//! - How inbound payloads are classified
//! - Why a node hearing its own feedback never answers it
//! - Enabling the telemetry indicator
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example actuator_node_sim
//! ```

use meshnode_core::{
    sim::{SimClock, SimGpio, SimTransport},
    ActuatorNode, ActuatorNodeConfig, IndicatorConfig, Level,
};

fn main() {
    println!("meshnode Actuator Node Simulation");
    println!("=================================\n");

    let clock = SimClock::new(0);
    let mut gpio = SimGpio::new(clock.clone());
    let mut radio = SimTransport { hear_own: true, ..SimTransport::ready() };

    let config: ActuatorNodeConfig = ActuatorNodeConfig::default().with_indicator(IndicatorConfig::default());
    let mut node = ActuatorNode::new(config);
    node.setup(&mut gpio);

    let traffic: [&[u8]; 7] = [
        b"{\"led1\":true}",
        b"{\"feedbackled1\":true,\"feedbackled2\":true}",
        b"{\"temp\":22.5,\"hum\":48.0,\"lux\":2047,\"dist\":85.0}",
        b"{\"LED2\": \"TRUE\"}",
        b"hello mesh",
        b"{\"led1\":false,\"note\":\"true\"}",
        &[0xfe, 0xff],
    ];

    for raw in traffic {
        let handled = node.handle_incoming(raw, &mut gpio, &clock, &mut radio);
        println!("<- {:<50} {:?}", String::from_utf8_lossy(raw), handled);

        // Our own feedback comes straight back on a broadcast channel
        let tick = node.tick(&mut gpio, &clock, &mut radio);
        if tick.received > 0 {
            println!("   heard {} echo(es), {} applied", tick.received, tick.applied);
        }
    }

    println!("\nFeedback sent:");
    for payload in radio.sent_text() {
        println!("-> {}", payload);
    }

    let state = node.state();
    println!("\nOutputs: led1={} led2={}", state.output1(), state.output2());
    let indicator = IndicatorConfig::default().pin;
    let blinks = gpio.writes_to(indicator).filter(|(_, level)| *level == Level::High).count();
    println!("Indicator blinks: {}", blinks);
}
