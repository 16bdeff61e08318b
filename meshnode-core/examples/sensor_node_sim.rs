//! Sensor Node Simulation
//!
//! Runs the sensor node loop for five minutes of virtual time against a
//! simulated DHT11, light sensor and ranger, printing every telemetry
//! payload it broadcasts.
//!
//! ## What You'll Learn
//!
//! - Wiring a `SensorNode` to clock, GPIO and transport implementations
//! - How the scheduler waits for the radio before sending anything
//! - What goes on the wire when the DHT11 or the ranger fails
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example sensor_node_sim
//! ```

use meshnode_core::{
    constants::{
        pins::{DHT_PIN, ECHO_PIN, LUX_PIN, TRIG_PIN},
        sensors::LUX_ADC_MAX,
    },
    sim::{echo_waveform, DhtWaveform, SimClock, SimGpio, SimTransport, Trigger},
    SensorNode, SensorNodeConfig,
};

fn main() {
    println!("meshnode Sensor Node Simulation");
    println!("===============================\n");

    let clock = SimClock::new(0);
    let mut gpio = SimGpio::new(clock.clone());
    let mut radio = SimTransport::default();

    let mut node = SensorNode::new(SensorNodeConfig::default());
    node.setup(&mut gpio);

    // 22.5°C, 48% RH, a wall 85cm away, half light
    gpio.script(DHT_PIN, DhtWaveform::from_values(48, 0, 22, 5).build(), Trigger::InputMode);
    gpio.script(ECHO_PIN, echo_waveform(150, 5_000), Trigger::FallingEdge(TRIG_PIN));
    gpio.set_analog(LUX_PIN, LUX_ADC_MAX / 2);

    for second in 0..300u64 {
        // Radio needs a few seconds to come up after boot
        radio.ready = second >= 5;

        // Unplug the DHT11 for a minute and take the wall away for another
        if second == 120 {
            gpio.clear_script(DHT_PIN);
        }
        if second == 180 {
            gpio.script(DHT_PIN, DhtWaveform::from_values(47, 0, 23, 0).build(), Trigger::InputMode);
            gpio.clear_script(ECHO_PIN);
        }

        let tick = node.tick(&mut gpio, &clock, &mut radio);
        if tick.joined_channel {
            println!("[{:>3}s] channel joined", second);
        }
        if let Some(cycle) = tick.cycle {
            let payload = radio.sent_text().last().cloned().unwrap_or_default();
            print!("[{:>3}s] {}", second, payload);
            if let Some(e) = cycle.dht_error {
                print!("  (DHT11: {}, stale values)", e);
            }
            if let Err(e) = cycle.sent {
                print!("  (not sent: {})", e);
            }
            println!();
        }

        clock.advance_ms(1_000);
    }

    println!("\n{} payloads broadcast", radio.sent.len());
}
