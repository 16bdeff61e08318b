//! Sensor and Actuator Node Loops
//!
//! The two device roles wired from the core pieces. Both are driven by
//! calling `tick` from the board's main loop; neither spawns anything or
//! holds on to the hardware handles between calls.
//!
//! ## Sensor node
//!
//! ```text
//! tick ─> scheduler ─(due)─> DHT11 ─┐
//!                            light ─┼─> SensorSample ─> encoder ─> broadcast
//!                            ranger ┘
//! ```
//!
//! A failed DHT11 read does not skip the cycle. The last good humidity and
//! temperature are sent instead (zero until the first good read) and the
//! error is reported in the [`TelemetryCycle`].
//!
//! ## Actuator node
//!
//! Every inbound payload goes through [`CommandProtocol`]. Commands change
//! outputs and answer with one feedback broadcast; everything else is
//! dropped. Boards with a telemetry indicator blink it when a sensor
//! node's telemetry is overheard.

use crate::{
    config::{ActuatorNodeConfig, IndicatorConfig, SensorNodeConfig},
    constants::protocol::{MAX_RX_PER_TICK, RX_BUFFER_LEN},
    errors::{DecodeError, TransportError},
    protocol::{ActuatorState, Classification, CommandProtocol},
    scheduler::PeriodicScheduler,
    sensors::{Dht11, DhtReading, EchoRanger},
    telemetry::{is_telemetry, SensorSample, TelemetryConfig, TelemetryEncoder},
    traits::{AnalogInput, Clock, Gpio, Level, Pin, PinMode, Transport},
};

/// Broadcast `payload` if the transport is ready, logging any failure
fn send<T: Transport + ?Sized>(transport: &mut T, payload: &[u8]) -> Result<(), TransportError> {
    let result = if transport.is_ready() {
        transport.broadcast(payload)
    } else {
        Err(TransportError::NotReady)
    };
    if let Err(e) = result {
        log_warn!("dropping {} byte payload: {}", payload.len(), e);
    }
    result
}

/// One telemetry send
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryCycle {
    /// Values that were encoded
    pub sample: SensorSample,
    /// DHT11 failure, when stale values were used
    pub dht_error: Option<DecodeError>,
    /// Payload did not fit and was cut short
    pub truncated: bool,
    /// Broadcast result
    pub sent: Result<(), TransportError>,
}

/// What one sensor node tick did
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorTick {
    /// The default channel was joined
    pub joined_channel: bool,
    /// Telemetry cycle, if one was due
    pub cycle: Option<TelemetryCycle>,
}

/// Temperature/humidity, light and distance reporter
#[derive(Debug, Clone)]
pub struct SensorNode {
    dht: Dht11,
    ranger: EchoRanger,
    lux_pin: Pin,
    encoder: TelemetryEncoder,
    scheduler: PeriodicScheduler,
    last_reading: DhtReading,
}

impl SensorNode {
    /// Node from its configuration
    pub fn new(config: SensorNodeConfig) -> Self {
        Self {
            dht: Dht11::new(config.pins.dht)
                .with_checksum(config.checksum)
                .with_precision(config.precision),
            ranger: EchoRanger::new(config.pins.trigger, config.pins.echo)
                .with_timeout_us(config.echo_timeout_us),
            lux_pin: config.pins.lux,
            encoder: TelemetryEncoder::new(config.telemetry),
            scheduler: PeriodicScheduler::new(config.send_interval_ms),
            last_reading: DhtReading::default(),
        }
    }

    /// Configure every pin
    pub fn setup<G: Gpio + ?Sized>(&self, gpio: &mut G) {
        self.dht.begin(gpio);
        self.ranger.begin(gpio);
        gpio.set_mode(self.lux_pin, PinMode::Input);
    }

    /// Scheduler state
    pub fn scheduler(&self) -> &PeriodicScheduler {
        &self.scheduler
    }

    /// Most recent good DHT11 values
    pub fn last_reading(&self) -> DhtReading {
        self.last_reading
    }

    /// Read all three sensors
    pub fn sample<G, C>(&mut self, gpio: &mut G, clock: &C) -> (SensorSample, Option<DecodeError>)
    where
        G: Gpio + AnalogInput + ?Sized,
        C: Clock + ?Sized,
    {
        let dht_error = match self.dht.read(gpio, clock) {
            Ok(reading) => {
                self.last_reading = reading;
                None
            }
            Err(e) => {
                log_warn!("DHT11 read failed, reusing last values: {}", e);
                Some(e)
            }
        };
        let lux = gpio.read_analog(self.lux_pin);
        let distance = self.ranger.measure(gpio, clock);

        let sample = SensorSample {
            humidity: self.last_reading.humidity,
            temperature: self.last_reading.temperature,
            lux,
            distance,
        };
        (sample, dht_error)
    }

    /// Run the scheduler and, when due, sample and broadcast
    pub fn tick<G, C, T>(&mut self, gpio: &mut G, clock: &C, transport: &mut T) -> SensorTick
    where
        G: Gpio + AnalogInput + ?Sized,
        C: Clock + ?Sized,
        T: Transport + ?Sized,
    {
        let scheduled = self.scheduler.tick(transport, clock.millis());
        if !scheduled.telemetry_due {
            return SensorTick { joined_channel: scheduled.joined_channel, cycle: None };
        }

        let (sample, dht_error) = self.sample(gpio, clock);
        let payload = self.encoder.encode(&sample);
        log_debug!("telemetry {}", payload);
        let sent = send(transport, payload.as_bytes());

        SensorTick {
            joined_channel: scheduled.joined_channel,
            cycle: Some(TelemetryCycle { sample, dht_error, truncated: payload.is_truncated(), sent }),
        }
    }
}

impl Default for SensorNode {
    fn default() -> Self {
        Self::new(SensorNodeConfig::default())
    }
}

/// What the actuator node did with one inbound payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// Command applied; feedback broadcast result
    Applied(Result<(), TransportError>),
    /// Telemetry overheard and the indicator pulsed
    Indicated,
    /// Dropped without side effects
    Ignored(Classification),
}

/// What one actuator node tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorTick {
    /// The default channel was joined
    pub joined_channel: bool,
    /// Inbound payloads handled
    pub received: usize,
    /// Commands among them
    pub applied: usize,
}

/// Remote-controlled outputs with feedback
#[derive(Debug, Clone)]
pub struct ActuatorNode<const N: usize = 2> {
    protocol: CommandProtocol<N>,
    scheduler: PeriodicScheduler,
    indicator: Option<IndicatorConfig>,
    telemetry: TelemetryConfig,
}

impl<const N: usize> ActuatorNode<N> {
    /// Node from its configuration
    pub fn new(config: ActuatorNodeConfig<N>) -> Self {
        Self {
            protocol: CommandProtocol::new(config.protocol),
            scheduler: PeriodicScheduler::default(),
            indicator: config.indicator,
            telemetry: config.telemetry,
        }
    }

    /// Outputs and indicator to output mode, all low
    pub fn setup<G: Gpio + ?Sized>(&self, gpio: &mut G) {
        self.protocol.setup(gpio);
        if let Some(indicator) = self.indicator {
            gpio.set_mode(indicator.pin, PinMode::Output);
            gpio.set_output(indicator.pin, Level::Low);
        }
    }

    /// Output state
    pub fn state(&self) -> &ActuatorState<N> {
        self.protocol.state()
    }

    /// Protocol handler
    pub fn protocol(&self) -> &CommandProtocol<N> {
        &self.protocol
    }

    /// Scheduler state
    pub fn scheduler(&self) -> &PeriodicScheduler {
        &self.scheduler
    }

    /// Join the channel when ready and handle up to [`MAX_RX_PER_TICK`]
    /// waiting payloads
    pub fn tick<G, C, T>(&mut self, gpio: &mut G, clock: &C, transport: &mut T) -> ActuatorTick
    where
        G: Gpio + ?Sized,
        C: Clock + ?Sized,
        T: Transport + ?Sized,
    {
        let mut tick = ActuatorTick {
            joined_channel: self.scheduler.poll_readiness(transport),
            ..Default::default()
        };

        let mut rx = [0u8; RX_BUFFER_LEN];
        for _ in 0..MAX_RX_PER_TICK {
            let Some(len) = transport.receive(&mut rx) else { break };
            let raw = &rx[..len.min(rx.len())];
            tick.received += 1;
            if let Inbound::Applied(_) = self.handle_incoming(raw, gpio, clock, transport) {
                tick.applied += 1;
            }
        }
        tick
    }

    /// Handle one inbound payload
    ///
    /// Entry point for callback-driven stacks that deliver payloads
    /// themselves instead of through [`Transport::receive`].
    pub fn handle_incoming<G, C, T>(&mut self, raw: &[u8], gpio: &mut G, clock: &C, transport: &mut T) -> Inbound
    where
        G: Gpio + ?Sized,
        C: Clock + ?Sized,
        T: Transport + ?Sized,
    {
        if let Some(feedback) = self.protocol.classify_and_apply(raw, gpio) {
            log_debug!("feedback {}", feedback);
            return Inbound::Applied(send(transport, feedback.as_bytes()));
        }

        let kind = self.protocol.classify(raw);
        if let Some(indicator) = self.indicator {
            let is_sensor_report = core::str::from_utf8(raw)
                .map(|text| is_telemetry(text, &self.telemetry))
                .unwrap_or(false);
            if kind == Classification::Unrelated && is_sensor_report {
                gpio.set_output(indicator.pin, Level::High);
                clock.delay_ms(indicator.pulse_ms);
                gpio.set_output(indicator.pin, Level::Low);
                return Inbound::Indicated;
            }
        }
        Inbound::Ignored(kind)
    }
}

impl Default for ActuatorNode<2> {
    fn default() -> Self {
        Self::new(ActuatorNodeConfig::default())
    }
}
