//! Digital and Analog Pin Access

/// Board pin number
pub type Pin = u8;

/// Logic level of a digital pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Level {
    /// Logic low
    Low,
    /// Logic high
    High,
}

impl Level {
    /// `High` for `true`
    pub fn from_bool(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }

    /// `true` for `High`
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        Level::from_bool(high)
    }
}

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PinMode {
    /// Floating input
    Input,
    /// Input with the internal pull-up enabled
    InputPullup,
    /// Push-pull output
    Output,
}

/// Digital pin access
///
/// `read_input` takes `&mut self` because on several boards a read goes
/// through a shared peripheral handle.
pub trait Gpio {
    /// Configure a pin's direction
    fn set_mode(&mut self, pin: Pin, mode: PinMode);

    /// Drive an output pin
    fn set_output(&mut self, pin: Pin, level: Level);

    /// Sample an input pin
    fn read_input(&mut self, pin: Pin) -> Level;
}

/// Analog input used by the light sensor
pub trait AnalogInput {
    /// Raw ADC reading
    fn read_analog(&mut self, pin: Pin) -> u16;
}

impl<T: Gpio + ?Sized> Gpio for &mut T {
    fn set_mode(&mut self, pin: Pin, mode: PinMode) {
        (**self).set_mode(pin, mode)
    }

    fn set_output(&mut self, pin: Pin, level: Level) {
        (**self).set_output(pin, level)
    }

    fn read_input(&mut self, pin: Pin) -> Level {
        (**self).read_input(pin)
    }
}
