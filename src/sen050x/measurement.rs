use std::fmt;

/// Temperature unit selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

/// Atmospheric pressure unit selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureUnit {
    HectoPascal,
    KiloPascal,
}

/// One full poll of the sensor, every quantity converted to physical units.
#[derive(Debug, Default, Clone, Copy)]
pub struct Measurement {
    /// °C
    pub temperature: f32,
    /// % relative humidity
    pub humidity: f32,
    /// UV index
    pub ultraviolet: f32,
    /// lux
    pub luminous: f32,
    /// hPa
    pub pressure: f32,
    /// meters above sea level
    pub elevation: f32,
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "temperature: {:.2}°C, humidity: {:.2}%, uv index: {:.2}, luminous: {:.2} lx, pressure: {:.2} hPa, elevation: {:.2} m",
            self.temperature,
            self.humidity,
            self.ultraviolet,
            self.luminous,
            self.pressure,
            self.elevation
        )
    }
}
