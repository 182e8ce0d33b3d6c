#![deny(unsafe_code)]

pub mod error;
pub mod measurement;
pub mod register;
pub mod transport;

pub use error::{Error, ErrorKind};
pub use measurement::{Measurement, PressureUnit, TemperatureUnit};
pub use register::Register;
pub use transport::{I2cTransport, RawSample, SerialTransport, Transport};

/// Address reported by the identity register of a healthy SEN0500/SEN0501.
/// Doubles as the factory I2C/station address.
pub const DEVICE_ADDRESS: u8 = 0x22;

/// Product id of the Gravity flavor of the board.
pub const DEVICE_PID_GRAVITY: u16 = 0x01F5;
/// Product id of the Breakout flavor of the board.
pub const DEVICE_PID_BREAKOUT: u16 = 0x01F4;
/// DFRobot vendor id.
pub const DEVICE_VID: u16 = 0x3343;

/// Firmware revision that ships with the factory-calibrated UV cell.
const UV_CALIBRATED_VERSION: u16 = 0x1001;

pub struct Sen050x<T> {
    // The concrete transport implementation.
    transport: T,
}

impl<T> Sen050x<T>
where
    T: Transport,
{
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Init the sensor. Verifies that the identity register reports the
    /// expected device address; until this succeeds no reading should be
    /// trusted. One synchronous attempt, retrying is the caller's call.
    pub fn begin(&mut self) -> Result<(), Error> {
        if self.detect_device_address()? != DEVICE_ADDRESS as u16 {
            return Err(ErrorKind::AddressMismatch.into());
        }
        Ok(())
    }

    fn detect_device_address(&mut self) -> Result<u16, Error> {
        let addr = self.read_word(Register::DeviceAddr)?;
        log::debug!("identity register reads {addr:#06x}");
        Ok(addr)
    }

    pub fn get_device_pid(&mut self) -> Result<u16, Error> {
        self.read_word(Register::Pid)
    }

    pub fn get_device_vid(&mut self) -> Result<u16, Error> {
        self.read_word(Register::Vid)
    }

    pub fn get_temperature(&mut self, unit: TemperatureUnit) -> Result<f32, Error> {
        let raw = self.read_word(Register::Temperature)?;
        let celsius = -45.0 + (raw as f32 * 175.0) / 1024.0 / 64.0;
        let temp = match unit {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 1.8 + 32.0,
        };
        Ok(round2(temp))
    }

    pub fn get_humidity(&mut self) -> Result<f32, Error> {
        let raw = self.read_word(Register::Humidity)?;
        Ok(raw as f32 / 1024.0 * 100.0 / 64.0)
    }

    pub fn get_ultraviolet_intensity(&mut self) -> Result<f32, Error> {
        let version = self.read_word(Register::Version)?;
        let raw = self.read_word(Register::Ultraviolet)?;
        let ultraviolet = if version == UV_CALIBRATED_VERSION {
            raw as f32 / 1800.0
        } else {
            let output_voltage = 3.0 * raw as f32 / 1024.0;
            (output_voltage - 0.99) * (15.0 / (2.9 - 0.99))
        };
        Ok(round2(ultraviolet))
    }

    pub fn get_luminous_intensity(&mut self) -> Result<f32, Error> {
        let raw = self.read_word(Register::Luminous)? as f32;
        let luminous = raw * (1.0023 + raw * (8.1488e-5 + raw * (-9.3924e-9 + raw * 6.0135e-13)));
        Ok(round2(luminous))
    }

    pub fn get_atmosphere_pressure(&mut self, unit: PressureUnit) -> Result<f32, Error> {
        let raw = self.read_word(Register::Pressure)?;
        let atmosphere = match unit {
            PressureUnit::HectoPascal => raw as f32,
            PressureUnit::KiloPascal => raw as f32 / 10.0,
        };
        Ok(atmosphere)
    }

    /// The device exposes elevation through the pressure register: the raw
    /// word at 0x18 is fed through the barometric formula instead.
    pub fn get_elevation(&mut self) -> Result<f32, Error> {
        let raw = self.read_word(Register::Pressure)?;
        let elevation = 44330.0 * (1.0 - (raw as f32 / 1015.0).powf(0.1903));
        Ok(round2(elevation))
    }

    /// One poll of every quantity, for display.
    pub fn read_measurement(&mut self) -> Result<Measurement, Error> {
        Ok(Measurement {
            temperature: self.get_temperature(TemperatureUnit::Celsius)?,
            humidity: self.get_humidity()?,
            ultraviolet: self.get_ultraviolet_intensity()?,
            luminous: self.get_luminous_intensity()?,
            pressure: self.get_atmosphere_pressure(PressureUnit::HectoPascal)?,
            elevation: self.get_elevation()?,
        })
    }

    fn read_word(&mut self, register: Register) -> Result<u16, Error> {
        self.transport.read(register, 2)?.word()
    }
}

fn round2(x: f32) -> f32 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockTransport {
        regs: HashMap<u8, [u8; 2]>,
        fail: bool,
    }

    impl MockTransport {
        fn new(regs: &[(Register, u16)]) -> Self {
            Self {
                regs: regs
                    .iter()
                    .map(|(r, v)| (r.address(), v.to_be_bytes()))
                    .collect(),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                regs: HashMap::new(),
                fail: true,
            }
        }
    }

    impl Transport for MockTransport {
        fn read(&mut self, register: Register, length: usize) -> Result<RawSample, Error> {
            if self.fail {
                return Err(ErrorKind::Transport.into());
            }
            let bytes = self.regs[&register.address()];
            Ok(RawSample::Bytes(bytes[..length].to_vec()))
        }
    }

    /// Serial-shaped transport: every read yields already-assembled words,
    /// the first carrying `value` and the rest garbage.
    struct WordMock(u16);

    impl Transport for WordMock {
        fn read(&mut self, _register: Register, length: usize) -> Result<RawSample, Error> {
            let mut words = vec![0x7FFF; length / 2];
            words[0] = self.0;
            Ok(RawSample::Words(words))
        }
    }

    fn sensor_with(regs: &[(Register, u16)]) -> Sen050x<MockTransport> {
        Sen050x::new(MockTransport::new(regs))
    }

    #[test]
    fn begin_accepts_expected_identity() {
        let mut sensor = sensor_with(&[(Register::DeviceAddr, 0x0022)]);
        assert!(sensor.begin().is_ok());
    }

    #[test]
    fn begin_rejects_foreign_identity() {
        let mut sensor = sensor_with(&[(Register::DeviceAddr, 0x0021)]);
        assert_eq!(
            sensor.begin().unwrap_err().kind(),
            ErrorKind::AddressMismatch
        );
    }

    #[test]
    fn begin_propagates_transport_failure() {
        let mut sensor = Sen050x::new(MockTransport::failing());
        assert_eq!(sensor.begin().unwrap_err().kind(), ErrorKind::Transport);
    }

    #[test]
    fn begin_accepts_serial_first_word_identity() {
        let mut sensor = Sen050x::new(WordMock(0x0022));
        assert!(sensor.begin().is_ok());
    }

    #[test]
    fn temperature_matches_reference_point() {
        let mut sensor = sensor_with(&[(Register::Temperature, 512)]);
        let t = sensor.get_temperature(TemperatureUnit::Celsius).unwrap();
        assert!((t - -43.63).abs() < 1e-3, "got {t}");
    }

    #[test]
    fn temperature_is_monotonic() {
        let mut prev = f32::NEG_INFINITY;
        for raw in (0..=65535u32).step_by(4096) {
            let mut sensor = sensor_with(&[(Register::Temperature, raw as u16)]);
            let t = sensor.get_temperature(TemperatureUnit::Celsius).unwrap();
            assert!(t > prev, "raw {raw}: {t} <= {prev}");
            prev = t;
        }
    }

    #[test]
    fn fahrenheit_tracks_celsius() {
        for raw in [0u16, 512, 10_000, 30_000, 65_535] {
            let mut sensor = sensor_with(&[(Register::Temperature, raw)]);
            let c = sensor.get_temperature(TemperatureUnit::Celsius).unwrap();
            let f = sensor.get_temperature(TemperatureUnit::Fahrenheit).unwrap();
            assert!((f - (c * 1.8 + 32.0)).abs() < 0.02, "raw {raw}: {c} vs {f}");
        }
    }

    #[test]
    fn humidity_is_linear() {
        let mut sensor = sensor_with(&[(Register::Humidity, 0)]);
        assert_eq!(sensor.get_humidity().unwrap(), 0.0);

        for raw in [1u16, 1024, 32_768, 65_535] {
            let mut sensor = sensor_with(&[(Register::Humidity, raw)]);
            let h = sensor.get_humidity().unwrap();
            assert!(
                (h - raw as f32 * 100.0 / 65536.0).abs() < 1e-3,
                "raw {raw}: {h}"
            );
        }
    }

    #[test]
    fn uv_calibrated_firmware_divides_raw() {
        let mut sensor = sensor_with(&[
            (Register::Version, 0x1001),
            (Register::Ultraviolet, 900),
        ]);
        let uv = sensor.get_ultraviolet_intensity().unwrap();
        assert!((uv - 0.5).abs() < 1e-3, "got {uv}");
    }

    #[test]
    fn uv_legacy_firmware_remaps_voltage() {
        let mut sensor = sensor_with(&[
            (Register::Version, 0x0042),
            (Register::Ultraviolet, 512),
        ]);
        // 512 counts -> 1.5 V -> (1.5 - 0.99) * 15 / 1.91
        let uv = sensor.get_ultraviolet_intensity().unwrap();
        assert!((uv - 4.01).abs() < 1e-3, "got {uv}");
    }

    #[test]
    fn luminous_polynomial_reference_point() {
        let mut sensor = sensor_with(&[(Register::Luminous, 512)]);
        let lx = sensor.get_luminous_intensity().unwrap();
        assert!((lx - 533.32).abs() < 0.05, "got {lx}");
    }

    #[test]
    fn pressure_kpa_is_a_tenth_of_hpa() {
        for raw in [0u16, 1015, 10_000, 65_535] {
            let mut sensor = sensor_with(&[(Register::Pressure, raw)]);
            let hpa = sensor
                .get_atmosphere_pressure(PressureUnit::HectoPascal)
                .unwrap();
            let kpa = sensor
                .get_atmosphere_pressure(PressureUnit::KiloPascal)
                .unwrap();
            assert!((kpa - hpa / 10.0).abs() < 1e-4, "raw {raw}");
        }
    }

    #[test]
    fn elevation_shares_the_pressure_register() {
        // 1015 hPa is the formula's sea-level reference.
        let mut sensor = sensor_with(&[(Register::Pressure, 1015)]);
        assert_eq!(
            sensor
                .get_atmosphere_pressure(PressureUnit::HectoPascal)
                .unwrap(),
            1015.0
        );
        let elevation = sensor.get_elevation().unwrap();
        assert!(elevation.abs() < 1e-3, "got {elevation}");
    }

    #[test]
    fn accessors_propagate_transport_failure() {
        let mut sensor = Sen050x::new(MockTransport::failing());
        assert_eq!(
            sensor
                .get_temperature(TemperatureUnit::Celsius)
                .unwrap_err()
                .kind(),
            ErrorKind::Transport
        );
        assert_eq!(sensor.get_humidity().unwrap_err().kind(), ErrorKind::Transport);
        assert_eq!(sensor.get_elevation().unwrap_err().kind(), ErrorKind::Transport);
    }

    #[test]
    fn full_poll_round_trip() {
        let mut sensor = sensor_with(&[
            (Register::Pid, DEVICE_PID_GRAVITY),
            (Register::Vid, DEVICE_VID),
            (Register::DeviceAddr, 0x0022),
            (Register::Version, 0x1001),
            (Register::Ultraviolet, 1800),
            (Register::Temperature, 512),
            (Register::Humidity, 32_768),
            (Register::Luminous, 0),
            (Register::Pressure, 1015),
        ]);

        assert!(sensor.begin().is_ok());
        assert_eq!(sensor.get_device_pid().unwrap(), DEVICE_PID_GRAVITY);
        assert_eq!(sensor.get_device_vid().unwrap(), DEVICE_VID);

        let m = sensor.read_measurement().unwrap();
        assert!((m.temperature - -43.63).abs() < 1e-3);
        assert_eq!(m.humidity, 50.0);
        assert!((m.ultraviolet - 1.0).abs() < 1e-3);
        assert_eq!(m.luminous, 0.0);
        assert_eq!(m.pressure, 1015.0);
        assert!(m.elevation.abs() < 1e-3);
    }
}
