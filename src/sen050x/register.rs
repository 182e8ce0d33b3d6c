/// Register map of the SEN0500/SEN0501, byte-addressed as seen on the I2C
/// bus. The UART protocol addresses the same map as 16-bit input registers,
/// so the serial transport halves these offsets on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Register {
    /// Product id, distinguishes the Gravity and Breakout boards.
    Pid = 0x00,
    /// Vendor id, 0x3343 for DFRobot.
    Vid = 0x02,
    /// Reports the configured device address, used for detection.
    DeviceAddr = 0x04,
    /// Sensor hardware revision, selects the UV conversion curve.
    Version = 0x05,
    Ultraviolet = 0x10,
    Luminous = 0x12,
    Temperature = 0x14,
    Humidity = 0x16,
    /// Atmospheric pressure in hPa. Elevation is derived from the same
    /// register through the barometric formula.
    Pressure = 0x18,
}

impl Register {
    pub fn address(&self) -> u8 {
        *self as u8
    }
}
