use anyhow::Result;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use esp_idf_hal::{
    delay::FreeRtos,
    i2c::{I2cConfig, I2cDriver},
    peripherals::Peripherals,
    prelude::*,
};

pub mod sen050x;

use crate::sen050x::*;

fn main() -> Result<()> {
    // It is necessary to call this function once. Otherwise some patches to the runtime
    // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
    esp_idf_svc::sys::link_patches();

    // Bind the log crate to the ESP Logging facilities
    esp_idf_svc::log::EspLogger::initialize_default();

    let peripherals = Peripherals::take().unwrap();

    let sda = peripherals.pins.gpio21;
    let scl = peripherals.pins.gpio22;

    let config = I2cConfig::new()
        .baudrate(100.kHz().into())
        .timeout(Duration::from_micros(200).into());
    let i2c = I2cDriver::new(peripherals.i2c0, sda, scl, &config)?;

    let mut sensor = Sen050x::new(I2cTransport::new(i2c, DEVICE_ADDRESS));

    // The board can also be polled over its UART interface (9600 baud, 8N1,
    // responses arrive within a second):
    //
    // let uart_config = UartConfig::new().baudrate(Hertz(9_600));
    // let uart = UartDriver::new(peripherals.uart1, tx, rx, Option::<AnyIOPin>::None, Option::<AnyIOPin>::None, &uart_config)?;
    // let mut sensor = Sen050x::new(SerialTransport::new(uart, DEVICE_ADDRESS));

    while let Err(e) = sensor.begin() {
        log::warn!("Sensor initialize failed: {e}");
        FreeRtos.delay_ms(1000u32);
    }

    let board = match sensor.get_device_pid()? {
        DEVICE_PID_GRAVITY => "Gravity",
        DEVICE_PID_BREAKOUT => "Breakout",
        _ => "unknown",
    };
    log::info!(
        "Sensor initialize success: SEN050x {} board, vid {:#06x}",
        board,
        sensor.get_device_vid()?
    );

    loop {
        match sensor.read_measurement() {
            Ok(m) => log::info!("{m}"),
            Err(e) => log::warn!("Read failed: {e}"),
        }

        FreeRtos.delay_ms(1000u32);
    }
}
