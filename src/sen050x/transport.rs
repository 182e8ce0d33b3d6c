//! Register transports for the SEN0500/SEN0501.
//!
//! The sensor speaks two protocols: block register reads over I2C and
//! Modbus RTU input-register reads over its UART. Both are folded behind
//! the [`Transport`] trait so the conversion layer never has to know which
//! one is wired up.

use embedded_hal::i2c;
use embedded_io::{Read, ReadExactError, Write};

use super::error::{Error, ErrorKind};
use super::register::Register;

/// Modbus function code used by the UART protocol.
const READ_INPUT_REGISTERS: u8 = 0x04;

/// CRC-16/MODBUS, transmitted low byte first.
const CRC16: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_MODBUS);

/// Raw data returned by one transport read.
///
/// The I2C path hands back the register bytes as they appear on the bus;
/// the UART path hands back already-assembled 16-bit input registers.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSample {
    Bytes(Vec<u8>),
    Words(Vec<u16>),
}

impl RawSample {
    /// Collapse a sample into the single register word every conversion
    /// consumes: big-endian byte pair for I2C, first word for UART. The
    /// second serial word, when present, is discarded.
    pub fn word(&self) -> Result<u16, Error> {
        match self {
            RawSample::Bytes(b) if b.len() >= 2 => Ok(u16::from_be_bytes([b[0], b[1]])),
            RawSample::Words(w) if !w.is_empty() => Ok(w[0]),
            _ => Err(ErrorKind::InvalidResponse.into()),
        }
    }
}

/// One register read primitive. `length` is always a byte count, even
/// though the UART protocol addresses 16-bit registers; the serial
/// implementation halves both the offset and the count on the wire.
pub trait Transport {
    fn read(&mut self, register: Register, length: usize) -> Result<RawSample, Error>;
}

/// Block register reads against a fixed 7-bit peripheral address.
pub struct I2cTransport<I2C> {
    // The concrete I²C device implementation.
    i2c: I2C,

    // Peripheral address
    address: u8,
}

impl<I2C> I2cTransport<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }
}

impl<I2C> Transport for I2cTransport<I2C>
where
    I2C: i2c::I2c,
{
    fn read(&mut self, register: Register, length: usize) -> Result<RawSample, Error> {
        let mut buf = vec![0; length];
        self.i2c
            .write_read(self.address, &[register.address()], &mut buf)
            .map_err(|e| Error::new(ErrorKind::Transport, format!("{e:?}")))?;
        Ok(RawSample::Bytes(buf))
    }
}

/// Modbus RTU master for the sensor's UART interface (9600 baud, 8N1).
///
/// The port is expected to bound the response wait itself; the sensor
/// answers well within one second. A read that runs dry is reported as
/// [`ErrorKind::Timeout`].
pub struct SerialTransport<P> {
    port: P,
    station: u8,
}

impl<P> SerialTransport<P> {
    pub fn new(port: P, station: u8) -> Self {
        Self { port, station }
    }
}

impl<P> SerialTransport<P>
where
    P: Read + Write,
{
    fn request(&mut self, register: u8, count: u16) -> Result<(), Error> {
        let mut frame = [0u8; 8];
        frame[0] = self.station;
        frame[1] = READ_INPUT_REGISTERS;
        frame[2..4].copy_from_slice(&(register as u16).to_be_bytes());
        frame[4..6].copy_from_slice(&count.to_be_bytes());
        let crc = CRC16.checksum(&frame[..6]);
        frame[6..8].copy_from_slice(&crc.to_le_bytes());

        self.port
            .write_all(&frame)
            .map_err(|e| Error::new(ErrorKind::Transport, format!("{e:?}")))?;
        self.port
            .flush()
            .map_err(|e| Error::new(ErrorKind::Transport, format!("{e:?}")))
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        self.port.read_exact(buf).map_err(|e| match e {
            ReadExactError::UnexpectedEof => ErrorKind::Timeout.into(),
            ReadExactError::Other(e) => Error::new(ErrorKind::Transport, format!("{e:?}")),
        })
    }

    fn response(&mut self, count: u16) -> Result<Vec<u16>, Error> {
        let mut head = [0u8; 3];
        self.read_exact(&mut head)?;

        // Exception frames carry the function code with its high bit set,
        // followed by one exception code byte and the CRC.
        if head[1] == (READ_INPUT_REGISTERS | 0x80) {
            let mut crc = [0u8; 2];
            self.read_exact(&mut crc)?;
            if CRC16.checksum(&head) != u16::from_le_bytes(crc) {
                return Err(ErrorKind::InvalidResponse.into());
            }
            return Err(Error::new(
                ErrorKind::InvalidResponse,
                format!("modbus exception {:#04x}", head[2]),
            ));
        }

        if head[0] != self.station
            || head[1] != READ_INPUT_REGISTERS
            || head[2] as usize != count as usize * 2
        {
            return Err(ErrorKind::InvalidResponse.into());
        }

        let mut body = vec![0; head[2] as usize + 2];
        self.read_exact(&mut body)?;

        let (payload, crc) = body.split_at(head[2] as usize);
        let mut digest = CRC16.digest();
        digest.update(&head);
        digest.update(payload);
        if digest.finalize() != u16::from_le_bytes([crc[0], crc[1]]) {
            return Err(ErrorKind::InvalidResponse.into());
        }

        Ok(payload
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect())
    }
}

impl<P> Transport for SerialTransport<P>
where
    P: Read + Write,
{
    fn read(&mut self, register: Register, length: usize) -> Result<RawSample, Error> {
        // The UART protocol addresses 16-bit registers, so the byte-oriented
        // offset and length are halved on the wire.
        let count = (length / 2) as u16;
        self.request(register.address() / 2, count)?;
        Ok(RawSample::Words(self.response(count)?))
    }
}
