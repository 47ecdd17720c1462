//! Native Serial Port Transport
//!
//! Opens the OS serial driver through `tokio-serial` (termios on Unix,
//! the comm API on Windows) in raw 8N1 mode with a short read timeout.

use crate::error::TransportError;
use crate::transport::{Connector, LinkSettings, ReadOutcome, Transport};
use std::io::{self, Read, Write};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info, warn};

/// Connector for real serial hardware
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    fn open(
        &self,
        port: &str,
        settings: &LinkSettings,
    ) -> Result<Box<dyn Transport>, TransportError> {
        Ok(Box::new(SerialTransport::open(port, settings)?))
    }
}

/// Serial port opened in raw 8N1 mode
pub struct SerialTransport {
    /// Name as given by the user (e.g. "COM3" or "/dev/ttyUSB0")
    name: String,
    port: Option<Box<dyn SerialPort>>,
    rtscts: bool,
}

impl SerialTransport {
    /// Open `name` with the given settings
    pub fn open(name: &str, settings: &LinkSettings) -> Result<Self, TransportError> {
        if settings.baud_rate == 0 {
            return Err(TransportError::InvalidBaudRate(settings.baud_rate));
        }

        // serialport's Windows backend adds the `\\.\` device prefix itself,
        // so COM10 and above open by their plain name
        debug!("Opening serial device {}", name);

        let port = tokio_serial::new(name, settings.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(flow_control_mode(settings.flow_control))
            .timeout(settings.read_timeout)
            .open()
            .map_err(|e| TransportError::OpenFailed {
                port: name.to_string(),
                reason: e.to_string(),
            })?;

        info!(
            "Opened {} @ {} 8N1 (rtscts={})",
            name, settings.baud_rate, settings.flow_control
        );

        Ok(Self {
            name: name.to_string(),
            port: Some(port),
            rtscts: settings.flow_control,
        })
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        self.port.as_mut().ok_or(TransportError::NotOpen)
    }
}

impl Transport for SerialTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError> {
        match self.port_mut()?.read(buf) {
            Ok(0) => Ok(ReadOutcome::Timeout),
            Ok(n) => Ok(ReadOutcome::Data(n)),
            Err(e) if is_timeout(&e) => Ok(ReadOutcome::Timeout),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        if data.is_empty() {
            return Ok(0);
        }
        Ok(self.port_mut()?.write(data)?)
    }

    fn set_flow_control(&mut self, enabled: bool) -> Result<(), TransportError> {
        let name = self.name.clone();
        self.port_mut()?
            .set_flow_control(flow_control_mode(enabled))
            .map_err(|e| {
                warn!("Setting RTS/CTS on {} failed: {}", name, e);
                TransportError::FlowControlUnsupported(name)
            })?;
        self.rtscts = enabled;
        Ok(())
    }

    fn flow_control(&self) -> bool {
        self.rtscts
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn try_clone(&self) -> Result<Box<dyn Transport>, TransportError> {
        let port = self
            .port
            .as_ref()
            .ok_or(TransportError::NotOpen)?
            .try_clone()
            .map_err(|e| TransportError::Io(e.into()))?;
        Ok(Box::new(Self {
            name: self.name.clone(),
            port: Some(port),
            rtscts: self.rtscts,
        }))
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!("Closed {}", self.name);
        }
    }
}

/// Names of the serial ports the OS currently reports
pub fn available_ports() -> Result<Vec<String>, TransportError> {
    let ports = tokio_serial::available_ports()
        .map_err(|e| TransportError::Io(io::Error::new(io::ErrorKind::Other, e.to_string())))?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

fn flow_control_mode(enabled: bool) -> FlowControl {
    if enabled {
        FlowControl::Hardware
    } else {
        FlowControl::None
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
