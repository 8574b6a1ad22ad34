pub mod codec;
pub mod config;

use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_serial::SerialStream;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::error::PtuError;
use crate::protocol::command::PtuCommand;
use crate::protocol::{classify, outcome::Outcome, parse_network_info};
use codec::WireCodec;
use config::TransportConfig;

pub trait Channel: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Channel for T {}

type FramedChannel = Framed<Box<dyn Channel>, WireCodec>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Uninitialized,
    SerialActive,
    SocketActive,
    Closed,
}

// owns whichever channel is active; the serial leg bootstraps the session
// and the socket leg carries it after a one-way handoff
pub struct Transport {
    serial: Option<FramedChannel>,
    socket: Option<FramedChannel>,
    state: TransportState,
    config: TransportConfig,
}

impl Transport {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            serial: None,
            socket: None,
            state: TransportState::Uninitialized,
            config,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn open_serial(&mut self) -> Result<(), PtuError> {
        if self.state != TransportState::Uninitialized {
            return Err(PtuError::TransportUnavailable(
                "serial channel can only open on a fresh session".to_string(),
            ));
        }
        let builder = tokio_serial::new(self.config.serial_port.as_str(), self.config.baud_rate);
        let stream = SerialStream::open(&builder).map_err(|err| {
            PtuError::TransportUnavailable(format!("open {}: {}", self.config.serial_port, err))
        })?;
        self.serial = Some(Framed::new(Box::new(stream) as Box<dyn Channel>, WireCodec));
        self.state = TransportState::SerialActive;
        info!("Serial channel open on {}", self.config.serial_port);
        Ok(())
    }

    // lets simulations and tests supply the serial leg as any duplex stream
    pub fn attach_serial(&mut self, channel: Box<dyn Channel>) -> Result<(), PtuError> {
        if self.state != TransportState::Uninitialized {
            return Err(PtuError::TransportUnavailable(
                "serial channel can only open on a fresh session".to_string(),
            ));
        }
        self.serial = Some(Framed::new(channel, WireCodec));
        self.state = TransportState::SerialActive;
        Ok(())
    }

    pub fn close_serial(&mut self) {
        if self.serial.take().is_some() {
            info!("Serial channel closed");
            if self.state == TransportState::SerialActive {
                self.state = TransportState::Closed;
            }
        }
    }

    pub fn close_socket(&mut self) {
        if self.socket.take().is_some() {
            info!("Socket channel closed");
        }
        if self.state == TransportState::SocketActive {
            self.state = TransportState::Closed;
        }
    }

    // writes the command, waits out the settle delay, then drains whatever
    // the device pushed back and keeps the last line
    pub async fn send_serial(&mut self, command: &str) -> Result<Option<String>, PtuError> {
        let framed = self.serial.as_mut().ok_or_else(|| {
            PtuError::TransportUnavailable("no active serial channel".to_string())
        })?;
        framed.send(command).await?;
        debug!("Sent over serial: {}", command);
        sleep(self.config.serial_settle()).await;

        let mut last = None;
        loop {
            match timeout(self.config.response_timeout(), framed.next()).await {
                Ok(Some(Ok(line))) => {
                    debug!("Serial line: {:?}", line);
                    last = Some(line);
                }
                Ok(Some(Err(err))) => return Err(err.into()),
                Ok(None) => break,
                Err(_) => break,
            }
        }
        Ok(last)
    }

    // queries the device for its network address; failure leaves the serial
    // channel open so the caller can retry
    pub async fn discover_socket_address(&mut self) -> Result<Option<String>, PtuError> {
        let raw = self.send_serial(&PtuCommand::NetworkInfo.render()).await?;
        match classify(raw) {
            Outcome::Success(text) => match parse_network_info(&text) {
                Some(address) => {
                    info!("Discovered device address: {}", address);
                    Ok(Some(address))
                }
                None => {
                    warn!("Network info reply carried no address: {:?}", text);
                    Ok(None)
                }
            },
            outcome => {
                warn!("Network info query failed: {:?}", outcome);
                Ok(None)
            }
        }
    }

    pub async fn open_socket(&mut self, address: &str) -> Result<(), PtuError> {
        if self.socket.is_some() || self.state == TransportState::Closed {
            return Err(PtuError::TransportUnavailable(
                "socket channel already open or session closed".to_string(),
            ));
        }
        let port = self.config.device_port;
        let stream = TcpStream::connect((address, port)).await.map_err(|err| {
            PtuError::TransportUnavailable(format!("connect {}:{}: {}", address, port, err))
        })?;
        let mut framed = Framed::new(Box::new(stream) as Box<dyn Channel>, WireCodec);

        // the device pushes one greeting line on connect
        match timeout(self.config.response_timeout(), framed.next()).await {
            Ok(Some(Ok(greeting))) => info!("Device greeting: {}", greeting),
            Ok(Some(Err(err))) => return Err(err.into()),
            Ok(None) => {
                return Err(PtuError::TransportUnavailable(
                    "socket closed before greeting".to_string(),
                ))
            }
            Err(_) => {
                return Err(PtuError::TransportUnavailable(
                    "no greeting from device".to_string(),
                ))
            }
        }

        self.socket = Some(framed);
        self.state = TransportState::SocketActive;
        self.close_serial();
        info!("Socket channel open to {}:{}", address, port);
        Ok(())
    }

    pub async fn send_socket(&mut self, command: &str) -> Result<Option<String>, PtuError> {
        let window = self.config.response_timeout();
        self.send_socket_timeout(command, window).await
    }

    // a silent device yields None rather than blocking the session
    pub async fn send_socket_timeout(
        &mut self,
        command: &str,
        window: Duration,
    ) -> Result<Option<String>, PtuError> {
        let framed = self.socket.as_mut().ok_or_else(|| {
            PtuError::TransportUnavailable("no active socket channel".to_string())
        })?;
        framed.send(command).await?;
        debug!("Sent over socket: {}", command);
        sleep(self.config.socket_settle()).await;

        match timeout(window, framed.next()).await {
            Ok(Some(Ok(line))) => Ok(Some(line)),
            Ok(Some(Err(err))) => Err(err.into()),
            Ok(None) => Ok(None),
            Err(_) => Ok(None),
        }
    }

    // one bounded read for diagnostics the device may have queued
    pub async fn drain_stale(&mut self) -> Result<Option<String>, PtuError> {
        let framed = self.socket.as_mut().ok_or_else(|| {
            PtuError::TransportUnavailable("no active socket channel".to_string())
        })?;
        match timeout(self.config.drain_timeout(), framed.next()).await {
            Ok(Some(Ok(line))) => Ok(Some(line)),
            Ok(Some(Err(err))) => Err(err.into()),
            Ok(None) => Ok(None),
            Err(_) => Ok(None),
        }
    }
}
