use anyhow::Result;
use pantrack::{
    config::AppConfig,
    control::ControlLoop,
    perception::{BoundingBox, Observation, Perception, PerceptionSource},
    ptu::{device_state::Axis, PtuDriver},
    transport::Transport,
};
use std::time::Duration;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info};

// Serial side of the mock unit: answers the discovery command with the
// address of the socket listener
async fn serial_device(mut device: DuplexStream) -> Result<()> {
    let mut buf = [0u8; 64];
    loop {
        let n = match device.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(_) => break,
        };
        let command = String::from_utf8_lossy(&buf[..n]).trim_end().to_string();
        if command == "NI" {
            device.write_all(b"NI * IP: 127.0.0.1\r\n").await?;
        } else {
            let reply = format!("{} *\r\n", command);
            device.write_all(reply.as_bytes()).await?;
        }
    }
    Ok(())
}

// Socket side of the mock unit: greets once, acknowledges every command and
// keeps a running pan/tilt position
async fn socket_device(listener: TcpListener) -> Result<()> {
    let (mut stream, peer) = listener.accept().await?;
    info!("Mock PTU accepted connection from {}", peer);
    stream.write_all(b"* PTU-5 ready\r\n").await?;

    let mut pan: i32 = 0;
    let mut tilt: i32 = 0;
    let mut buf = [0u8; 64];
    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(_) => break,
        };
        let command = String::from_utf8_lossy(&buf[..n]).trim_end().to_string();
        apply_command(&command, &mut pan, &mut tilt);
        let reply = format!("{} *\r\n", command);
        if stream.write_all(reply.as_bytes()).await.is_err() {
            break;
        }
    }
    info!("Mock PTU session closed at pan {}, tilt {}", pan, tilt);
    Ok(())
}

fn apply_command(command: &str, pan: &mut i32, tilt: &mut i32) {
    if let Some(value) = command.strip_prefix("PP").and_then(|v| v.parse::<i32>().ok()) {
        *pan = value;
    } else if let Some(value) = command.strip_prefix("TP").and_then(|v| v.parse::<i32>().ok()) {
        *tilt = value;
    } else if let Some(value) = command.strip_prefix("PO").and_then(|v| v.parse::<i32>().ok()) {
        *pan += value;
    } else if let Some(value) = command.strip_prefix("TO").and_then(|v| v.parse::<i32>().ok()) {
        *tilt += value;
    } else if command == "RP" {
        *pan = 0;
    } else if command == "RT" {
        *tilt = 0;
    }
}

// Synthetic target that starts off-center and drifts toward the middle of
// the frame, with one dropped detection along the way
struct DriftingTarget {
    position: (f64, f64),
    frames_left: u32,
    frame_delay: Duration,
}

#[async_trait::async_trait]
impl PerceptionSource for DriftingTarget {
    async fn next_observation(&mut self) -> Result<Perception> {
        if self.frames_left == 0 {
            return Ok(Perception::EndOfStream);
        }
        self.frames_left -= 1;
        tokio::time::sleep(self.frame_delay).await;

        if self.frames_left == 12 {
            return Ok(Perception::Absent);
        }

        self.position.0 += (320.0 - self.position.0) * 0.25;
        self.position.1 += (240.0 - self.position.1) * 0.25;
        let region = BoundingBox::from_xywh(
            self.position.0 - 20.0,
            self.position.1 - 20.0,
            40.0,
            40.0,
        );
        Ok(Perception::Object(
            Observation::new(region)
                .with_confidence(0.9)
                .with_label("target"),
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("Starting pantrack demo against a mock PTU");

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        if let Err(e) = socket_device(listener).await {
            error!("Mock PTU socket failed: {}", e);
        }
    });

    let (host, device) = duplex(256);
    tokio::spawn(async move {
        if let Err(e) = serial_device(device).await {
            error!("Mock PTU serial failed: {}", e);
        }
    });

    let mut config = AppConfig::default();
    config.transport.device_port = port;

    let mut transport = Transport::new(config.transport.clone());
    transport.attach_serial(Box::new(host))?;

    let driver = PtuDriver::bootstrap(transport, config.driver.clone()).await?;
    info!("Bootstrap complete, unit homed");

    let source = DriftingTarget {
        position: (560.0, 130.0),
        frames_left: 20,
        frame_delay: Duration::from_millis(50),
    };
    let mut control = ControlLoop::new(driver, Box::new(source), config.control.clone());

    let mut status_rx = control.status();
    tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let status = status_rx.borrow().clone();
            info!(
                "Loop {:?}: {} frames, {} commands",
                status.state, status.frames_processed, status.commands_issued
            );
        }
    });

    let (quit_tx, quit_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = quit_tx.send(());
        }
    });

    control.run(quit_rx).await?;

    info!(
        "Final commanded position: pan {}, tilt {}",
        control.driver().commanded_position(Axis::Pan),
        control.driver().commanded_position(Axis::Tilt),
    );
    info!("Demo complete");

    Ok(())
}
