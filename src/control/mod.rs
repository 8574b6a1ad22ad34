pub mod config;
pub mod pid;
pub mod status;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::perception::{Observation, Perception, PerceptionSource};
use crate::ptu::device_state::Axis;
use crate::ptu::PtuDriver;
use config::ControlConfig;
use pid::PidController;
use status::{LoopState, LoopStatus};

#[derive(Debug, Clone, Copy)]
struct FrameCommand {
    pan_degrees: Option<f64>,
    tilt_degrees: Option<f64>,
    error: (f64, f64),
}

pub struct ControlLoop {
    driver: PtuDriver,
    source: Box<dyn PerceptionSource>,
    config: ControlConfig,
    pan_pid: PidController,
    tilt_pid: PidController,
    state: LoopState,
    track_id: Option<Uuid>,
    status_tx: watch::Sender<LoopStatus>,
    frames_processed: u64,
    commands_issued: u64,
    last_error: Option<(f64, f64)>,
    started_at: DateTime<Utc>,
}

impl ControlLoop {
    pub fn new(
        driver: PtuDriver,
        source: Box<dyn PerceptionSource>,
        config: ControlConfig,
    ) -> Self {
        let (status_tx, _) = watch::channel(LoopStatus::idle());
        let pan_pid = PidController::new(config.pan_gains);
        let tilt_pid = PidController::new(config.tilt_gains);
        Self {
            driver,
            source,
            config,
            pan_pid,
            tilt_pid,
            state: LoopState::Idle,
            track_id: None,
            status_tx,
            frames_processed: 0,
            commands_issued: 0,
            last_error: None,
            started_at: Utc::now(),
        }
    }

    pub fn status(&self) -> watch::Receiver<LoopStatus> {
        self.status_tx.subscribe()
    }

    pub fn driver(&self) -> &PtuDriver {
        &self.driver
    }

    // servos until the source ends, the quit signal fires or the transport
    // dies; the unit is parked on every exit path
    pub async fn run(&mut self, mut quit: broadcast::Receiver<()>) -> Result<()> {
        self.started_at = Utc::now();
        self.transition(LoopState::Acquiring);
        self.publish();
        info!("Control loop started");

        let outcome = self.drive(&mut quit).await;

        if let Err(err) = self.driver.park().await {
            warn!("Parking failed: {}", err);
        }
        self.transition(LoopState::Idle);
        self.publish();
        info!("Control loop stopped");
        outcome
    }

    async fn drive(&mut self, quit: &mut broadcast::Receiver<()>) -> Result<()> {
        loop {
            tokio::select! {
                _ = quit.recv() => {
                    info!("Quit signal received");
                    return Ok(());
                }
                observed = self.source.next_observation() => {
                    match observed {
                        Ok(Perception::Object(observation)) => {
                            self.frames_processed += 1;
                            self.handle_object(observation).await?;
                        }
                        Ok(Perception::Absent) => {
                            self.frames_processed += 1;
                            self.handle_absence();
                        }
                        Ok(Perception::EndOfStream) => {
                            info!("Perception source exhausted");
                            return Ok(());
                        }
                        Err(err) => {
                            error!("Perception source failed: {}", err);
                            return Err(err);
                        }
                    }
                    self.publish();
                }
            }
        }
    }

    async fn handle_object(&mut self, observation: Observation) -> Result<()> {
        match self.state {
            LoopState::Tracking => {}
            LoopState::Lost => {
                if let Some(id) = self.track_id {
                    info!("Reacquired track {}", id);
                }
                self.transition(LoopState::Tracking);
            }
            _ => {
                let id = Uuid::new_v4();
                info!(
                    "Acquired track {} ({})",
                    id,
                    observation.label.as_deref().unwrap_or("object")
                );
                self.track_id = Some(id);
                self.transition(LoopState::Tracking);
            }
        }

        let command = self.plan_frame(observation.bounding_box.center());
        debug!(
            "Frame error ({}, {}), pan {:?}, tilt {:?}",
            command.error.0, command.error.1, command.pan_degrees, command.tilt_degrees
        );

        if let Some(degrees) = command.pan_degrees {
            let state = self.driver.move_axis_by_degrees(Axis::Pan, degrees).await?;
            self.commands_issued += 1;
            if !state.success {
                warn!("Pan correction of {} degrees failed", degrees);
            }
        }
        if let Some(degrees) = command.tilt_degrees {
            let state = self.driver.move_axis_by_degrees(Axis::Tilt, degrees).await?;
            self.commands_issued += 1;
            if !state.success {
                warn!("Tilt correction of {} degrees failed", degrees);
            }
        }

        self.last_error = Some(command.error);
        Ok(())
    }

    fn handle_absence(&mut self) {
        if self.state == LoopState::Tracking {
            if let Some(id) = self.track_id {
                warn!("Track {} lost", id);
            }
            self.transition(LoopState::Lost);
            if self.config.reset_on_loss {
                self.pan_pid.reset();
                self.tilt_pid.reset();
            }
        }
    }

    // controller state advances on every observed frame; the dead-zone only
    // gates whether a command goes out
    fn plan_frame(&mut self, object_center: (f64, f64)) -> FrameCommand {
        let (center_x, center_y) = self.config.frame.center();
        let error_x = object_center.0 - center_x;
        // image rows grow downward while tilt grows upward
        let error_y = center_y - object_center.1;

        let pan_output = self.pan_pid.update(error_x);
        let tilt_output = self.tilt_pid.update(error_y);

        let pan_degrees = if error_x * error_x > self.config.dead_zone {
            Some(pan_output)
        } else {
            None
        };
        let tilt_degrees = if error_y * error_y > self.config.dead_zone {
            Some(-tilt_output)
        } else {
            None
        };

        FrameCommand {
            pan_degrees,
            tilt_degrees,
            error: (error_x, error_y),
        }
    }

    fn transition(&mut self, next: LoopState) {
        if self.state != next {
            debug!("Loop state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn publish(&self) {
        let _ = self.status_tx.send(LoopStatus {
            state: self.state,
            track_id: self.track_id,
            frames_processed: self.frames_processed,
            commands_issued: self.commands_issued,
            last_error: self.last_error,
            started_at: self.started_at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::pid::PidGains;
    use crate::perception::BoundingBox;
    use crate::ptu::config::DriverConfig;
    use crate::transport::config::TransportConfig;
    use crate::transport::{Transport, TransportState};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    struct ScriptedSource {
        frames: VecDeque<Perception>,
    }

    #[async_trait::async_trait]
    impl PerceptionSource for ScriptedSource {
        async fn next_observation(&mut self) -> Result<Perception> {
            Ok(self.frames.pop_front().unwrap_or(Perception::EndOfStream))
        }
    }

    struct StallSource {
        sent: bool,
    }

    #[async_trait::async_trait]
    impl PerceptionSource for StallSource {
        async fn next_observation(&mut self) -> Result<Perception> {
            if !self.sent {
                self.sent = true;
                return Ok(Perception::Object(Observation::new(
                    BoundingBox::from_xywh(301.0, 221.0, 40.0, 40.0),
                )));
            }
            std::future::pending().await
        }
    }

    fn test_transport_config(device_port: u16) -> TransportConfig {
        TransportConfig {
            device_port,
            serial_settle_ms: 1,
            socket_settle_ms: 1,
            response_timeout_ms: 50,
            drain_timeout_ms: 50,
            ..TransportConfig::default()
        }
    }

    fn test_driver_config() -> DriverConfig {
        DriverConfig {
            mode_settle_ms: 1,
            reset_settle_ms: 1,
            ..DriverConfig::default()
        }
    }

    fn idle_control_with(config: ControlConfig) -> ControlLoop {
        let transport = Transport::new(test_transport_config(4000));
        let driver = PtuDriver::new(transport, test_driver_config());
        let source = ScriptedSource {
            frames: VecDeque::new(),
        };
        ControlLoop::new(driver, Box::new(source), config)
    }

    fn idle_control() -> ControlLoop {
        idle_control_with(ControlConfig::default())
    }

    async fn ack_device(listener: TcpListener, log: Arc<Mutex<Vec<String>>>) {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(b"* ready\r\n").await.unwrap();
        let mut buf = [0u8; 64];
        loop {
            let n = match stream.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(_) => break,
            };
            let command = String::from_utf8_lossy(&buf[..n]).trim_end().to_string();
            log.lock().unwrap().push(command.clone());
            let reply = format!("{} *\r\n", command);
            if stream.write_all(reply.as_bytes()).await.is_err() {
                break;
            }
        }
    }

    async fn connected_control(
        source: Box<dyn PerceptionSource>,
        log: Arc<Mutex<Vec<String>>>,
    ) -> ControlLoop {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(ack_device(listener, log));

        let mut transport = Transport::new(test_transport_config(port));
        transport.open_socket("127.0.0.1").await.unwrap();
        let driver = PtuDriver::new(transport, test_driver_config());
        ControlLoop::new(driver, source, ControlConfig::default())
    }

    #[test]
    fn test_plan_blocks_moves_inside_dead_zone() {
        let mut control = idle_control();
        // nine pixels off center on both axes
        let command = control.plan_frame((329.0, 231.0));
        assert_eq!(command.error, (9.0, 9.0));
        assert_eq!(command.pan_degrees, None);
        assert_eq!(command.tilt_degrees, None);
    }

    #[test]
    fn test_plan_blocks_error_exactly_at_threshold() {
        let mut control = idle_control();
        // squared error of exactly 100 does not clear the dead-zone
        let command = control.plan_frame((330.0, 240.0));
        assert_eq!(command.error, (10.0, 0.0));
        assert_eq!(command.pan_degrees, None);
        assert_eq!(command.tilt_degrees, None);
    }

    #[test]
    fn test_plan_issues_moves_outside_dead_zone() {
        let mut control = idle_control();
        let command = control.plan_frame((331.0, 229.0));
        assert_eq!(command.error, (11.0, 11.0));
        assert_eq!(command.pan_degrees, Some(0.22));
        // tilt command is negated so positive image error tips the unit up
        assert_eq!(command.tilt_degrees, Some(-0.22));
    }

    #[test]
    fn test_plan_reference_gain_output() {
        let mut control = idle_control();
        let command = control.plan_frame((370.0, 240.0));
        assert_eq!(command.error, (50.0, 0.0));
        assert_eq!(command.pan_degrees, Some(1.0));
        assert_eq!(command.tilt_degrees, None);
    }

    #[test]
    fn test_controller_state_advances_on_dead_zoned_frames() {
        let mut config = ControlConfig::default();
        config.pan_gains = PidGains {
            kp: 0.0,
            ki: 0.1,
            kd: 0.0,
            integral_limit: None,
        };
        let mut control = idle_control_with(config);

        // nine pixels off center: held by the dead-zone, still accumulated
        let held = control.plan_frame((329.0, 240.0));
        assert_eq!(held.pan_degrees, None);

        // integral carries 9 + 30; a fresh 30-pixel error alone would give 3.0
        let command = control.plan_frame((350.0, 240.0));
        assert_eq!(command.pan_degrees, Some(3.9));
    }

    #[tokio::test]
    async fn test_acquire_and_reacquire_keep_track_identity() {
        let mut control = idle_control();
        assert_eq!(control.state, LoopState::Idle);

        let near_center = Observation::new(BoundingBox::from_xywh(301.0, 221.0, 40.0, 40.0));
        control.handle_object(near_center.clone()).await.unwrap();
        assert_eq!(control.state, LoopState::Tracking);
        let first_id = control.track_id.unwrap();

        control.handle_absence();
        assert_eq!(control.state, LoopState::Lost);

        control.handle_object(near_center).await.unwrap();
        assert_eq!(control.state, LoopState::Tracking);
        assert_eq!(control.track_id.unwrap(), first_id);
    }

    #[tokio::test]
    async fn test_loop_servos_until_stream_ends() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let frames = VecDeque::from(vec![
            // object up-right of center: pan right, tilt up
            Perception::Object(Observation::new(BoundingBox::from_xywh(
                500.0, 100.0, 40.0, 40.0,
            ))),
            // near center: inside the dead-zone, no commands
            Perception::Object(Observation::new(BoundingBox::from_xywh(
                302.0, 222.0, 40.0, 40.0,
            ))),
        ]);
        let source = ScriptedSource { frames };
        let mut control = connected_control(Box::new(source), log.clone()).await;
        let status_rx = control.status();

        let (_quit_tx, quit_rx) = broadcast::channel(1);
        control.run(quit_rx).await.unwrap();

        let commands = log.lock().unwrap().clone();
        assert_eq!(commands, vec!["PO200", "TO-120", "PP0", "TP0"]);

        let status = status_rx.borrow().clone();
        assert_eq!(status.state, LoopState::Idle);
        assert_eq!(status.frames_processed, 2);
        assert_eq!(status.commands_issued, 2);
        assert!(status.track_id.is_some());
    }

    #[tokio::test]
    async fn test_quit_parks_unit() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let source = StallSource { sent: false };
        let mut control = connected_control(Box::new(source), log.clone()).await;

        let (quit_tx, quit_rx) = broadcast::channel(1);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = quit_tx.send(());
        });

        control.run(quit_rx).await.unwrap();

        let commands = log.lock().unwrap().clone();
        assert_eq!(commands, vec!["PP0", "TP0"]);
        assert_eq!(control.driver().transport().state(), TransportState::Closed);
    }
}
