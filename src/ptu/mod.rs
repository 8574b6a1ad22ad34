pub mod config;
pub mod device_state;
pub mod execution;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::PtuError;
use crate::protocol::command::PtuCommand;
use crate::protocol::{classify, outcome::Outcome};
use crate::transport::Transport;
use config::DriverConfig;
use device_state::{Axis, AxisSelection, DeviceState, StepMode};
use execution::{ExecutionState, ExecutionTracker};

pub struct PtuDriver {
    transport: Transport,
    state: DeviceState,
    tracker: ExecutionTracker,
    config: DriverConfig,
}

impl PtuDriver {
    pub fn new(transport: Transport, config: DriverConfig) -> Self {
        Self {
            transport,
            state: DeviceState::new(),
            tracker: ExecutionTracker::new(),
            config,
        }
    }

    // discovers the device address over serial, hands the session off to the
    // socket, configures the step mode and homes both axes
    pub async fn bootstrap(
        mut transport: Transport,
        config: DriverConfig,
    ) -> Result<Self, PtuError> {
        let address = transport
            .discover_socket_address()
            .await?
            .ok_or(PtuError::DiscoveryFailed)?;
        transport.open_socket(&address).await?;

        let mode = config.step_mode;
        let mut driver = Self::new(transport, config);
        driver.set_step_mode(mode).await?;
        driver.move_axis_to_degrees(Axis::Pan, 0.0).await?;
        driver.move_axis_to_degrees(Axis::Tilt, 0.0).await?;
        info!("Driver ready");
        Ok(driver)
    }

    pub fn device_state(&self) -> &DeviceState {
        &self.state
    }

    pub fn commanded_position(&self, axis: Axis) -> i32 {
        self.state.position(axis)
    }

    pub fn execution(&self) -> &ExecutionTracker {
        &self.tracker
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub async fn execute(&mut self, command: PtuCommand) -> Result<ExecutionState, PtuError> {
        let wire = command.render();
        let raw = self.transport.send_socket(&wire).await?;
        let (state, _) = self.process_response(&wire, raw).await?;
        Ok(state)
    }

    // for callers that treat a device refusal as fatal
    pub async fn execute_strict(&mut self, command: PtuCommand) -> Result<String, PtuError> {
        let wire = command.render();
        let raw = self.transport.send_socket(&wire).await?;
        let (_, outcome) = self.process_response(&wire, raw).await?;
        match outcome {
            Outcome::Success(text) => Ok(text),
            Outcome::Failure => Err(PtuError::CommandFailed(wire)),
            Outcome::NoResponse => Err(PtuError::NoResponse),
        }
    }

    async fn process_response(
        &mut self,
        wire: &str,
        raw: Option<String>,
    ) -> Result<(ExecutionState, Outcome), PtuError> {
        if let Some(text) = raw.as_deref() {
            debug!("Device replied to {}: {:?}", wire, text);
        }
        let outcome = classify(raw);
        let state = self.tracker.record(&outcome);
        if !state.success {
            warn!("Command {} failed: {:?}", wire, outcome);
            if state.first_failure {
                match self.transport.drain_stale().await? {
                    Some(stale) => info!("Stale device output: {:?}", stale),
                    None => warn!("No diagnostic output within the drain window"),
                }
            }
        }
        Ok((state, outcome))
    }

    pub async fn move_axis_to(
        &mut self,
        axis: Axis,
        position: i32,
    ) -> Result<ExecutionState, PtuError> {
        let state = self.execute(PtuCommand::MoveTo(axis, position)).await?;
        if state.success {
            self.state.set_position(axis, position);
        }
        Ok(state)
    }

    pub async fn move_axis_by(
        &mut self,
        axis: Axis,
        positions: i32,
    ) -> Result<ExecutionState, PtuError> {
        let state = self.execute(PtuCommand::MoveBy(axis, positions)).await?;
        if state.success {
            self.state.offset_position(axis, positions);
        }
        Ok(state)
    }

    pub async fn move_axis_to_degrees(
        &mut self,
        axis: Axis,
        angle: f64,
    ) -> Result<ExecutionState, PtuError> {
        let position = self.state.degrees_to_steps(angle);
        self.move_axis_to(axis, position).await
    }

    pub async fn move_axis_by_degrees(
        &mut self,
        axis: Axis,
        angle: f64,
    ) -> Result<ExecutionState, PtuError> {
        let positions = self.state.degrees_to_steps(angle);
        self.move_axis_by(axis, positions).await
    }

    // per-axis mode commands with a settle pause between them, then a full
    // reset before the new resolution takes effect
    pub async fn set_step_mode(&mut self, mode: StepMode) -> Result<ExecutionState, PtuError> {
        info!("Configuring {:?} step mode", mode);
        let pan = self
            .execute(PtuCommand::SetStepMode(Axis::Pan, mode))
            .await?;
        sleep(self.config.mode_settle()).await;
        let tilt = self
            .execute(PtuCommand::SetStepMode(Axis::Tilt, mode))
            .await?;
        sleep(self.config.mode_settle()).await;
        let reset = self.reset_axes(AxisSelection::both()).await?;
        self.state.set_step_mode(mode);
        Ok(pan.merge(tilt).merge(reset))
    }

    pub async fn reset_axes(
        &mut self,
        selection: AxisSelection,
    ) -> Result<ExecutionState, PtuError> {
        if selection.is_empty() {
            return Err(PtuError::InvalidAxisSelection);
        }
        let mut result = ExecutionState {
            success: true,
            first_failure: false,
        };
        if selection.pan {
            let state = self.execute(PtuCommand::Reset(Axis::Pan)).await?;
            if state.success {
                self.state.set_position(Axis::Pan, 0);
            }
            result = result.merge(state);
            sleep(self.config.reset_settle()).await;
        }
        if selection.tilt {
            let state = self.execute(PtuCommand::Reset(Axis::Tilt)).await?;
            if state.success {
                self.state.set_position(Axis::Tilt, 0);
            }
            result = result.merge(state);
            sleep(self.config.reset_settle()).await;
        }
        Ok(result)
    }

    // completion can legitimately take seconds, so it gets a wider window
    pub async fn await_completion(&mut self) -> Result<ExecutionState, PtuError> {
        let wire = PtuCommand::Await.render();
        let raw = self
            .transport
            .send_socket_timeout(&wire, self.config.await_timeout())
            .await?;
        let (state, _) = self.process_response(&wire, raw).await?;
        Ok(state)
    }

    // homes both axes and releases the transport
    pub async fn park(&mut self) -> Result<(), PtuError> {
        info!("Parking unit at home position");
        self.move_axis_to(Axis::Pan, 0).await?;
        self.move_axis_to(Axis::Tilt, 0).await?;
        self.transport.close_socket();
        Ok(())
    }
}
