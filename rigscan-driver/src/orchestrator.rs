use crate::config::{CapturePolicy, ScanConfig};
use crate::decoder::decode;
use crate::deferred::{DeferredAction, PendingSlot};
use crate::error::{DecodeError, RigError, ScanError};
use crate::link::Link;
use crate::numeric::{step_angle, step_command};
use crate::projector::PointProjector;
use crate::tokens::{to_motor_token, to_sensor_token, MotorToken, SensorToken};
use crossbeam_channel::{Sender, TrySendError};
use rigscan_data::{
    LinkRole, PointCloud, SampleGrid, ScanEvent, ScanFault, ScanState, ScanStatus,
};
use std::str::FromStr;
use std::time::Instant;

/// Number of steps in a sweep. Always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleCount(u32);

impl SampleCount {
    pub fn new(n_steps: u32) -> Result<SampleCount, ScanError> {
        match n_steps {
            0 => Err(ScanError::InvalidSampleCount(n_steps.to_string())),
            n => Ok(SampleCount(n)),
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for SampleCount {
    type Error = ScanError;

    fn try_from(n_steps: i64) -> Result<Self, Self::Error> {
        let n = u32::try_from(n_steps)
            .map_err(|_| ScanError::InvalidSampleCount(n_steps.to_string()))?;
        SampleCount::new(n)
    }
}

impl FromStr for SampleCount {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: i64 = s
            .trim()
            .parse()
            .map_err(|_| ScanError::InvalidSampleCount(s.to_string()))?;
        SampleCount::try_from(n)
    }
}

/// State of one scan. Replaced by every `begin`.
#[derive(Debug, Default)]
struct ScanSession {
    n_steps: u32,
    step_angle: f64,
    completed_steps: u32,
    last_grid: Option<SampleGrid>,
    projector: PointProjector,
}

impl ScanSession {
    fn new(samples: SampleCount) -> ScanSession {
        ScanSession {
            n_steps: samples.get(),
            step_angle: step_angle(samples.get()),
            ..ScanSession::default()
        }
    }
}

/// Sequences the motor and sensor links through a scan.
///
/// The orchestrator never blocks: call [`tick`](ScanOrchestrator::tick)
/// periodically. Each tick handles at most one line per link, then runs the
/// pending action if it is due. Updates are pushed to the event sender.
pub struct ScanOrchestrator<M: Link, S: Link> {
    motor: M,
    sensor: S,
    config: ScanConfig,
    events: Sender<ScanEvent>,
    state: ScanState,
    session: ScanSession,
    pending: PendingSlot,
}

impl<M: Link, S: Link> ScanOrchestrator<M, S> {
    pub fn new(motor: M, sensor: S, config: ScanConfig, events: Sender<ScanEvent>) -> Self {
        ScanOrchestrator {
            motor,
            sensor,
            config,
            events,
            state: ScanState::Idle,
            session: ScanSession::default(),
            pending: PendingSlot::default(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn status(&self) -> ScanStatus {
        ScanStatus {
            state: self.state,
            completed_steps: self.session.completed_steps,
            total_steps: self.session.n_steps,
        }
    }

    /// Points of the current or last scan.
    pub fn cloud(&self) -> &PointCloud {
        self.session.projector.cloud()
    }

    pub fn last_grid(&self) -> Option<&SampleGrid> {
        self.session.last_grid.as_ref()
    }

    /// Angle increment of the current scan in degrees.
    pub fn step_angle(&self) -> f64 {
        self.session.step_angle
    }

    pub fn has_pending_action(&self) -> bool {
        self.pending.is_pending()
    }

    /// Starts a scan of `samples` steps. Nothing is sent when the count is
    /// not positive. A running scan is superseded.
    pub fn begin(&mut self, samples: i64) -> Result<(), ScanError> {
        let samples = SampleCount::try_from(samples)?;
        self.start(samples);
        Ok(())
    }

    pub fn start(&mut self, samples: SampleCount) {
        if self.state.is_active() {
            log::warn!("Superseding the running scan in {}", self.state);
        }
        self.pending.cancel();
        self.session = ScanSession::new(samples);
        log::info!(
            "Starting scan: {} steps of {:.3} degrees ({:?} capture)",
            self.session.n_steps,
            self.session.step_angle,
            self.config.capture
        );
        if self.send_step() {
            self.set_state(ScanState::Rotating);
        } else if self.state != ScanState::Error {
            self.set_state(ScanState::Error);
        }
    }

    /// Stops the scan without completing it.
    pub fn abort(&mut self) {
        if let Some(action) = self.pending.cancel() {
            log::debug!("Cancelled pending {:?}", action);
        }
        if self.state.is_active() {
            log::info!("Scan aborted in {}", self.state);
        }
        self.set_state(ScanState::Idle);
    }

    pub fn tick(&mut self, now: Instant) {
        match self.motor.poll() {
            Ok(Some(line)) => self.on_motor_line(&line, now),
            Ok(None) => (),
            Err(e) => self.fail_link(LinkRole::Motor, e),
        }
        match self.sensor.poll() {
            Ok(Some(line)) => self.on_sensor_line(&line, now),
            Ok(None) => (),
            Err(e) => self.fail_link(LinkRole::Sensor, e),
        }
        if let Some(action) = self.pending.take_due(now) {
            self.run_deferred(action);
        }
    }

    fn on_motor_line(&mut self, line: &str, now: Instant) {
        log::debug!("RX motor: {}", line);
        let awaiting_reset = self.state == ScanState::Finishing;
        let token = to_motor_token(line, &self.config.protocol, awaiting_reset);
        match (self.state, token) {
            // no step command is in flight while the next one waits in the slot
            (ScanState::Rotating, MotorToken::StepAck)
                if self.pending.action() == Some(DeferredAction::SendStep) =>
            {
                self.unexpected(LinkRole::Motor, line)
            }
            (ScanState::Rotating, MotorToken::StepAck) => self.on_step_ack(now),
            (ScanState::Rotating, MotorToken::Abort) => {
                // a step command still in flight leaves the stage mid-step
                let next = match self.pending.cancel() {
                    Some(_) => ScanState::Idle,
                    None => ScanState::Error,
                };
                self.on_peer_abort(next);
            }
            (ScanState::Measuring | ScanState::Finishing, MotorToken::Abort) => {
                self.pending.cancel();
                self.on_peer_abort(ScanState::Idle);
            }
            (ScanState::Finishing, MotorToken::ResetDone) => self.finish(),
            (_, MotorToken::Other(token)) => self.unexpected(LinkRole::Motor, &token),
            _ => self.unexpected(LinkRole::Motor, line),
        }
    }

    fn on_sensor_line(&mut self, line: &str, now: Instant) {
        log::debug!("RX sensor: {}", line);
        let per_step = self.config.capture == CapturePolicy::PerStep;
        match (self.state, to_sensor_token(line, &self.config.protocol)) {
            (ScanState::Measuring, SensorToken::Data(data)) => self.on_grid_line(&data, now),
            (ScanState::Measuring, SensorToken::MeasureDone) => self.on_measure_done(now),
            (
                ScanState::Rotating | ScanState::Finishing | ScanState::Done,
                SensorToken::MeasureDone,
            ) if per_step => {
                log::trace!("Measurement of step {} done", self.session.completed_steps);
            }
            (_, SensorToken::Other(token)) => self.unexpected(LinkRole::Sensor, &token),
            _ => self.unexpected(LinkRole::Sensor, line),
        }
    }

    fn on_step_ack(&mut self, now: Instant) {
        self.session.completed_steps += 1;
        log::info!(
            "Step {}/{} acknowledged",
            self.session.completed_steps,
            self.session.n_steps
        );
        let timing = &self.config.timing;
        match self.config.capture {
            CapturePolicy::PostSweep => {
                if self.session.completed_steps < self.session.n_steps {
                    self.pending
                        .schedule(now, timing.settle(), DeferredAction::SendStep);
                    self.emit_status();
                    return;
                }
                log::info!("Sweep complete, starting measurement");
                self.session.last_grid = None;
                if self.send_measure_start() {
                    self.set_state(ScanState::Measuring);
                }
            }
            CapturePolicy::PerStep => {
                self.pending
                    .schedule(now, timing.measure_delay(), DeferredAction::StartMeasure);
                self.set_state(ScanState::Measuring);
            }
        }
    }

    fn on_grid_line(&mut self, data: &str, now: Instant) {
        let grid = match decode(data) {
            Ok(grid) => grid,
            Err(DecodeError::WrongCellCount(cells)) => {
                log::warn!("Discarded a grid line with {} cells", cells);
                self.emit(ScanEvent::Error(ScanFault::MalformedGridLine { cells }));
                return;
            }
        };
        let azimuth_center = self.capture_azimuth();
        let added = self
            .session
            .projector
            .project_and_accumulate(&grid, azimuth_center);
        log::info!(
            "Grid at {:.3} degrees: {} returns, cloud has {} points",
            azimuth_center,
            grid.n_returns(),
            self.cloud().len()
        );
        self.session.last_grid = Some(grid.clone());
        self.emit(ScanEvent::GridUpdate(grid));
        if added > 0 {
            self.emit(ScanEvent::PointCloudUpdate(self.cloud().clone()));
        }
        if self.config.capture == CapturePolicy::PerStep {
            self.advance_after_capture(now);
        }
    }

    fn on_measure_done(&mut self, now: Instant) {
        match self.config.capture {
            CapturePolicy::PostSweep => {
                match &self.session.last_grid {
                    Some(grid) => {
                        log::info!("Measurement done, last grid has {} returns", grid.n_returns());
                        self.emit(ScanEvent::PointCloudUpdate(self.cloud().clone()));
                    }
                    None => log::warn!("Measurement done without any grid"),
                }
                self.begin_finishing();
            }
            CapturePolicy::PerStep => {
                log::warn!(
                    "No grid captured at step {}",
                    self.session.completed_steps
                );
                self.advance_after_capture(now);
            }
        }
    }

    /// Azimuth the sensor faced when the current grid was captured.
    fn capture_azimuth(&self) -> f64 {
        let session = &self.session;
        let step_index = match self.config.capture {
            CapturePolicy::PostSweep => session.completed_steps % session.n_steps.max(1),
            CapturePolicy::PerStep => session.completed_steps.saturating_sub(1),
        };
        (step_index as f64) * session.step_angle
    }

    fn advance_after_capture(&mut self, now: Instant) {
        self.pending.cancel();
        if self.session.completed_steps < self.session.n_steps {
            let interval = self.config.timing.step_interval();
            self.pending.schedule(now, interval, DeferredAction::SendStep);
            self.set_state(ScanState::Rotating);
        } else {
            self.begin_finishing();
        }
    }

    fn begin_finishing(&mut self) {
        if !self.config.finishing {
            self.finish();
            return;
        }
        let command = self.config.protocol.reset_command.clone();
        if self.send(LinkRole::Motor, &command) {
            self.set_state(ScanState::Finishing);
        }
    }

    fn finish(&mut self) {
        self.set_state(ScanState::Done);
        log::info!("Scan complete with {} points", self.cloud().len());
        self.emit(ScanEvent::Complete(self.cloud().clone()));
    }

    fn on_peer_abort(&mut self, next: ScanState) {
        log::warn!("Motor aborted the scan in {}", self.state);
        self.emit(ScanEvent::Error(ScanFault::AbortedByPeer));
        self.set_state(next);
    }

    fn unexpected(&mut self, link: LinkRole, line: &str) {
        log::warn!("Ignored {:?} on the {} link in {}", line, link, self.state);
        self.emit(ScanEvent::Error(ScanFault::UnexpectedToken {
            link,
            token: line.to_string(),
        }));
    }

    fn run_deferred(&mut self, action: DeferredAction) {
        match (action, self.state) {
            (DeferredAction::SendStep, ScanState::Rotating) => {
                self.send_step();
            }
            (DeferredAction::StartMeasure, ScanState::Measuring) => {
                self.send_measure_start();
            }
            (action, state) => log::debug!("Dropped {:?} in {}", action, state),
        }
    }

    fn send_step(&mut self) -> bool {
        let command = step_command(self.session.step_angle);
        self.send(LinkRole::Motor, &command)
    }

    fn send_measure_start(&mut self) -> bool {
        let command = self.config.protocol.measure_start.clone();
        self.send(LinkRole::Sensor, &command)
    }

    fn send(&mut self, link: LinkRole, line: &str) -> bool {
        log::debug!("TX {}: {}", link, line);
        let result = match link {
            LinkRole::Motor => self.motor.send(line),
            LinkRole::Sensor => self.sensor.send(line),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                self.fail_link(link, e);
                false
            }
        }
    }

    fn fail_link(&mut self, link: LinkRole, e: RigError) {
        log::error!("The {} link failed: {}", link, e);
        self.emit(ScanEvent::Error(ScanFault::LinkFailure(format!(
            "{} link: {}",
            link, e
        ))));
        if self.state.is_active() {
            self.pending.cancel();
            self.set_state(ScanState::Error);
        }
    }

    fn set_state(&mut self, next: ScanState) {
        if self.state != next {
            log::info!("{} -> {}", self.state, next);
            self.state = next;
        }
        if !next.is_active() {
            self.pending.cancel();
        }
        self.emit_status();
    }

    fn emit_status(&self) {
        self.emit(ScanEvent::Status(self.status()));
    }

    fn emit(&self, event: ScanEvent) {
        match self.events.try_send(event) {
            Ok(()) => (),
            Err(TrySendError::Full(_)) => log::warn!("Event queue is full, dropped an event"),
            Err(TrySendError::Disconnected(_)) => log::trace!("No event receiver"),
        }
    }
}
