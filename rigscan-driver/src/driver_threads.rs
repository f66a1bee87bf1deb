use crate::config::ScanConfig;
use crate::error::RigError;
use crate::link::Link;
use crate::orchestrator::{SampleCount, ScanOrchestrator};
use crate::time::sleep_until;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError};
use rigscan_data::ScanEvent;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Request forwarded to the rig thread.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum RigCommand {
    Begin(SampleCount),
    Abort,
}

/// Handle to the thread that ticks the orchestrator.
///
/// Dropping the handle stops and joins the thread.
pub struct RigThread {
    pub(crate) command_tx: Sender<RigCommand>,
    pub(crate) terminator_tx: Sender<bool>,
    pub(crate) thread: Option<JoinHandle<()>>,
}

impl RigThread {
    /// Starts a scan of `samples` steps. An invalid count is rejected here,
    /// before anything reaches the rig.
    pub fn begin(&self, samples: i64) -> Result<(), RigError> {
        let samples = SampleCount::try_from(samples)?;
        self.send(RigCommand::Begin(samples))
    }

    pub fn abort(&self) -> Result<(), RigError> {
        self.send(RigCommand::Abort)
    }

    fn send(&self, command: RigCommand) -> Result<(), RigError> {
        self.command_tx
            .send(command)
            .map_err(|_| RigError::RigStopped)
    }
}

/// Moves an orchestrator over `motor` and `sensor` onto its own thread.
pub fn spawn_rig<M, S>(
    motor: M,
    sensor: S,
    config: ScanConfig,
) -> Result<(RigThread, Receiver<ScanEvent>), RigError>
where
    M: Link + Send + 'static,
    S: Link + Send + 'static,
{
    if config.timing.tick_ms == 0 {
        return Err(RigError::InvalidConfig("tick_ms must be positive".into()));
    }
    let (event_tx, event_rx) = unbounded();
    let (command_tx, command_rx) = unbounded();
    let (terminator_tx, terminator_rx) = bounded(10);

    let tick = config.timing.tick();
    let orchestrator = ScanOrchestrator::new(motor, sensor, config, event_tx);
    let thread = std::thread::Builder::new()
        .name("rigscan".to_string())
        .spawn(move || run_ticks(orchestrator, command_rx, terminator_rx, tick))?;

    let rig_thread = RigThread {
        command_tx,
        terminator_tx,
        thread: Some(thread),
    };
    Ok((rig_thread, event_rx))
}

pub(crate) fn run_ticks<M: Link, S: Link>(
    mut orchestrator: ScanOrchestrator<M, S>,
    command_rx: Receiver<RigCommand>,
    terminator_rx: Receiver<bool>,
    tick: Duration,
) {
    log::debug!("Rig thread started, ticking every {:?}", tick);
    let mut next_tick = Instant::now();
    while !do_terminate(&terminator_rx) {
        loop {
            match command_rx.try_recv() {
                Ok(RigCommand::Begin(samples)) => orchestrator.start(samples),
                Ok(RigCommand::Abort) => orchestrator.abort(),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }

        orchestrator.tick(Instant::now());

        // a late tick does not make the following ones run back to back
        next_tick = (next_tick + tick).max(Instant::now());
        sleep_until(next_tick);
    }
    if orchestrator.state().is_active() {
        orchestrator.abort();
    }
    log::debug!("Rig thread stopped");
}

pub(crate) fn do_terminate(terminator_rx: &Receiver<bool>) -> bool {
    terminator_rx.try_recv().unwrap_or(false)
}

/// Stops the rig thread and waits for it.
/// This function is automatically called when `rig_thread` is dropped.
pub fn join(rig_thread: &mut RigThread) {
    // the thread may already be gone when its command channel closed
    let _ = rig_thread.terminator_tx.send(true);
    if let Some(thread) = rig_thread.thread.take() {
        if thread.join().is_err() {
            log::error!("The rig thread panicked");
        }
    }
}

impl Drop for RigThread {
    fn drop(&mut self) {
        join(self);
    }
}
