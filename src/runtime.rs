//! The event loop.
//!
//! Every iteration waits for readiness on all input and output descriptors, then runs one tick:
//!
//! 1. dispatch ready descriptors to their devices,
//! 2. remove inputs that failed,
//! 3. re-evaluate all variables,
//! 4. write a frame to every output,
//! 5. let inputs that committed new state reset their per-frame state.
//!
//! Outputs are synced on every iteration, including ones where the wait timed out. An output
//! whose descriptor reports an error is no longer waited on, but still receives frames.

use std::{
    io,
    iter::zip,
    os::fd::{AsRawFd, BorrowedFd},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use crate::{
    device::{InputDevice, PollResult},
    error::Error,
    expr::EvalContext,
    output::OutputDevice,
    registry::{DeviceHandle, DeviceRegistry},
    util,
    variables::Variables,
};

/// How long a single wait may block before the cancellation token is checked again.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10);

/// A flag that asks [`Runtime::run`] to return.
///
/// Clones share the flag. It is only checked between ticks, so setting it from a signal handler
/// is fine.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns the underlying flag, for use with `signal_hook::flag::register`.
    pub fn flag(&self) -> Arc<AtomicBool> {
        self.0.clone()
    }
}

/// Something the runtime waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pollable {
    Input(DeviceHandle),
    /// Index into the runtime's outputs.
    Output(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Readable,
    /// The descriptor reported an error or hangup.
    Failed,
}

/// Owns all devices and drives them.
#[derive(Debug)]
pub struct Runtime {
    registry: DeviceRegistry,
    variables: Variables,
    outputs: Vec<OutputDevice>,
    timeout: Duration,
}

fn pollfd(fd: BorrowedFd<'_>) -> libc::pollfd {
    libc::pollfd {
        fd: fd.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    }
}

impl Runtime {
    pub fn new(registry: DeviceRegistry, variables: Variables, outputs: Vec<OutputDevice>) -> Self {
        Self {
            registry,
            variables,
            outputs,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets how long a wait may block. Defaults to [`DEFAULT_TIMEOUT`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn outputs(&self) -> &[OutputDevice] {
        &self.outputs
    }

    /// Runs until `token` is cancelled.
    ///
    /// Fails only if waiting for readiness fails.
    pub fn run(&mut self, token: &CancellationToken) -> Result<(), Error> {
        log::info!(
            "running with {} inputs and {} outputs",
            self.registry.len(),
            self.outputs.len()
        );
        while !token.is_cancelled() {
            let ready = match self.wait() {
                Ok(ready) => ready,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::io("failed to wait for devices", e)),
            };
            self.tick(&ready);
        }
        log::info!("shutting down");
        Ok(())
    }

    /// Waits until a descriptor is ready or the timeout expires.
    fn wait(&self) -> io::Result<Vec<(Pollable, Readiness)>> {
        let mut pollables = Vec::new();
        let mut fds = Vec::new();
        for handle in self.registry.handles() {
            if let Some(fd) = self.registry.get(handle).and_then(|dev| dev.as_fd()) {
                pollables.push(Pollable::Input(handle));
                fds.push(pollfd(fd));
            }
        }
        for (index, output) in self.outputs.iter().enumerate() {
            if let Some(fd) = output.as_fd() {
                pollables.push(Pollable::Output(index));
                fds.push(pollfd(fd));
            }
        }

        if util::poll(&mut fds, self.timeout)? == 0 {
            return Ok(Vec::new());
        }
        Ok(zip(pollables, fds)
            .filter_map(|(pollable, fd)| {
                if fd.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
                    Some((pollable, Readiness::Failed))
                } else if fd.revents & libc::POLLIN != 0 {
                    Some((pollable, Readiness::Readable))
                } else {
                    None
                }
            })
            .collect())
    }

    /// Processes one round of readiness notifications.
    pub fn tick(&mut self, ready: &[(Pollable, Readiness)]) {
        let mut removed = Vec::new();
        let mut synced = Vec::new();
        for &(pollable, readiness) in ready {
            match pollable {
                Pollable::Input(handle) => {
                    if readiness == Readiness::Failed {
                        removed.push(handle);
                        continue;
                    }
                    let Some(device) = self.registry.get_mut(handle) else {
                        continue;
                    };
                    match device.on_poll() {
                        PollResult::None => {}
                        PollResult::Error => removed.push(handle),
                        PollResult::Sync => synced.push(handle),
                    }
                }
                Pollable::Output(index) => {
                    let Some(output) = self.outputs.get_mut(index) else {
                        continue;
                    };
                    if readiness == Readiness::Failed {
                        if output.mark_failed() {
                            log::warn!(
                                "output '{}': descriptor error, no longer handling force-feedback \
                                 requests",
                                output.mapping().name()
                            );
                        }
                        continue;
                    }
                    if let Err(e) = output.on_poll(&mut self.registry) {
                        log::error!(
                            "output '{}': failed to handle requests: {e}",
                            output.mapping().name()
                        );
                    }
                }
            }
        }

        for handle in removed {
            if let Some(device) = self.registry.remove(handle) {
                log::warn!("input '{}' failed and was removed", device.name());
            }
        }

        self.variables.evaluate(&self.registry);

        let ctx = EvalContext {
            registry: &self.registry,
            variables: self.variables.values(),
        };
        for output in &self.outputs {
            if let Err(e) = output.sync(&ctx) {
                log::error!(
                    "output '{}': failed to write events: {e}",
                    output.mapping().name()
                );
            }
        }

        for handle in synced {
            if let Some(device) = self.registry.get_mut(handle) {
                device.flush();
            }
        }
    }
}
