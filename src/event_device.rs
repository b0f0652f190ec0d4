//! Physical input devices backed by `/dev/input/event*`.

use std::{
    collections::HashMap,
    io, mem,
    os::fd::{AsFd, BorrowedFd},
};

use crate::{
    AbsInfo, Evdev,
    bits::BitSet,
    config::Section,
    device::{ChannelId, ChannelType, InputDevice, PollResult},
    enumerate::Selector,
    error::Error,
    event::{EventType, InputEvent, Syn},
    evdev::{KEY_MAX, REL_MAX},
    ff::{Effect, EffectId},
};

/// Number of events read per `read(2)`.
const READ_SIZE: usize = 64;

/// What ingesting an event did to a [`DeviceState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ingest {
    /// The event was staged (or discarded); the committed state is unchanged.
    Pending,
    /// A frame was committed.
    Commit,
    /// Events were lost; the state has to be fetched from the kernel.
    Resync,
}

/// Committed key and axis state, plus the frame being received.
#[derive(Debug)]
struct DeviceState {
    keys: BitSet,
    abs: HashMap<u16, AbsInfo>,
    /// Motion accumulated since the last flush.
    rel: HashMap<u16, i32>,
    pending: Vec<InputEvent>,
    /// Set by `SYN_DROPPED`; everything up to the next `SYN_REPORT` is discarded.
    discarding: bool,
}

impl DeviceState {
    fn new(keys: BitSet, abs: HashMap<u16, AbsInfo>) -> Self {
        Self {
            keys,
            abs,
            rel: HashMap::new(),
            pending: Vec::new(),
            discarding: false,
        }
    }

    fn ingest(&mut self, event: InputEvent) -> Ingest {
        match event.syn() {
            Some(Syn::REPORT) => {
                if mem::take(&mut self.discarding) {
                    self.pending.clear();
                    return Ingest::Resync;
                }
                if self.pending.is_empty() {
                    return Ingest::Pending;
                }
                let mut pending = mem::take(&mut self.pending);
                for event in pending.drain(..) {
                    self.apply(event);
                }
                self.pending = pending;
                Ingest::Commit
            }
            Some(Syn::DROPPED) => {
                log::debug!("SYN_DROPPED: events were lost, discarding until the next report");
                self.pending.clear();
                self.discarding = true;
                Ingest::Pending
            }
            Some(_) => Ingest::Pending,
            None => {
                if !self.discarding {
                    self.pending.push(event);
                }
                Ingest::Pending
            }
        }
    }

    fn apply(&mut self, event: InputEvent) {
        let code = event.raw_code();
        let value = event.raw_value();
        match event.event_type() {
            EventType::KEY if code <= self.keys.max() => {
                // 0 = released, 1 = pressed, 2 = autorepeat
                if value == 0 {
                    self.keys.remove(code);
                } else {
                    self.keys.insert(code);
                }
            }
            EventType::REL if code <= REL_MAX => {
                let acc = self.rel.entry(code).or_default();
                *acc = acc.saturating_add(value);
            }
            EventType::ABS => {
                if let Some(info) = self.abs.get_mut(&code) {
                    *info = info.with_raw_value(value);
                }
            }
            _ => log::trace!("ignoring {event:?}"),
        }
    }
}

/// An evdev device exposing its keys, axes, and force-feedback effects as channels.
#[derive(Debug)]
pub struct EventDevice {
    name: String,
    evdev: Evdev,
    keys: BitSet,
    rels: BitSet,
    ff: BitSet,
    state: DeviceState,
}

impl EventDevice {
    /// Opens the device an `input` section selects with its `ID` key.
    ///
    /// The device is named by the `name` key, falling back to the `ID`. With `grab = true`, the
    /// device is grabbed so that other programs stop seeing its events.
    pub fn open(section: &Section) -> Result<Self, Error> {
        let id = section.require("ID")?;
        let name = section.get("name").unwrap_or(id).to_string();
        let grab = section.get_bool("grab")?.unwrap_or(false);

        let selector = Selector::parse(id);
        let evdev = selector
            .open()
            .map_err(|e| Error::io(format!("failed to open input '{name}' ({selector})"), e))?;
        Self::from_evdev(name.clone(), evdev, grab)
            .map_err(|e| Error::io(format!("failed to set up input '{name}'"), e))
    }

    /// Queries the capabilities and current state of `evdev` and switches it to non-blocking
    /// mode.
    pub fn from_evdev(name: String, evdev: Evdev, grab: bool) -> io::Result<Self> {
        let keys = evdev.supported_codes(EventType::KEY)?;
        let rels = evdev.supported_codes(EventType::REL)?;
        let ff = evdev.supported_codes(EventType::FF)?;
        let abs: HashMap<u16, AbsInfo> = evdev
            .supported_codes(EventType::ABS)?
            .iter()
            .map(|code| -> io::Result<_> { Ok((code, evdev.abs_info(code)?)) })
            .collect::<io::Result<_>>()?;
        let pressed = evdev.key_state()?;

        evdev.set_nonblocking(true)?;
        if grab {
            evdev.grab()?;
        }
        log::info!(
            "opened input '{name}' at '{}' ({} keys, {} relative axes, {} absolute axes{})",
            evdev.path().display(),
            keys.len(),
            rels.len(),
            abs.len(),
            if grab { ", grabbed" } else { "" },
        );

        Ok(Self {
            name,
            evdev,
            keys,
            rels,
            ff,
            state: DeviceState::new(pressed, abs),
        })
    }

    pub fn evdev(&self) -> &Evdev {
        &self.evdev
    }

    fn resync(&mut self) -> io::Result<()> {
        self.state.keys = self.evdev.key_state()?;
        for (&code, info) in &mut self.state.abs {
            *info = self.evdev.abs_info(code)?;
        }
        log::debug!("input '{}': resynchronized state", self.name);
        Ok(())
    }
}

impl InputDevice for EventDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_channel(&self, channel: ChannelId) -> bool {
        match channel.ty {
            ChannelType::Rel => self.rels.contains(channel.code),
            ChannelType::Key => self.keys.contains(channel.code),
            ChannelType::Abs => self.state.abs.contains_key(&channel.code),
            ChannelType::Ff => self.ff.contains(channel.code),
        }
    }

    fn value(&self, channel: ChannelId) -> Option<f32> {
        if !self.has_channel(channel) {
            return None;
        }
        match channel.ty {
            ChannelType::Rel => Some(self.state.rel.get(&channel.code).copied().unwrap_or(0) as f32),
            ChannelType::Key => Some(if self.state.keys.contains(channel.code) { 1.0 } else { 0.0 }),
            ChannelType::Abs => self.state.abs.get(&channel.code).map(AbsInfo::normalized),
            ChannelType::Ff => None,
        }
    }

    fn as_fd(&self) -> Option<BorrowedFd<'_>> {
        Some(self.evdev.as_fd())
    }

    fn on_poll(&mut self) -> PollResult {
        let mut buf = [InputEvent::zeroed(); READ_SIZE];
        let mut result = PollResult::None;
        loop {
            let count = match self.evdev.read_events(&mut buf) {
                Ok(0) => {
                    log::warn!("input '{}': device closed", self.name);
                    return PollResult::Error;
                }
                Ok(count) => count,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return result,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::warn!("input '{}': read failed: {e}", self.name);
                    return PollResult::Error;
                }
            };

            for &event in &buf[..count] {
                log::trace!("input '{}': {event:?}", self.name);
                match self.state.ingest(event) {
                    Ingest::Pending => {}
                    Ingest::Commit => result = PollResult::Sync,
                    Ingest::Resync => {
                        if let Err(e) = self.resync() {
                            log::warn!("input '{}': resync failed: {e}", self.name);
                            return PollResult::Error;
                        }
                        result = PollResult::Sync;
                    }
                }
            }
        }
    }

    fn flush(&mut self) {
        self.state.rel.clear();
    }

    fn ff_upload(&mut self, effect: &Effect) -> io::Result<EffectId> {
        self.evdev.upload_ff_effect(effect)
    }

    fn ff_erase(&mut self, id: EffectId) -> io::Result<()> {
        self.evdev.erase_ff_effect(id)
    }

    fn ff_control(&mut self, id: EffectId, active: bool) -> io::Result<()> {
        self.evdev.control_ff(id, active)
    }

    fn ff_gain(&mut self, gain: u16) -> io::Result<()> {
        self.evdev.set_ff_gain(gain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> DeviceState {
        let mut abs = HashMap::new();
        abs.insert(0, AbsInfo::new(0, 255).with_raw_value(128));
        DeviceState::new(BitSet::with_max(KEY_MAX), abs)
    }

    fn key(code: u16, value: i32) -> InputEvent {
        InputEvent::new(EventType::KEY, code, value)
    }

    #[test]
    fn frames_commit_on_report() {
        let mut state = state();
        assert_eq!(state.ingest(key(30, 1)), Ingest::Pending);
        assert_eq!(state.ingest(InputEvent::new(EventType::ABS, 0, 255)), Ingest::Pending);
        assert!(!state.keys.contains(30));

        assert_eq!(state.ingest(InputEvent::report()), Ingest::Commit);
        assert!(state.keys.contains(30));
        assert_eq!(state.abs[&0].value(), 255);

        // empty reports don't commit anything
        assert_eq!(state.ingest(InputEvent::report()), Ingest::Pending);

        state.ingest(key(30, 2));
        state.ingest(InputEvent::report());
        assert!(state.keys.contains(30));
        state.ingest(key(30, 0));
        state.ingest(InputEvent::report());
        assert!(!state.keys.contains(30));
    }

    #[test]
    fn relative_motion_accumulates() {
        let mut state = state();
        for value in [3, -1, 5] {
            state.ingest(InputEvent::new(EventType::REL, 0, value));
            state.ingest(InputEvent::report());
        }
        assert_eq!(state.rel[&0], 7);
    }

    #[test]
    fn dropped_events() {
        let mut state = state();
        state.ingest(key(30, 1));
        assert_eq!(
            state.ingest(InputEvent::new(EventType::SYN, Syn::DROPPED.raw(), 0)),
            Ingest::Pending
        );
        state.ingest(key(31, 1));
        assert_eq!(state.ingest(InputEvent::report()), Ingest::Resync);
        assert!(state.keys.is_empty());
        assert!(state.pending.is_empty());

        // back to normal
        state.ingest(key(31, 1));
        assert_eq!(state.ingest(InputEvent::report()), Ingest::Commit);
        assert!(state.keys.contains(31));
    }

    #[test]
    fn out_of_range_codes() {
        let mut state = state();
        state.ingest(key(KEY_MAX + 1, 1));
        state.ingest(InputEvent::new(EventType::ABS, 5, 1));
        state.ingest(InputEvent::new(EventType::MSC, 4, 1));
        assert_eq!(state.ingest(InputEvent::report()), Ingest::Commit);
        assert!(state.keys.is_empty());
        assert!(!state.abs.contains_key(&5));
    }
}
