//! The input device abstraction shared by all drivers.

use std::{fmt, io, os::fd::BorrowedFd};

use crate::codes;
use crate::event::EventType;
use crate::ff::{Effect, EffectId};

/// The kind of a channel.
///
/// The declaration order is also the order in which a virtual device emits events within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelType {
    /// Relative axis (mouse motion, scroll wheels).
    Rel,
    /// Key or button.
    Key,
    /// Absolute axis (sticks, triggers, hats).
    Abs,
    /// Force-feedback effect type.
    Ff,
}

impl ChannelType {
    pub const ALL: [Self; 4] = [Self::Rel, Self::Key, Self::Abs, Self::Ff];

    /// The event type used for this kind of channel on the wire.
    pub fn event_type(self) -> EventType {
        match self {
            Self::Rel => EventType::REL,
            Self::Key => EventType::KEY,
            Self::Abs => EventType::ABS,
            Self::Ff => EventType::FF,
        }
    }

    pub fn from_event_type(ty: EventType) -> Option<Self> {
        Self::ALL.into_iter().find(|ch| ch.event_type() == ty)
    }
}

/// Identifies a channel of a device: its type and code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId {
    pub ty: ChannelType,
    pub code: u16,
}

impl ChannelId {
    #[inline]
    pub const fn new(ty: ChannelType, code: u16) -> Self {
        Self { ty, code }
    }

    /// Returns the symbolic name of this channel, if it has one.
    pub fn name(&self) -> Option<&'static str> {
        codes::name(*self)
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:?}({:#x})", self.ty, self.code),
        }
    }
}

/// Outcome of a device handling read readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollResult {
    /// Nothing observable changed.
    None,
    /// The device failed and must be removed.
    Error,
    /// A complete, consistent frame of new state was committed.
    ///
    /// The device will be asked to [`InputDevice::flush`] once the virtual devices have been
    /// updated.
    Sync,
}

fn unsupported(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, format!("{what} is not supported"))
}

/// A source of input channels.
///
/// Implementations buffer incoming events themselves and only expose committed state through
/// [`InputDevice::value`], so that all channels of a device appear to change at once.
///
/// The force-feedback methods default to failing with [`io::ErrorKind::Unsupported`].
pub trait InputDevice: fmt::Debug {
    /// The name other configuration entries refer to this device by.
    fn name(&self) -> &str;

    /// Returns whether the device provides `channel`.
    fn has_channel(&self, channel: ChannelId) -> bool;

    /// Returns the committed value of `channel`.
    ///
    /// Keys read as `0` or `1`, absolute axes are normalized to `[-1, 1]`, and relative axes
    /// report the motion accumulated since the last [`InputDevice::flush`]. Returns `None` if the
    /// device doesn't provide a readable `channel`.
    fn value(&self, channel: ChannelId) -> Option<f32>;

    /// Resolves a channel name from the configuration.
    fn parse_channel(&self, name: &str) -> Option<ChannelId> {
        codes::lookup(name).filter(|&ch| self.has_channel(ch))
    }

    /// Returns the file descriptor to wait on for readiness, if the device has one.
    fn as_fd(&self) -> Option<BorrowedFd<'_>>;

    /// Processes pending input after the descriptor became readable.
    fn on_poll(&mut self) -> PollResult;

    /// Resets per-frame state after a [`PollResult::Sync`] has been propagated.
    fn flush(&mut self) {}

    /// Uploads (or, if the ID of `effect` is set, updates) a force-feedback effect.
    fn ff_upload(&mut self, effect: &Effect) -> io::Result<EffectId> {
        let _ = effect;
        Err(unsupported("force feedback"))
    }

    fn ff_erase(&mut self, id: EffectId) -> io::Result<()> {
        let _ = id;
        Err(unsupported("force feedback"))
    }

    /// Starts or stops playback of an uploaded effect.
    fn ff_control(&mut self, id: EffectId, active: bool) -> io::Result<()> {
        let _ = (id, active);
        Err(unsupported("force feedback"))
    }

    /// Sets the master force-feedback gain, as a fraction of `0xffff`.
    fn ff_gain(&mut self, gain: u16) -> io::Result<()> {
        let _ = gain;
        Err(unsupported("force-feedback gain"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_display() {
        assert_eq!(ChannelId::new(ChannelType::Key, 30).to_string(), "KEY_A");
        assert_eq!(ChannelId::new(ChannelType::Abs, 0x3f).to_string(), "Abs(0x3f)");
        assert_eq!(
            ChannelType::from_event_type(EventType::REL),
            Some(ChannelType::Rel)
        );
        assert_eq!(ChannelType::from_event_type(EventType::SYN), None);
    }

    #[test]
    fn emission_order() {
        let mut channels = [
            ChannelId::new(ChannelType::Abs, 0),
            ChannelId::new(ChannelType::Key, 30),
            ChannelId::new(ChannelType::Rel, 8),
            ChannelId::new(ChannelType::Key, 2),
        ];
        channels.sort();
        assert_eq!(
            channels.map(|ch| ch.ty),
            [ChannelType::Rel, ChannelType::Key, ChannelType::Key, ChannelType::Abs]
        );
    }
}
