//! Input event types and enumerations.
//!
//! Events carry an [`EventType`] (the broad category of event), a `u16` code identifying the
//! button, axis, or effect affected, and an `i32` value describing what happened to it.
//! [`InputEvent`] has the same layout as the kernel's `struct input_event`, so slices of events can
//! be written to a *uinput* device directly.

use std::fmt;

use crate::ff::{EffectId, Feature};
use crate::raw::input::input_event;

ffi_enum! {
    /// Input event types.
    pub enum EventType: u16 {
        SYN = 0x00,
        KEY = 0x01,
        REL = 0x02,
        ABS = 0x03,
        MSC = 0x04,
        SW = 0x05,
        LED = 0x11,
        SND = 0x12,
        REP = 0x14,
        FF = 0x15,
        PWR = 0x16,
        FF_STATUS = 0x17,
        /// Requests sent to a *uinput* device by the kernel.
        UINPUT = 0x0101,
    }
}

ffi_enum_debug!(EventType, "EV_");

impl EventType {
    /// The largest regular event type (`EV_MAX`).
    pub const MAX: Self = Self(0x1f);
}

ffi_enum! {
    /// Synchronization event codes.
    pub enum Syn: u16 {
        /// Marks the end of a frame of events that belong together.
        REPORT = 0,
        CONFIG = 1,
        MT_REPORT = 2,
        /// The kernel buffer overflowed and events were lost.
        ///
        /// Everything up to and including the next [`Syn::REPORT`] must be discarded, and the
        /// device state queried again.
        DROPPED = 3,
    }
}

ffi_enum_debug!(Syn, "SYN_");

ffi_enum! {
    /// Codes of [`EventType::UINPUT`] events.
    pub enum UinputCode: u16 {
        /// The kernel wants a force-feedback effect uploaded.
        FF_UPLOAD = 1,
        /// The kernel wants a force-feedback effect erased.
        FF_ERASE = 2,
    }
}

ffi_enum_debug!(UinputCode, "UI_");

/// Interpretation of the code of an [`EventType::FF`] event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceFeedbackCode {
    /// Starts (value 1) or stops (value 0) the effect with the given [`EffectId`].
    ///
    /// This may be sent with an unassigned [`EffectId`]. Consumers should ignore it in that case.
    ControlEffect(EffectId),

    /// Sets the master gain of the device, as a fraction of 65535.
    SetGain,

    /// Sets the autocenter strength of the device, as a fraction of 65535.
    SetAutocenter,
}

/// An input event received from or sent to an *evdev* or *uinput* device.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct InputEvent(input_event);

impl InputEvent {
    /// Creates an [`InputEvent`] from raw values.
    ///
    /// The timestamp of the event will be set to 0, which makes the kernel assign the current time
    /// when the event is written.
    #[inline]
    pub const fn new(ty: EventType, raw_code: u16, raw_value: i32) -> Self {
        Self(input_event {
            time: libc::timeval {
                tv_sec: 0,
                tv_usec: 0,
            },
            type_: ty.0,
            code: raw_code,
            value: raw_value,
        })
    }

    /// Creates an [`InputEvent`] with all fields zeroed out.
    ///
    /// This results in a [`Syn::REPORT`] event, and is used as filler in read buffers.
    #[inline]
    pub const fn zeroed() -> Self {
        Self::new(EventType::SYN, 0, 0)
    }

    /// Creates the [`Syn::REPORT`] event that terminates a frame.
    #[inline]
    pub const fn report() -> Self {
        Self::new(EventType::SYN, Syn::REPORT.0, 0)
    }

    #[inline]
    pub fn event_type(&self) -> EventType {
        EventType(self.0.type_)
    }

    #[inline]
    pub fn raw_code(&self) -> u16 {
        self.0.code
    }

    #[inline]
    pub fn raw_value(&self) -> i32 {
        self.0.value
    }

    /// If this is an [`EventType::SYN`] event, returns its [`Syn`] code.
    pub fn syn(&self) -> Option<Syn> {
        (self.event_type() == EventType::SYN).then_some(Syn(self.raw_code()))
    }

    /// If this is an [`EventType::FF`] event, returns what it is meant to control.
    pub fn ff_code(&self) -> Option<ForceFeedbackCode> {
        if self.event_type() != EventType::FF {
            return None;
        }

        const FF_GAIN: u16 = Feature::GAIN.0;
        const FF_AUTOCENTER: u16 = Feature::AUTOCENTER.0;
        match self.raw_code() {
            id if id < FF_GAIN => Some(ForceFeedbackCode::ControlEffect(EffectId(id as _))),
            FF_GAIN => Some(ForceFeedbackCode::SetGain),
            FF_AUTOCENTER => Some(ForceFeedbackCode::SetAutocenter),
            _ => None,
        }
    }
}

impl PartialEq for InputEvent {
    /// Compares type, code, and value. Timestamps are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.0.type_ == other.0.type_ && self.0.code == other.0.code && self.0.value == other.0.value
    }
}
impl Eq for InputEvent {}

impl fmt::Debug for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputEvent")
            .field("type", &self.event_type())
            .field("code", &self.raw_code())
            .field("value", &self.raw_value())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ff_codes() {
        let play = InputEvent::new(EventType::FF, 3, 1);
        assert_eq!(
            play.ff_code(),
            Some(ForceFeedbackCode::ControlEffect(EffectId(3)))
        );
        assert_eq!(
            InputEvent::new(EventType::FF, 0x60, 0xffff).ff_code(),
            Some(ForceFeedbackCode::SetGain)
        );
        assert_eq!(
            InputEvent::new(EventType::FF, 0x61, 0).ff_code(),
            Some(ForceFeedbackCode::SetAutocenter)
        );
        assert_eq!(InputEvent::new(EventType::KEY, 3, 1).ff_code(), None);
    }

    #[test]
    fn debug() {
        assert_eq!(format!("{:?}", EventType::ABS), "EV_ABS");
        assert_eq!(format!("{:?}", EventType(0x1e)), "EventType(0x1e)");
        assert_eq!(
            format!("{:?}", InputEvent::report()),
            "InputEvent { type: EV_SYN, code: 0, value: 0 }"
        );
        assert_eq!(InputEvent::report().syn(), Some(Syn::REPORT));
    }
}
