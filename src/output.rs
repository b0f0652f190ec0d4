//! Virtual output devices.
//!
//! An [`OutputMapping`] is the device-independent part of an `[[output]]` section: the channels it
//! exposes, the expression each one is bound to, and the force-feedback effect slots. An
//! [`OutputDevice`] pairs a mapping with the [`UinputDevice`] it drives.

use std::{
    io,
    os::fd::{AsFd, BorrowedFd},
};
#[cfg(test)]
use std::sync::{Arc, Mutex};

use crate::{
    AbsInfo, Bus, InputId,
    codes,
    config::Section,
    device::{ChannelId, ChannelType, InputDevice},
    error::ConfigError,
    event::{EventType, ForceFeedbackCode, InputEvent, UinputCode},
    expr::{ChannelRef, EvalContext, Expr, Resolver},
    ff::{Effect, EffectId, EffectType, Feature},
    registry::{DeviceHandle, DeviceRegistry},
    uinput::UinputDevice,
};

/// Lower end of the range advertised for every absolute output axis.
pub const ABS_MIN: i32 = -32768;
/// Upper end of the range advertised for every absolute output axis.
pub const ABS_MAX: i32 = 32767;

pub const DEFAULT_NAME: &str = "InputMap";
pub const DEFAULT_FF_EFFECTS_MAX: u32 = 16;

/// `FF_MAX_EFFECTS`; effect IDs at or above this would collide with `FF_GAIN`.
const FF_MAX_EFFECTS: u32 = Feature::GAIN.0 as u32;

/// Number of requests read from the virtual device at once.
const REQUEST_BATCH: usize = 16;

const METADATA_KEYS: &[&str] = &[
    "name",
    "phys",
    "bus",
    "vendor",
    "product",
    "version",
    "ff_effects_max",
];

#[derive(Debug)]
struct Binding {
    channel: ChannelId,
    expr: Expr,
}

impl Binding {
    fn event(&self, ctx: &EvalContext<'_>) -> Option<InputEvent> {
        let value = self.expr.evaluate(ctx)?;
        let raw = match self.channel.ty {
            ChannelType::Rel => value.round() as i32,
            ChannelType::Key => (value >= 0.5) as i32,
            ChannelType::Abs => scale_abs(value),
            ChannelType::Ff => return None,
        };
        Some(InputEvent::new(
            self.channel.ty.event_type(),
            self.channel.code,
            raw,
        ))
    }
}

/// Maps a normalized value onto `ABS_MIN..=ABS_MAX`, keeping `0.0` at `0`.
fn scale_abs(value: f32) -> i32 {
    let value = value.clamp(-1.0, 1.0);
    let scale = if value >= 0.0 { ABS_MAX } else { -ABS_MIN };
    (value * scale as f32).round() as i32
}

/// Routes effects of one type to a physical device.
#[derive(Debug, Clone, Copy)]
struct FfBinding {
    effect: EffectType,
    source: ChannelRef,
}

/// Where an effect uploaded to the virtual device actually lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectSlot {
    pub device: DeviceHandle,
    /// The ID the physical device assigned to the effect.
    pub local: EffectId,
}

fn errno(errno: i32) -> io::Error {
    io::Error::from_raw_os_error(errno)
}

/// The bindings and force-feedback state of one virtual device.
#[derive(Debug)]
pub struct OutputMapping {
    name: String,
    id: InputId,
    phys: Option<String>,
    /// Sorted by channel, which is the order events are emitted in.
    bindings: Vec<Binding>,
    ff: Vec<FfBinding>,
    ff_effects_max: u32,
    /// Indexed by the effect ID on the virtual device.
    slots: Vec<Option<EffectSlot>>,
}

impl OutputMapping {
    /// Builds a mapping from an `output` section, resolving every binding against `resolver`.
    pub fn from_section(section: &Section, resolver: &dyn Resolver) -> Result<Self, ConfigError> {
        let name = section.get("name").unwrap_or(DEFAULT_NAME).to_string();
        if name.len() >= 80 {
            return Err(ConfigError::InvalidValue {
                key: "name".into(),
                reason: format!("`{name}` is longer than 79 bytes"),
            });
        }
        let bus = section.get("bus").map_or(Bus::VIRTUAL, Bus::from_setting);
        let id = InputId::new(
            bus,
            section.get_hex("vendor")?.unwrap_or(0),
            section.get_hex("product")?.unwrap_or(0),
            section.get_int("version")?.unwrap_or(1),
        );
        let ff_effects_max = section
            .get_int("ff_effects_max")?
            .unwrap_or(DEFAULT_FF_EFFECTS_MAX);
        if !(1..=FF_MAX_EFFECTS).contains(&ff_effects_max) {
            return Err(ConfigError::InvalidValue {
                key: "ff_effects_max".into(),
                reason: format!("must be between 1 and {FF_MAX_EFFECTS}"),
            });
        }

        let mut this = Self {
            name,
            id,
            phys: section.get("phys").map(str::to_string),
            bindings: Vec::new(),
            ff: Vec::new(),
            ff_effects_max,
            slots: Vec::new(),
        };

        for (key, _) in section.entries() {
            if METADATA_KEYS.contains(&key) {
                continue;
            }
            let Some(channel) = codes::lookup(key) else {
                log::warn!("output '{}': ignoring unknown key `{key}`", this.name);
                continue;
            };
            // Empty values leave the channel out.
            let Some(text) = section.get(key) else {
                continue;
            };
            let expr = Expr::parse(text, resolver)?;
            this.bind(key, channel, expr)?;
        }
        this.bindings.sort_by_key(|b| b.channel);

        log::debug!(
            "output '{}': {} channel bindings, {} force-feedback bindings",
            this.name,
            this.bindings.len(),
            this.ff.len(),
        );
        Ok(this)
    }

    fn bind(&mut self, key: &str, channel: ChannelId, expr: Expr) -> Result<(), ConfigError> {
        let duplicate = || ConfigError::InvalidValue {
            key: key.into(),
            reason: format!("{channel} is bound more than once"),
        };

        if channel.ty != ChannelType::Ff {
            if self.bindings.iter().any(|b| b.channel == channel) {
                return Err(duplicate());
            }
            self.bindings.push(Binding { channel, expr });
            return Ok(());
        }

        let Some(effect) = EffectType::from_code(channel.code) else {
            return Err(ConfigError::InvalidValue {
                key: key.into(),
                reason: "not a force-feedback effect type".into(),
            });
        };
        let source = expr
            .as_channel()
            .filter(|source| source.channel.ty == ChannelType::Ff)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: key.into(),
                reason: "force-feedback effects must be bound to a force-feedback channel of a \
                         device"
                    .into(),
            })?;
        if self.ff.iter().any(|b| b.effect == effect) {
            return Err(duplicate());
        }
        self.ff.push(FfBinding { effect, source });
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the channels this mapping exposes, in emission order.
    pub fn channels(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.bindings.iter().map(|b| b.channel)
    }

    /// Returns the effect types forwarded by this mapping.
    pub fn ff_effects(&self) -> impl Iterator<Item = EffectType> + '_ {
        self.ff.iter().map(|b| b.effect)
    }

    fn codes(&self, ty: ChannelType) -> impl Iterator<Item = u16> + '_ {
        self.channels()
            .filter(move |ch| ch.ty == ty)
            .map(|ch| ch.code)
    }

    /// Evaluates all bindings into an event frame.
    ///
    /// Bindings without a value are left out. A non-empty frame is terminated by `SYN_REPORT`;
    /// if no binding has a value, the frame is empty.
    pub fn frame(&self, ctx: &EvalContext<'_>) -> Vec<InputEvent> {
        let mut events: Vec<_> = self.bindings.iter().filter_map(|b| b.event(ctx)).collect();
        if !events.is_empty() {
            events.push(InputEvent::report());
        }
        events
    }

    /// Returns the slot for the effect `id` of the virtual device, if one is populated.
    pub fn slot(&self, id: EffectId) -> Option<EffectSlot> {
        self.slots.get(id.index()?).copied().flatten()
    }

    fn take_slot(&mut self, id: EffectId) -> Option<EffectSlot> {
        self.slots.get_mut(id.index()?)?.take()
    }

    /// Forwards an effect uploaded to the virtual device to the device bound to its type.
    ///
    /// The ID of `effect` is the one the kernel assigned on the virtual device.
    pub fn handle_upload(
        &mut self,
        effect: &Effect,
        registry: &mut DeviceRegistry,
    ) -> io::Result<()> {
        let id = effect.id();
        let Some(index) = id.index().filter(|&i| i < self.ff_effects_max as usize) else {
            log::debug!("output '{}': effect ID {} out of range", self.name, id.raw());
            return Err(errno(libc::EINVAL));
        };
        let ty = effect.effect_type();
        let Some(binding) = self.ff.iter().find(|b| b.effect == ty) else {
            log::debug!("output '{}': no device bound to {ty:?}", self.name);
            return Err(errno(libc::EINVAL));
        };
        if effect.is_custom_periodic() {
            log::warn!(
                "output '{}': custom periodic waveforms can't be forwarded",
                self.name
            );
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "custom periodic waveforms can't be forwarded",
            ));
        }
        let target = binding.source.device;

        // Updates of an effect already playing on the same device keep its local ID. If it lives
        // on another device (the effect type changed), that one is released first.
        let local = match self.slot(id) {
            Some(slot) if slot.device == target && registry.contains(target) => slot.local,
            Some(slot) => {
                self.slots[index] = None;
                if let Some(device) = registry.get_mut(slot.device) {
                    if let Err(e) = device.ff_erase(slot.local) {
                        log::warn!(
                            "output '{}': failed to release effect on '{}': {e}",
                            self.name,
                            device.name(),
                        );
                    }
                }
                EffectId::NEW
            }
            None => EffectId::NEW,
        };

        let Some(device) = registry.get_mut(target) else {
            return Err(errno(libc::ENODEV));
        };
        let local = device.ff_upload(&effect.with_id(local))?;
        log::debug!(
            "output '{}': uploaded {ty:?} effect {} as {} on '{}'",
            self.name,
            id.raw(),
            local.raw(),
            device.name(),
        );

        if self.slots.len() <= index {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(EffectSlot {
            device: target,
            local,
        });
        Ok(())
    }

    /// Releases the effect `id` of the virtual device.
    ///
    /// The slot is cleared even if the physical device fails to release the effect.
    pub fn handle_erase(&mut self, id: EffectId, registry: &mut DeviceRegistry) -> io::Result<()> {
        let Some(slot) = self.take_slot(id) else {
            log::debug!("output '{}': erase of unknown effect {}", self.name, id.raw());
            return Err(errno(libc::EINVAL));
        };
        let Some(device) = registry.get_mut(slot.device) else {
            return Err(errno(libc::ENODEV));
        };
        log::debug!(
            "output '{}': erasing effect {} ({} on '{}')",
            self.name,
            id.raw(),
            slot.local.raw(),
            device.name(),
        );
        device.ff_erase(slot.local)
    }

    /// Starts or stops the effect `id` on the device rendering it.
    pub fn handle_control(&self, id: EffectId, active: bool, registry: &mut DeviceRegistry) {
        let Some(slot) = self.slot(id) else {
            log::trace!("output '{}': ignoring control of effect {}", self.name, id.raw());
            return;
        };
        let Some(device) = registry.get_mut(slot.device) else {
            return;
        };
        if let Err(e) = device.ff_control(slot.local, active) {
            log::debug!("output '{}': failed to control effect on '{}': {e}", self.name, device.name());
        }
    }

    /// Forwards a gain change to every live device bound to an effect type.
    pub fn handle_gain(&self, gain: u16, registry: &mut DeviceRegistry) {
        let mut devices: Vec<DeviceHandle> = Vec::new();
        for binding in &self.ff {
            if !devices.contains(&binding.source.device) {
                devices.push(binding.source.device);
            }
        }
        for handle in devices {
            let Some(device) = registry.get_mut(handle) else {
                continue;
            };
            if let Err(e) = device.ff_gain(gain) {
                log::debug!("output '{}': failed to set gain on '{}': {e}", self.name, device.name());
            }
        }
    }

    /// Creates the virtual device.
    ///
    /// Only event types with at least one binding are advertised.
    pub fn create_device(self) -> io::Result<OutputDevice> {
        let mut builder = UinputDevice::builder()?.with_device_id(self.id);
        if let Some(phys) = &self.phys {
            builder = builder.with_phys(phys)?;
        }
        let abs = self
            .codes(ChannelType::Abs)
            .map(|code| (code, AbsInfo::new(ABS_MIN, ABS_MAX)));
        builder = builder
            .with_rel_axes(self.codes(ChannelType::Rel))?
            .with_keys(self.codes(ChannelType::Key))?
            .with_abs_axes(abs)?;
        if !self.ff.is_empty() {
            let features = self
                .ff_effects()
                .map(EffectType::feature)
                .chain([Feature::GAIN]);
            builder = builder
                .with_ff_features(features)?
                .with_ff_effects_max(self.ff_effects_max);
        }

        let dev = builder.build(&self.name)?;
        dev.set_nonblocking(true)?;
        log::info!("created output device '{}'", self.name);
        Ok(OutputDevice::new(self, Sink::Uinput(dev)))
    }
}

/// Frames written by a recording [`OutputDevice`].
#[cfg(test)]
pub(crate) type Recording = Arc<Mutex<Vec<Vec<InputEvent>>>>;

#[derive(Debug)]
enum Sink {
    Uinput(UinputDevice),
    /// Keeps written frames in memory and never has pending requests.
    #[cfg(test)]
    Recorder(Recording),
}

/// A virtual device driven by an [`OutputMapping`].
#[derive(Debug)]
pub struct OutputDevice {
    mapping: OutputMapping,
    sink: Sink,
    failed: bool,
}

impl OutputDevice {
    fn new(mapping: OutputMapping, sink: Sink) -> Self {
        Self {
            mapping,
            sink,
            failed: false,
        }
    }

    /// Creates an output that records its frames instead of writing them to a device.
    #[cfg(test)]
    pub(crate) fn recording(mapping: OutputMapping) -> (Self, Recording) {
        let frames = Recording::default();
        (Self::new(mapping, Sink::Recorder(frames.clone())), frames)
    }

    pub fn mapping(&self) -> &OutputMapping {
        &self.mapping
    }

    /// Returns the descriptor to wait on for force-feedback requests.
    ///
    /// `None` once the descriptor has failed.
    pub fn as_fd(&self) -> Option<BorrowedFd<'_>> {
        match &self.sink {
            Sink::Uinput(dev) if !self.failed => Some(dev.as_fd()),
            _ => None,
        }
    }

    /// Stops waiting for requests on this output. Frames are still written.
    ///
    /// Returns `false` if it had already failed.
    pub fn mark_failed(&mut self) -> bool {
        !std::mem::replace(&mut self.failed, true)
    }

    /// Writes the current frame to the virtual device, if it isn't empty.
    pub fn sync(&self, ctx: &EvalContext<'_>) -> io::Result<()> {
        let frame = self.mapping.frame(ctx);
        if frame.is_empty() {
            return Ok(());
        }
        log::trace!("output '{}': writing {frame:?}", self.mapping.name);
        match &self.sink {
            Sink::Uinput(dev) => dev.write(&frame),
            #[cfg(test)]
            Sink::Recorder(frames) => {
                frames.lock().unwrap().push(frame);
                Ok(())
            }
        }
    }

    /// Handles the force-feedback requests pending on the virtual device.
    ///
    /// Failed requests are reported back to the requesting process; they don't affect the
    /// device.
    pub fn on_poll(&mut self, registry: &mut DeviceRegistry) -> io::Result<()> {
        let Self { mapping, sink, .. } = self;
        let dev = match sink {
            Sink::Uinput(dev) => dev,
            #[cfg(test)]
            Sink::Recorder(_) => return Ok(()),
        };
        let mut buf = [InputEvent::zeroed(); REQUEST_BATCH];
        loop {
            let count = match dev.read_requests(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(count) => count,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            for event in &buf[..count] {
                Self::dispatch(mapping, dev, event, registry);
            }
        }
    }

    fn dispatch(
        mapping: &mut OutputMapping,
        dev: &UinputDevice,
        event: &InputEvent,
        registry: &mut DeviceRegistry,
    ) {
        match event.event_type() {
            EventType::UINPUT => match UinputCode::from_raw(event.raw_code()) {
                UinputCode::FF_UPLOAD => {
                    let res = dev.ff_upload(event, |upload| {
                        mapping.handle_upload(upload.effect(), registry)
                    });
                    if let Err(e) = res {
                        log::debug!("output '{}': upload failed: {e}", mapping.name);
                    }
                }
                UinputCode::FF_ERASE => {
                    let res = dev.ff_erase(event, |erase| {
                        mapping.handle_erase(erase.effect_id(), registry)
                    });
                    if let Err(e) = res {
                        log::debug!("output '{}': erase failed: {e}", mapping.name);
                    }
                }
                code => log::trace!("output '{}': ignoring {code:?}", mapping.name),
            },
            EventType::FF => match event.ff_code() {
                Some(ForceFeedbackCode::ControlEffect(id)) => {
                    mapping.handle_control(id, event.raw_value() != 0, registry);
                }
                Some(ForceFeedbackCode::SetGain) => {
                    let gain = event.raw_value().clamp(0, 0xffff) as u16;
                    mapping.handle_gain(gain, registry);
                }
                _ => log::trace!("output '{}': ignoring {event:?}", mapping.name),
            },
            _ => log::trace!("output '{}': ignoring {event:?}", mapping.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        expr::Scope,
        ff::{Constant, Periodic, Rumble, Waveform},
        test::{FakeDevice, check_events},
        variables::Variables,
    };

    use super::*;

    const BTN1: ChannelId = ChannelId::new(ChannelType::Key, 0x100);
    const STICK: ChannelId = ChannelId::new(ChannelType::Abs, 0);
    const WHEEL: ChannelId = ChannelId::new(ChannelType::Rel, 8);
    const RUMBLE: ChannelId = ChannelId::new(ChannelType::Ff, 0x50);
    const CONSTANT: ChannelId = ChannelId::new(ChannelType::Ff, 0x52);

    fn section(entries: &[(&str, &str)]) -> Section {
        Section::new(
            "output",
            entries
                .iter()
                .map(|&(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn mapping(registry: &DeviceRegistry, entries: &[(&str, &str)]) -> OutputMapping {
        let variables = Variables::new();
        let scope = Scope {
            registry,
            variables: &variables,
        };
        OutputMapping::from_section(&section(entries), &scope).unwrap()
    }

    fn frame(mapping: &OutputMapping, registry: &DeviceRegistry) -> Vec<InputEvent> {
        mapping.frame(&EvalContext {
            registry,
            variables: &[],
        })
    }

    #[test]
    fn abs_scaling() {
        assert_eq!(scale_abs(0.0), 0);
        assert_eq!(scale_abs(1.0), ABS_MAX);
        assert_eq!(scale_abs(-1.0), ABS_MIN);
        assert_eq!(scale_abs(0.5), 16384);
        assert_eq!(scale_abs(-0.5), -16384);
        assert_eq!(scale_abs(7.0), ABS_MAX);
    }

    #[test]
    fn frames() {
        let mut registry = DeviceRegistry::new();
        let (kbd, kbd_state) = FakeDevice::new("kbd", &[("BTN1", BTN1), ("X", STICK), ("W", WHEEL)]);
        registry.insert(Box::new(kbd)).unwrap();

        let mapping = mapping(
            &registry,
            &[
                ("name", "Remapped"),
                ("ABS_X", "kbd.X"),
                ("KEY_A", "kbd.BTN1"),
                ("REL_WHEEL", "kbd.W * 2"),
                ("KEY_B", ""),
                ("LED_NOPE", "kbd.BTN1"),
            ],
        );
        assert_eq!(mapping.name(), "Remapped");

        kbd_state.borrow_mut().values.insert(BTN1, 1.0);
        kbd_state.borrow_mut().values.insert(STICK, -1.0);
        kbd_state.borrow_mut().values.insert(WHEEL, 1.4);
        check_events(
            frame(&mapping, &registry),
            [
                InputEvent::new(EventType::REL, 8, 3),
                InputEvent::new(EventType::KEY, 30, 1),
                InputEvent::new(EventType::ABS, 0, ABS_MIN),
                InputEvent::report(),
            ],
        );

        kbd_state.borrow_mut().values.insert(BTN1, 0.4);
        let events = frame(&mapping, &registry);
        assert_eq!(events[1], InputEvent::new(EventType::KEY, 30, 0));
    }

    #[test]
    fn dead_bindings_are_omitted() {
        let mut registry = DeviceRegistry::new();
        let (kbd, _) = FakeDevice::new("kbd", &[("BTN1", BTN1)]);
        let handle = registry.insert(Box::new(kbd)).unwrap();
        let mapping = mapping(&registry, &[("KEY_A", "kbd.BTN1"), ("KEY_B", "1 / 0")]);

        check_events(
            frame(&mapping, &registry),
            [InputEvent::new(EventType::KEY, 30, 0), InputEvent::report()],
        );

        registry.remove(handle);
        // no lone SYN_REPORT
        assert!(frame(&mapping, &registry).is_empty());
    }

    #[test]
    fn metadata() {
        let registry = DeviceRegistry::new();
        let mapping = mapping(
            &registry,
            &[
                ("bus", "usb"),
                ("vendor", "045e"),
                ("product", "0x028e"),
                ("phys", "inputmap/0"),
            ],
        );
        assert_eq!(mapping.name(), DEFAULT_NAME);
        assert_eq!(mapping.id, InputId::new(Bus::USB, 0x045e, 0x028e, 1));
        assert_eq!(mapping.phys.as_deref(), Some("inputmap/0"));
        assert_eq!(mapping.ff_effects_max, DEFAULT_FF_EFFECTS_MAX);
        assert_eq!(mapping.channels().count(), 0);
    }

    #[test]
    fn integer_ids() {
        let registry = DeviceRegistry::new();
        let config = crate::Config::parse("[[output]]\nvendor = 0x1234\nproduct = 1234\nversion = 2")
            .unwrap();
        let variables = Variables::new();
        let scope = Scope {
            registry: &registry,
            variables: &variables,
        };
        let mapping = OutputMapping::from_section(config.section("output").unwrap(), &scope).unwrap();
        assert_eq!(mapping.id, InputId::new(Bus::VIRTUAL, 0x1234, 1234, 2));
    }

    #[test]
    fn invalid_sections() {
        let mut registry = DeviceRegistry::new();
        let (pad, _) = FakeDevice::new("pad", &[("BTN1", BTN1), ("FF_RUMBLE", RUMBLE)]);
        registry.insert(Box::new(pad)).unwrap();
        let variables = Variables::new();
        let scope = Scope {
            registry: &registry,
            variables: &variables,
        };
        let build = |entries: &[(&str, &str)]| OutputMapping::from_section(&section(entries), &scope);

        assert!(matches!(
            build(&[("FF_RUMBLE", "pad.BTN1")]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            build(&[("FF_RUMBLE", "pad.FF_RUMBLE * 2")]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            build(&[("BTN_A", "pad.BTN1"), ("BTN_SOUTH", "pad.BTN1")]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            build(&[("KEY_A", "joy.BTN1")]),
            Err(ConfigError::UnknownDevice { .. })
        ));
        assert!(matches!(
            build(&[("ff_effects_max", "0")]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            build(&[("name", "x".repeat(80).as_str())]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(build(&[("name", "x".repeat(79).as_str())]).is_ok());
    }

    fn rumble(id: i16) -> Effect {
        Effect::from(Rumble::new(0x8000, 0x4000)).with_id(EffectId::from_raw(id))
    }

    #[test]
    fn effect_slots() {
        let mut registry = DeviceRegistry::new();
        let (pad, pad_state) = FakeDevice::new("pad", &[("FF_RUMBLE", RUMBLE)]);
        let pad_handle = registry.insert(Box::new(pad)).unwrap();
        let mut mapping = mapping(&registry, &[("FF_RUMBLE", "pad.FF_RUMBLE")]);

        mapping.handle_upload(&rumble(3), &mut registry).unwrap();
        let slot = mapping.slot(EffectId::from_raw(3)).unwrap();
        assert_eq!(slot.device, pad_handle);
        assert_eq!(slot.local, EffectId::from_raw(10));
        assert_eq!(mapping.slot(EffectId::from_raw(0)), None);

        // updates keep the local ID
        mapping.handle_upload(&rumble(3), &mut registry).unwrap();
        assert_eq!(mapping.slot(EffectId::from_raw(3)), Some(slot));
        assert_eq!(pad_state.borrow().effects.len(), 1);

        mapping.handle_control(EffectId::from_raw(3), true, &mut registry);
        mapping.handle_control(EffectId::from_raw(4), true, &mut registry);
        assert_eq!(pad_state.borrow().controls, [(EffectId::from_raw(10), true)]);

        mapping.handle_erase(EffectId::from_raw(3), &mut registry).unwrap();
        assert_eq!(mapping.slot(EffectId::from_raw(3)), None);
        assert_eq!(pad_state.borrow().erased, [EffectId::from_raw(10)]);
        let err = mapping
            .handle_erase(EffectId::from_raw(3), &mut registry)
            .unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EINVAL));

        // the slot can be reused
        mapping.handle_upload(&rumble(3), &mut registry).unwrap();
        assert_eq!(
            mapping.slot(EffectId::from_raw(3)).unwrap().local,
            EffectId::from_raw(11)
        );
    }

    #[test]
    fn rejected_uploads() {
        let mut registry = DeviceRegistry::new();
        let (pad, pad_state) = FakeDevice::new(
            "pad",
            &[("FF_RUMBLE", RUMBLE), ("FF_PERIODIC", ChannelId::new(ChannelType::Ff, 0x51))],
        );
        registry.insert(Box::new(pad)).unwrap();
        let mut mapping = mapping(
            &registry,
            &[
                ("FF_RUMBLE", "pad.FF_RUMBLE"),
                ("FF_PERIODIC", "pad.FF_PERIODIC"),
                ("ff_effects_max", "4"),
            ],
        );

        let unbound = Effect::from(Constant::new(100)).with_id(EffectId::from_raw(0));
        let err = mapping.handle_upload(&unbound, &mut registry).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EINVAL));
        assert_eq!(mapping.slot(EffectId::from_raw(0)), None);

        let err = mapping.handle_upload(&rumble(4), &mut registry).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EINVAL));

        let custom = Effect::from(Periodic::simple(Waveform::CUSTOM, 100, 1000))
            .with_id(EffectId::from_raw(1));
        let err = mapping.handle_upload(&custom, &mut registry).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        assert_eq!(mapping.slot(EffectId::from_raw(1)), None);

        pad_state.borrow_mut().fail_uploads = true;
        let err = mapping.handle_upload(&rumble(2), &mut registry).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ENOSPC));
        assert_eq!(mapping.slot(EffectId::from_raw(2)), None);
        assert!(pad_state.borrow().effects.is_empty());
    }

    #[test]
    fn effect_moves_between_devices() {
        let mut registry = DeviceRegistry::new();
        let (pad, pad_state) = FakeDevice::new("pad", &[("FF_RUMBLE", RUMBLE)]);
        let (wheel, wheel_state) = FakeDevice::new("wheel", &[("FF_CONSTANT", CONSTANT)]);
        registry.insert(Box::new(pad)).unwrap();
        let wheel_handle = registry.insert(Box::new(wheel)).unwrap();
        let mut mapping = mapping(
            &registry,
            &[("FF_RUMBLE", "pad.FF_RUMBLE"), ("FF_CONSTANT", "wheel.FF_CONSTANT")],
        );

        mapping.handle_upload(&rumble(0), &mut registry).unwrap();
        let constant = Effect::from(Constant::new(-100)).with_id(EffectId::from_raw(0));
        mapping.handle_upload(&constant, &mut registry).unwrap();

        assert!(pad_state.borrow().effects.is_empty());
        assert_eq!(wheel_state.borrow().effects.len(), 1);
        assert_eq!(mapping.slot(EffectId::from_raw(0)).unwrap().device, wheel_handle);

        mapping.handle_gain(0x8000, &mut registry);
        assert_eq!(pad_state.borrow().gains, [0x8000]);
        assert_eq!(wheel_state.borrow().gains, [0x8000]);
    }

    #[test]
    fn removed_ff_device() {
        let mut registry = DeviceRegistry::new();
        let (pad, pad_state) = FakeDevice::new("pad", &[("FF_RUMBLE", RUMBLE)]);
        let handle = registry.insert(Box::new(pad)).unwrap();
        let mut mapping = mapping(&registry, &[("FF_RUMBLE", "pad.FF_RUMBLE")]);
        mapping.handle_upload(&rumble(1), &mut registry).unwrap();

        registry.remove(handle);

        mapping.handle_control(EffectId::from_raw(1), true, &mut registry);
        assert!(pad_state.borrow().controls.is_empty());

        let err = mapping.handle_upload(&rumble(2), &mut registry).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ENODEV));

        let err = mapping
            .handle_erase(EffectId::from_raw(1), &mut registry)
            .unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ENODEV));
        assert_eq!(mapping.slot(EffectId::from_raw(1)), None);
    }
}
