//! End-to-end remapping through the public startup API, without touching real devices.

use std::{cell::RefCell, collections::HashMap, io, os::fd::BorrowedFd, rc::Rc};

use inputmap::{
    Config, ConfigError, Runtime,
    device::{ChannelId, ChannelType, InputDevice, PollResult},
    event::{EventType, InputEvent},
    expr::EvalContext,
    ff::{Constant, Effect, EffectId, Rumble},
    output::OutputMapping,
    registry::{DeviceHandle, DeviceRegistry},
    runtime::{Pollable, Readiness},
    setup::{self, Mappings},
    variables::Variables,
};

const BTN1: ChannelId = ChannelId::new(ChannelType::Key, 0x101);
const FF_RUMBLE: ChannelId = ChannelId::new(ChannelType::Ff, 0x50);

#[derive(Debug, Default)]
struct Shared {
    values: HashMap<ChannelId, f32>,
    effects: Vec<EffectId>,
    next_id: i16,
}

/// A device with one button called `BTN1` and rumble support.
#[derive(Debug)]
struct Device {
    name: &'static str,
    shared: Rc<RefCell<Shared>>,
}

fn device(name: &'static str) -> (Device, Rc<RefCell<Shared>>) {
    let shared = Rc::new(RefCell::new(Shared::default()));
    let dev = Device {
        name,
        shared: shared.clone(),
    };
    (dev, shared)
}

impl InputDevice for Device {
    fn name(&self) -> &str {
        self.name
    }

    fn has_channel(&self, channel: ChannelId) -> bool {
        channel == BTN1 || channel == FF_RUMBLE
    }

    fn value(&self, channel: ChannelId) -> Option<f32> {
        (channel == BTN1).then(|| {
            self.shared
                .borrow()
                .values
                .get(&channel)
                .copied()
                .unwrap_or(0.0)
        })
    }

    fn parse_channel(&self, name: &str) -> Option<ChannelId> {
        match name {
            "BTN1" => Some(BTN1),
            "FF_RUMBLE" => Some(FF_RUMBLE),
            _ => None,
        }
    }

    fn as_fd(&self) -> Option<BorrowedFd<'_>> {
        None
    }

    fn on_poll(&mut self) -> PollResult {
        PollResult::None
    }

    fn ff_upload(&mut self, effect: &Effect) -> io::Result<EffectId> {
        let mut shared = self.shared.borrow_mut();
        if effect.id() != EffectId::NEW {
            return Ok(effect.id());
        }
        let id = EffectId::from_raw(shared.next_id);
        shared.next_id += 1;
        shared.effects.push(id);
        Ok(id)
    }

    fn ff_erase(&mut self, id: EffectId) -> io::Result<()> {
        let mut shared = self.shared.borrow_mut();
        match shared.effects.iter().position(|&e| e == id) {
            Some(i) => {
                shared.effects.remove(i);
                Ok(())
            }
            None => Err(io::Error::from_raw_os_error(libc::EINVAL)),
        }
    }
}

fn resolve(registry: &DeviceRegistry, config: &str) -> Result<Mappings, ConfigError> {
    let config = Config::parse(config).expect("invalid TOML");
    setup::resolve(&config, registry)
}

fn frame(output: &OutputMapping, registry: &DeviceRegistry, variables: &Variables) -> Vec<InputEvent> {
    output.frame(&EvalContext {
        registry,
        variables: variables.values(),
    })
}

fn key_a(value: i32) -> Vec<InputEvent> {
    vec![InputEvent::new(EventType::KEY, 30, value), InputEvent::report()]
}

#[test]
fn press_and_release() {
    let mut registry = DeviceRegistry::new();
    let (kbd, kbd_state) = device("kbd");
    registry.insert(Box::new(kbd)).unwrap();
    let mappings = resolve(&registry, "[[output]]\nKEY_A = \"kbd.BTN1\"").unwrap();
    let output = &mappings.outputs[0];

    kbd_state.borrow_mut().values.insert(BTN1, 1.0);
    assert_eq!(frame(output, &registry, &mappings.variables), key_a(1));
    kbd_state.borrow_mut().values.insert(BTN1, 0.0);
    assert_eq!(frame(output, &registry, &mappings.variables), key_a(0));
}

#[test]
fn shared_device() {
    let mut registry = DeviceRegistry::new();
    let (kbd, kbd_state) = device("kbd");
    registry.insert(Box::new(kbd)).unwrap();
    let mappings = resolve(
        &registry,
        r#"
[[output]]
name = "one"
KEY_A = "kbd.BTN1"

[[output]]
name = "two"
KEY_A = "kbd.BTN1"
"#,
    )
    .unwrap();
    assert_eq!(registry.len(), 1);

    kbd_state.borrow_mut().values.insert(BTN1, 1.0);
    let one = frame(&mappings.outputs[0], &registry, &mappings.variables);
    let two = frame(&mappings.outputs[1], &registry, &mappings.variables);
    assert_eq!(one, key_a(1));
    assert_eq!(one, two);
}

#[test]
fn removed_device() {
    let mut registry = DeviceRegistry::new();
    let (kbd, _) = device("kbd");
    let (pad, _) = device("pad");
    let kbd = registry.insert(Box::new(kbd)).unwrap();
    registry.insert(Box::new(pad)).unwrap();
    let mappings = resolve(
        &registry,
        r#"
[variables]
both = "kbd.BTN1 + pad.BTN1"

[[output]]
KEY_A = "kbd.BTN1"
KEY_B = "both"
KEY_C = "pad.BTN1"
"#,
    )
    .unwrap();

    let mut rt = Runtime::new(registry, mappings.variables, Vec::new());
    rt.tick(&[]);
    assert_eq!(rt.variables().values(), [Some(0.0)]);

    rt.tick(&[(Pollable::Input(kbd), Readiness::Failed)]);
    assert_eq!(rt.registry().len(), 1);
    assert_eq!(rt.variables().values(), [None]);

    let events = frame(&mappings.outputs[0], rt.registry(), rt.variables());
    assert_eq!(
        events,
        [InputEvent::new(EventType::KEY, 46, 0), InputEvent::report()]
    );
}

#[test]
fn no_lone_report() {
    let mut registry = DeviceRegistry::new();
    let (kbd, _) = device("kbd");
    let handle: DeviceHandle = registry.insert(Box::new(kbd)).unwrap();
    let mappings = resolve(&registry, "[[output]]\nKEY_A = \"kbd.BTN1\"\nKEY_B = \"\"").unwrap();

    registry.remove(handle);
    assert!(frame(&mappings.outputs[0], &registry, &mappings.variables).is_empty());
}

#[test]
fn effect_forwarding() {
    let mut registry = DeviceRegistry::new();
    let (pad, pad_state) = device("pad");
    let handle = registry.insert(Box::new(pad)).unwrap();
    let mut mappings = resolve(&registry, "[[output]]\nFF_RUMBLE = \"pad.FF_RUMBLE\"").unwrap();
    let output = &mut mappings.outputs[0];

    let slot3 = EffectId::from_raw(3);
    let rumble = Effect::from(Rumble::new(0xffff, 0)).with_id(slot3);
    output.handle_upload(&rumble, &mut registry).unwrap();
    let slot = output.slot(slot3).unwrap();
    assert_eq!(slot.device, handle);
    assert_eq!(pad_state.borrow().effects, [slot.local]);

    output.handle_erase(slot3, &mut registry).unwrap();
    assert_eq!(output.slot(slot3), None);
    assert!(pad_state.borrow().effects.is_empty());

    let err = output.handle_erase(slot3, &mut registry).unwrap_err();
    assert_eq!(err.raw_os_error(), Some(libc::EINVAL));

    // upload -> erase -> upload with the same ID
    output.handle_upload(&rumble, &mut registry).unwrap();
    assert_eq!(pad_state.borrow().effects.len(), 1);
    assert_eq!(output.slot(slot3).unwrap().device, handle);
}

#[test]
fn unbound_effect_type() {
    let mut registry = DeviceRegistry::new();
    let (pad, pad_state) = device("pad");
    registry.insert(Box::new(pad)).unwrap();
    let mut mappings = resolve(&registry, "[[output]]\nFF_RUMBLE = \"pad.FF_RUMBLE\"").unwrap();
    let output = &mut mappings.outputs[0];

    let slot0 = EffectId::from_raw(0);
    let constant = Effect::from(Constant::new(0x1000)).with_id(slot0);
    let err = output.handle_upload(&constant, &mut registry).unwrap_err();
    assert_eq!(err.raw_os_error(), Some(libc::EINVAL));
    assert_eq!(output.slot(slot0), None);
    assert!(pad_state.borrow().effects.is_empty());
}

#[test]
fn startup_errors() {
    let mut registry = DeviceRegistry::new();
    let (kbd, _) = device("kbd");
    registry.insert(Box::new(kbd)).unwrap();

    assert!(matches!(
        resolve(&registry, "[[output]]\nKEY_A = \"joy.BTN1\""),
        Err(ConfigError::UnknownDevice { device, .. }) if device == "joy"
    ));
    assert!(matches!(
        resolve(
            &registry,
            "[variables]\nfirst = \"second\"\nsecond = \"kbd.BTN1\"\n[[output]]\nKEY_A = \"first\"",
        ),
        Err(ConfigError::UnknownVariable { name, .. }) if name == "second"
    ));
    assert!(matches!(
        resolve(&registry, "[[output]]\nKEY_A = \"kbd.\""),
        Err(ConfigError::Syntax { .. })
    ));

    let (dup, _) = device("kbd");
    assert!(matches!(
        registry.insert(Box::new(dup)),
        Err(ConfigError::DuplicateDevice(name)) if name == "kbd"
    ));
}
