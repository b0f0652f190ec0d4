//! Turning a [`Config`] into a [`Runtime`].
//!
//! Inputs are opened first, in file order. Variables are then resolved in declaration order, so
//! each one can refer to the devices and to the variables above it. Outputs come last and may refer
//! to everything.

use crate::{
    config::{Config, Section},
    device::InputDevice,
    error::{ConfigError, Error},
    event_device::EventDevice,
    expr::{self, Expr, Scope},
    output::{OutputDevice, OutputMapping},
    registry::DeviceRegistry,
    runtime::Runtime,
    variables::Variables,
};

/// Opens the device an `input` section describes.
pub fn open_input(section: &Section) -> Result<Box<dyn InputDevice>, Error> {
    let id = section.require("ID")?;
    if id.eq_ignore_ascii_case("steam") {
        return Err(ConfigError::UnsupportedDriver(id.into()).into());
    }
    Ok(Box::new(EventDevice::open(section)?))
}

/// Opens every `input` section.
pub fn open_inputs(config: &Config) -> Result<DeviceRegistry, Error> {
    let mut sections = config.sections("input").peekable();
    if sections.peek().is_none() {
        return Err(ConfigError::MissingSection("input").into());
    }

    let mut registry = DeviceRegistry::new();
    for section in sections {
        let device = open_input(section)?;
        if !expr::is_device_name(device.name()) {
            log::warn!(
                "input '{}' can't be referenced in bindings; give it a `name`",
                device.name()
            );
        }
        registry.insert(device)?;
    }
    Ok(registry)
}

/// Variables and output bindings, resolved against a set of input devices.
#[derive(Debug)]
pub struct Mappings {
    pub variables: Variables,
    pub outputs: Vec<OutputMapping>,
}

fn is_identifier(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Resolves the `variables` and `output` sections against the devices in `registry`.
pub fn resolve(config: &Config, registry: &DeviceRegistry) -> Result<Mappings, ConfigError> {
    let mut variables = Variables::new();
    for section in config.sections("variables") {
        for (name, text) in section.entries() {
            if !is_identifier(name) {
                return Err(ConfigError::InvalidValue {
                    key: name.into(),
                    reason: "variable names must start with a letter or `_` and may only contain ASCII \
                             letters, digits and `_`"
                        .into(),
                });
            }
            let scope = Scope {
                registry,
                variables: &variables,
            };
            let expr = Expr::parse(text, &scope)?;
            variables.define(name, expr)?;
        }
    }

    let mut sections = config.sections("output").peekable();
    if sections.peek().is_none() {
        return Err(ConfigError::MissingSection("output"));
    }
    let scope = Scope {
        registry,
        variables: &variables,
    };
    let outputs = sections
        .map(|section| OutputMapping::from_section(section, &scope))
        .collect::<Result<Vec<_>, _>>()?;
    for output in &outputs {
        if output.channels().next().is_none() && output.ff_effects().next().is_none() {
            log::warn!("output '{}' has no bindings", output.name());
        }
    }

    Ok(Mappings { variables, outputs })
}

/// Opens all inputs, resolves all bindings, and creates the virtual devices.
///
/// Nothing is polled before every binding has been resolved.
pub fn build(config: &Config) -> Result<Runtime, Error> {
    let registry = open_inputs(config)?;
    let Mappings { variables, outputs } = resolve(config, &registry)?;
    let outputs = outputs
        .into_iter()
        .map(|mapping| {
            let name = mapping.name().to_string();
            mapping
                .create_device()
                .map_err(|e| Error::io(format!("failed to create output '{name}'"), e))
        })
        .collect::<Result<Vec<OutputDevice>, _>>()?;
    Ok(Runtime::new(registry, variables, outputs))
}

#[cfg(test)]
mod tests {
    use crate::{
        device::{ChannelId, ChannelType},
        expr::EvalContext,
        test::FakeDevice,
    };

    use super::*;

    const BTN1: ChannelId = ChannelId::new(ChannelType::Key, 0x100);

    fn registry() -> DeviceRegistry {
        let mut registry = DeviceRegistry::new();
        let (kbd, kbd_state) = FakeDevice::new("kbd", &[("BTN1", BTN1)]);
        kbd_state.borrow_mut().values.insert(BTN1, 1.0);
        registry.insert(Box::new(kbd)).unwrap();
        registry
    }

    #[test]
    fn variables_in_order() {
        let config = Config::parse(
            r#"
[variables]
pressed = "kbd.BTN1"
inverted = "1 - pressed"

[[output]]
KEY_A = "inverted"
KEY_B = "pressed"
"#,
        )
        .unwrap();
        let registry = registry();
        let mut mappings = resolve(&config, &registry).unwrap();
        assert_eq!(mappings.variables.len(), 2);
        assert_eq!(mappings.outputs.len(), 1);

        mappings.variables.evaluate(&registry);
        let frame = mappings.outputs[0].frame(&EvalContext {
            registry: &registry,
            variables: mappings.variables.values(),
        });
        assert_eq!(frame.len(), 3);
        assert_eq!(frame[0].raw_value(), 0);
        assert_eq!(frame[1].raw_value(), 1);
    }

    #[test]
    fn resolution_errors() {
        let registry = registry();
        let check = |text: &str| resolve(&Config::parse(text).unwrap(), &registry);

        assert!(matches!(
            check("[variables]\na = \"b\"\nb = \"1\"\n[[output]]\n"),
            Err(ConfigError::UnknownVariable { name, .. }) if name == "b"
        ));
        assert!(matches!(
            check("[[output]]\nKEY_A = \"joy.BTN1\""),
            Err(ConfigError::UnknownDevice { device, .. }) if device == "joy"
        ));
        assert!(matches!(
            check("[[output]]\nKEY_A = \"kbd.BTN2\""),
            Err(ConfigError::UnknownChannel { .. })
        ));
        assert!(matches!(
            check("[variables]\n\"a.b\" = \"1\"\n[[output]]\n"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            check("[variables]\n1abc = \"1\"\n[[output]]\n"),
            Err(ConfigError::InvalidValue { key, .. }) if key == "1abc"
        ));
        assert!(check("[variables]\n_a1 = \"1\"\n[[output]]\n").is_ok());
        assert!(matches!(
            check("[variables]\na = \"1\"\n"),
            Err(ConfigError::MissingSection("output"))
        ));
        assert!(check("[[output]]\n").is_ok());
    }

    #[test]
    fn input_errors() {
        let config = Config::parse("[[output]]\nKEY_A = \"kbd.BTN1\"").unwrap();
        assert!(matches!(
            open_inputs(&config),
            Err(Error::Config(ConfigError::MissingSection("input")))
        ));

        let steam = Section::new("input", vec![("ID".into(), "Steam".into())]);
        assert!(matches!(
            open_input(&steam),
            Err(Error::Config(ConfigError::UnsupportedDriver(id))) if id == "Steam"
        ));

        let missing = Section::new("input", vec![("name".into(), "pad".into())]);
        assert!(matches!(
            open_input(&missing),
            Err(Error::Config(ConfigError::MissingKey { .. }))
        ));
    }
}
