//! Ownership of the live input devices.
//!
//! Everything else refers to devices through [`DeviceHandle`]s. A handle stays valid until its
//! device is removed, after which every lookup through it fails. This lets expressions and effect
//! slots outlive the device they point at without extending its lifetime.

use std::collections::HashMap;

use crate::device::InputDevice;
use crate::error::ConfigError;

/// A generation-checked reference to a device in a [`DeviceRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct Entry {
    generation: u32,
    device: Option<Box<dyn InputDevice>>,
}

/// Owns all input devices and indexes them by name.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    entries: Vec<Entry>,
    names: HashMap<String, DeviceHandle>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `device`.
    ///
    /// Fails if a live device with the same name is already registered.
    pub fn insert(&mut self, device: Box<dyn InputDevice>) -> Result<DeviceHandle, ConfigError> {
        let name = device.name().to_string();
        if self.names.contains_key(&name) {
            return Err(ConfigError::DuplicateDevice(name));
        }

        let handle = match self.entries.iter().position(|e| e.device.is_none()) {
            Some(index) => {
                let entry = &mut self.entries[index];
                entry.device = Some(device);
                DeviceHandle {
                    index: index as u32,
                    generation: entry.generation,
                }
            }
            None => {
                self.entries.push(Entry {
                    generation: 0,
                    device: Some(device),
                });
                DeviceHandle {
                    index: (self.entries.len() - 1) as u32,
                    generation: 0,
                }
            }
        };
        self.names.insert(name, handle);
        Ok(handle)
    }

    /// Removes the device `handle` refers to and returns it.
    ///
    /// All outstanding handles to it become invalid.
    pub fn remove(&mut self, handle: DeviceHandle) -> Option<Box<dyn InputDevice>> {
        let entry = self.entry_mut(handle)?;
        let device = entry.device.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.names.remove(device.name());
        Some(device)
    }

    pub fn contains(&self, handle: DeviceHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: DeviceHandle) -> Option<&dyn InputDevice> {
        self.entries
            .get(handle.index as usize)
            .filter(|e| e.generation == handle.generation)?
            .device
            .as_deref()
    }

    pub fn get_mut(&mut self, handle: DeviceHandle) -> Option<&mut (dyn InputDevice + 'static)> {
        self.entry_mut(handle)?.device.as_deref_mut()
    }

    fn entry_mut(&mut self, handle: DeviceHandle) -> Option<&mut Entry> {
        self.entries
            .get_mut(handle.index as usize)
            .filter(|e| e.generation == handle.generation)
    }

    /// Looks up a live device by name.
    pub fn find_by_name(&self, name: &str) -> Option<DeviceHandle> {
        self.names.get(name).copied()
    }

    /// Returns handles to all live devices, in registration order of their slots.
    pub fn handles(&self) -> impl Iterator<Item = DeviceHandle> + '_ {
        self.entries.iter().enumerate().filter_map(|(index, e)| {
            e.device.as_ref().map(|_| DeviceHandle {
                index: index as u32,
                generation: e.generation,
            })
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::FakeDevice;

    #[test]
    fn stale_handles() {
        let mut registry = DeviceRegistry::new();
        let (pad, _) = FakeDevice::new("pad", &[]);
        let pad = registry.insert(Box::new(pad)).unwrap();
        assert_eq!(registry.find_by_name("pad"), Some(pad));
        assert_eq!(registry.get(pad).unwrap().name(), "pad");

        let removed = registry.remove(pad).unwrap();
        assert_eq!(removed.name(), "pad");
        assert!(registry.get(pad).is_none());
        assert!(registry.get_mut(pad).is_none());
        assert!(registry.remove(pad).is_none());
        assert_eq!(registry.find_by_name("pad"), None);
        assert!(registry.is_empty());

        // the slot is reused, but the old handle must not resolve to the new device
        let (kbd, _) = FakeDevice::new("kbd", &[]);
        let kbd = registry.insert(Box::new(kbd)).unwrap();
        assert_ne!(kbd, pad);
        assert!(registry.get(pad).is_none());
        assert_eq!(registry.get(kbd).unwrap().name(), "kbd");
        assert_eq!(registry.handles().collect::<Vec<_>>(), [kbd]);
    }

    #[test]
    fn duplicate_names() {
        let mut registry = DeviceRegistry::new();
        registry
            .insert(Box::new(FakeDevice::new("pad", &[]).0))
            .unwrap();
        let err = registry
            .insert(Box::new(FakeDevice::new("pad", &[]).0))
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateDevice(name) if name == "pad"));
        assert_eq!(registry.len(), 1);
    }
}
