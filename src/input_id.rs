use std::fmt;

use crate::raw::input::input_id;

/// Identity a device reports to userspace (`struct input_id`).
///
/// Inputs are matched against the `vendor:product` part, outputs advertise a configured one.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct InputId(pub(crate) input_id);

impl InputId {
    pub const fn new(bus: Bus, vendor: u16, product: u16, version: u16) -> Self {
        Self(input_id {
            bustype: bus.0,
            vendor,
            product,
            version,
        })
    }

    pub fn bus(&self) -> Bus {
        Bus(self.0.bustype)
    }

    pub fn vendor(&self) -> u16 {
        self.0.vendor
    }

    pub fn product(&self) -> u16 {
        self.0.product
    }

    pub fn version(&self) -> u16 {
        self.0.version
    }
}

/// Formats as `vendor:product`, the form used by the `ID` setting of inputs.
impl fmt::Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor(), self.product())
    }
}

impl fmt::Debug for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InputId({:?}, {self}, v{:#x})", self.bus(), self.version())
    }
}

ffi_enum! {
    /// The bus a device is attached through.
    ///
    /// Only the values a virtual device can be configured with are named.
    pub enum Bus: u16 {
        PCI         = 0x01,
        USB         = 0x03,
        BLUETOOTH   = 0x05,
        VIRTUAL     = 0x06,
    }
}
ffi_enum_debug!(Bus, "BUS_");

impl Bus {
    /// Parses the `bus` setting of a virtual device.
    ///
    /// `USB`, `BLUETOOTH` and `PCI` are matched case-insensitively. Anything else is
    /// [`Bus::VIRTUAL`].
    pub fn from_setting(setting: &str) -> Self {
        let setting = setting.trim();
        [Bus::USB, Bus::BLUETOOTH, Bus::PCI]
            .into_iter()
            .find(|bus| bus.variant_name().is_some_and(|n| n.eq_ignore_ascii_case(setting)))
            .unwrap_or(Bus::VIRTUAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatting() {
        let id = InputId::new(Bus::USB, 0x045e, 0x28e, 0x110);
        assert_eq!(id.to_string(), "045e:028e");
        assert_eq!(format!("{id:?}"), "InputId(BUS_USB, 045e:028e, v0x110)");
        assert_eq!(format!("{:?}", Bus(0xffff)), "Bus(0xffff)");
    }

    #[test]
    fn bus_setting() {
        assert_eq!(Bus::from_setting("USB"), Bus::USB);
        assert_eq!(Bus::from_setting("bluetooth"), Bus::BLUETOOTH);
        assert_eq!(Bus::from_setting(" pci "), Bus::PCI);
        assert_eq!(Bus::from_setting("serial"), Bus::VIRTUAL);
        assert_eq!(Bus::from_setting(""), Bus::VIRTUAL);
    }
}
