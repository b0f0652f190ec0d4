//! Device enumeration and selection.

use std::{
    fmt, fs, io,
    os::unix::fs::FileTypeExt as _,
    path::{Path, PathBuf},
    vec,
};

use crate::Evdev;

/// Enumerates all currently plugged-in event devices, in ascending `eventN` order.
///
/// Devices that can't be opened are yielded as errors.
pub fn enumerate() -> io::Result<Enumerate> {
    let mut paths = Vec::new();
    for entry in fs::read_dir("/dev/input")? {
        let entry = entry?;
        // `/dev/input` also contains legacy nodes like `mouseN` and `js0` that we have to skip.
        let Some(index) = event_index(&entry.file_name().to_string_lossy()) else {
            continue;
        };
        match entry.file_type() {
            Ok(ty) if ty.is_char_device() => paths.push((index, entry.path())),
            Ok(_) => {}
            Err(e) => log::debug!("failed to access '{}': {e}", entry.path().display()),
        }
    }
    paths.sort();

    Ok(Enumerate {
        paths: paths.into_iter(),
    })
}

fn event_index(file_name: &str) -> Option<u32> {
    file_name.strip_prefix("event")?.parse().ok()
}

/// Iterator over evdev devices on the system.
///
/// Returned by [`enumerate`].
#[derive(Debug)]
pub struct Enumerate {
    paths: vec::IntoIter<(u32, PathBuf)>,
}

impl Iterator for Enumerate {
    type Item = io::Result<Evdev>;

    fn next(&mut self) -> Option<Self::Item> {
        let (_, path) = self.paths.next()?;
        Some(Evdev::open(path))
    }
}

/// Selects an event device by path, by `vendor:product` ID, or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// An absolute path to the device node.
    Path(PathBuf),
    /// Hexadecimal USB-style IDs, written `vvvv:pppp`.
    Id { vendor: u16, product: u16 },
    /// The exact device name reported by the driver.
    Name(String),
}

impl Selector {
    pub fn parse(id: &str) -> Self {
        if id.starts_with('/') {
            return Selector::Path(PathBuf::from(id));
        }
        if let Some((vendor, product)) = id.split_once(':') {
            let hex = |s: &str| (s.len() == 4).then(|| u16::from_str_radix(s, 16).ok())?;
            if let (Some(vendor), Some(product)) = (hex(vendor), hex(product)) {
                return Selector::Id { vendor, product };
            }
        }
        Selector::Name(id.to_string())
    }

    fn matches(&self, evdev: &Evdev) -> io::Result<bool> {
        Ok(match self {
            Selector::Path(path) => evdev.path() == path,
            Selector::Id { vendor, product } => {
                let id = evdev.input_id()?;
                id.vendor() == *vendor && id.product() == *product
            }
            Selector::Name(name) => evdev.name()? == *name,
        })
    }

    /// Opens the device this selector refers to.
    ///
    /// Paths are opened directly. Otherwise the first matching device in [`enumerate`] order is
    /// returned; devices that fail to open are skipped.
    pub fn open(&self) -> io::Result<Evdev> {
        if let Selector::Path(path) = self {
            return Evdev::open(path);
        }

        for res in enumerate()? {
            let evdev = match res {
                Ok(evdev) => evdev,
                Err(e) => {
                    log::debug!("skipping device: {e}");
                    continue;
                }
            };
            match self.matches(&evdev) {
                Ok(true) => return Ok(evdev),
                Ok(false) => {}
                Err(e) => log::debug!("skipping '{}': {e}", evdev.path().display()),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no input device matches {self}"),
        ))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Path(path) => write!(f, "path '{}'", Path::display(path)),
            Selector::Id { vendor, product } => write!(f, "ID {vendor:04x}:{product:04x}"),
            Selector::Name(name) => write!(f, "name '{name}'"),
        }
    }
}
