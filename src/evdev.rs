use std::{
    ffi::{c_char, c_int, c_void},
    fs::File,
    io,
    mem::MaybeUninit,
    os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd},
    path::{Path, PathBuf},
    time::Instant,
};

use uoctl::Ioctl;

use crate::{
    AbsInfo,
    bits::BitSet,
    event::{EventType, InputEvent},
    ff::{self, Feature},
    input_id::InputId,
    raw::input::{
        EVIOCGABS, EVIOCGBIT, EVIOCGID, EVIOCGKEY, EVIOCGNAME, EVIOCGRAB, EVIOCGVERSION,
        EVIOCRMFF, EVIOCSFF,
    },
    util::{self, set_nonblocking},
};

/// `KEY_MAX`
pub(crate) const KEY_MAX: u16 = 0x2ff;
/// `REL_MAX`
pub(crate) const REL_MAX: u16 = 0x0f;
/// `ABS_MAX`
pub(crate) const ABS_MAX: u16 = 0x3f;

/// A handle to an *event device* (`/dev/input/event*`).
#[derive(Debug)]
pub struct Evdev {
    file: File,
    path: PathBuf,
}

impl AsFd for Evdev {
    #[inline]
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl AsRawFd for Evdev {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl Evdev {
    /// Opens an event device.
    ///
    /// Read-write access is tried first, so that force-feedback effects can be played. Without
    /// permission for that, the device is opened read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let now = Instant::now();

        let file = Self::try_open(path).map_err(|e| {
            io::Error::new(e.kind(), format!("failed to open '{}': {e}", path.display()))
        })?;
        let this = Self {
            file,
            path: path.to_path_buf(),
        };
        let version = this.driver_version()?;
        log::debug!(
            "opened '{}' in {:?}; driver version {}.{}.{}",
            this.path().display(),
            now.elapsed(),
            version >> 16,
            (version >> 8) & 0xff,
            version & 0xff,
        );
        Ok(this)
    }

    fn try_open(path: &Path) -> io::Result<File> {
        match File::options().read(true).write(true).open(path) {
            Ok(file) => return Ok(file),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                log::warn!(
                    "no permission to open '{}' in read-write mode, retrying in read-only",
                    path.display()
                );
            }
            Err(e) => return Err(e),
        }

        File::options().read(true).open(path)
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Moves this handle into or out of non-blocking mode.
    ///
    /// Returns whether the [`Evdev`] was previously in non-blocking mode. Only event reads honor
    /// this; ioctls always block.
    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<bool> {
        set_nonblocking(self.as_raw_fd(), nonblocking)
    }

    /// Executes `ioctl` and adds context to the error.
    unsafe fn ioctl<T>(&self, name: &'static str, ioctl: Ioctl<T>, arg: T) -> io::Result<c_int> {
        unsafe { ioctl.ioctl(self, arg) }
            .map_err(|e| util::ioctl_error(name, &self.path.display(), e))
    }

    unsafe fn fetch_string(
        &self,
        ioctl_name: &'static str,
        ioctl: fn(usize) -> Ioctl<*mut c_char>,
    ) -> io::Result<String> {
        // These ioctls return the number of bytes copied, which is at most the buffer length. If
        // the buffer was filled completely the string may be truncated, so retry with more room.
        let mut buf = vec![0_u8; 64];
        let len = loop {
            let len = unsafe {
                self.ioctl(
                    ioctl_name,
                    ioctl(buf.len()),
                    buf.as_mut_ptr() as *mut c_char,
                )?
            };
            if len as usize == buf.len() {
                buf.resize(buf.len() * 2, 0);
            } else {
                break len;
            }
        };

        // `len` includes the trailing 0 byte
        buf.truncate(len.saturating_sub(1) as usize);
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    unsafe fn fetch_bits(
        &self,
        ioctl_name: &'static str,
        ioctl: impl FnOnce(usize) -> Ioctl<*mut c_void>,
        max: u16,
    ) -> io::Result<BitSet> {
        let mut set = BitSet::with_max(max);
        let len = set.byte_len();
        unsafe {
            self.ioctl(ioctl_name, ioctl(len), set.words_mut().as_mut_ptr().cast())?;
        }
        Ok(set)
    }

    /// Returns the evdev subsystem version.
    pub fn driver_version(&self) -> io::Result<u32> {
        let mut version: c_int = 0;
        unsafe {
            self.ioctl("EVIOCGVERSION", EVIOCGVERSION, &mut version)?;
        }
        Ok(version as u32)
    }

    pub fn input_id(&self) -> io::Result<InputId> {
        let mut out = MaybeUninit::uninit();
        unsafe {
            self.ioctl("EVIOCGID", EVIOCGID, out.as_mut_ptr())?;
            Ok(InputId(out.assume_init()))
        }
    }

    pub fn name(&self) -> io::Result<String> {
        unsafe { self.fetch_string("EVIOCGNAME", EVIOCGNAME) }
    }

    /// Returns the codes the device advertises for event type `ty`.
    ///
    /// Supported for [`EventType::KEY`], [`EventType::REL`], [`EventType::ABS`] and
    /// [`EventType::FF`].
    pub fn supported_codes(&self, ty: EventType) -> io::Result<BitSet> {
        let max = match ty {
            EventType::KEY => KEY_MAX,
            EventType::REL => REL_MAX,
            EventType::ABS => ABS_MAX,
            EventType::FF => Feature::MAX.0,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("unsupported event type {ty:?}"),
                ));
            }
        };
        unsafe { self.fetch_bits("EVIOCGBIT", |len| EVIOCGBIT(ty.0 as u8, len), max) }
    }

    /// Returns information about the absolute axis `code`, including its current value.
    pub fn abs_info(&self, code: u16) -> io::Result<AbsInfo> {
        if code > ABS_MAX {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("absolute axis {code:#x} exceeds maximum axis value"),
            ));
        }

        unsafe {
            let mut out = MaybeUninit::uninit();
            self.ioctl("EVIOCGABS", EVIOCGABS(code as u8), out.as_mut_ptr())?;
            Ok(AbsInfo(out.assume_init()))
        }
    }

    /// Grabs this input device, making its events unavailable to other programs.
    ///
    /// The kernel releases the grab when the file descriptor is closed.
    pub fn grab(&self) -> io::Result<()> {
        unsafe {
            self.ioctl("EVIOCGRAB", EVIOCGRAB, 1)?;
        }
        Ok(())
    }

    /// Queries the set of currently pressed keys.
    pub fn key_state(&self) -> io::Result<BitSet> {
        unsafe { self.fetch_bits("EVIOCGKEY", EVIOCGKEY, KEY_MAX) }
    }

    /// Reads incoming events into `buf`.
    ///
    /// In non-blocking mode, this fails with [`io::ErrorKind::WouldBlock`] when no events are
    /// pending.
    pub fn read_events(&self, buf: &mut [InputEvent]) -> io::Result<usize> {
        util::read_events(&self.file, buf)
    }

    /// Uploads a force-feedback effect and returns the ID the kernel assigned to it.
    ///
    /// If the effect carries an existing ID, that effect is updated in place.
    pub fn upload_ff_effect(&self, effect: &ff::Effect) -> io::Result<ff::EffectId> {
        log::trace!("uploading FF effect to '{}': {:?}", self.path.display(), effect);
        let mut effect = *effect;
        let now = Instant::now();
        unsafe {
            self.ioctl("EVIOCSFF", EVIOCSFF, &mut effect.raw)?;
        }
        log::debug!("upload_ff_effect: ioctl took {:?}", now.elapsed());

        Ok(effect.id())
    }

    pub fn erase_ff_effect(&self, id: ff::EffectId) -> io::Result<()> {
        unsafe {
            self.ioctl("EVIOCRMFF", EVIOCRMFF, id.0 as c_int)?;
        }
        Ok(())
    }

    /// Starts or stops an uploaded force-feedback effect.
    pub fn control_ff(&self, effect: ff::EffectId, active: bool) -> io::Result<()> {
        self.write(&[InputEvent::new(
            EventType::FF,
            effect.0 as u16,
            active as i32,
        )])
    }

    /// Sets the global gain for force-feedback effects, as a fraction of 65535.
    pub fn set_ff_gain(&self, gain: u16) -> io::Result<()> {
        self.write(&[InputEvent::new(
            EventType::FF,
            Feature::GAIN.0,
            gain.into(),
        )])
    }

    pub fn write(&self, events: &[InputEvent]) -> io::Result<()> {
        util::write_events(&self.file, events)
    }
}
