//! Virtual devices backed by `/dev/uinput`.
//!
//! A [`UinputDevice`] is configured through a [`Builder`] and then appears as a regular evdev
//! device. Applications that upload force-feedback effects to it cause [`EventType::UINPUT`]
//! requests to show up in [`UinputDevice::read_requests`], which have to be answered with
//! [`UinputDevice::ff_upload`] or [`UinputDevice::ff_erase`] before the uploading process is
//! unblocked.

use std::{
    ffi::{CString, c_int},
    fmt,
    fs::File,
    io, mem,
    os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd},
    time::Instant,
};

use uoctl::Ioctl;

use crate::{
    AbsInfo, InputId,
    event::{EventType, InputEvent, UinputCode},
    ff::{Effect, EffectId, Feature},
    raw::uinput::{
        UI_ABS_SETUP, UI_BEGIN_FF_ERASE, UI_BEGIN_FF_UPLOAD, UI_DEV_CREATE, UI_DEV_SETUP,
        UI_END_FF_ERASE, UI_END_FF_UPLOAD, UI_GET_VERSION, UI_SET_ABSBIT, UI_SET_EVBIT,
        UI_SET_FFBIT, UI_SET_KEYBIT, UI_SET_PHYS, UI_SET_RELBIT, UINPUT_MAX_NAME_SIZE,
        uinput_abs_setup, uinput_ff_erase, uinput_ff_upload, uinput_setup,
    },
    util,
};

/// Configures a [`UinputDevice`] before it is created.
///
/// Every `with_*` call that enables codes is applied to `/dev/uinput` immediately.
pub struct Builder {
    uinput: File,
    setup: uinput_setup,
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("uinput", &self.uinput)
            .field("id", &InputId(self.setup.id))
            .field("ff_effects_max", &self.setup.ff_effects_max)
            .finish_non_exhaustive()
    }
}

impl Builder {
    fn new() -> io::Result<Self> {
        let uinput = File::options()
            .read(true)
            .write(true)
            .open("/dev/uinput")
            .map_err(|e| io::Error::new(e.kind(), format!("failed to open /dev/uinput: {e}")))?;
        let mut version = 0;
        unsafe { UI_GET_VERSION.ioctl(&uinput, &mut version)? };
        log::debug!("uinput version {version:#x}");
        Ok(Self {
            uinput,
            // Safety: `uinput_setup` is plain data.
            setup: unsafe { mem::zeroed() },
        })
    }

    pub fn with_device_id(mut self, id: InputId) -> Self {
        self.setup.id = id.0;
        self
    }

    /// Sets the `phys` string the device reports.
    pub fn with_phys(self, phys: &str) -> io::Result<Self> {
        let phys =
            CString::new(phys).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        unsafe { UI_SET_PHYS.ioctl(&self.uinput, phys.as_ptr())? };
        Ok(self)
    }

    pub fn with_keys(self, keys: impl IntoIterator<Item = u16>) -> io::Result<Self> {
        self.enable_codes(UI_SET_KEYBIT, EventType::KEY, keys)
    }

    pub fn with_rel_axes(self, axes: impl IntoIterator<Item = u16>) -> io::Result<Self> {
        self.enable_codes(UI_SET_RELBIT, EventType::REL, axes)
    }

    /// Enables absolute axes, each with the range and resolution from its [`AbsInfo`].
    pub fn with_abs_axes(
        self,
        axes: impl IntoIterator<Item = (u16, AbsInfo)>,
    ) -> io::Result<Self> {
        let mut axes = axes.into_iter().peekable();
        if axes.peek().is_none() {
            return Ok(self);
        }
        self.enable_event(EventType::ABS)?;
        for (code, info) in axes {
            let setup = uinput_abs_setup {
                code,
                absinfo: info.0,
            };
            unsafe {
                UI_SET_ABSBIT.ioctl(&self.uinput, code.into())?;
                UI_ABS_SETUP.ioctl(&self.uinput, &setup)?;
            }
        }
        Ok(self)
    }

    /// Sets how many effects applications may upload at once.
    pub fn with_ff_effects_max(mut self, ff_effects_max: u32) -> Self {
        self.setup.ff_effects_max = ff_effects_max;
        self
    }

    pub fn with_ff_features(self, features: impl IntoIterator<Item = Feature>) -> io::Result<Self> {
        self.enable_codes(UI_SET_FFBIT, EventType::FF, features.into_iter().map(|f| f.0))
    }

    /// Enables `ty` and all of `codes`, unless `codes` is empty.
    fn enable_codes(
        self,
        set_bit: Ioctl<c_int>,
        ty: EventType,
        codes: impl IntoIterator<Item = u16>,
    ) -> io::Result<Self> {
        let mut codes = codes.into_iter().peekable();
        if codes.peek().is_none() {
            return Ok(self);
        }
        self.enable_event(ty)?;
        for code in codes {
            unsafe { set_bit.ioctl(&self.uinput, code.into())? };
        }
        Ok(self)
    }

    fn enable_event(&self, ty: EventType) -> io::Result<()> {
        unsafe { UI_SET_EVBIT.ioctl(&self.uinput, ty.0.into())? };
        Ok(())
    }

    /// Creates the device.
    ///
    /// `name` must be shorter than 80 bytes and must not contain NUL.
    pub fn build(mut self, name: &str) -> io::Result<UinputDevice> {
        if name.len() >= UINPUT_MAX_NAME_SIZE || name.contains('\0') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid device name {name:?}"),
            ));
        }
        for (dest, &byte) in self.setup.name.iter_mut().zip(name.as_bytes()) {
            *dest = byte as _;
        }

        unsafe {
            UI_DEV_SETUP.ioctl(&self.uinput, &self.setup)?;
            UI_DEV_CREATE.ioctl(&self.uinput)?;
        }
        log::debug!("created uinput device '{name}'");
        Ok(UinputDevice { file: self.uinput })
    }
}

/// A virtual device.
///
/// It is destroyed when this handle is dropped.
#[derive(Debug)]
pub struct UinputDevice {
    file: File,
}

impl AsFd for UinputDevice {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl AsRawFd for UinputDevice {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl UinputDevice {
    pub fn builder() -> io::Result<Builder> {
        Builder::new()
    }

    /// Returns whether the device was in non-blocking mode before.
    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<bool> {
        util::set_nonblocking(self.as_raw_fd(), nonblocking)
    }

    unsafe fn ioctl<T>(&self, name: &'static str, ioctl: Ioctl<T>, arg: T) -> io::Result<c_int> {
        unsafe { ioctl.ioctl(self, arg) }
            .map_err(|e| util::ioctl_error(name, &"uinput device", e))
    }

    /// Reads the requests and events applications sent to the device into `buf`.
    ///
    /// Returns the number of events read. In non-blocking mode, this fails with
    /// [`io::ErrorKind::WouldBlock`] when nothing is pending.
    pub fn read_requests(&self, buf: &mut [InputEvent]) -> io::Result<usize> {
        util::read_events(&self.file, buf)
    }

    /// Answers an `FF_UPLOAD` request.
    ///
    /// `handler` is called with the effect being uploaded. If it fails, the uploading process
    /// receives the error as an `errno` value, and the error is also returned from here.
    pub fn ff_upload<R>(
        &self,
        request: &InputEvent,
        handler: impl FnOnce(&ForceFeedbackUpload) -> io::Result<R>,
    ) -> io::Result<R> {
        debug_assert_eq!(request.raw_code(), UinputCode::FF_UPLOAD.0);

        let start = Instant::now();
        // Safety: plain data.
        let mut upload = ForceFeedbackUpload(unsafe { mem::zeroed() });
        upload.0.request_id = request.raw_value() as u32;
        unsafe { self.ioctl("UI_BEGIN_FF_UPLOAD", UI_BEGIN_FF_UPLOAD, &mut upload.0)? };

        let res = handler(&upload);
        if let Err(e) = &res {
            upload.0.retval = -util::errno_of(e);
            log::debug!("rejecting effect upload with {}: {e}", upload.0.retval);
        }

        unsafe { self.ioctl("UI_END_FF_UPLOAD", UI_END_FF_UPLOAD, &upload.0)? };
        log::trace!("effect upload handled in {:?}", start.elapsed());
        res
    }

    /// Answers an `FF_ERASE` request, reporting errors like [`UinputDevice::ff_upload`].
    pub fn ff_erase(
        &self,
        request: &InputEvent,
        handler: impl FnOnce(&ForceFeedbackErase) -> io::Result<()>,
    ) -> io::Result<()> {
        debug_assert_eq!(request.raw_code(), UinputCode::FF_ERASE.0);

        // Safety: plain data.
        let mut erase = ForceFeedbackErase(unsafe { mem::zeroed() });
        erase.0.request_id = request.raw_value() as u32;
        unsafe { self.ioctl("UI_BEGIN_FF_ERASE", UI_BEGIN_FF_ERASE, &mut erase.0)? };

        let res = handler(&erase);
        if let Err(e) = &res {
            erase.0.retval = -util::errno_of(e);
            log::debug!("rejecting effect erase with {}: {e}", erase.0.retval);
        }

        unsafe { self.ioctl("UI_END_FF_ERASE", UI_END_FF_ERASE, &erase.0)? };
        res
    }

    /// Writes `events` in a single `write(2)`.
    ///
    /// The kernel drops events for codes that weren't enabled and events that don't change any
    /// state.
    pub fn write(&self, events: &[InputEvent]) -> io::Result<()> {
        util::write_events(&self.file, events)
    }
}

/// A pending effect upload, see [`UinputDevice::ff_upload`].
pub struct ForceFeedbackUpload(uinput_ff_upload);

impl ForceFeedbackUpload {
    /// The effect as uploaded, carrying the ID it has on the virtual device.
    pub fn effect(&self) -> &Effect {
        // Safety: `Effect` is `#[repr(transparent)]` over `ff_effect`.
        unsafe { &*(&raw const self.0.effect).cast::<Effect>() }
    }
}

impl fmt::Debug for ForceFeedbackUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForceFeedbackUpload")
            .field("request_id", &self.0.request_id)
            .field("effect", self.effect())
            .finish_non_exhaustive()
    }
}

/// A pending effect erase, see [`UinputDevice::ff_erase`].
pub struct ForceFeedbackErase(uinput_ff_erase);

impl ForceFeedbackErase {
    /// ID of the effect on the virtual device.
    pub fn effect_id(&self) -> EffectId {
        EffectId(self.0.effect_id as i16)
    }
}

impl fmt::Debug for ForceFeedbackErase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ForceFeedbackErase({}, {:?})", self.0.request_id, self.effect_id())
    }
}
