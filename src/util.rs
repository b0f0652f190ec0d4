use std::{
    error::Error,
    ffi::c_int,
    fmt,
    fs::File,
    io::{self, Read as _, Write as _},
    os::fd::{AsRawFd, RawFd},
    slice,
    time::Duration,
};

use crate::event::InputEvent;

/// Reads as many whole events as fit into `dest`.
pub fn read_events(mut file: &File, dest: &mut [InputEvent]) -> io::Result<usize> {
    let bptr = dest.as_mut_ptr().cast::<u8>();
    // Safety: `InputEvent` is a `repr(transparent)` wrapper around `input_event`, which has no
    // padding on Linux.
    let byte_buf = unsafe { slice::from_raw_parts_mut(bptr, size_of::<InputEvent>() * dest.len()) };
    let bytes = file.read(byte_buf)?;
    debug_assert_eq!(bytes % size_of::<InputEvent>(), 0);
    Ok(bytes / size_of::<InputEvent>())
}

/// Writes all of `events` with as few `write(2)` calls as possible (normally one).
pub fn write_events(mut file: &File, events: &[InputEvent]) -> io::Result<()> {
    let bytes = unsafe {
        slice::from_raw_parts(
            events.as_ptr().cast::<u8>(),
            events.len() * size_of::<InputEvent>(),
        )
    };
    file.write_all(bytes)
}

#[derive(Debug)]
struct WrappedError {
    cause: io::Error,
    msg: String,
}

impl fmt::Display for WrappedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}
impl Error for WrappedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.cause)
    }
}

/// Adds the ioctl name and the device to an ioctl error, keeping its [`io::ErrorKind`].
pub fn ioctl_error(name: &'static str, device: &dyn fmt::Display, cause: io::Error) -> io::Error {
    let kind = cause.kind();
    let msg = format!("ioctl {name} failed for {device} ({kind:?})");
    io::Error::new(kind, WrappedError { cause, msg })
}

pub fn set_nonblocking(fd: RawFd, nonblocking: bool) -> io::Result<bool> {
    let flags = unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_GETFL) };
    if flags == -1 {
        return Err(io::Error::last_os_error());
    }

    let was_nonblocking = flags & libc::O_NONBLOCK != 0;
    let new_flags = if nonblocking {
        flags | libc::O_NONBLOCK
    } else {
        flags & !libc::O_NONBLOCK
    };

    if new_flags != flags {
        let ret = unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_SETFL, new_flags) };
        if ret == -1 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(was_nonblocking)
}

/// Waits on `fds` with `poll(2)` and returns the number of descriptors with pending `revents`.
///
/// `EINTR` is returned to the caller as [`io::ErrorKind::Interrupted`].
pub fn poll(fds: &mut [libc::pollfd], timeout: Duration) -> io::Result<usize> {
    let timeout = c_int::try_from(timeout.as_millis()).unwrap_or(c_int::MAX);
    let ret = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout) };
    if ret == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(ret as usize)
}

/// Converts an [`io::Error`] into the errno value reported back to the kernel.
///
/// Errors that don't carry an OS error code (directly or wrapped by [`ioctl_error`]) are
/// translated by their [`io::ErrorKind`], falling back to `EIO`.
pub fn errno_of(error: &io::Error) -> c_int {
    if let Some(errno) = error.raw_os_error() {
        return errno;
    }
    if let Some(wrapped) = error
        .get_ref()
        .and_then(|e| e.downcast_ref::<WrappedError>())
    {
        return errno_of(&wrapped.cause);
    }
    errorkind2libc(error.kind()).unwrap_or(libc::EIO)
}

fn errorkind2libc(kind: io::ErrorKind) -> Option<c_int> {
    use io::ErrorKind::*;

    Some(match kind {
        InvalidInput | InvalidData => libc::EINVAL,
        NotFound => libc::ENOENT,
        PermissionDenied => libc::EACCES,
        Unsupported => libc::EOPNOTSUPP,
        OutOfMemory => libc::ENOMEM,
        StorageFull => libc::ENOSPC,
        ResourceBusy => libc::EBUSY,
        AlreadyExists => libc::EEXIST,
        Interrupted => libc::EINTR,
        TimedOut => libc::ETIMEDOUT,
        BrokenPipe => libc::EPIPE,
        WouldBlock => libc::EWOULDBLOCK,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_ioctl_error() {
        let err = ioctl_error(
            "EVIOCGRAB",
            &"/dev/input/event3",
            io::Error::from_raw_os_error(libc::EBUSY),
        );
        assert_eq!(err.kind(), io::ErrorKind::ResourceBusy);
        assert_eq!(
            err.to_string(),
            "ioctl EVIOCGRAB failed for /dev/input/event3 (ResourceBusy)"
        );
        assert_eq!(errno_of(&err), libc::EBUSY);

        // ENODEV has no dedicated `ErrorKind`, so it has to come from the wrapped error
        let err = ioctl_error("EVIOCSFF", &"pad", io::Error::from_raw_os_error(libc::ENODEV));
        assert_eq!(errno_of(&err), libc::ENODEV);
    }

    #[test]
    fn errno_translation() {
        assert_eq!(errno_of(&io::Error::from_raw_os_error(libc::ENODEV)), libc::ENODEV);
        assert_eq!(
            errno_of(&io::Error::new(io::ErrorKind::InvalidInput, "bad slot")),
            libc::EINVAL,
        );
        assert_eq!(errno_of(&io::Error::other("???")), libc::EIO);
    }
}
