#![doc = include_str!("../README.md")]
#![warn(missing_debug_implementations)]

#[macro_use]
mod macros;


mod abs_info;
pub mod bits;
pub mod codes;
pub mod config;
pub mod device;
pub mod enumerate;
mod error;
mod evdev;
pub mod event;
pub mod event_device;
pub mod expr;
pub mod ff;
mod input_id;
pub mod output;
mod raw;
pub mod registry;
pub mod runtime;
pub mod setup;
pub mod uinput;
mod util;
pub mod variables;

pub use abs_info::AbsInfo;
pub use config::{Config, Section};
pub use error::{ConfigError, Error};
pub use evdev::Evdev;
pub use input_id::{Bus, InputId};
pub use runtime::{CancellationToken, Runtime};

#[cfg(test)]
mod tests {
    use crate::{output::OutputDevice, uinput::UinputDevice};

    use super::*;

    #[test]
    fn send_sync() {
        fn assert<T: Send + Sync>() {}

        assert::<Evdev>();
        assert::<UinputDevice>();
        assert::<OutputDevice>();
        assert::<CancellationToken>();
    }
}
