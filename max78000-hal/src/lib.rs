//! HAL for the MAX78000 microcontroller
//!
//! This crate binds the MAX78000 SPI peripherals, as driven by the vendor MSDK, to a small
//! generic SPI platform interface ([`spi::SpiPlatformOps`]) and to the [`embedded-hal`] SPI
//! traits.
//!
//! The vendor SDK is reached through the [`spi::SpiPeripheral`] trait. Enable the `msdk` feature
//! to get [`msdk::Msdk`], the implementation calling into the MSDK C library.
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal

#![warn(missing_docs)]
#![cfg_attr(not(test), no_std)]

/// Emit a warning through defmt when the `defmt` feature is enabled.
macro_rules! warn {
    ($($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        defmt::warn!($($arg)+);
    }};
}

#[cfg(feature = "msdk")]
pub mod msdk;
pub mod spi;

pub use spi::{Error, MaxSpi, SpiMessage, SpiPlatformOps, SpiRegistry};
