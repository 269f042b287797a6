//! ADIS16505 IIO server for MAX78000 evaluation boards
//!
//! The sensor driver and the IIO application server are provided by the firmware image. This
//! crate holds the board configuration ([`common_data`]), the contracts those collaborators
//! implement ([`iio`]) and the procedure wiring them together ([`iio_example`]).

#![warn(missing_docs)]
#![cfg_attr(not(test), no_std)]

pub mod common_data;
pub mod iio;
pub mod iio_example;

pub use iio_example::{iio_example_main, Error, IIO_DATA_BUFFER_SIZE};
