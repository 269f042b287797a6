//! IIO collaborators
//!
//! The sensor IIO descriptor and the IIO application server live outside this crate. These
//! traits are the calls the example makes into them.

use core::convert::Infallible;

/// Scratch buffer the IIO server fills with samples of a device.
#[derive(Debug)]
pub struct IioDataBuffer<'a> {
    /// Sample storage
    pub buff: &'a mut [u8],
}

impl<'a> IioDataBuffer<'a> {
    /// Wrap `buff`.
    pub fn new(buff: &'a mut [u8]) -> Self {
        Self { buff }
    }

    /// Capacity in bytes.
    pub fn size(&self) -> usize {
        self.buff.len()
    }
}

/// A sensor that can be exposed as an IIO device.
pub trait IioSensor: Sized {
    /// Driver initialization parameters
    type InitParam;
    /// Driver error
    type Error;

    /// Probe the sensor and build its IIO descriptor.
    fn iio_init(param: &Self::InitParam) -> Result<Self, Self::Error>;
}

/// An entry of the IIO server device table.
#[derive(Debug)]
pub struct IioAppDevice<'a, S> {
    /// Name reported to IIO clients
    pub name: &'static str,
    /// The device
    pub dev: S,
    /// Buffer used for buffered reads, `None` if the device isn't read in bursts
    pub read_buff: Option<IioDataBuffer<'a>>,
}

/// IIO server initialization parameters.
///
/// `T` is the device table, usually an array of [`IioAppDevice`].
#[derive(Debug)]
pub struct IioAppInitParam<T, U> {
    /// Devices served
    pub devices: T,
    /// Transport the server listens on
    pub uart_init_params: U,
}

/// The IIO application server, generic over its device table `T`.
pub trait IioApp<T>: Sized {
    /// Transport parameters
    type UartParam;
    /// Server error
    type Error;

    /// Set up the transport and register the devices.
    fn init(param: IioAppInitParam<T, Self::UartParam>) -> Result<Self, Self::Error>;

    /// Serve requests.
    ///
    /// Only returns on a fatal error.
    fn run(&mut self) -> Result<Infallible, Self::Error>;
}
