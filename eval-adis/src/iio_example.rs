//! IIO example
//!
//! Expose one ADIS16505 through the IIO application server, over UART.

use core::{convert::Infallible, ffi::c_int, fmt, mem::size_of};

use crate::iio::{IioApp, IioAppDevice, IioAppInitParam, IioDataBuffer, IioSensor};

/// Samples held by the read buffer.
const DATA_BUFFER_SIZE: usize = 400;

/// Size of the buffer the sensor samples are read into: 400 samples of 13 channels.
pub const IIO_DATA_BUFFER_SIZE: usize = DATA_BUFFER_SIZE * 13 * size_of::<c_int>();

/// Name the sensor is served under.
pub const DEVICE_NAME: &str = "adis16505";

/// Device table served by the example.
pub type Devices<'a, S> = [IioAppDevice<'a, S>; 1];

/// Failure of the IIO example.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<S, A> {
    /// The sensor IIO descriptor could not be created
    Sensor(S),
    /// The IIO server failed to start, or stopped
    App(A),
}

impl<S: fmt::Display, A: fmt::Display> fmt::Display for Error<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Sensor(e) => write!(f, "sensor initialization failed: {}", e),
            Error::App(e) => write!(f, "IIO server error: {}", e),
        }
    }
}

/// Run the IIO example.
///
/// Initializes the sensor with `sensor_param`, registers it with the IIO server listening on
/// `uart_param` and serves requests, reading samples into `buffer`. Only returns on failure.
///
/// ```no_run
/// # use core::convert::Infallible;
/// # use eval_adis::common_data::{AdisInitParam, UartInitParam, ADIS16505_IP, ADIS16505_UART_IP};
/// # use eval_adis::iio::*;
/// # use eval_adis::iio_example::{Devices, IIO_DATA_BUFFER_SIZE};
/// # struct Adis16505;
/// # impl IioSensor for Adis16505 {
/// #     type InitParam = AdisInitParam;
/// #     type Error = i32;
/// #     fn iio_init(_: &AdisInitParam) -> Result<Self, i32> { Ok(Adis16505) }
/// # }
/// # struct Server;
/// # impl<'a> IioApp<Devices<'a, Adis16505>> for Server {
/// #     type UartParam = UartInitParam;
/// #     type Error = i32;
/// #     fn init(_: IioAppInitParam<Devices<'a, Adis16505>, UartInitParam>) -> Result<Self, i32> { Ok(Server) }
/// #     fn run(&mut self) -> Result<Infallible, i32> { Err(-1) }
/// # }
/// static mut IIO_DATA_BUFFER: [u8; IIO_DATA_BUFFER_SIZE] = [0; IIO_DATA_BUFFER_SIZE];
///
/// // SAFETY: the example is entered once.
/// let buffer = unsafe { &mut *core::ptr::addr_of_mut!(IIO_DATA_BUFFER) };
/// let err = eval_adis::iio_example_main::<Adis16505, Server>(
///     buffer,
///     &ADIS16505_IP,
///     ADIS16505_UART_IP,
/// )
/// .unwrap_err();
/// ```
pub fn iio_example_main<'a, S, A>(
    buffer: &'a mut [u8; IIO_DATA_BUFFER_SIZE],
    sensor_param: &S::InitParam,
    uart_param: A::UartParam,
) -> Result<Infallible, Error<S::Error, A::Error>>
where
    S: IioSensor,
    A: IioApp<Devices<'a, S>>,
{
    let data_buff = IioDataBuffer::new(buffer);

    let adis16505 = S::iio_init(sensor_param).map_err(Error::Sensor)?;

    let devices = [IioAppDevice {
        name: DEVICE_NAME,
        dev: adis16505,
        read_buff: Some(data_buff),
    }];

    let mut app = A::init(IioAppInitParam {
        devices,
        uart_init_params: uart_param,
    })
    .map_err(Error::App)?;

    app.run().map_err(Error::App)
}
