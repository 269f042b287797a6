//! Serial Peripheral Interface (SPI)
//!
//! [`MaxSpi`] is the main struct exported by this module, representing one configured
//! peripheral + chip select combination. It implements the four operations of the generic
//! [`SpiPlatformOps`] interface, as well as the `embedded-hal` SPI traits.
//!
//! The vendor SDK is abstracted behind [`SpiPeripheral`]. Several descriptors may share a
//! peripheral instance with different chip selects: the [`SpiRegistry`] remembers which chip
//! select was last configured on each instance, and a transfer reconfigures the peripheral
//! only when that changes.
//!
//! See the MAX78000 user guide, chapter "Serial Peripheral Interface (SPI)" for more details.
//!
//! ## Usage
//!
//! ```no_run
//! # #[cfg(feature = "msdk")] {
//! use fugit::RateExtU32;
//! use max78000_hal::msdk::Msdk;
//! use max78000_hal::spi::{
//!     BitOrder, MaxSpi, MaxSpiInitParam, MaxSpiResources, SpiInitParam, SpiMode,
//!     SpiPlatformOps, SpiRegistry, Vssel,
//! };
//!
//! static REGISTRY: SpiRegistry = SpiRegistry::new();
//!
//! # fn delay() -> impl embedded_hal::delay::DelayNs { todo!() }
//! let resources = MaxSpiResources {
//!     peripheral: unsafe { Msdk::steal() },
//!     delay: delay(),
//!     registry: &REGISTRY,
//! };
//! let param = SpiInitParam {
//!     device_id: 1,
//!     max_speed: 1.MHz(),
//!     chip_select: 1,
//!     mode: SpiMode::Mode3,
//!     bit_order: BitOrder::MsbFirst,
//!     extra: Some(MaxSpiInitParam {
//!         num_slaves: 1,
//!         polarity: 0,
//!         vssel: Vssel::Vddioh,
//!     }),
//! };
//! let mut spi = MaxSpi::init(resources, &param).unwrap();
//!
//! let mut buf = [0x72, 0x00];
//! spi.write_and_read(&mut buf).unwrap();
//! # }
//! ```

use core::fmt;

use fugit::HertzU32;

mod delay;
mod max;
mod peripheral;
mod pins;
mod registry;

pub use delay::*;
pub use max::*;
pub use peripheral::*;
pub use pins::*;
pub use registry::*;

/// SPI error
///
/// Vendor SDK statuses are normalized before they leave the binding: `E_BAD_PARAM` becomes
/// [`Error::InvalidArgument`] and `E_BAD_STATE` becomes [`Error::Busy`]. Any other non-zero
/// status has no counterpart and is reported as [`Error::Vendor`] with the raw MSDK code, so
/// that it stays distinguishable from caller errors.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Bad caller input or an unsupported configuration value
    InvalidArgument,
    /// A descriptor could not be allocated
    ///
    /// [`MaxSpi`] keeps its state by value and never reports this.
    NoMemory,
    /// The peripheral reported a bad state (busy) during a transaction, retry later
    Busy,
    /// Any other non-zero status returned by the vendor SDK, with its raw MSDK code
    ///
    /// Configuration failures are never reported this way, they are all
    /// [`Error::InvalidArgument`]. Only a failing transaction surfaces it.
    Vendor(i32),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument => write!(f, "invalid argument"),
            Error::NoMemory => write!(f, "out of memory"),
            Error::Busy => write!(f, "peripheral busy"),
            Error::Vendor(code) => write!(f, "vendor error code: {}", code),
        }
    }
}

impl embedded_hal::spi::Error for Error {
    fn kind(&self) -> embedded_hal::spi::ErrorKind {
        embedded_hal::spi::ErrorKind::Other
    }
}

impl From<MxcError> for Error {
    fn from(e: MxcError) -> Self {
        match e {
            MxcError::BadParam => Error::InvalidArgument,
            MxcError::BadState => Error::Busy,
            MxcError::Other(code) => Error::Vendor(code),
        }
    }
}

/// Clock polarity and phase, numbered as in the generic SPI interface
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiMode {
    /// CPOL=0, CPHA=0
    Mode0 = 0,
    /// CPOL=0, CPHA=1
    Mode1 = 1,
    /// CPOL=1, CPHA=0
    Mode2 = 2,
    /// CPOL=1, CPHA=1
    Mode3 = 3,
}

impl TryFrom<u8> for SpiMode {
    type Error = Error;

    fn try_from(mode: u8) -> Result<Self, Error> {
        match mode {
            0 => Ok(SpiMode::Mode0),
            1 => Ok(SpiMode::Mode1),
            2 => Ok(SpiMode::Mode2),
            3 => Ok(SpiMode::Mode3),
            _ => Err(Error::InvalidArgument),
        }
    }
}

impl From<embedded_hal::spi::Mode> for SpiMode {
    fn from(mode: embedded_hal::spi::Mode) -> Self {
        use embedded_hal::spi::{Phase, Polarity};

        match (mode.polarity, mode.phase) {
            (Polarity::IdleLow, Phase::CaptureOnFirstTransition) => SpiMode::Mode0,
            (Polarity::IdleLow, Phase::CaptureOnSecondTransition) => SpiMode::Mode1,
            (Polarity::IdleHigh, Phase::CaptureOnFirstTransition) => SpiMode::Mode2,
            (Polarity::IdleHigh, Phase::CaptureOnSecondTransition) => SpiMode::Mode3,
        }
    }
}

/// SPI bit order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitOrder {
    /// Most significant bit first
    #[default]
    MsbFirst,
    /// Least significant bit first
    LsbFirst,
}

/// Generic SPI initialization parameters.
///
/// `X` is the platform specific extension block, [`MaxSpiInitParam`] for this HAL.
#[derive(Debug, Clone)]
pub struct SpiInitParam<X> {
    /// Peripheral index
    pub device_id: usize,
    /// Target SCLK frequency
    pub max_speed: HertzU32,
    /// Chip select line
    pub chip_select: u8,
    /// Clock polarity and phase
    pub mode: SpiMode,
    /// Bit order
    pub bit_order: BitOrder,
    /// Platform specific parameters. Initialization fails without them.
    pub extra: Option<X>,
}

/// Data buffers of a [`SpiMessage`].
///
/// At least one direction is always present.
#[derive(Debug)]
pub enum SpiBuffers<'a> {
    /// Transmit only, received bytes are discarded
    Write(&'a [u8]),
    /// Receive only
    Read(&'a mut [u8]),
    /// Transmit from `tx` while receiving into `rx`
    Transfer {
        /// Transmitted bytes
        tx: &'a [u8],
        /// Received bytes
        rx: &'a mut [u8],
    },
    /// Transmit the buffer and replace it with the received bytes
    InPlace(&'a mut [u8]),
}

impl SpiBuffers<'_> {
    /// Length of the transmit buffer, if any.
    pub fn tx_len(&self) -> Option<usize> {
        match self {
            SpiBuffers::Write(tx) => Some(tx.len()),
            SpiBuffers::Read(_) => None,
            SpiBuffers::Transfer { tx, .. } => Some(tx.len()),
            SpiBuffers::InPlace(buf) => Some(buf.len()),
        }
    }

    /// Length of the receive buffer, if any.
    pub fn rx_len(&self) -> Option<usize> {
        match self {
            SpiBuffers::Write(_) => None,
            SpiBuffers::Read(rx) => Some(rx.len()),
            SpiBuffers::Transfer { rx, .. } => Some(rx.len()),
            SpiBuffers::InPlace(buf) => Some(buf.len()),
        }
    }
}

/// One logical SPI transaction.
#[derive(Debug)]
pub struct SpiMessage<'a> {
    /// Data to send and/or receive
    pub buffers: SpiBuffers<'a>,
    /// Number of bytes to clock. Must not exceed the length of any present buffer.
    pub bytes_number: usize,
    /// Deassert chip select at the end of this message
    pub cs_change: bool,
    /// Busy wait after this message, in microseconds
    pub cs_change_delay: u32,
    /// Delay between chip select assertion and the first SCLK edge, in microseconds
    pub cs_delay_first: u32,
    /// Delay between the last SCLK edge and chip select deassertion, in microseconds
    pub cs_delay_last: u32,
}

impl<'a> SpiMessage<'a> {
    /// Build a message clocking every byte of `buffers`, keeping chip select asserted.
    pub fn new(buffers: SpiBuffers<'a>) -> Self {
        let bytes_number = match (buffers.tx_len(), buffers.rx_len()) {
            (Some(tx), Some(rx)) => tx.min(rx),
            (Some(len), None) | (None, Some(len)) => len,
            (None, None) => 0,
        };

        Self {
            buffers,
            bytes_number,
            cs_change: false,
            cs_change_delay: 0,
            cs_delay_first: 0,
            cs_delay_last: 0,
        }
    }

    /// Transmit-only message.
    pub fn write(tx: &'a [u8]) -> Self {
        Self::new(SpiBuffers::Write(tx))
    }

    /// Receive-only message.
    pub fn read(rx: &'a mut [u8]) -> Self {
        Self::new(SpiBuffers::Read(rx))
    }

    /// Full duplex message with separate buffers.
    pub fn transfer(tx: &'a [u8], rx: &'a mut [u8]) -> Self {
        Self::new(SpiBuffers::Transfer { tx, rx })
    }

    /// Full duplex message sending and receiving through the same buffer.
    pub fn in_place(buf: &'a mut [u8]) -> Self {
        Self::new(SpiBuffers::InPlace(buf))
    }

    /// Set whether chip select is deasserted at the end of the message.
    pub fn with_cs_change(mut self, cs_change: bool) -> Self {
        self.cs_change = cs_change;
        self
    }

    /// Set the busy wait performed after the message, in microseconds.
    pub fn with_cs_change_delay(mut self, us: u32) -> Self {
        self.cs_change_delay = us;
        self
    }

    /// Set the chip select setup (`first`) and hold (`last`) delays, in microseconds.
    pub fn with_cs_delays(mut self, first: u32, last: u32) -> Self {
        self.cs_delay_first = first;
        self.cs_delay_last = last;
        self
    }

    fn validate(&self) -> Result<(), Error> {
        let fits = |len: Option<usize>| len.map_or(true, |len| self.bytes_number <= len);
        if fits(self.buffers.tx_len()) && fits(self.buffers.rx_len()) {
            Ok(())
        } else {
            Err(Error::InvalidArgument)
        }
    }
}

/// The generic SPI platform interface.
///
/// A platform family implements these four operations. Drivers written against this trait
/// are independent of the peripheral behind it.
pub trait SpiPlatformOps: Sized {
    /// Platform handles consumed by [`init`](Self::init) and handed back by
    /// [`remove`](Self::remove).
    type Resources;
    /// Platform specific extension of [`SpiInitParam`].
    type Extra: Clone;

    /// Initialize and configure the peripheral.
    ///
    /// On failure the peripheral is left shut down.
    fn init(resources: Self::Resources, param: &SpiInitParam<Self::Extra>)
        -> Result<Self, Error>;

    /// Send `data` and replace it with the received bytes, deasserting chip select at the end.
    fn write_and_read(&mut self, data: &mut [u8]) -> Result<(), Error>;

    /// Execute a batch of messages in order.
    ///
    /// Processing stops at the first failing message. Messages already sent are not rolled
    /// back.
    fn transfer(&mut self, msgs: &mut [SpiMessage<'_>]) -> Result<(), Error>;

    /// Shut the peripheral down and release the descriptor.
    fn remove(self) -> Self::Resources;
}
