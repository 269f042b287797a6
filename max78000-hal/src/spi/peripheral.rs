use core::{marker::PhantomData, ptr};

use fugit::HertzU32;

use super::{SpiBuffers, SpiMessage, SpiMode, SpiPins, SsTime};

/// Number of SPI peripheral instances on the MAX78000.
pub const SPI_INSTANCES: usize = 2;

/// MSDK status: success
pub const E_NO_ERROR: i32 = 0;
/// MSDK status: a parameter was out of range
pub const E_BAD_PARAM: i32 = -3;
/// MSDK status: the peripheral is in a state that doesn't allow the request (busy)
pub const E_BAD_STATE: i32 = -7;

/// Non-zero MSDK status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MxcError {
    /// `E_BAD_PARAM`
    BadParam,
    /// `E_BAD_STATE`
    BadState,
    /// Any other non-zero status
    Other(i32),
}

impl MxcError {
    /// Turn an MSDK return value into a `Result`.
    pub fn from_code(code: i32) -> Result<(), MxcError> {
        match code {
            E_NO_ERROR => Ok(()),
            E_BAD_PARAM => Err(MxcError::BadParam),
            E_BAD_STATE => Err(MxcError::BadState),
            other => Err(MxcError::Other(other)),
        }
    }

    /// The raw MSDK status code.
    pub fn code(&self) -> i32 {
        match self {
            MxcError::BadParam => E_BAD_PARAM,
            MxcError::BadState => E_BAD_STATE,
            MxcError::Other(code) => *code,
        }
    }
}

/// Clock mode as programmed into the peripheral (`mxc_spi_mode_t`).
///
/// On this part modes 1 and 2 are swapped relative to the usual CPOL/CPHA numbering. Convert
/// from [`SpiMode`] to get the right value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HwMode {
    /// `SPI_MODE_0`
    Mode0 = 0,
    /// `SPI_MODE_1`
    Mode1 = 1,
    /// `SPI_MODE_2`
    Mode2 = 2,
    /// `SPI_MODE_3`
    Mode3 = 3,
}

impl From<SpiMode> for HwMode {
    fn from(mode: SpiMode) -> Self {
        // Modes 1 and 2 are reversed on Maxim parts
        match mode {
            SpiMode::Mode0 => HwMode::Mode0,
            SpiMode::Mode1 => HwMode::Mode2,
            SpiMode::Mode2 => HwMode::Mode1,
            SpiMode::Mode3 => HwMode::Mode3,
        }
    }
}

/// Bus width (`mxc_spi_width_t`)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Width {
    /// Half duplex on a shared data line
    ThreeWire = 0,
    /// Separate MOSI and MISO lines
    Standard = 1,
    /// Two data lines
    Dual = 2,
    /// Four data lines
    Quad = 3,
}

/// Arguments of the peripheral initialization call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeripheralConfig {
    /// Master (controller) mode
    pub master: bool,
    /// Quad SPI pins in use
    pub quad: bool,
    /// Number of slave select lines in use
    pub num_slaves: u32,
    /// Slave select polarity bitmap
    pub ss_polarity: u32,
    /// SCLK frequency
    pub frequency: HertzU32,
    /// Pin mux selection
    pub pins: SpiPins,
}

/// A blocking master transaction request (`mxc_spi_req_t`).
///
/// Built from a borrowed [`SpiMessage`]; the pointers stay valid for `'a`. A direction whose
/// buffer is absent has a null pointer and a zero length.
#[derive(Debug)]
pub struct Request<'a> {
    ss_idx: u8,
    ss_deassert: bool,
    tx: *const u8,
    tx_len: usize,
    rx: *mut u8,
    rx_len: usize,
    _buffers: PhantomData<&'a mut [u8]>,
}

impl<'a> Request<'a> {
    /// Prepare a request for `msg` on slave select `ss_idx`.
    pub fn new(ss_idx: u8, msg: &'a mut SpiMessage<'_>) -> Self {
        let len = msg.bytes_number;
        let (tx, rx): (*const u8, *mut u8) = match &mut msg.buffers {
            SpiBuffers::Write(tx) => (tx.as_ptr(), ptr::null_mut()),
            SpiBuffers::Read(rx) => (ptr::null(), rx.as_mut_ptr()),
            SpiBuffers::Transfer { tx, rx } => (tx.as_ptr(), rx.as_mut_ptr()),
            SpiBuffers::InPlace(buf) => {
                let p = buf.as_mut_ptr();
                (p as *const u8, p)
            }
        };

        Self {
            ss_idx,
            ss_deassert: msg.cs_change,
            tx,
            tx_len: if tx.is_null() { 0 } else { len },
            rx,
            rx_len: if rx.is_null() { 0 } else { len },
            _buffers: PhantomData,
        }
    }

    /// Slave select line driven by this request.
    pub fn ss_idx(&self) -> u8 {
        self.ss_idx
    }

    /// Whether slave select is deasserted at the end.
    pub fn ss_deassert(&self) -> bool {
        self.ss_deassert
    }

    /// Start of the transmit buffer, null when there's nothing to send.
    pub fn tx_ptr(&self) -> *const u8 {
        self.tx
    }

    /// Number of bytes to transmit.
    pub fn tx_len(&self) -> usize {
        self.tx_len
    }

    /// Start of the receive buffer, null when received bytes are dropped.
    pub fn rx_ptr(&self) -> *mut u8 {
        self.rx
    }

    /// Number of bytes to receive.
    pub fn rx_len(&self) -> usize {
        self.rx_len
    }
}

/// Vendor SPI peripheral API.
///
/// Every method takes the peripheral index; callers only pass indices below
/// [`SPI_INSTANCES`]. Operations block until the hardware is done.
pub trait SpiPeripheral {
    /// Initialize the peripheral and its pins (`MXC_SPI_Init`).
    fn init(&mut self, id: usize, config: &PeripheralConfig) -> Result<(), MxcError>;

    /// Set the clock mode (`MXC_SPI_SetMode`).
    fn set_mode(&mut self, id: usize, mode: HwMode) -> Result<(), MxcError>;

    /// Set the bus width (`MXC_SPI_SetWidth`).
    fn set_width(&mut self, id: usize, width: Width) -> Result<(), MxcError>;

    /// Set the word size in bits (`MXC_SPI_SetDataSize`).
    fn set_data_size(&mut self, id: usize, bits: u8) -> Result<(), MxcError>;

    /// Clock feeding the peripheral (`MXC_SPI_GetPeripheralClock`).
    fn peripheral_clock(&self, id: usize) -> HertzU32;

    /// Read the slave select timing register.
    fn sstime(&self, id: usize) -> SsTime;

    /// Write the slave select timing register.
    fn set_sstime(&mut self, id: usize, sstime: SsTime);

    /// Disable the peripheral (`MXC_SPI_Shutdown`).
    fn shutdown(&mut self, id: usize);

    /// Run a blocking master transaction (`MXC_SPI_MasterTransaction`).
    fn master_transaction(&mut self, id: usize, req: &mut Request<'_>) -> Result<(), MxcError>;
}

impl<P: SpiPeripheral + ?Sized> SpiPeripheral for &mut P {
    fn init(&mut self, id: usize, config: &PeripheralConfig) -> Result<(), MxcError> {
        (**self).init(id, config)
    }

    fn set_mode(&mut self, id: usize, mode: HwMode) -> Result<(), MxcError> {
        (**self).set_mode(id, mode)
    }

    fn set_width(&mut self, id: usize, width: Width) -> Result<(), MxcError> {
        (**self).set_width(id, width)
    }

    fn set_data_size(&mut self, id: usize, bits: u8) -> Result<(), MxcError> {
        (**self).set_data_size(id, bits)
    }

    fn peripheral_clock(&self, id: usize) -> HertzU32 {
        (**self).peripheral_clock(id)
    }

    fn sstime(&self, id: usize) -> SsTime {
        (**self).sstime(id)
    }

    fn set_sstime(&mut self, id: usize, sstime: SsTime) {
        (**self).set_sstime(id, sstime)
    }

    fn shutdown(&mut self, id: usize) {
        (**self).shutdown(id)
    }

    fn master_transaction(&mut self, id: usize, req: &mut Request<'_>) -> Result<(), MxcError> {
        (**self).master_transaction(id, req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(MxcError::from_code(0), Ok(()));
        assert_eq!(MxcError::from_code(-3), Err(MxcError::BadParam));
        assert_eq!(MxcError::from_code(-7), Err(MxcError::BadState));
        assert_eq!(MxcError::from_code(-1), Err(MxcError::Other(-1)));
        assert_eq!(MxcError::Other(-9).code(), -9);
        assert_eq!(MxcError::BadState.code(), E_BAD_STATE);
    }

    #[test]
    fn clock_mode_remap() {
        assert_eq!(HwMode::from(SpiMode::Mode0), HwMode::Mode0);
        assert_eq!(HwMode::from(SpiMode::Mode1), HwMode::Mode2);
        assert_eq!(HwMode::from(SpiMode::Mode2), HwMode::Mode1);
        assert_eq!(HwMode::from(SpiMode::Mode3), HwMode::Mode3);
    }

    #[test]
    fn request_lengths_follow_buffers() {
        let tx = [0xaau8; 4];
        let mut msg = SpiMessage::write(&tx).with_cs_change(true);
        let req = Request::new(2, &mut msg);
        assert_eq!(req.ss_idx(), 2);
        assert!(req.ss_deassert());
        assert_eq!(req.tx_len(), 4);
        assert_eq!(req.rx_len(), 0);
        assert!(req.rx_ptr().is_null());

        let mut rx = [0u8; 3];
        let mut msg = SpiMessage::read(&mut rx);
        let req = Request::new(0, &mut msg);
        assert_eq!(req.tx_len(), 0);
        assert!(req.tx_ptr().is_null());
        assert_eq!(req.rx_len(), 3);
        assert!(!req.ss_deassert());
    }

    #[test]
    fn in_place_request_shares_buffer() {
        let mut buf = [1u8, 2, 3];
        let addr = buf.as_ptr();
        let mut msg = SpiMessage::in_place(&mut buf);
        let req = Request::new(0, &mut msg);
        assert_eq!(req.tx_ptr(), addr);
        assert_eq!(req.rx_ptr() as *const u8, addr);
        assert_eq!((req.tx_len(), req.rx_len()), (3, 3));
    }
}
