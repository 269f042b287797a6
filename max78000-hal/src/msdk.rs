//! MAX78000 SDK (MSDK) backend
//!
//! [`Msdk`] implements [`SpiPeripheral`] by calling the MSDK peripheral driver library
//! (`libPeriphDriver`), which must be linked into the firmware image. The slave select timing
//! register has no MSDK accessor and is accessed directly.

use core::ffi::{c_int, c_uint, c_void};

use fugit::{HertzU32, RateExtU32};
use vcell::VolatileCell;

use crate::spi::{
    HwMode, MxcError, PeripheralConfig, Request, SpiPeripheral, SpiPins, SsTime, Width,
    SPI_INSTANCES,
};

const SPI0_BASE: usize = 0x400B_E000;
const SPI1_BASE: usize = 0x4004_6000;

/// Start of `mxc_spi_regs_t`, up to the register accessed from Rust.
#[repr(C)]
struct RegisterBlock {
    /// FIFO32, CTRL0, CTRL1, CTRL2
    _reserved0: [VolatileCell<u32>; 4],
    sstime: VolatileCell<u32>,
}

/// `mxc_spi_pins_t`
#[repr(C)]
struct MxcSpiPins {
    clock: bool,
    ss0: bool,
    ss1: bool,
    ss2: bool,
    miso: bool,
    mosi: bool,
    sdio2: bool,
    sdio3: bool,
    vddioh: bool,
}

impl From<SpiPins> for MxcSpiPins {
    fn from(pins: SpiPins) -> Self {
        Self {
            clock: pins.clock,
            ss0: pins.ss0,
            ss1: pins.ss1,
            ss2: pins.ss2,
            miso: pins.miso,
            mosi: pins.mosi,
            sdio2: pins.sdio2,
            sdio3: pins.sdio3,
            vddioh: pins.vddioh,
        }
    }
}

/// `mxc_spi_req_t`
#[repr(C)]
struct MxcSpiReq {
    spi: *mut RegisterBlock,
    ss_idx: c_int,
    ss_deassert: c_int,
    tx_data: *mut u8,
    rx_data: *mut u8,
    tx_len: u32,
    rx_len: u32,
    tx_cnt: u32,
    rx_cnt: u32,
    complete_cb: Option<unsafe extern "C" fn(req: *mut c_void, result: c_int)>,
}

extern "C" {
    #[link_name = "MXC_SPI_Init"]
    fn mxc_spi_init(
        spi: *mut RegisterBlock,
        master_mode: c_int,
        quad_mode_used: c_int,
        num_slaves: c_int,
        ss_polarity: c_uint,
        hz: c_uint,
        pins: MxcSpiPins,
    ) -> c_int;

    #[link_name = "MXC_SPI_Shutdown"]
    fn mxc_spi_shutdown(spi: *mut RegisterBlock) -> c_int;

    #[link_name = "MXC_SPI_SetMode"]
    fn mxc_spi_set_mode(spi: *mut RegisterBlock, mode: c_int) -> c_int;

    #[link_name = "MXC_SPI_SetWidth"]
    fn mxc_spi_set_width(spi: *mut RegisterBlock, width: c_int) -> c_int;

    #[link_name = "MXC_SPI_SetDataSize"]
    fn mxc_spi_set_data_size(spi: *mut RegisterBlock, data_size: c_int) -> c_int;

    #[link_name = "MXC_SPI_GetPeripheralClock"]
    fn mxc_spi_get_peripheral_clock(spi: *mut RegisterBlock) -> c_int;

    #[link_name = "MXC_SPI_MasterTransaction"]
    fn mxc_spi_master_transaction(req: *mut MxcSpiReq) -> c_int;
}

/// `MXC_SPI_GET_SPI`
fn regs(id: usize) -> *mut RegisterBlock {
    debug_assert!(id < SPI_INSTANCES);
    match id {
        0 => SPI0_BASE as *mut RegisterBlock,
        _ => SPI1_BASE as *mut RegisterBlock,
    }
}

/// The MSDK SPI driver.
///
/// This is a zero sized handle; every descriptor gets its own copy.
#[derive(Debug, Clone, Copy)]
pub struct Msdk {
    _private: (),
}

impl Msdk {
    /// Get a handle on the MSDK SPI driver.
    ///
    /// # Safety
    ///
    /// Must only be called on a MAX78000, with the MSDK linked and the system clocks set up.
    /// The SPI peripherals must not be driven by anything other than [`Msdk`] handles.
    pub unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

impl SpiPeripheral for Msdk {
    fn init(&mut self, id: usize, config: &PeripheralConfig) -> Result<(), MxcError> {
        // SAFETY: `regs` points at a SPI peripheral, the MSDK validates the rest.
        let ret = unsafe {
            mxc_spi_init(
                regs(id),
                config.master as c_int,
                config.quad as c_int,
                config.num_slaves as c_int,
                config.ss_polarity as c_uint,
                config.frequency.to_Hz() as c_uint,
                config.pins.into(),
            )
        };
        MxcError::from_code(ret)
    }

    fn set_mode(&mut self, id: usize, mode: HwMode) -> Result<(), MxcError> {
        MxcError::from_code(unsafe { mxc_spi_set_mode(regs(id), mode as c_int) })
    }

    fn set_width(&mut self, id: usize, width: Width) -> Result<(), MxcError> {
        MxcError::from_code(unsafe { mxc_spi_set_width(regs(id), width as c_int) })
    }

    fn set_data_size(&mut self, id: usize, bits: u8) -> Result<(), MxcError> {
        MxcError::from_code(unsafe { mxc_spi_set_data_size(regs(id), bits as c_int) })
    }

    fn peripheral_clock(&self, id: usize) -> HertzU32 {
        let hz = unsafe { mxc_spi_get_peripheral_clock(regs(id)) };
        // Negative values are MSDK error codes
        u32::try_from(hz).unwrap_or(0).Hz()
    }

    fn sstime(&self, id: usize) -> SsTime {
        // SAFETY: `regs` points at the memory mapped registers of a SPI peripheral.
        SsTime::from_bits(unsafe { (*regs(id)).sstime.get() })
    }

    fn set_sstime(&mut self, id: usize, sstime: SsTime) {
        unsafe { (*regs(id)).sstime.set(sstime.bits()) }
    }

    fn shutdown(&mut self, id: usize) {
        // Only fails for an unknown instance
        let _ = unsafe { mxc_spi_shutdown(regs(id)) };
    }

    fn master_transaction(&mut self, id: usize, req: &mut Request<'_>) -> Result<(), MxcError> {
        let mut mxc_req = MxcSpiReq {
            spi: regs(id),
            ss_idx: req.ss_idx() as c_int,
            ss_deassert: req.ss_deassert() as c_int,
            // The MSDK only reads through `txData`
            tx_data: req.tx_ptr() as *mut u8,
            rx_data: req.rx_ptr(),
            tx_len: req.tx_len() as u32,
            rx_len: req.rx_len() as u32,
            tx_cnt: 0,
            rx_cnt: 0,
            complete_cb: None,
        };

        // SAFETY: the buffers are borrowed by `req` for the whole blocking call.
        MxcError::from_code(unsafe { mxc_spi_master_transaction(&mut mxc_req) })
    }
}
