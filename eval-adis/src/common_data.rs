//! Board configuration shared by the eval-adis examples.

use fugit::HertzU32;
use max78000_hal::spi::{BitOrder, MaxSpiInitParam, SpiInitParam, SpiMode, Vssel};

/// ADIS driver initialization parameters.
#[derive(Debug, Clone)]
pub struct AdisInitParam {
    /// Bus the sensor sits on
    pub spi_init: SpiInitParam<MaxSpiInitParam>,
}

/// Data bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    /// 5 bits
    Five,
    /// 6 bits
    Six,
    /// 7 bits
    Seven,
    /// 8 bits
    Eight,
}

/// Stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    /// 1 bit
    One,
    /// 2 bits
    Two,
}

/// Parity
///
/// No parity is represented with `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    /// Odd parity
    Odd,
    /// Even parity
    Even,
}

/// UART the IIO server talks over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartInitParam {
    /// UART index
    pub device_id: u8,
    /// Baud rate
    pub baudrate: HertzU32,
    /// Data bits
    pub data_bits: DataBits,
    /// Stop bits
    pub stop_bits: StopBits,
    /// Parity, `None` for no parity bit
    pub parity: Option<Parity>,
}

/// SPI bus of the ADIS16505: SPI1, chip select 1, 1 MHz, mode 3 on the VDDIOH supply.
pub const ADIS16505_SPI_IP: SpiInitParam<MaxSpiInitParam> = SpiInitParam {
    device_id: 1,
    max_speed: HertzU32::MHz(1),
    chip_select: 1,
    mode: SpiMode::Mode3,
    bit_order: BitOrder::MsbFirst,
    extra: Some(MaxSpiInitParam {
        num_slaves: 1,
        // Active low
        polarity: 0,
        vssel: Vssel::Vddioh,
    }),
};

/// ADIS16505 driver parameters.
pub const ADIS16505_IP: AdisInitParam = AdisInitParam {
    spi_init: ADIS16505_SPI_IP,
};

/// IIO server UART: UART0, 115200 baud, 8 data bits, no parity, 1 stop bit.
pub const ADIS16505_UART_IP: UartInitParam = UartInitParam {
    device_id: 0,
    baudrate: HertzU32::Hz(115_200),
    data_bits: DataBits::Eight,
    stop_bits: StopBits::One,
    parity: None,
};
