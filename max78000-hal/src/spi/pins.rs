//! Pin mux selection for the SPI peripherals.
//!
//! The MSDK routes the SPI signals to their fixed pins when initializing the peripheral. Only
//! the slave select line of the descriptor is enabled, so that other devices on the bus keep
//! their own select line free.

/// Number of hardware slave select lines on each SPI peripheral.
pub const SLAVE_SELECT_LINES: u8 = 3;

/// I/O voltage of the SPI pins (`mxc_gpio_vssel_t`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Vssel {
    /// VDDIO supply
    #[default]
    Vddio,
    /// VDDIOH supply
    Vddioh,
}

/// Pins enabled when initializing a peripheral (`mxc_spi_pins_t`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiPins {
    /// SCLK
    pub clock: bool,
    /// Slave select 0
    pub ss0: bool,
    /// Slave select 1
    pub ss1: bool,
    /// Slave select 2
    pub ss2: bool,
    /// MISO
    pub miso: bool,
    /// MOSI
    pub mosi: bool,
    /// Third data line, quad mode only
    pub sdio2: bool,
    /// Fourth data line, quad mode only
    pub sdio3: bool,
    /// Use the VDDIOH supply for the pins
    pub vddioh: bool,
}

impl SpiPins {
    /// Standard 4-wire pinout driving slave select `chip_select`.
    ///
    /// A chip select above the last hardware line enables no slave select at all.
    pub fn for_chip_select(chip_select: u8, vssel: Vssel) -> Self {
        Self {
            clock: true,
            ss0: chip_select == 0,
            ss1: chip_select == 1,
            ss2: chip_select == 2,
            miso: true,
            mosi: true,
            sdio2: false,
            sdio3: false,
            vddioh: vssel == Vssel::Vddioh,
        }
    }

    /// Number of slave select lines enabled.
    pub fn slave_selects(&self) -> u8 {
        [self.ss0, self.ss1, self.ss2]
            .iter()
            .filter(|enabled| **enabled)
            .count() as u8
    }
}
