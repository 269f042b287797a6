use embedded_hal::{
    delay::DelayNs,
    spi::{ErrorType, Operation, SpiDevice},
};
// Support Embedded HAL 0.2 for backwards-compatibility
use embedded_hal_0_2::blocking::spi as blocking_spi02;
use fugit::HertzU32;

use super::{
    apply_cs_delays, BitOrder, CsDelays, DelayError, Error, HwMode, MxcError, PeripheralConfig,
    Request, SpiInitParam, SpiMessage, SpiMode, SpiPeripheral, SpiPins, SpiPlatformOps,
    SpiRegistry, Vssel, Width, SPI_INSTANCES,
};

/// Word size, in bits, of every transfer.
pub const DATA_SIZE_BITS: u8 = 8;

/// MAX78000 specific SPI initialization parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MaxSpiInitParam {
    /// Number of slave select lines used on the peripheral
    pub num_slaves: u32,
    /// Slave select polarity, one bit per line, set for active high
    pub polarity: u32,
    /// Supply of the SPI pins
    pub vssel: Vssel,
}

/// Everything a [`MaxSpi`] needs besides its parameters.
pub struct MaxSpiResources<'r, P, D> {
    /// Vendor SDK access
    pub peripheral: P,
    /// Busy wait provider used between messages
    pub delay: D,
    /// Chip select bookkeeping shared by all descriptors
    pub registry: &'r SpiRegistry,
}

struct MaxSpiState {
    cs_delays: CsDelays,
    init_param: MaxSpiInitParam,
}

/// Configured SPI peripheral + chip select.
///
/// This struct implements [`SpiPlatformOps`] and the `embedded-hal` SPI traits. Several
/// `MaxSpi` may drive the same peripheral with different chip selects, as long as they share
/// the same [`SpiRegistry`] and aren't used concurrently.
///
/// `MaxSpi` has three generic parameters:
/// - `'r`: lifetime of the [`SpiRegistry`], usually `'static`
/// - `P`: the vendor SDK access, [`Msdk`](crate::msdk::Msdk) on hardware
/// - `D`: an [`embedded_hal::delay::DelayNs`] used for the delays requested by messages
///
/// See [the module level docs][super] for an example.
pub struct MaxSpi<'r, P: SpiPeripheral, D: DelayNs> {
    peripheral: P,
    delay: D,
    registry: &'r SpiRegistry,
    device_id: usize,
    max_speed: HertzU32,
    chip_select: u8,
    mode: SpiMode,
    bit_order: BitOrder,
    state: MaxSpiState,
}

impl<'r, P: SpiPeripheral, D: DelayNs> MaxSpi<'r, P, D> {
    /// Peripheral index.
    pub fn device_id(&self) -> usize {
        self.device_id
    }

    /// Requested SCLK frequency.
    pub fn max_speed(&self) -> HertzU32 {
        self.max_speed
    }

    /// Chip select driven by this descriptor.
    pub fn chip_select(&self) -> u8 {
        self.chip_select
    }

    /// Drive another chip select.
    ///
    /// The peripheral is reconfigured by the next transfer.
    pub fn set_chip_select(&mut self, chip_select: u8) {
        self.chip_select = chip_select;
    }

    /// Clock polarity and phase.
    pub fn mode(&self) -> SpiMode {
        self.mode
    }

    /// Bit order.
    pub fn bit_order(&self) -> BitOrder {
        self.bit_order
    }

    /// Chip select delays currently programmed in the peripheral.
    pub fn cs_delays(&self) -> CsDelays {
        self.state.cs_delays
    }

    /// Platform parameters the peripheral is configured with.
    pub fn init_param(&self) -> &MaxSpiInitParam {
        &self.state.init_param
    }

    /// Apply the descriptor settings to the peripheral.
    ///
    /// Any SDK failure shuts the peripheral down.
    fn configure(&mut self) -> Result<(), Error> {
        let id = self.device_id;
        let eparam = self.state.init_param;
        let config = PeripheralConfig {
            master: true,
            quad: false,
            num_slaves: eparam.num_slaves,
            ss_polarity: eparam.polarity,
            frequency: self.max_speed,
            pins: SpiPins::for_chip_select(self.chip_select, eparam.vssel),
        };

        let res = self.peripheral.init(id, &config);
        self.shutdown_on_error(res)?;
        let res = self.peripheral.set_mode(id, HwMode::from(self.mode));
        self.shutdown_on_error(res)?;
        let res = self.peripheral.set_width(id, Width::Standard);
        self.shutdown_on_error(res)?;
        let res = self.peripheral.set_data_size(id, DATA_SIZE_BITS);
        self.shutdown_on_error(res)?;

        // Start from the shortest setup and hold times, which is what a 0 us delay maps to
        let mut sstime = self.peripheral.sstime(id);
        sstime.set_pre(1);
        sstime.set_post(1);
        self.peripheral.set_sstime(id, sstime);
        self.state.cs_delays = CsDelays::default();

        self.registry.record(id, self.chip_select);

        Ok(())
    }

    fn shutdown_on_error(&mut self, res: Result<(), MxcError>) -> Result<(), Error> {
        res.map_err(|_| {
            self.peripheral.shutdown(self.device_id);
            Error::InvalidArgument
        })
    }

    /// Reconfigure the peripheral if another chip select was used last.
    fn select(&mut self) -> Result<(), Error> {
        if self
            .registry
            .needs_reconfigure(self.device_id, self.chip_select)
        {
            self.configure()?;
        }

        Ok(())
    }

    /// Set the closest chip select delays to what was requested.
    ///
    /// A request that can't be programmed keeps the previous delays in effect.
    fn update_cs_delays(&mut self, first: u32, last: u32) {
        let requested = CsDelays { first, last };
        match apply_cs_delays(
            &mut self.peripheral,
            self.device_id,
            self.state.cs_delays,
            requested,
        ) {
            Ok(applied) => self.state.cs_delays = applied,
            Err(DelayError::FirstTooHigh) => warn!("cs_delay_first value is too high"),
            Err(DelayError::LastTooHigh) => warn!("cs_delay_last value is too high"),
            Err(DelayError::NoClock) => warn!("SPI peripheral clock is stopped"),
        }
    }

    fn transfer_message(&mut self, msg: &mut SpiMessage<'_>) -> Result<(), Error> {
        msg.validate()?;
        self.update_cs_delays(msg.cs_delay_first, msg.cs_delay_last);

        let mut req = Request::new(self.chip_select, msg);
        self.peripheral
            .master_transaction(self.device_id, &mut req)?;

        self.delay.delay_us(msg.cs_change_delay);

        Ok(())
    }

    fn send(&mut self, msg: SpiMessage<'_>, cs: CsFrame) -> Result<(), Error> {
        let mut msg = msg
            .with_cs_change(cs.release)
            .with_cs_delays(cs.setup_us, cs.hold_us);
        self.transfer_message(&mut msg)
    }

    fn run_operations(
        &mut self,
        operations: &mut [Operation<'_, u8>],
        first: usize,
        last: usize,
    ) -> Result<(), Error> {
        // Delays around the data are done by the peripheral while chip select is asserted
        let setup_us = delay_ns_to_us(&operations[..first]);
        let hold_us = delay_ns_to_us(&operations[last + 1..]);

        for (i, op) in operations.iter_mut().enumerate().take(last + 1).skip(first) {
            if let Operation::DelayNs(ns) = op {
                self.delay.delay_ns(*ns);
                continue;
            }
            if carries_no_data(op) {
                continue;
            }

            // SSTIME PRE only applies on assertion and POST on release, so every message of
            // the transaction carries the same pair
            let cs = CsFrame {
                setup_us,
                hold_us,
                release: i == last,
            };
            match op {
                Operation::Read(words) => self.send(SpiMessage::read(words), cs)?,
                Operation::Write(words) => self.send(SpiMessage::write(words), cs)?,
                Operation::Transfer(read, write) => {
                    // The SDK clocks both directions for the same count, so the longer
                    // buffer's tail goes in a message of its own
                    let n = read.len().min(write.len());
                    let (read_head, read_tail) = read.split_at_mut(n);
                    let (write_head, write_tail) = write.split_at(n);
                    let tail = if !write_tail.is_empty() {
                        Some(SpiMessage::write(write_tail))
                    } else if !read_tail.is_empty() {
                        Some(SpiMessage::read(read_tail))
                    } else {
                        None
                    };

                    match tail {
                        Some(tail) if n > 0 => {
                            let head = SpiMessage::transfer(write_head, read_head);
                            self.send(head, cs.head())?;
                            self.send(tail, cs)?;
                        }
                        Some(tail) => self.send(tail, cs)?,
                        None => self.send(SpiMessage::transfer(write_head, read_head), cs)?,
                    }
                }
                Operation::TransferInPlace(words) => {
                    self.send(SpiMessage::in_place(words), cs)?
                }
                Operation::DelayNs(_) => {}
            }
        }

        Ok(())
    }
}

/// Chip select handling of one message sent for a `SpiDevice` operation.
#[derive(Clone, Copy)]
struct CsFrame {
    setup_us: u32,
    hold_us: u32,
    release: bool,
}

impl CsFrame {
    /// First half of an operation split in two messages.
    fn head(self) -> Self {
        CsFrame {
            release: false,
            ..self
        }
    }
}

/// Total of the `DelayNs` operations, rounded up to whole microseconds.
fn delay_ns_to_us(operations: &[Operation<'_, u8>]) -> u32 {
    let ns = operations
        .iter()
        .filter_map(|op| match op {
            Operation::DelayNs(ns) => Some(*ns),
            _ => None,
        })
        .fold(0u32, u32::saturating_add);
    ns.div_ceil(1_000)
}

impl<'r, P: SpiPeripheral, D: DelayNs> SpiPlatformOps for MaxSpi<'r, P, D> {
    type Resources = MaxSpiResources<'r, P, D>;
    type Extra = MaxSpiInitParam;

    fn init(
        resources: Self::Resources,
        param: &SpiInitParam<MaxSpiInitParam>,
    ) -> Result<Self, Error> {
        let init_param = param.extra.ok_or(Error::InvalidArgument)?;
        if param.device_id >= SPI_INSTANCES {
            return Err(Error::InvalidArgument);
        }

        let MaxSpiResources {
            peripheral,
            delay,
            registry,
        } = resources;
        let mut spi = MaxSpi {
            peripheral,
            delay,
            registry,
            device_id: param.device_id,
            max_speed: param.max_speed,
            chip_select: param.chip_select,
            mode: param.mode,
            bit_order: param.bit_order,
            state: MaxSpiState {
                cs_delays: CsDelays::default(),
                init_param,
            },
        };
        spi.configure()?;

        Ok(spi)
    }

    fn write_and_read(&mut self, data: &mut [u8]) -> Result<(), Error> {
        let mut xfer = [SpiMessage::in_place(data).with_cs_change(true)];
        SpiPlatformOps::transfer(self, &mut xfer)
    }

    fn transfer(&mut self, msgs: &mut [SpiMessage<'_>]) -> Result<(), Error> {
        self.select()?;

        for msg in msgs.iter_mut() {
            self.transfer_message(msg)?;
        }

        Ok(())
    }

    fn remove(mut self) -> Self::Resources {
        self.peripheral.shutdown(self.device_id);

        MaxSpiResources {
            peripheral: self.peripheral,
            delay: self.delay,
            registry: self.registry,
        }
    }
}

fn carries_no_data(op: &Operation<'_, u8>) -> bool {
    match op {
        Operation::Read(words) => words.is_empty(),
        Operation::Write(words) => words.is_empty(),
        Operation::Transfer(read, write) => read.is_empty() && write.is_empty(),
        Operation::TransferInPlace(words) => words.is_empty(),
        Operation::DelayNs(_) => true,
    }
}

impl<P: SpiPeripheral, D: DelayNs> ErrorType for MaxSpi<'_, P, D> {
    type Error = Error;
}

/// Chip select is asserted for the whole transaction, `DelayNs` operations included: delays
/// before the first or after the last data operation become the SSTIME setup and hold times,
/// and are subject to the same range limit as [`SpiMessage::cs_delay_first`] and
/// [`SpiMessage::cs_delay_last`].
///
/// The MSDK can't deassert chip select on its own. When an operation fails, the peripheral is
/// reinitialized, which resets it and releases chip select, and the original error is
/// returned.
impl<P: SpiPeripheral, D: DelayNs> SpiDevice<u8> for MaxSpi<'_, P, D> {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Error> {
        self.select()?;

        let first = operations.iter().position(|op| !carries_no_data(op));
        let last = operations.iter().rposition(|op| !carries_no_data(op));
        let (Some(first), Some(last)) = (first, last) else {
            // Nothing to clock, chip select is never asserted
            for op in operations.iter() {
                if let Operation::DelayNs(ns) = op {
                    self.delay.delay_ns(*ns);
                }
            }
            return Ok(());
        };

        let res = self.run_operations(operations, first, last);
        if res.is_err() {
            // Configure failures shut the peripheral down, which releases chip select too
            let _ = self.configure();
        }
        res
    }
}

impl<P: SpiPeripheral, D: DelayNs> blocking_spi02::Transfer<u8> for MaxSpi<'_, P, D> {
    type Error = Error;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Error> {
        SpiPlatformOps::write_and_read(self, words)?;
        Ok(words)
    }
}

impl<P: SpiPeripheral, D: DelayNs> blocking_spi02::Write<u8> for MaxSpi<'_, P, D> {
    type Error = Error;

    fn write(&mut self, words: &[u8]) -> Result<(), Error> {
        let mut xfer = [SpiMessage::write(words).with_cs_change(true)];
        SpiPlatformOps::transfer(self, &mut xfer)
    }
}
