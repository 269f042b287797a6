//! Host side stand-ins for the MSDK and the delay provider.
#![allow(dead_code)]

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use embedded_hal::delay::DelayNs;
use fugit::{HertzU32, RateExtU32};
use max78000_hal::spi::{
    BitOrder, HwMode, MaxSpi, MaxSpiInitParam, MaxSpiResources, MxcError, PeripheralConfig,
    Request, SpiInitParam, SpiMode, SpiPeripheral, SpiRegistry, SsTime, Vssel, Width,
    SPI_INSTANCES,
};

/// Something the binding asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Init { id: usize, config: PeripheralConfig },
    SetMode { id: usize, mode: HwMode },
    SetWidth { id: usize, width: Width },
    SetDataSize { id: usize, bits: u8 },
    SetSsTime { id: usize, bits: u32 },
    Shutdown { id: usize },
    Transaction(Transaction),
    Delay { ns: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: usize,
    pub ss_idx: u8,
    pub deassert: bool,
    pub tx: Option<Vec<u8>>,
    pub tx_ptr: usize,
    pub rx_ptr: usize,
    pub tx_len: usize,
    pub rx_len: usize,
}

pub struct SpyState {
    pub calls: Vec<Call>,
    pub clock: HertzU32,
    pub sstime: [u32; SPI_INSTANCES],
    pub fail_init: Option<MxcError>,
    pub fail_set_mode: Option<MxcError>,
    pub fail_set_width: Option<MxcError>,
    pub fail_set_data_size: Option<MxcError>,
    /// Outcome of the next transactions, success once empty
    pub results: VecDeque<Result<(), MxcError>>,
    /// Byte shifted in on MISO
    pub miso: u8,
}

/// Recording [`SpiPeripheral`].
#[derive(Clone)]
pub struct Spy(pub Rc<RefCell<SpyState>>);

/// Recording [`DelayNs`] sharing the log of a [`Spy`].
pub struct SpyDelay(Rc<RefCell<SpyState>>);

impl Spy {
    pub fn new() -> Self {
        Spy(Rc::new(RefCell::new(SpyState {
            calls: Vec::new(),
            clock: 50.MHz(),
            // INACT = 4, PRE and POST as left by a previous user
            sstime: [0x0004_0707; SPI_INSTANCES],
            fail_init: None,
            fail_set_mode: None,
            fail_set_width: None,
            fail_set_data_size: None,
            results: VecDeque::new(),
            miso: 0x5a,
        })))
    }

    pub fn delay(&self) -> SpyDelay {
        SpyDelay(self.0.clone())
    }

    pub fn resources<'r>(&self, registry: &'r SpiRegistry) -> MaxSpiResources<'r, Spy, SpyDelay> {
        MaxSpiResources {
            peripheral: self.clone(),
            delay: self.delay(),
            registry,
        }
    }

    pub fn state(&self) -> std::cell::RefMut<'_, SpyState> {
        self.0.borrow_mut()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().calls.clone()
    }

    /// Drain the log.
    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut self.0.borrow_mut().calls)
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Transaction(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn sstime(&self, id: usize) -> SsTime {
        SsTime::from_bits(self.0.borrow().sstime[id])
    }
}

impl SpiPeripheral for Spy {
    fn init(&mut self, id: usize, config: &PeripheralConfig) -> Result<(), MxcError> {
        let mut s = self.0.borrow_mut();
        s.calls.push(Call::Init {
            id,
            config: *config,
        });
        s.fail_init.map_or(Ok(()), Err)
    }

    fn set_mode(&mut self, id: usize, mode: HwMode) -> Result<(), MxcError> {
        let mut s = self.0.borrow_mut();
        s.calls.push(Call::SetMode { id, mode });
        s.fail_set_mode.map_or(Ok(()), Err)
    }

    fn set_width(&mut self, id: usize, width: Width) -> Result<(), MxcError> {
        let mut s = self.0.borrow_mut();
        s.calls.push(Call::SetWidth { id, width });
        s.fail_set_width.map_or(Ok(()), Err)
    }

    fn set_data_size(&mut self, id: usize, bits: u8) -> Result<(), MxcError> {
        let mut s = self.0.borrow_mut();
        s.calls.push(Call::SetDataSize { id, bits });
        s.fail_set_data_size.map_or(Ok(()), Err)
    }

    fn peripheral_clock(&self, _id: usize) -> HertzU32 {
        self.0.borrow().clock
    }

    fn sstime(&self, id: usize) -> SsTime {
        SsTime::from_bits(self.0.borrow().sstime[id])
    }

    fn set_sstime(&mut self, id: usize, sstime: SsTime) {
        let mut s = self.0.borrow_mut();
        s.calls.push(Call::SetSsTime {
            id,
            bits: sstime.bits(),
        });
        s.sstime[id] = sstime.bits();
    }

    fn shutdown(&mut self, id: usize) {
        self.0.borrow_mut().calls.push(Call::Shutdown { id });
    }

    fn master_transaction(&mut self, id: usize, req: &mut Request<'_>) -> Result<(), MxcError> {
        let mut s = self.0.borrow_mut();
        let tx = (!req.tx_ptr().is_null()).then(|| {
            // SAFETY: the request borrows `tx_len` bytes at `tx_ptr`
            unsafe { std::slice::from_raw_parts(req.tx_ptr(), req.tx_len()) }.to_vec()
        });
        s.calls.push(Call::Transaction(Transaction {
            id,
            ss_idx: req.ss_idx(),
            deassert: req.ss_deassert(),
            tx,
            tx_ptr: req.tx_ptr() as usize,
            rx_ptr: req.rx_ptr() as usize,
            tx_len: req.tx_len(),
            rx_len: req.rx_len(),
        }));

        let result = s.results.pop_front().unwrap_or(Ok(()));
        if result.is_ok() && !req.rx_ptr().is_null() {
            // SAFETY: the request mutably borrows `rx_len` bytes at `rx_ptr`
            let rx = unsafe { std::slice::from_raw_parts_mut(req.rx_ptr(), req.rx_len()) };
            rx.fill(s.miso);
        }
        result
    }
}

impl DelayNs for SpyDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().calls.push(Call::Delay { ns });
    }
}

pub const EXTRA: MaxSpiInitParam = MaxSpiInitParam {
    num_slaves: 1,
    polarity: 0,
    vssel: Vssel::Vddioh,
};

pub fn param(device_id: usize, chip_select: u8) -> SpiInitParam<MaxSpiInitParam> {
    SpiInitParam {
        device_id,
        max_speed: 1.MHz(),
        chip_select,
        mode: SpiMode::Mode3,
        bit_order: BitOrder::MsbFirst,
        extra: Some(EXTRA),
    }
}

pub type TestSpi<'r> = MaxSpi<'r, Spy, SpyDelay>;
