//! Chip select timing.
//!
//! The SSTIME register holds the delays between slave select assertion and the first SCLK
//! edge (PRE), between the last SCLK edge and slave select deassertion (POST), and the minimum
//! inactive time between transactions (INACT), each as a number of peripheral clock ticks.
//! A field value of 0 encodes 256 ticks.

use fugit::HertzU32;

use super::SpiPeripheral;

/// Largest tick count the SSTIME fields are programmed with.
pub const MAX_DELAY_SCLK: u32 = 255;

const NS_PER_US: u64 = 1_000;
const NANO: u64 = 1_000_000_000;

bitfield::bitfield! {
    /// Slave select timing register
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct SsTime(u32);
    impl Debug;
    /// Ticks between slave select assertion and the first SCLK edge
    pub u8, pre, set_pre: 7, 0;
    /// Ticks between the last SCLK edge and slave select deassertion
    pub u8, post, set_post: 15, 8;
    /// Minimum ticks slave select stays inactive between transactions
    pub u8, inact, set_inact: 23, 16;
}

impl SsTime {
    /// Register view of a raw value.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw register value.
    pub const fn bits(&self) -> u32 {
        self.0
    }
}

/// Chip select setup and hold delays, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CsDelays {
    /// Delay before the first SCLK edge
    pub first: u32,
    /// Delay after the last SCLK edge
    pub last: u32,
}

/// Reasons a chip select delay request can't be programmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DelayError {
    /// The peripheral clock reads as 0 Hz
    NoClock,
    /// The first delay needs more than [`MAX_DELAY_SCLK`] ticks
    FirstTooHigh,
    /// The last delay needs more than [`MAX_DELAY_SCLK`] ticks
    LastTooHigh,
}

/// Duration of one peripheral clock tick, in nanoseconds rounded to the closest value.
///
/// Returns `None` for a stopped clock.
pub fn tick_ns(clock: HertzU32) -> Option<u64> {
    let hz = clock.to_Hz() as u64;
    if hz == 0 {
        return None;
    }

    Some(((NANO + hz / 2) / hz).max(1))
}

/// Number of ticks programmed for a delay of `delay_us`.
///
/// A delay of 0 maps to a single tick, the shortest the register can encode. Returns `None`
/// when the delay needs more than [`MAX_DELAY_SCLK`] ticks.
pub fn delay_ticks(delay_us: u32, tick_ns: u64) -> Option<u8> {
    if delay_us == 0 {
        return Some(1);
    }

    let ticks = (delay_us as u64 * NS_PER_US / tick_ns.max(1)).max(1);
    if ticks > MAX_DELAY_SCLK as u64 {
        return None;
    }

    Some(ticks as u8)
}

/// Program the SSTIME register for `requested`, given that `current` is in effect.
///
/// Only the fields whose delay changed are recomputed. Nothing is written unless every
/// changed field fits, so on error the register keeps its previous value. Returns the delays
/// in effect afterwards.
pub(crate) fn apply_cs_delays<P: SpiPeripheral>(
    peripheral: &mut P,
    id: usize,
    current: CsDelays,
    requested: CsDelays,
) -> Result<CsDelays, DelayError> {
    if requested == current {
        return Ok(current);
    }

    let snapshot = peripheral.sstime(id);
    let tick = tick_ns(peripheral.peripheral_clock(id)).ok_or(DelayError::NoClock)?;

    let mut sstime = snapshot;
    if requested.first != current.first {
        let ticks = delay_ticks(requested.first, tick).ok_or(DelayError::FirstTooHigh)?;
        sstime.set_pre(ticks);
    }
    if requested.last != current.last {
        let ticks = delay_ticks(requested.last, tick).ok_or(DelayError::LastTooHigh)?;
        sstime.set_post(ticks);
    }

    peripheral.set_sstime(id, sstime);

    Ok(requested)
}
