use core::cell::Cell;

use critical_section::Mutex;

use super::SPI_INSTANCES;

/// Last configured chip select of every SPI peripheral instance.
///
/// Descriptors sharing a peripheral with different chip selects consult this before a
/// transfer, and only reconfigure the peripheral when the selection changed. Typically a
/// single `static` registry is shared by all descriptors:
///
/// ```
/// use max78000_hal::spi::SpiRegistry;
///
/// static REGISTRY: SpiRegistry = SpiRegistry::new();
/// ```
///
/// Each entry is updated inside a critical section. This doesn't make concurrent transfers on
/// one peripheral safe, as they would still interleave on the hardware.
pub struct SpiRegistry {
    last_cs: [Mutex<Cell<u8>>; SPI_INSTANCES],
}

impl Default for SpiRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SpiRegistry {
    /// Registry with chip select 0 recorded for every instance.
    pub const fn new() -> Self {
        #[allow(clippy::declare_interior_mutable_const)]
        const UNSELECTED: Mutex<Cell<u8>> = Mutex::new(Cell::new(0));

        Self {
            last_cs: [UNSELECTED; SPI_INSTANCES],
        }
    }

    /// Chip select last configured on peripheral `device_id`, `None` for an unknown instance.
    pub fn last_chip_select(&self, device_id: usize) -> Option<u8> {
        let entry = self.last_cs.get(device_id)?;
        Some(critical_section::with(|cs| entry.borrow(cs).get()))
    }

    /// Whether peripheral `device_id` has to be reconfigured to drive `chip_select`.
    pub fn needs_reconfigure(&self, device_id: usize, chip_select: u8) -> bool {
        self.last_chip_select(device_id) != Some(chip_select)
    }

    pub(crate) fn record(&self, device_id: usize, chip_select: u8) {
        if let Some(entry) = self.last_cs.get(device_id) {
            critical_section::with(|cs| entry.borrow(cs).set(chip_select));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_chip_select_zero() {
        let registry = SpiRegistry::new();
        for id in 0..SPI_INSTANCES {
            assert_eq!(registry.last_chip_select(id), Some(0));
            assert!(!registry.needs_reconfigure(id, 0));
            assert!(registry.needs_reconfigure(id, 1));
        }
        assert_eq!(registry.last_chip_select(SPI_INSTANCES), None);
    }

    #[test]
    fn one_entry_per_instance() {
        let registry = SpiRegistry::default();
        assert_eq!(registry.last_cs.len(), SPI_INSTANCES);
        for id in 0..SPI_INSTANCES {
            registry.record(id, id as u8 + 1);
        }
        for id in 0..SPI_INSTANCES {
            assert_eq!(registry.last_chip_select(id), Some(id as u8 + 1));
        }
    }

    #[test]
    fn instances_are_independent() {
        let registry = SpiRegistry::new();
        registry.record(1, 2);
        assert_eq!(registry.last_chip_select(0), Some(0));
        assert_eq!(registry.last_chip_select(1), Some(2));
        assert!(registry.needs_reconfigure(1, 0));
        assert!(!registry.needs_reconfigure(1, 2));

        // Unknown instances are ignored
        registry.record(SPI_INSTANCES, 1);
    }
}
