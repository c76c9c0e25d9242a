//! Fixed-capacity ring of query slots
//!
//! Pure storage: the ring maps a logical bracket index onto one of its
//! physical slots and never checks whether that slot is still in flight.
//! Reuse safety is the scheduler's job.

use crate::device::{DeviceError, QueryKind, TimingDevice};
use crate::error::TimerError;

/// Default number of slots (and so a pipeline depth of three brackets)
pub const DEFAULT_CAPACITY: usize = 4;

fn creation_error(kind: QueryKind, slot: usize) -> impl FnOnce(DeviceError) -> TimerError {
    move |source| TimerError::QueryCreation { kind, slot, source }
}

/// The three query objects backing one bracket
pub struct QuerySlot<D: TimingDevice> {
    pub begin: D::Timestamp,
    pub end: D::Timestamp,
    pub validity: D::Validity,
}

impl<D: TimingDevice> QuerySlot<D> {
    fn create(device: &mut D, slot: usize) -> Result<Self, TimerError> {
        let begin = device
            .create_timestamp_query()
            .map_err(creation_error(QueryKind::Timestamp, slot))?;
        let end = match device.create_timestamp_query() {
            Ok(end) => end,
            Err(e) => {
                device.release_timestamp_query(begin);
                return Err(creation_error(QueryKind::Timestamp, slot)(e));
            }
        };
        let validity = match device.create_validity_query() {
            Ok(validity) => validity,
            Err(e) => {
                device.release_timestamp_query(begin);
                device.release_timestamp_query(end);
                return Err(creation_error(QueryKind::Validity, slot)(e));
            }
        };

        Ok(Self {
            begin,
            end,
            validity,
        })
    }

    fn release(self, device: &mut D) {
        device.release_timestamp_query(self.begin);
        device.release_timestamp_query(self.end);
        device.release_validity_query(self.validity);
    }
}

/// Circular array of query slots; capacity is a power of two
pub struct QueryRing<D: TimingDevice> {
    slots: Vec<QuerySlot<D>>,
    mask: u64,
}

impl<D: TimingDevice> QueryRing<D> {
    /// Allocate `capacity` slots on the device.
    ///
    /// If any allocation fails, every query created so far is released
    /// before the error is returned.
    pub fn create(device: &mut D, capacity: usize) -> Result<Self, TimerError> {
        if !capacity.is_power_of_two() {
            return Err(TimerError::InvalidCapacity(capacity));
        }

        let mut slots = Vec::with_capacity(capacity);
        for index in 0..capacity {
            match QuerySlot::create(device, index) {
                Ok(slot) => slots.push(slot),
                Err(e) => {
                    for slot in slots {
                        slot.release(device);
                    }
                    return Err(e);
                }
            }
        }

        Ok(Self {
            slots,
            mask: (capacity - 1) as u64,
        })
    }

    /// Number of physical slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Physical position backing logical index `index`
    pub fn position(&self, index: u64) -> usize {
        (index & self.mask) as usize
    }

    /// Slot for logical index `index`
    pub fn slot_at(&self, index: u64) -> &QuerySlot<D> {
        &self.slots[self.position(index)]
    }

    /// Return every query object to the device
    pub fn release(self, device: &mut D) {
        for slot in self.slots {
            slot.release(device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedDevice;

    #[test]
    fn test_create_allocates_three_queries_per_slot() {
        let mut device = SimulatedDevice::new();
        let ring = QueryRing::create(&mut device, 8).unwrap();
        assert_eq!(ring.capacity(), 8);
        assert_eq!(device.live_queries(), 24);

        ring.release(&mut device);
        assert_eq!(device.live_queries(), 0);
    }

    #[test]
    fn test_slot_index_wraps_with_mask() {
        let mut device = SimulatedDevice::new();
        let ring = QueryRing::create(&mut device, 4).unwrap();
        assert_eq!(ring.position(0), 0);
        assert_eq!(ring.position(3), 3);
        assert_eq!(ring.position(4), 0);
        assert_eq!(ring.position(13), 1);
        assert!(std::ptr::eq(ring.slot_at(2), ring.slot_at(6)));
        assert!(!std::ptr::eq(ring.slot_at(2), ring.slot_at(3)));
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        let mut device = SimulatedDevice::new();
        for capacity in [0, 3, 6, 12] {
            match QueryRing::create(&mut device, capacity) {
                Err(TimerError::InvalidCapacity(c)) => assert_eq!(c, capacity),
                _ => panic!("capacity {} should be rejected", capacity),
            }
        }
        assert_eq!(device.live_queries(), 0);
    }

    #[test]
    fn test_failed_allocation_releases_partial_ring() {
        let mut device = SimulatedDevice::new();
        // Two full slots plus the first timestamp of the third.
        device.fail_allocation_after(7);

        match QueryRing::create(&mut device, 4) {
            Err(TimerError::QueryCreation { kind, slot, .. }) => {
                assert_eq!(kind, QueryKind::Timestamp);
                assert_eq!(slot, 2);
            }
            _ => panic!("allocation failure should surface"),
        }
        assert_eq!(device.live_queries(), 0);
    }
}
