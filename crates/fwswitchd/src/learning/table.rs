//! Per-device MAC learning table.

use dashmap::DashMap;
use ofctl_types::{DatapathId, MacAddress, PortNo};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// What an observation changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The address was not known on this device.
    New,
    /// The address was already known on the same port.
    Unchanged,
    /// The address moved from another port.
    Moved { from: PortNo },
}

#[derive(Debug, Clone, Copy)]
struct LearnedPort {
    port: PortNo,
    /// Value of the device clock at the last observation.
    last_seen: u64,
}

#[derive(Debug, Default)]
struct DeviceTable {
    entries: HashMap<MacAddress, LearnedPort>,
    clock: u64,
}

impl DeviceTable {
    fn observe(&mut self, mac: MacAddress, port: PortNo, capacity: Option<NonZeroUsize>) -> Observation {
        self.clock += 1;
        let now = self.clock;

        if let Some(learned) = self.entries.get_mut(&mac) {
            let previous = learned.port;
            *learned = LearnedPort { port, last_seen: now };
            return if previous == port {
                Observation::Unchanged
            } else {
                Observation::Moved { from: previous }
            };
        }

        if let Some(limit) = capacity {
            if self.entries.len() >= limit.get() {
                self.evict_oldest();
            }
        }
        self.entries.insert(mac, LearnedPort { port, last_seen: now });
        Observation::New
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, learned)| learned.last_seen)
            .map(|(mac, _)| *mac);

        if let Some(mac) = oldest {
            self.entries.remove(&mac);
            debug!(%mac, "Evicted least recently observed address");
        }
    }
}

/// Learned address-to-port mappings, one independent table per device.
///
/// The outer map is only touched to find or create a device's table;
/// all reads and writes of learned entries happen under that device's own
/// lock, so devices never contend with each other.
///
/// Without a capacity, entries never expire. With one, learning a new
/// address on a full device first forgets the address observed least
/// recently.
#[derive(Debug, Default)]
pub struct LearningTable {
    devices: DashMap<DatapathId, Arc<Mutex<DeviceTable>>>,
    capacity: Option<NonZeroUsize>,
}

impl LearningTable {
    /// Creates an unbounded table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding at most `max_entries_per_device` addresses
    /// per device. Zero means unbounded.
    pub fn with_capacity(max_entries_per_device: usize) -> Self {
        Self {
            devices: DashMap::new(),
            capacity: NonZeroUsize::new(max_entries_per_device),
        }
    }

    fn shard(&self, dpid: DatapathId) -> Arc<Mutex<DeviceTable>> {
        Arc::clone(self.devices.entry(dpid).or_default().value())
    }

    fn existing_shard(&self, dpid: DatapathId) -> Option<Arc<Mutex<DeviceTable>>> {
        self.devices.get(&dpid).map(|shard| Arc::clone(shard.value()))
    }

    /// Records that `mac` was seen arriving on `port` of `dpid`.
    pub fn observe(&self, dpid: DatapathId, mac: MacAddress, port: PortNo) -> Observation {
        let shard = self.shard(dpid);
        let observation = shard.lock().observe(mac, port, self.capacity);

        if let Observation::Moved { from } = observation {
            debug!(%dpid, %mac, %from, to = %port, "Address moved");
        }
        observation
    }

    /// Returns the port `mac` was last seen on at `dpid`.
    pub fn lookup(&self, dpid: DatapathId, mac: MacAddress) -> Option<PortNo> {
        let shard = self.existing_shard(dpid)?;
        let port = shard.lock().entries.get(&mac).map(|learned| learned.port);
        port
    }

    /// Drops everything learned on `dpid`. Returns the number of entries removed.
    pub fn forget_device(&self, dpid: DatapathId) -> usize {
        self.devices
            .remove(&dpid)
            .map(|(_, shard)| shard.lock().entries.len())
            .unwrap_or(0)
    }

    /// Number of addresses learned on `dpid`.
    pub fn len(&self, dpid: DatapathId) -> usize {
        self.existing_shard(dpid)
            .map(|shard| shard.lock().entries.len())
            .unwrap_or(0)
    }

    /// Returns true if nothing has been learned on `dpid`.
    pub fn is_empty(&self, dpid: DatapathId) -> bool {
        self.len(dpid) == 0
    }

    /// Number of devices with a table.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const SW1: DatapathId = DatapathId::new(1);
    const SW2: DatapathId = DatapathId::new(2);

    fn mac(last: u8) -> MacAddress {
        MacAddress::new([0x00, 0x00, 0x00, 0x00, 0x00, last])
    }

    #[test]
    fn test_observe_and_lookup() {
        let table = LearningTable::new();
        assert_eq!(table.lookup(SW1, mac(1)), None);

        assert_eq!(table.observe(SW1, mac(1), PortNo::new(3)), Observation::New);
        assert_eq!(table.lookup(SW1, mac(1)), Some(PortNo::new(3)));
        assert_eq!(table.len(SW1), 1);
    }

    #[test]
    fn test_later_observation_overwrites() {
        let table = LearningTable::new();
        table.observe(SW1, mac(1), PortNo::new(3));
        assert_eq!(
            table.observe(SW1, mac(1), PortNo::new(3)),
            Observation::Unchanged
        );
        assert_eq!(
            table.observe(SW1, mac(1), PortNo::new(4)),
            Observation::Moved {
                from: PortNo::new(3)
            }
        );
        assert_eq!(table.lookup(SW1, mac(1)), Some(PortNo::new(4)));
        assert_eq!(table.len(SW1), 1);
    }

    #[test]
    fn test_devices_are_independent() {
        let table = LearningTable::new();
        table.observe(SW1, mac(1), PortNo::new(1));
        table.observe(SW2, mac(1), PortNo::new(2));

        assert_eq!(table.lookup(SW1, mac(1)), Some(PortNo::new(1)));
        assert_eq!(table.lookup(SW2, mac(1)), Some(PortNo::new(2)));
        assert_eq!(table.device_count(), 2);
    }

    #[test]
    fn test_forget_device() {
        let table = LearningTable::new();
        table.observe(SW1, mac(1), PortNo::new(1));
        table.observe(SW1, mac(2), PortNo::new(2));
        table.observe(SW2, mac(1), PortNo::new(1));

        assert_eq!(table.forget_device(SW1), 2);
        assert!(table.is_empty(SW1));
        assert_eq!(table.lookup(SW1, mac(1)), None);
        assert_eq!(table.lookup(SW2, mac(1)), Some(PortNo::new(1)));
        assert_eq!(table.forget_device(SW1), 0);
    }

    #[test]
    fn test_lookup_does_not_create_device() {
        let table = LearningTable::new();
        assert_eq!(table.lookup(SW1, mac(1)), None);
        assert_eq!(table.device_count(), 0);
    }

    #[test]
    fn test_capacity_evicts_least_recently_observed() {
        let table = LearningTable::with_capacity(2);
        table.observe(SW1, mac(1), PortNo::new(1));
        table.observe(SW1, mac(2), PortNo::new(2));
        // Refresh mac(1) so mac(2) becomes the oldest.
        table.observe(SW1, mac(1), PortNo::new(1));
        table.observe(SW1, mac(3), PortNo::new(3));

        assert_eq!(table.len(SW1), 2);
        assert_eq!(table.lookup(SW1, mac(1)), Some(PortNo::new(1)));
        assert_eq!(table.lookup(SW1, mac(2)), None);
        assert_eq!(table.lookup(SW1, mac(3)), Some(PortNo::new(3)));
    }

    #[test]
    fn test_zero_capacity_is_unbounded() {
        let table = LearningTable::with_capacity(0);
        for i in 0..100u8 {
            table.observe(SW1, mac(i), PortNo::new(1));
        }
        assert_eq!(table.len(SW1), 100);
    }

    proptest! {
        #[test]
        fn prop_last_observation_wins(
            observations in proptest::collection::vec((0u8..8, 1u32..16), 1..64)
        ) {
            let table = LearningTable::new();
            let mut expected: HashMap<u8, u32> = HashMap::new();

            for (addr, port) in &observations {
                table.observe(SW1, mac(*addr), PortNo::new(*port));
                expected.insert(*addr, *port);
            }

            prop_assert_eq!(table.len(SW1), expected.len());
            for (addr, port) in expected {
                prop_assert_eq!(table.lookup(SW1, mac(addr)), Some(PortNo::new(port)));
            }
        }
    }
}
