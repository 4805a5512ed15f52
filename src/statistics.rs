use crate::layer3::IpVersion;
use crate::packet::DecodedPacket;

use log::*;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, SystemTime};

/// Number of entries kept in the top source and destination address lists
pub const TOP_ADDRESS_LIMIT: usize = 10;

///
/// Counts per key, iterated in the order keys were first seen
///
#[derive(Clone, Debug, PartialEq)]
pub struct Distribution<K: Eq + Hash> {
    entries: Vec<(K, u64)>,
    index: HashMap<K, usize>,
}

impl<K: Eq + Hash> Default for Distribution<K> {
    fn default() -> Self {
        Distribution {
            entries: vec![],
            index: HashMap::new(),
        }
    }
}

impl<K: Clone + Eq + Hash> Distribution<K> {
    pub fn add(&mut self, key: K) {
        match self.index.get(&key) {
            Some(idx) => self.entries[*idx].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    pub fn get(&self, key: &K) -> u64 {
        self.index.get(key).map(|idx| self.entries[*idx].1).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> + '_ {
        self.entries.iter().map(|(k, c)| (k, *c))
    }

    ///
    /// At most `n` entries by descending count. Ties keep first seen order.
    ///
    pub fn top(&self, n: usize) -> Vec<(K, u64)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted.truncate(n);
        sorted
    }
}

impl<K: Eq + Hash + Serialize> Serialize for Distribution<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, c) in self.entries.iter() {
            map.serialize_entry(k, c)?;
        }
        map.end()
    }
}

///
/// Summary of a decoded capture. Always recomputed from the full packet list.
///
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Statistics {
    total_packets: u64,
    total_bytes: u64,
    average_packet_size: f64,
    min_packet_size: u32,
    max_packet_size: u32,
    first_timestamp: Option<SystemTime>,
    last_timestamp: Option<SystemTime>,
    protocols: Distribution<String>,
    ip_versions: Distribution<IpVersion>,
    top_sources: Vec<(String, u64)>,
    top_destinations: Vec<(String, u64)>,
}

impl Statistics {
    pub fn total_packets(&self) -> u64 { self.total_packets }
    pub fn total_bytes(&self) -> u64 { self.total_bytes }
    pub fn average_packet_size(&self) -> f64 { self.average_packet_size }
    pub fn min_packet_size(&self) -> u32 { self.min_packet_size }
    pub fn max_packet_size(&self) -> u32 { self.max_packet_size }
    pub fn first_timestamp(&self) -> Option<SystemTime> { self.first_timestamp }
    pub fn last_timestamp(&self) -> Option<SystemTime> { self.last_timestamp }
    pub fn protocols(&self) -> &Distribution<String> { &self.protocols }
    pub fn ip_versions(&self) -> &Distribution<IpVersion> { &self.ip_versions }
    pub fn top_sources(&self) -> &[(String, u64)] { &self.top_sources }
    pub fn top_destinations(&self) -> &[(String, u64)] { &self.top_destinations }

    ///
    /// Time between the first and last packet, zero if the last packet is stamped earlier
    ///
    pub fn capture_duration(&self) -> Option<Duration> {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => Some(last.duration_since(first).unwrap_or_default()),
            _ => None,
        }
    }

    pub fn from_packets(packets: &[DecodedPacket]) -> Statistics {
        if packets.is_empty() {
            return Statistics::default();
        }

        let mut total_bytes = 0u64;
        let mut min_packet_size = std::u32::MAX;
        let mut max_packet_size = 0u32;
        let mut protocols = Distribution::default();
        let mut ip_versions = Distribution::default();
        let mut sources = Distribution::default();
        let mut destinations = Distribution::default();

        for p in packets {
            total_bytes += p.packet_size() as u64;
            min_packet_size = std::cmp::min(min_packet_size, p.packet_size());
            max_packet_size = std::cmp::max(max_packet_size, p.packet_size());
            protocols.add(p.protocol().to_string());
            ip_versions.add(p.ip_version());
            sources.add(p.source_address().to_string());
            destinations.add(p.destination_address().to_string());
        }

        let total_packets = packets.len() as u64;

        debug!("{} packets, {} bytes, {} protocols", total_packets, total_bytes, protocols.len());

        Statistics {
            total_packets: total_packets,
            total_bytes: total_bytes,
            average_packet_size: total_bytes as f64 / total_packets as f64,
            min_packet_size: min_packet_size,
            max_packet_size: max_packet_size,
            first_timestamp: packets.first().map(|p| *p.timestamp()),
            last_timestamp: packets.last().map(|p| *p.timestamp()),
            protocols: protocols,
            ip_versions: ip_versions,
            top_sources: sources.top(TOP_ADDRESS_LIMIT),
            top_destinations: destinations.top(TOP_ADDRESS_LIMIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer2::LinkType;
    use crate::packet::PacketBuilder;
    use crate::record::{PcapRecord, RecordHeader};
    use crate::tests::util::ETHERNET_TCP_FRAME;
    use crate::layer2::ethernet::tests::ARP_RAW_DATA;

    use std::time::UNIX_EPOCH;

    fn packets(frames: &[(u64, &[u8], u32)]) -> Vec<DecodedPacket> {
        let mut builder = PacketBuilder::new(LinkType::Ethernet);
        frames.iter()
            .map(|(secs, frame, original)| {
                let header = RecordHeader::new(
                    UNIX_EPOCH + Duration::from_secs(*secs),
                    frame.len() as u32,
                    *original
                );
                builder.build(&PcapRecord::new(header, frame.to_vec())).into_packet()
            })
            .collect()
    }

    #[test]
    fn empty() {
        let stats = Statistics::from_packets(&[]);

        assert_eq!(stats.total_packets(), 0);
        assert_eq!(stats.total_bytes(), 0);
        assert_eq!(stats.average_packet_size(), 0.0);
        assert_eq!(stats.min_packet_size(), 0);
        assert_eq!(stats.max_packet_size(), 0);
        assert_eq!(stats.first_timestamp(), None);
        assert_eq!(stats.capture_duration(), None);
        assert!(stats.protocols().is_empty());
        assert!(stats.ip_versions().is_empty());
        assert!(stats.top_sources().is_empty());
    }

    #[test]
    fn aggregate() {
        let _ = env_logger::try_init();

        let packets = packets(&[
            (10, ETHERNET_TCP_FRAME, 100),
            (12, ARP_RAW_DATA, 60),
            (15, ETHERNET_TCP_FRAME, 200),
        ]);
        let stats = Statistics::from_packets(&packets);

        assert_eq!(stats.total_packets(), 3);
        assert_eq!(stats.total_bytes(), 360);
        assert_eq!(stats.average_packet_size(), 120.0);
        assert_eq!(stats.min_packet_size(), 60);
        assert_eq!(stats.max_packet_size(), 200);
        assert_eq!(stats.capture_duration(), Some(Duration::from_secs(5)));

        let protocols: Vec<(&String, u64)> = stats.protocols().iter().collect();
        assert_eq!(protocols, vec![(&"TCP".to_string(), 2), (&"ARP".to_string(), 1)]);
        assert_eq!(stats.protocols().total(), stats.total_packets());
        assert_eq!(stats.ip_versions().total(), stats.total_packets());
        assert_eq!(stats.ip_versions().get(&IpVersion::Unknown), 1);

        assert_eq!(stats.top_sources()[0], ("192.168.1.1".to_string(), 2));
        assert_eq!(stats.top_sources().len(), 2);
    }

    #[test]
    fn duration_saturates() {
        let packets = packets(&[
            (20, ETHERNET_TCP_FRAME, 100),
            (10, ETHERNET_TCP_FRAME, 100),
        ]);
        let stats = Statistics::from_packets(&packets);

        assert_eq!(stats.first_timestamp(), Some(UNIX_EPOCH + Duration::from_secs(20)));
        assert_eq!(stats.capture_duration(), Some(Duration::from_secs(0)));
    }

    #[test]
    fn top_is_stable_and_bounded() {
        let mut dist = Distribution::default();
        for key in &["c", "a", "b", "a", "d", "b"] {
            dist.add(key.to_string());
        }
        for i in 0..12 {
            dist.add(format!("host{}", i));
        }

        let top = dist.top(TOP_ADDRESS_LIMIT);

        assert_eq!(top.len(), TOP_ADDRESS_LIMIT);
        assert_eq!(top[0], ("a".to_string(), 2));
        assert_eq!(top[1], ("b".to_string(), 2));
        assert_eq!(top[2], ("c".to_string(), 1));
        assert_eq!(top[3], ("d".to_string(), 1));
        assert_eq!(top[4], ("host0".to_string(), 1));
        assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
        assert!(top.iter().all(|(_, c)| *c > 0));
    }
}
