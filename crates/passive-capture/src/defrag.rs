//! IPv4 reassembly: a datagram split into fragments can't be parsed as SIP
//! or RTP until every fragment has arrived. Grounded in the original
//! implementation's use of `gopacket/ip4defrag`, simplified here to the
//! common non-overlapping case since real fragmentation is rare on a
//! voice-signalling segment.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use pnet::packet::ipv4::Ipv4Packet;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FragmentKey {
    identification: u16,
    source: Ipv4Addr,
    destination: Ipv4Addr,
    protocol: u8,
}

#[derive(Default)]
struct Partial {
    fragments: Vec<(usize, Vec<u8>)>,
    total_len: Option<usize>,
}

/// Reassembles fragmented IPv4 datagrams into their L4 payload (the bytes
/// following the IPv4 header). A datagram that arrives unfragmented is
/// returned immediately; a fragmented one is buffered by
/// `(identification, source, destination, protocol)` until the
/// last-fragment (`more_fragments == false`) packet's offset plus length
/// accounts for every byte.
#[derive(Default)]
pub struct Ipv4Defragmenter {
    pending: HashMap<FragmentKey, Partial>,
}

impl Ipv4Defragmenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, packet: &Ipv4Packet) -> Option<Vec<u8>> {
        let more_fragments = packet.get_flags() & 0x1 != 0;
        let fragment_offset = packet.get_fragment_offset() as usize * 8;

        if fragment_offset == 0 && !more_fragments {
            return Some(packet.payload().to_vec());
        }

        let key = FragmentKey {
            identification: packet.get_identification(),
            source: packet.get_source(),
            destination: packet.get_destination(),
            protocol: packet.get_next_level_protocol().0,
        };

        let partial = self.pending.entry(key.clone()).or_default();
        partial.fragments.push((fragment_offset, packet.payload().to_vec()));
        if !more_fragments {
            partial.total_len = Some(fragment_offset + packet.payload().len());
        }

        let Some(total) = partial.total_len else { return None };
        let covered: usize = partial.fragments.iter().map(|(_, data)| data.len()).sum();
        if covered < total {
            return None;
        }

        let mut buf = vec![0u8; total];
        for (offset, data) in &partial.fragments {
            let end = offset + data.len();
            if end <= buf.len() {
                buf[*offset..end].copy_from_slice(data);
            }
        }
        self.pending.remove(&key);
        Some(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::packet::ipv4::MutableIpv4Packet;
    use pnet::packet::ip::IpNextHeaderProtocols;

    fn build_fragment(id: u16, offset_words: u16, more_fragments: bool, payload: &[u8]) -> Vec<u8> {
        let total_len = 20 + payload.len();
        let mut buf = vec![0u8; total_len];
        let mut packet = MutableIpv4Packet::new(&mut buf).unwrap();
        packet.set_version(4);
        packet.set_header_length(5);
        packet.set_total_length(total_len as u16);
        packet.set_identification(id);
        packet.set_flags(if more_fragments { 0x1 } else { 0x0 });
        packet.set_fragment_offset(offset_words);
        packet.set_ttl(64);
        packet.set_next_level_protocol(IpNextHeaderProtocols::Udp);
        packet.set_source("10.0.0.1".parse().unwrap());
        packet.set_destination("10.0.0.2".parse().unwrap());
        packet.set_payload(payload);
        buf
    }

    #[test]
    fn unfragmented_packet_returns_payload_immediately() {
        let buf = build_fragment(1, 0, false, b"hello");
        let packet = Ipv4Packet::new(&buf).unwrap();
        let mut defrag = Ipv4Defragmenter::new();
        assert_eq!(defrag.feed(&packet), Some(b"hello".to_vec()));
    }

    #[test]
    fn two_fragments_reassemble_once_both_arrive() {
        let first = build_fragment(7, 0, true, b"hello ");
        let second = build_fragment(7, (b"hello ".len() / 8) as u16, false, b"world");

        let mut defrag = Ipv4Defragmenter::new();
        let first_packet = Ipv4Packet::new(&first).unwrap();
        assert_eq!(defrag.feed(&first_packet), None);

        let second_packet = Ipv4Packet::new(&second).unwrap();
        let reassembled = defrag.feed(&second_packet).unwrap();
        assert_eq!(reassembled, b"hello world".to_vec());
    }

    #[test]
    fn unrelated_datagrams_do_not_interfere() {
        let mut defrag = Ipv4Defragmenter::new();
        let a = build_fragment(1, 0, true, b"aaaa");
        let b = build_fragment(2, 0, true, b"bbbb");
        assert_eq!(defrag.feed(&Ipv4Packet::new(&a).unwrap()), None);
        assert_eq!(defrag.feed(&Ipv4Packet::new(&b).unwrap()), None);
        assert_eq!(defrag.pending.len(), 2);
    }
}
