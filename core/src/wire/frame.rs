use crate::math::GeoHelper;
use std::iter::FusedIterator;
use std::slice::ChunksExact;

/// id (i32 LE) + lat (i32 LE, micro-degrees) + lng (i32 LE, micro-degrees) + status (u8).
pub const RECORD_WIDTH: usize = 13;

/// One-byte ping sent while the socket is open.
pub const HEARTBEAT_FRAME: [u8; 1] = [0x09];

/// A single entity fix as carried on the wire, with coordinates already scaled to degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireRecord {
    pub id: i32,
    pub lat: f64,
    pub lng: f64,
    pub status: u8,
}

impl WireRecord {
    pub fn new(id: i32, lat: f64, lng: f64, status: u8) -> Self {
        Self {
            id,
            lat,
            lng,
            status,
        }
    }

    fn from_chunk(chunk: &[u8]) -> Self {
        let word = |offset: usize| {
            i32::from_le_bytes([
                chunk[offset],
                chunk[offset + 1],
                chunk[offset + 2],
                chunk[offset + 3],
            ])
        };
        Self {
            id: word(0),
            lat: GeoHelper::from_fixed(word(4)),
            lng: GeoHelper::from_fixed(word(8)),
            status: chunk[12],
        }
    }
}

/// Number of complete records in a frame of `byte_len` bytes.
pub fn record_count(byte_len: usize) -> usize {
    byte_len / RECORD_WIDTH
}

/// Borrowing iterator over the whole records of a frame. A trailing partial record is ignored.
pub struct FrameDecoder<'a> {
    chunks: ChunksExact<'a, u8>,
}

pub fn decode_frame(bytes: &[u8]) -> FrameDecoder<'_> {
    FrameDecoder {
        chunks: bytes.chunks_exact(RECORD_WIDTH),
    }
}

impl<'a> FrameDecoder<'a> {
    /// Bytes that did not fill a complete record.
    pub fn trailing(&self) -> usize {
        self.chunks.remainder().len()
    }
}

impl Iterator for FrameDecoder<'_> {
    type Item = WireRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.chunks.next().map(WireRecord::from_chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for FrameDecoder<'_> {}

impl FusedIterator for FrameDecoder<'_> {}

pub fn encode_record(record: &WireRecord, out: &mut Vec<u8>) {
    out.extend_from_slice(&record.id.to_le_bytes());
    out.extend_from_slice(&GeoHelper::to_fixed(record.lat).to_le_bytes());
    out.extend_from_slice(&GeoHelper::to_fixed(record.lng).to_le_bytes());
    out.push(record.status);
}

pub fn encode_frame(records: &[WireRecord]) -> Vec<u8> {
    let mut out = Vec::with_capacity(records.len() * RECORD_WIDTH);
    for record in records {
        encode_record(record, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_little_endian_fixed_point_record() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&37_500_000i32.to_le_bytes());
        bytes.extend_from_slice(&(-122_000_000i32).to_le_bytes());
        bytes.push(1);

        let records: Vec<_> = decode_frame(&bytes).collect();
        assert_eq!(records, vec![WireRecord::new(1, 37.5, -122.0, 1)]);
    }

    #[test]
    fn trailing_partial_record_is_dropped() {
        let mut bytes = encode_frame(&[
            WireRecord::new(7, 1.0, 2.0, 3),
            WireRecord::new(-8, -1.0, -2.0, 255),
        ]);
        bytes.extend_from_slice(&[0xAA; 12]);

        let decoder = decode_frame(&bytes);
        assert_eq!(decoder.len(), 2);
        assert_eq!(decoder.trailing(), 12);
        let ids: Vec<_> = decoder.map(|r| r.id).collect();
        assert_eq!(ids, vec![7, -8]);
    }

    #[test]
    fn record_count_floors_for_every_length() {
        for len in 0..(RECORD_WIDTH * 4) {
            let bytes = vec![0u8; len];
            assert_eq!(decode_frame(&bytes).count(), len / RECORD_WIDTH);
            assert_eq!(record_count(len), len / RECORD_WIDTH);
        }
    }

    #[test]
    fn empty_frame_yields_nothing() {
        assert_eq!(decode_frame(&[]).next(), None);
    }
}
