//! Lockstep packet queues and the byte/timestamp sample buffer.
//!
//! The transport delivers one timestamp per packet but the container wants
//! one timestamp per byte. `PacketQueue` holds the per-packet records;
//! `SampleBuffer` holds the expanded per-byte view that frames are cut from.

use bytes::BytesMut;
use std::collections::VecDeque;

/// Per-packet records awaiting timestamp expansion.
///
/// Header timestamps and payload byte counts are two parallel FIFOs pushed
/// through a single entry point, so they stay lockstep by construction.
#[derive(Debug, Default)]
pub struct PacketQueue {
    timestamps: VecDeque<i64>,
    lengths: VecDeque<usize>,
}

impl PacketQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one arrived packet: its receiver-clock timestamp and the
    /// number of payload bytes it carried.
    pub fn push(&mut self, timestamp: i64, len: usize) {
        self.timestamps.push_back(timestamp);
        self.lengths.push_back(len);
        debug_assert_eq!(self.timestamps.len(), self.lengths.len());
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Expand every queued packet record into per-byte timestamps.
    ///
    /// For a packet `(t0, n)` this appends `t0, t0+1, …, t0+n-1` to the
    /// sample buffer's timestamp FIFO, consuming both records. Runs until
    /// the queue is empty. The payload bytes themselves are appended to the
    /// sample buffer separately by the producer.
    pub fn expand_into(&mut self, buf: &mut SampleBuffer) {
        while let (Some(t0), Some(n)) = (self.timestamps.pop_front(), self.lengths.pop_front()) {
            buf.timestamps.reserve(n);
            for i in 0..n as i64 {
                buf.timestamps.push_back(t0 + i);
            }
        }
        debug_assert!(self.lengths.is_empty());
    }
}

/// Two parallel FIFOs: raw payload bytes awaiting output and one timestamp
/// per buffered byte. Equal length at every point outside expansion; always
/// consumed together.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    pub(crate) bytes: BytesMut,
    pub(crate) timestamps: VecDeque<i64>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffered payload bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of buffered per-byte timestamps.
    pub fn timestamp_len(&self) -> usize {
        self.timestamps.len()
    }

    /// Timestamp at the head of the buffer, if any.
    pub fn head_timestamp(&self) -> Option<i64> {
        self.timestamps.front().copied()
    }

    /// Append raw payload bytes at the tail.
    pub fn push_bytes(&mut self, payload: &[u8]) {
        self.bytes.extend_from_slice(payload);
    }

    /// Remove exactly `n` bytes and `n` timestamps from the head, returning
    /// the bytes. The caller must ensure `n <= len()`.
    pub(crate) fn split_head(&mut self, n: usize) -> BytesMut {
        let data = self.bytes.split_to(n);
        self.timestamps.drain(..n);
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_fans_out_one_timestamp_per_byte() {
        let mut queue = PacketQueue::new();
        let mut buf = SampleBuffer::new();

        queue.push(1000, 4);
        queue.push(1004, 2);
        buf.push_bytes(&[1, 2, 3, 4, 5, 6]);

        queue.expand_into(&mut buf);

        assert!(queue.is_empty());
        assert_eq!(buf.len(), 6);
        assert_eq!(buf.timestamp_len(), 6);
        assert_eq!(
            buf.timestamps.iter().copied().collect::<Vec<_>>(),
            vec![1000, 1001, 1002, 1003, 1004, 1005]
        );
    }

    #[test]
    fn expansion_total_equals_sum_of_lengths() {
        let mut queue = PacketQueue::new();
        let mut buf = SampleBuffer::new();

        let packets = [(10i64, 3usize), (20, 0), (30, 7), (99, 1)];
        for (ts, len) in packets {
            queue.push(ts, len);
        }
        queue.expand_into(&mut buf);

        let total: usize = packets.iter().map(|(_, n)| n).sum();
        assert_eq!(buf.timestamp_len(), total);
    }

    #[test]
    fn split_head_consumes_both_fifos_together() {
        let mut queue = PacketQueue::new();
        let mut buf = SampleBuffer::new();

        queue.push(500, 5);
        buf.push_bytes(b"abcde");
        queue.expand_into(&mut buf);

        let head = buf.split_head(3);
        assert_eq!(&head[..], b"abc");
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.timestamp_len(), 2);
        assert_eq!(buf.head_timestamp(), Some(503));
    }
}
