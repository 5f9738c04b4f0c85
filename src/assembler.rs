//! Fixed-size frame assembly over the sample buffer.

use crate::buffer::SampleBuffer;
use crate::error::{MuxError, Result};
use crate::types::OutputFrame;

/// Cut one full frame from the head of the buffer.
///
/// Removes exactly `frame_size` bytes and `frame_size` timestamps; the
/// frame's pts is the first removed timestamp. Returns `None` once fewer
/// than `frame_size` bytes remain. The removal is all-or-nothing: the
/// buffers are only advanced when a complete frame comes out.
pub fn next_frame(buf: &mut SampleBuffer, frame_size: usize) -> Option<OutputFrame> {
    if frame_size == 0 || buf.len() < frame_size {
        return None;
    }
    let pts = buf.head_timestamp()?;
    let data = buf.split_head(frame_size).freeze();
    Some(OutputFrame { data, pts })
}

/// Drain everything left in the buffer as one final frame.
///
/// The final frame is usually short (fewer than `frame_size` bytes) but may
/// be larger if the assembler was not run to exhaustion first. Returns
/// `Ok(None)` when nothing is buffered. A byte/timestamp length disagreement
/// means the lockstep invariant was broken upstream and is reported, not
/// papered over.
pub fn final_frame(buf: &mut SampleBuffer) -> Result<Option<OutputFrame>> {
    let (bytes, timestamps) = (buf.len(), buf.timestamp_len());
    if bytes != timestamps {
        return Err(MuxError::BufferMismatch { bytes, timestamps });
    }
    if bytes == 0 {
        return Ok(None);
    }
    let pts = buf
        .head_timestamp()
        .ok_or(MuxError::BufferMismatch { bytes, timestamps })?;
    let data = buf.split_head(bytes).freeze();
    Ok(Some(OutputFrame { data, pts }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PacketQueue;

    fn filled_buffer(packets: &[(i64, &[u8])]) -> SampleBuffer {
        let mut queue = PacketQueue::new();
        let mut buf = SampleBuffer::new();
        for (ts, payload) in packets {
            queue.push(*ts, payload.len());
            buf.push_bytes(payload);
        }
        queue.expand_into(&mut buf);
        buf
    }

    #[test]
    fn exact_frame_drains_buffer() {
        let mut buf = filled_buffer(&[(1000, b"ABCD")]);

        let frame = next_frame(&mut buf, 4).expect("one full frame");
        assert_eq!(&frame.data[..], b"ABCD");
        assert_eq!(frame.pts, 1000);
        assert_eq!(frame.dts(), 1000);

        assert!(next_frame(&mut buf, 4).is_none());
        assert!(buf.is_empty());
        assert_eq!(buf.timestamp_len(), 0);
    }

    #[test]
    fn partial_remainder_stays_buffered() {
        // Two packets, 6 bytes total, frame size 4: one full frame out,
        // two bytes left carrying the second packet's expanded timestamps.
        let mut buf = filled_buffer(&[(100, b"ABC"), (103, b"DEF")]);

        let frame = next_frame(&mut buf, 4).expect("one full frame");
        assert_eq!(&frame.data[..], b"ABCD");
        assert_eq!(frame.pts, 100);

        assert!(next_frame(&mut buf, 4).is_none());
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.head_timestamp(), Some(104));
    }

    #[test]
    fn final_frame_takes_remainder() {
        let mut buf = filled_buffer(&[(100, b"ABC"), (103, b"DEF")]);
        let _ = next_frame(&mut buf, 4).unwrap();

        let frame = final_frame(&mut buf).unwrap().expect("short final frame");
        assert_eq!(&frame.data[..], b"EF");
        assert_eq!(frame.pts, 104);
        assert!(buf.is_empty());
    }

    #[test]
    fn final_frame_on_empty_buffer_emits_nothing() {
        let mut buf = SampleBuffer::new();
        assert!(final_frame(&mut buf).unwrap().is_none());
    }

    #[test]
    fn final_frame_reports_length_mismatch() {
        let mut buf = SampleBuffer::new();
        // Bytes pushed without a matching packet record: no timestamps.
        buf.push_bytes(b"xyz");

        match final_frame(&mut buf) {
            Err(MuxError::BufferMismatch { bytes, timestamps }) => {
                assert_eq!(bytes, 3);
                assert_eq!(timestamps, 0);
            }
            other => panic!("expected BufferMismatch, got {:?}", other),
        }
    }

    #[test]
    fn concatenated_frames_preserve_byte_order() {
        let payload: Vec<u8> = (0u8..=255).collect();
        let mut buf = filled_buffer(&[(0, &payload[..100]), (100, &payload[100..])]);

        let mut out = Vec::new();
        while let Some(frame) = next_frame(&mut buf, 48) {
            out.extend_from_slice(&frame.data);
        }
        if let Some(frame) = final_frame(&mut buf).unwrap() {
            out.extend_from_slice(&frame.data);
        }

        assert_eq!(out, payload);
    }
}
