use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::codec::{decode_frame, FrameConfig, RawFrame};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    done: bool,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            done: false,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<RawFrame> {
        loop {
            if let Some(frame) = decode_frame(&mut self.buf, &self.config)? {
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if !self.buf.is_empty() {
                    tracing::debug!(buffered = self.buf.len(), "stream closed mid-frame");
                }
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T: Read> Iterator for FrameReader<T> {
    type Item = Result<RawFrame>;

    /// Yields frames until the stream ends cleanly on a frame boundary.
    /// The first error is yielded once and ends the iteration.
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_frame() {
            Ok(frame) => Some(Ok(frame)),
            Err(FrameError::ConnectionClosed) if self.buf.is_empty() => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BufMut;

    use super::*;
    use crate::codec::{encode_raw, FrameHeader};

    fn wire(frames: &[RawFrame]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for frame in frames {
            encode_raw(frame, &FrameConfig::default(), &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn read_single_frame() {
        let bytes = wire(&[RawFrame::new(FrameHeader::message(1), &b"hello"[..])]);

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.header.message_id, 1);
        assert_eq!(frame.body.as_ref(), b"hello");
    }

    #[test]
    fn read_mixed_frames() {
        let bytes = wire(&[
            RawFrame::new(FrameHeader::message(1), &b"one"[..]),
            RawFrame::new(FrameHeader::module(82, 2), &b"two"[..]),
            RawFrame::new(FrameHeader::message(3), &b""[..]),
        ]);

        let mut reader = FrameReader::new(Cursor::new(bytes));

        let f1 = reader.read_frame().unwrap();
        let f2 = reader.read_frame().unwrap();
        let f3 = reader.read_frame().unwrap();

        assert_eq!((f1.header.message_id, f1.body.as_ref()), (1, b"one".as_ref()));
        assert_eq!(f2.header, FrameHeader::module(82, 2));
        assert_eq!(f2.body.as_ref(), b"two");
        assert!(f3.body.is_empty());
    }

    #[test]
    fn partial_read_handling() {
        let bytes = wire(&[RawFrame::new(FrameHeader::module(82, 9), &b"slow"[..])]);

        let mut reader = FrameReader::new(ByteByByteReader { bytes, pos: 0 });

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.header.module_id, Some(9));
        assert_eq!(frame.body.as_ref(), b"slow");
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let mut partial = BytesMut::new();
        partial.put_u16_le(16);
        partial.put_u8(2);
        partial.put_slice(b"only-part");

        let mut reader = FrameReader::new(Cursor::new(partial.to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn invalid_length_in_stream() {
        let mut reader = FrameReader::new(Cursor::new(vec![0x01, 0x00, 0x07]));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::InvalidLength(1)));
    }

    #[test]
    fn iterator_stops_at_clean_eof() {
        let bytes = wire(&[
            RawFrame::new(FrameHeader::message(4), &b"a"[..]),
            RawFrame::new(FrameHeader::message(5), &b"b"[..]),
        ]);

        let ids: Vec<u8> = FrameReader::new(Cursor::new(bytes))
            .map(|frame| frame.unwrap().header.message_id)
            .collect();
        assert_eq!(ids, vec![4, 5]);
    }

    #[test]
    fn iterator_reports_trailing_partial_frame() {
        let mut bytes = wire(&[RawFrame::new(FrameHeader::message(4), &b"a"[..])]);
        bytes.extend_from_slice(&[0x09, 0x00]);

        let mut reader = FrameReader::new(Cursor::new(bytes));
        assert!(reader.next().unwrap().is_ok());
        assert!(matches!(
            reader.next(),
            Some(Err(FrameError::ConnectionClosed))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn interrupted_read_retries() {
        let bytes = wire(&[RawFrame::new(FrameHeader::message(8), &b"ok"[..])]);

        let mut framed = FrameReader::new(InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(bytes),
        });
        let frame = framed.read_frame().unwrap();

        assert_eq!(frame.header.message_id, 8);
        assert_eq!(frame.body.as_ref(), b"ok");
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_pipe() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        writer.send(FrameHeader::message(1), b"ping").unwrap();
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.header.message_id, 1);
        assert_eq!(frame.body.as_ref(), b"ping");
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }
}
