//! Frame encoding and decoding for the EZApp serial link.
//!
//! Frame format:
//! - SOF (1 byte): 0x7E, never escaped
//! - SEQ (1 byte): sequence number, echoed by the responder
//! - CMD (1 byte): command code
//! - PAYLOAD (0-MAX_PAYLOAD_SIZE bytes): command-specific data
//! - CHECKSUM (1 byte): XOR of SEQ, CMD and all PAYLOAD bytes
//! - EOF (1 byte): 0x7D, never escaped
//!
//! Any SOF, EOF or ESC value between the markers is sent as `ESC, byte ^ 0x20`.
//! The checksum is computed over unescaped values.

use heapless::Vec;

/// Start-of-frame marker
pub const SOF: u8 = 0x7E;

/// End-of-frame marker
pub const EOF: u8 = 0x7D;

/// Escape marker
pub const ESC: u8 = 0x7C;

/// Value XORed into an escaped byte
pub const ESC_XOR: u8 = 0x20;

/// Maximum payload size in bytes (shared by both ends of the link)
pub const MAX_PAYLOAD_SIZE: usize = 32;

/// Bytes between the markers that are not payload (SEQ + CMD + CHECKSUM)
pub const FRAME_OVERHEAD: usize = 3;

/// SEQ and CMD
const HEADER_SIZE: usize = 2;

/// Worst-case encoded frame size: both markers plus every inner byte escaped
pub const MAX_FRAME_SIZE: usize = 2 + 2 * (FRAME_OVERHEAD + MAX_PAYLOAD_SIZE);

/// Command code of the negative acknowledgement frame
pub const CMD_NACK: u8 = 0x6E;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Checksum mismatch
    InvalidChecksum,
    /// Frame shorter than SEQ + CMD + CHECKSUM
    InvalidFrame,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// Returns true if `byte` must be escaped inside a frame
#[inline]
pub const fn needs_escape(byte: u8) -> bool {
    matches!(byte, SOF | EOF | ESC)
}

/// Destination for outgoing frame bytes
///
/// Implemented by anything that can accept one byte at a time: a UART,
/// a Bluetooth module, or a buffer in tests.
pub trait ByteSink {
    /// Send or enqueue one raw byte
    fn put_byte(&mut self, byte: u8);
}

/// Collects bytes into a heapless Vec, dropping bytes once it is full
impl<const N: usize> ByteSink for Vec<u8, N> {
    fn put_byte(&mut self, byte: u8) {
        let _ = self.push(byte);
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn put_byte(&mut self, byte: u8) {
        (**self).put_byte(byte);
    }
}

/// Streaming frame transmitter
///
/// Writes SOF immediately, escapes and checksums every byte pushed
/// through it, and closes the frame with the checksum and EOF in
/// [`FrameWriter::finish`]. Responses whose payload is produced on the
/// fly (strings read from storage, polled values) never need a buffer.
pub struct FrameWriter<'a, W: ByteSink + ?Sized> {
    sink: &'a mut W,
    checksum: u8,
    written: usize,
}

impl<'a, W: ByteSink + ?Sized> FrameWriter<'a, W> {
    /// Emit SOF and the frame header
    pub fn begin(sink: &'a mut W, seq: u8, cmd: u8) -> Self {
        sink.put_byte(SOF);
        let mut writer = Self {
            sink,
            checksum: 0,
            written: 0,
        };
        writer.byte(seq);
        writer.byte(cmd);
        writer
    }

    fn put_escaped(&mut self, byte: u8) {
        if needs_escape(byte) {
            self.sink.put_byte(ESC);
            self.sink.put_byte(byte ^ ESC_XOR);
        } else {
            self.sink.put_byte(byte);
        }
    }

    /// Append one data byte
    pub fn byte(&mut self, byte: u8) {
        self.checksum ^= byte;
        self.written += 1;
        self.put_escaped(byte);
    }

    /// Append a run of data bytes
    pub fn bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.byte(byte);
        }
    }

    /// Append a little-endian 16-bit value
    pub fn u16_le(&mut self, value: u16) {
        self.bytes(&value.to_le_bytes());
    }

    /// Payload bytes that still fit in [`MAX_PAYLOAD_SIZE`]
    pub fn remaining(&self) -> usize {
        (HEADER_SIZE + MAX_PAYLOAD_SIZE).saturating_sub(self.written)
    }

    /// Emit the checksum and EOF
    pub fn finish(mut self) {
        let checksum = self.checksum;
        self.put_escaped(checksum);
        self.sink.put_byte(EOF);
    }
}

/// Sink over a fixed slice that remembers whether it ran out of room
struct SliceSink<'a> {
    buffer: &'a mut [u8],
    pos: usize,
    overflow: bool,
}

impl ByteSink for SliceSink<'_> {
    fn put_byte(&mut self, byte: u8) {
        match self.buffer.get_mut(self.pos) {
            Some(slot) => {
                *slot = byte;
                self.pos += 1;
            }
            None => self.overflow = true,
        }
    }
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<const N: usize = MAX_PAYLOAD_SIZE> {
    /// Sequence number
    pub seq: u8,
    /// Command code
    pub cmd: u8,
    /// Payload data
    pub payload: Vec<u8, N>,
}

impl<const N: usize> Frame<N> {
    /// Create a new frame with the given header and payload
    pub fn new(seq: u8, cmd: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self {
            seq,
            cmd,
            payload: payload_vec,
        })
    }

    /// Create a frame with no payload
    pub fn empty(seq: u8, cmd: u8) -> Self {
        Self {
            seq,
            cmd,
            payload: Vec::new(),
        }
    }

    /// The negative acknowledgement sent after a corrupt frame
    pub fn nack() -> Self {
        Self::empty(0, CMD_NACK)
    }

    /// Stream this frame into a sink
    pub fn write_to<W: ByteSink + ?Sized>(&self, sink: &mut W) {
        let mut writer = FrameWriter::begin(sink, self.seq, self.cmd);
        writer.bytes(&self.payload);
        writer.finish();
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let mut sink = SliceSink {
            buffer,
            pos: 0,
            overflow: false,
        };
        self.write_to(&mut sink);
        if sink.overflow {
            return Err(FrameError::BufferTooSmall);
        }
        Ok(sink.pos)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }
}

/// Resumable receive state machine
///
/// Bytes are fed one at a time as the transport yields them. A SOF
/// always restarts the frame, so noise in the middle of a frame costs
/// only that frame. Bytes past the payload capacity are not stored but
/// still counted and checksummed, which lets EOF reject oversized frames.
#[derive(Debug, Clone)]
pub struct FrameParser<const N: usize = MAX_PAYLOAD_SIZE> {
    waiting_for_sof: bool,
    escaped: bool,
    checksum: u8,
    count: usize,
    seq: u8,
    cmd: u8,
    payload: Vec<u8, N>,
}

impl<const N: usize> Default for FrameParser<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FrameParser<N> {
    /// Create a new frame parser
    pub fn new() -> Self {
        Self {
            waiting_for_sof: true,
            escaped: false,
            checksum: 0,
            count: 0,
            seq: 0,
            cmd: 0,
            payload: Vec::new(),
        }
    }

    /// Drop any partial frame and wait for the next SOF
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// True while no frame is in progress
    pub fn is_waiting_for_sof(&self) -> bool {
        self.waiting_for_sof
    }

    /// Unescaped bytes received since the last SOF
    pub fn bytes_received(&self) -> usize {
        self.count
    }

    /// XOR of the unescaped bytes received since the last SOF
    pub fn running_checksum(&self) -> u8 {
        self.checksum
    }

    fn start_frame(&mut self) {
        self.waiting_for_sof = false;
        self.escaped = false;
        self.checksum = 0;
        self.count = 0;
        self.seq = 0;
        self.cmd = 0;
        self.payload.clear();
    }

    fn accept(&mut self, byte: u8) {
        self.checksum ^= byte;
        match self.count {
            0 => self.seq = byte,
            1 => self.cmd = byte,
            // Overflow is detected at EOF from `count`
            _ => {
                let _ = self.payload.push(byte);
            }
        }
        self.count = self.count.saturating_add(1);
    }

    fn end_frame(&mut self) -> Result<Option<Frame<N>>, FrameError> {
        self.waiting_for_sof = true;
        self.escaped = false;

        if self.checksum != 0 {
            return Err(FrameError::InvalidChecksum);
        }
        if self.count < FRAME_OVERHEAD {
            return Err(FrameError::InvalidFrame);
        }

        let len = self.count - FRAME_OVERHEAD;
        if len > N {
            return Err(FrameError::PayloadTooLarge);
        }

        // The checksum byte landed in the buffer when there was room for it
        let mut payload = core::mem::take(&mut self.payload);
        payload.truncate(len);

        Ok(Some(Frame {
            seq: self.seq,
            cmd: self.cmd,
            payload,
        }))
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` when EOF closed a
    /// corrupt frame. After an error the parser waits for the next SOF.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame<N>>, FrameError> {
        if byte == SOF {
            self.start_frame();
            return Ok(None);
        }

        if self.waiting_for_sof {
            return Ok(None);
        }

        match byte {
            ESC => {
                self.escaped = true;
                Ok(None)
            }
            EOF => self.end_frame(),
            _ => {
                let value = if self.escaped {
                    self.escaped = false;
                    byte ^ ESC_XOR
                } else {
                    byte
                };
                self.accept(value);
                Ok(None)
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame or error found, if any.
    /// Remaining bytes after it are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Frame<N>>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}
