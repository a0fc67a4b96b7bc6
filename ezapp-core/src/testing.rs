//! Scripted collaborators for unit tests

use ezapp_hal::{ByteTransport, TickSource};
use heapless::{Deque, Vec};

/// Transport fed from a queue, recording everything sent
pub struct MockTransport {
    rx: Deque<u8, 256>,
    pub tx: Vec<u8, 512>,
    pub connected: bool,
    pub init_calls: u32,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            rx: Deque::new(),
            tx: Vec::new(),
            connected: true,
            init_calls: 0,
        }
    }

    /// Queue bytes for the receiver
    pub fn push_rx(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.rx.push_back(byte).unwrap();
        }
    }

    /// Everything sent so far, clearing the record
    pub fn take_tx(&mut self) -> Vec<u8, 512> {
        core::mem::take(&mut self.tx)
    }

    pub fn pending_rx(&self) -> usize {
        self.rx.len()
    }
}

impl ByteTransport for MockTransport {
    fn init(&mut self) {
        self.init_calls += 1;
    }

    fn kbhit(&mut self) -> bool {
        !self.rx.is_empty()
    }

    fn getc(&mut self) -> u8 {
        self.rx.pop_front().unwrap()
    }

    fn putc(&mut self, byte: u8) {
        self.tx.push(byte).unwrap();
    }

    fn is_connected(&mut self) -> bool {
        self.connected
    }
}

/// Tick counter advanced by hand
pub struct ManualTicks {
    pub now: u32,
    pub per_second: u32,
}

impl ManualTicks {
    pub fn new(per_second: u32) -> Self {
        Self { now: 0, per_second }
    }

    pub fn advance_seconds(&mut self, seconds: u32) {
        self.now = self
            .now
            .wrapping_add(seconds.wrapping_mul(self.per_second));
    }
}

impl TickSource for ManualTicks {
    fn ticks(&mut self) -> u32 {
        self.now
    }

    fn ticks_per_second(&self) -> u32 {
        self.per_second
    }
}
