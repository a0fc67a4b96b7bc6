//! Tick source backed by the embassy time driver

use embassy_time::{Instant, TICK_HZ};
use ezapp_hal::TickSource;

/// Low 32 bits of the embassy tick counter
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyTicks;

impl TickSource for EmbassyTicks {
    fn ticks(&mut self) -> u32 {
        Instant::now().as_ticks() as u32
    }

    fn ticks_per_second(&self) -> u32 {
        TICK_HZ as u32
    }
}
