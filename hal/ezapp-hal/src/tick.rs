//! Tick source abstraction

/// Free-running tick counter
///
/// The counter may wrap; consumers compare ticks with `wrapping_sub`.
pub trait TickSource {
    /// Current tick count
    fn ticks(&mut self) -> u32;

    /// Ticks per second of [`TickSource::ticks`]
    fn ticks_per_second(&self) -> u32;
}
