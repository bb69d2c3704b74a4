//! vtex Metrics - texture memory bookkeeping
//!
//! Counters and rolling windows used to watch how often texture memory is
//! re-acquired. Everything here vanishes in production builds.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use vtex_metrics::{Counter, FrameTimer, RingBuffer};
//!
//! let mut counters = Counter::new();
//! counters.add("reclaims", 1);
//!
//! let mut per_frame = RingBuffer::<u64>::new(60);
//! per_frame.push(4096);
//! println!("avg reclaimed: {}", per_frame.average());
//!
//! let mut timer = FrameTimer::new(60);
//! timer.begin();
//! // ... render a frame ...
//! timer.end();
//! println!("frame time: {:.2} ms", timer.frame_time_ms());
//! ```
//!
//! Without the `metrics` feature the types below are no-op stubs with the
//! same surface, so callers never need their own `cfg` guards.

#[cfg(feature = "metrics")]
mod counter;
#[cfg(feature = "metrics")]
mod frame_timer;
#[cfg(feature = "metrics")]
mod ring_buffer;

#[cfg(feature = "metrics")]
pub use counter::Counter;
#[cfg(feature = "metrics")]
pub use frame_timer::FrameTimer;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;

/// Counter names shared between the core and the runtime.
pub mod keys {
    pub const RECLAIMS: &str = "reclaims";
    pub const RECLAIMED_BYTES: &str = "reclaimed_bytes";
    pub const DEFINITIONS: &str = "definitions";
    pub const DELETIONS: &str = "deletions";
    pub const ALLOC_FAILURES: &str = "alloc_failures";
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct Counter;

#[cfg(not(feature = "metrics"))]
impl Counter {
    pub fn new() -> Self { Self }
    pub fn add(&mut self, _name: &'static str, _value: u64) {}
    pub fn get(&self, _name: &str) -> u64 { 0 }
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> { Vec::new() }
    pub fn reset_all(&mut self) {}
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug)]
pub struct FrameTimer;

#[cfg(not(feature = "metrics"))]
impl FrameTimer {
    pub fn new(_capacity: usize) -> Self { Self }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) {}
    pub fn record(&mut self, _elapsed: std::time::Duration) {}
    pub fn frames(&self) -> u64 { 0 }
    pub fn fps(&self) -> f64 { 0.0 }
    pub fn frame_time_ms(&self) -> f64 { 0.0 }
    pub fn frame_time_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug)]
pub struct RingBuffer<T>(std::marker::PhantomData<T>);

#[cfg(not(feature = "metrics"))]
impl<T> RingBuffer<T> {
    pub fn new(_capacity: usize) -> Self { Self(std::marker::PhantomData) }
    pub fn push(&mut self, _value: T) {}
    pub fn len(&self) -> usize { 0 }
    pub fn is_empty(&self) -> bool { true }
}

#[cfg(not(feature = "metrics"))]
impl RingBuffer<u64> {
    pub fn average(&self) -> u64 { 0 }
    pub fn peak(&self) -> u64 { 0 }
}
