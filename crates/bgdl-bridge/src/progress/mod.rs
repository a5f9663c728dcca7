//! Progress reporting policy for native adapters.
//!
//! Native adapters see raw byte counts far more often than callers want
//! progress callbacks. They feed those counts through a
//! [`ProgressCoalescer`] and emit whatever batch it hands back.

mod coalescer;

pub use coalescer::ProgressCoalescer;
