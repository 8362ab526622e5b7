//! Per-tick systems that only touch entity data.

pub mod transform;

pub use transform::sync_transforms;
