//! Headless GPU context.
//!
//! The effect engine renders into offscreen targets; window/surface
//! ownership stays with the embedding application. This module only
//! acquires an instance/adapter/device/queue set.

mod gpu;

pub use gpu::{Gpu, GpuInit};
