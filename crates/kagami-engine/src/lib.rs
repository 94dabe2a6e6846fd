//! Kagami effect engine crate.
//!
//! Binds effect-file semantic annotations to shader parameters, selects
//! techniques per material, and interprets the effect Script language that
//! drives multi-pass offscreen rendering. Effect compilation, model vertex
//! buffers, and windowing belong to the embedding application.

pub mod coords;
pub mod device;
pub mod effect;
pub mod engine;
pub mod interp;
pub mod logging;
pub mod registry;
pub mod render;
pub mod semantic;
pub mod target;
