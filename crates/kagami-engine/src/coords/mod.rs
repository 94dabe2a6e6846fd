//! Size and viewport types shared across the target arena and renderers.

mod viewport;

pub use viewport::Viewport;
