//! `Format` annotation vocabulary.
//!
//! Effect files name pixel formats with D3D-style tokens. The vocabulary
//! is closed; unrecognized tokens fall back to 8-bit RGBA (or 24/8
//! depth-stencil for depth targets) with a warning.

/// Maps a color `Format` token to a texture format.
pub fn color_format(token: Option<&str>) -> wgpu::TextureFormat {
    use wgpu::TextureFormat as F;
    let Some(token) = token else {
        return F::Rgba8Unorm;
    };
    match token {
        "A8R8G8B8" | "X8R8G8B8" => F::Bgra8Unorm,
        "A8B8G8R8" | "R8G8B8A8" => F::Rgba8Unorm,
        "A16B16G16R16F" => F::Rgba16Float,
        "A32B32G32R32F" => F::Rgba32Float,
        "R16F" => F::R16Float,
        "R32F" => F::R32Float,
        "G16R16F" => F::Rg16Float,
        "G32R32F" => F::Rg32Float,
        "G16R16" => F::Rg16Unorm,
        "A2B10G10R10" => F::Rgb10a2Unorm,
        "L8" | "A8" => F::R8Unorm,
        other => {
            log::warn!("unrecognized color format token {other:?}, defaulting to RGBA8");
            F::Rgba8Unorm
        }
    }
}

/// Maps a depth-stencil `Format` token to a texture format.
pub fn depth_format(token: Option<&str>) -> wgpu::TextureFormat {
    use wgpu::TextureFormat as F;
    let Some(token) = token else {
        return F::Depth24PlusStencil8;
    };
    match token {
        "D24S8" | "D24X8" => F::Depth24PlusStencil8,
        "D32" | "D32F" => F::Depth32Float,
        "D16" => F::Depth16Unorm,
        other => {
            log::warn!("unrecognized depth format token {other:?}, defaulting to D24S8");
            F::Depth24PlusStencil8
        }
    }
}
