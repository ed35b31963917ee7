//! Rendering: the framebuffer and the rasterization pipeline that fills it.

mod framebuffer;
mod rasterizer;

pub use framebuffer::{FrameBuffer, Tile, DEPTH_CLEAR};
pub use rasterizer::{
    pixel_center, to_raster, vertex_shader, Bounds, DrawStats, EdgeFunction, FragmentInput,
    FragmentShader, NormalShader, Rasterizer, TextureShader, TriangleSetup, DEFAULT_TILE_ROWS,
};
