pub mod camera;
pub mod data;
pub mod geometry;
pub mod pipeline;
pub mod render_buffer;
pub mod render_engine;
pub mod shader;
pub mod texture;
