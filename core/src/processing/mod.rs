pub mod denoise;
pub mod pipeline;
pub mod render;
pub mod store;

pub use denoise::{Decision, DenoiseEngine};
pub use pipeline::FramePipeline;
pub use render::{RenderBuffer, RenderBufferBuilder, RENDER_STRIDE};
pub use store::{CanonicalStore, EntityRecord};
