pub mod builder;
pub mod bundle;
pub mod depth;
pub mod driver;
pub mod render;

pub use builder::OverlayBuilder;
pub use bundle::{BoxShape, BoxSource, OverlayBox, OverlayBundle, RenderMode};
pub use depth::{depth_colors, normalized_depth, DepthColors};
pub use driver::{render_scenes, RenderReport};
pub use render::{PlyRenderer, RenderError, Renderer, RendererKind, SvgRenderer};
