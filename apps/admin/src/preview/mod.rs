//! Template live preview.
//!
//! `document` is the pure part: `{markup, style, fidelity}` in, one
//! standalone HTML document out. `renderer` decides when to rebuild and
//! writes into a `PreviewSurface`, which is whatever host actually shows it.

pub mod document;
pub mod renderer;
pub mod surface;

pub use document::{build_preview_document, sandboxed_frame_html, Fidelity};
pub use renderer::{PreviewRenderer, PreviewSource, RenderStatus};
pub use surface::{FileSurface, MemorySurface, PreviewSurface};
