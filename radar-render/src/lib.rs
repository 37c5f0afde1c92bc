//! Channel-ready text: the markdown subset drafts use, preamble cleanup and
//! the two size-limited preview variants.

pub mod markup;
pub mod preamble;
pub mod preview;
pub mod sections;
pub mod visible;

pub use preview::{PreviewKind, PreviewRenderer, PreviewVariant, PreviewVariants};
pub use sections::{PostSections, split_post_sections};
