//! Output emission: chunk rendering and naming, static assets, the HTML
//! entry document, the precache manifest, and the final write.
//!
//! Nothing here touches the output directory until [`write_output`] runs,
//! which the pipeline calls only after every other stage has succeeded.

#![warn(missing_docs)]

pub mod assets;
pub mod error;
pub mod html;
pub mod minify;
pub mod naming;
pub mod output;
pub mod precache;
pub mod render;

pub use assets::{collect_assets, Asset};
pub use error::EmitError;
pub use html::{html_scripts, render_html};
pub use minify::{Minifier, Passthrough, StripWhitespace};
pub use naming::{name_chunks, EmittedChunk, FilenameTemplate};
pub use output::{resolve_collisions, write_output, FileKind, OutputFile};
pub use precache::{build_manifest, inject_manifest, ManifestEntry, PrecacheOptions};
