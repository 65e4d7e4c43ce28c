//! Pedigree Layout - automatic family-tree drawing
//!
//! This library computes generation-leveled, horizontally positioned and
//! orthogonally routed layouts for pedigree graphs: persons linked by mate
//! relations and parent-to-child relations.
//!
//! # Example
//!
//! ```rust
//! use pedigree_layout::layout::{compute_layout, ChildTriple, LayoutConfig, NoopMetrics, PersonId, UniformSize};
//!
//! let layout = compute_layout(
//!     vec![(PersonId::from("A"), PersonId::from("B"))],
//!     vec![ChildTriple::of_couple("A", "B", "C")],
//!     &UniformSize::new(120.0, 40.0),
//!     &LayoutConfig::default(),
//!     &NoopMetrics,
//! )
//! .unwrap();
//!
//! assert_eq!(layout.row_count(), 2);
//! assert_eq!(layout.node("C").unwrap().row, 1);
//! ```

pub mod document;
pub mod dump;
pub mod layout;

pub use document::{DocumentError, PedigreeDocument};
pub use dump::{render_text, TextDump};
pub use layout::{LayoutConfig, LayoutError, PedigreeLayout};

use crate::layout::MetricsSink;
use thiserror::Error;

/// Errors that can occur between loading a document and laying it out
#[derive(Debug, Error)]
pub enum PedigreeError {
    /// Error while loading the document
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Error during layout
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
}

/// Lay out a loaded document
pub fn layout_document(
    doc: &PedigreeDocument,
    config: &LayoutConfig,
    metrics: &dyn MetricsSink,
) -> Result<PedigreeLayout, LayoutError> {
    layout::compute_layout(
        doc.mates.iter().cloned(),
        doc.children.iter().cloned(),
        &doc.sizer(config),
        config,
        metrics,
    )
}

/// Parse a TOML pedigree document and render its layout as text
///
/// # Example
///
/// ```rust
/// use pedigree_layout::{layout_str, LayoutConfig};
///
/// let text = layout_str(r#"
///     [[mates]]
///     pair = ["A", "B"]
/// "#, &LayoutConfig::default()).unwrap();
///
/// assert!(text.contains("couple A + B slot 0"));
/// ```
pub fn layout_str(source: &str, config: &LayoutConfig) -> Result<String, PedigreeError> {
    let doc = PedigreeDocument::from_toml_str(source)?;
    let layout = layout_document(&doc, config, &layout::NoopMetrics)?;
    Ok(render_text(&layout))
}
