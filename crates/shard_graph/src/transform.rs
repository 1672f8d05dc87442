//! The source-transform collaborator interface.

/// Maps a module's raw bytes to transformed bytes before scanning and hashing.
///
/// Implementations (transpilers, stylesheet compilers) must leave import
/// specifiers intact: the graph is built from the transformed text, and
/// chunk hashes are computed over it.
pub trait SourceTransform: Send + Sync {
    /// Transforms one module. `resource` is the project-relative path.
    fn transform(
        &self,
        resource: &str,
        source: Vec<u8>,
    ) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>>;
}

/// A transform that returns its input unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

impl SourceTransform for Identity {
    fn transform(
        &self,
        _resource: &str,
        source: Vec<u8>,
    ) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(source)
    }
}
