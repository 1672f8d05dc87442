//! Error types for chunk graph construction.

/// Fatal errors raised while building the chunk graph.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// Cache-group rules moved every module out of an entry or async chunk.
    #[error("chunk '{chunk}' has no modules left after cache groups {}", format_rules(.rules))]
    EmptyChunk {
        /// The emptied chunk.
        chunk: String,
        /// Cache groups that took modules from it, in rule order.
        rules: Vec<String>,
    },

    /// A cache-group `regex` test failed to compile.
    #[error("invalid pattern in cache group '{group}': {message}")]
    InvalidPattern {
        /// The cache group name.
        group: String,
        /// The regex compiler's message.
        message: String,
    },
}

fn format_rules(rules: &[String]) -> String {
    rules
        .iter()
        .map(|r| format!("'{r}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
