//! CMS reference placeholder resolution.
//!
//! A content tree may hold nodes shaped `{"_type": "reference", "_ref": id}`.
//! [`ReferenceResolver`] returns a new tree in which each such node is
//! replaced by the fetched document, itself resolved recursively.

/// Async traversal that substitutes reference nodes.
pub mod resolver;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use resolver::{ReferenceResolver, replace_references_in_content};

/// Boxed error returned by a [`DocumentSource`].
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while resolving references.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A reference points back at a document already on the current path.
    #[error("ran into an infinite loop of references, document order: [{}]", .chain.join(","))]
    CyclicReference {
        /// Ids along the path, ending with the revisited id.
        chain: Vec<String>,
    },
    /// A node typed `reference` without a string `_ref`.
    #[error("reference node has no string `_ref`: {node}")]
    InvalidReference {
        /// The offending node.
        node: Value,
    },
    /// The source had no document for a referenced id.
    #[error("referenced document `{id}` not found")]
    MissingDocument {
        /// Referenced id.
        id: String,
    },
    /// The source failed while fetching a document.
    #[error("failed to fetch document `{id}`: {source}")]
    Fetch {
        /// Referenced id.
        id: String,
        /// Underlying failure.
        source: SourceError,
    },
}

/// Result alias for reference resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Shape of one JSON node as far as resolution is concerned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContentNode<'a> {
    /// Placeholder to substitute with the document `id`.
    Reference {
        /// Referenced document id.
        id: &'a str,
    },
    /// Anything else; children are still visited.
    Plain(&'a Value),
}

impl<'a> ContentNode<'a> {
    /// Classifies `value`.
    pub fn classify(value: &'a Value) -> ResolveResult<Self> {
        let Value::Object(map) = value else {
            return Ok(Self::Plain(value));
        };
        if map.get("_type").and_then(Value::as_str) != Some("reference") {
            return Ok(Self::Plain(value));
        }
        match map.get("_ref").and_then(Value::as_str) {
            Some(id) => Ok(Self::Reference { id }),
            None => Err(ResolveError::InvalidReference {
                node: value.clone(),
            }),
        }
    }
}

/// Fetches full documents by id.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Returns the document with `id`, or `None` when it does not exist.
    async fn fetch_document(&self, id: &str) -> Result<Option<Value>, SourceError>;
}
