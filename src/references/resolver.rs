use futures_util::{
    FutureExt,
    future::{BoxFuture, try_join_all},
};
use serde_json::{Map, Value};
use tracing::debug;

use super::{ContentNode, DocumentSource, ResolveError, ResolveResult};

/// Rebuilds content trees with reference nodes replaced by documents.
///
/// The input is never mutated. The same referenced document may appear under
/// several parents; each occurrence is fetched and resolved on its own path.
pub struct ReferenceResolver<S> {
    source: S,
}

impl<S: DocumentSource> ReferenceResolver<S> {
    /// Resolver fetching documents from `source`.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Underlying document source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns `content` with every reference substituted.
    ///
    /// Siblings resolve concurrently. Fails with
    /// [`ResolveError::CyclicReference`] when a document references one of
    /// its own ancestors on the current path.
    pub async fn resolve(&self, content: &Value) -> ResolveResult<Value> {
        self.resolve_node(content, Vec::new()).await
    }

    fn resolve_node<'a>(
        &'a self,
        value: &'a Value,
        chain: Vec<String>,
    ) -> BoxFuture<'a, ResolveResult<Value>> {
        async move {
            match ContentNode::classify(value)? {
                ContentNode::Reference { id } => self.resolve_reference(id, chain).await,
                ContentNode::Plain(Value::Object(map)) => {
                    let fields = try_join_all(map.iter().map(|(name, child)| {
                        let chain = chain.clone();
                        async move {
                            let resolved = self.resolve_node(child, chain).await?;
                            Ok::<_, ResolveError>((name.clone(), resolved))
                        }
                    }))
                    .await?;
                    Ok(Value::Object(fields.into_iter().collect::<Map<_, _>>()))
                }
                ContentNode::Plain(Value::Array(items)) => {
                    let items =
                        try_join_all(items.iter().map(|item| self.resolve_node(item, chain.clone())))
                            .await?;
                    Ok(Value::Array(items))
                }
                ContentNode::Plain(other) => Ok(other.clone()),
            }
        }
        .boxed()
    }

    async fn resolve_reference(&self, id: &str, mut chain: Vec<String>) -> ResolveResult<Value> {
        let revisited = chain.iter().any(|seen| seen == id);
        chain.push(id.to_string());
        if revisited {
            return Err(ResolveError::CyclicReference { chain });
        }

        debug!(id, depth = chain.len(), "fetching referenced document");
        let document = self
            .source
            .fetch_document(id)
            .await
            .map_err(|source| ResolveError::Fetch {
                id: id.to_string(),
                source,
            })?
            .ok_or_else(|| ResolveError::MissingDocument { id: id.to_string() })?;

        self.resolve_node(&document, chain).await
    }
}

/// One-shot helper around [`ReferenceResolver::resolve`].
pub async fn replace_references_in_content<S: DocumentSource>(
    content: &Value,
    source: S,
) -> ResolveResult<Value> {
    ReferenceResolver::new(source).resolve(content).await
}
