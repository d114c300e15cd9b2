use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use serde_json::{Value, json};

use lokalize::references::{
    ContentNode, DocumentSource, ReferenceResolver, ResolveError, SourceError,
    replace_references_in_content,
};

#[derive(Default, Clone)]
struct FakeSource {
    docs: HashMap<String, Value>,
    fetches: Arc<AtomicUsize>,
}

impl FakeSource {
    fn with(mut self, id: &str, doc: Value) -> Self {
        self.docs.insert(id.to_string(), doc);
        self
    }
}

#[async_trait]
impl DocumentSource for FakeSource {
    async fn fetch_document(&self, id: &str) -> Result<Option<Value>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if id == "broken" {
            return Err("connection reset".into());
        }
        Ok(self.docs.get(id).cloned())
    }
}

fn reference(id: &str) -> Value {
    json!({ "_type": "reference", "_ref": id })
}

#[tokio::test]
async fn substitutes_nested_references_and_keeps_other_fields() {
    let source = FakeSource::default()
        .with("author", json!({ "_id": "author", "name": "Ada" }))
        .with(
            "article",
            json!({ "_id": "article", "title": "Intro", "author": reference("author") }),
        );

    let content = json!({
        "title": "Page",
        "sections": [ { "body": reference("article") }, { "body": "inline" } ],
        "count": 3
    });

    let resolver = ReferenceResolver::new(source);
    let resolved = resolver.resolve(&content).await.expect("resolve");

    assert_eq!(
        resolved,
        json!({
            "title": "Page",
            "sections": [
                { "body": { "_id": "article", "title": "Intro", "author": { "_id": "author", "name": "Ada" } } },
                { "body": "inline" }
            ],
            "count": 3
        })
    );
    // The input tree is left untouched.
    assert_eq!(content["sections"][0]["body"], reference("article"));
    assert_eq!(resolver.source().fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn same_document_under_two_parents_resolves_for_both() {
    let source = FakeSource::default().with("shared", json!({ "_id": "shared", "v": 1 }));
    let content = json!({ "left": reference("shared"), "right": reference("shared") });

    let resolved = replace_references_in_content(&content, source)
        .await
        .expect("resolve");
    assert_eq!(resolved["left"], resolved["right"]);
    assert_eq!(resolved["left"]["v"], 1);
}

#[tokio::test]
async fn cycle_reports_full_chain() {
    let source = FakeSource::default()
        .with("A", json!({ "_id": "A", "next": reference("B") }))
        .with("B", json!({ "_id": "B", "next": reference("A") }));

    let err = ReferenceResolver::new(source)
        .resolve(&reference("A"))
        .await
        .unwrap_err();

    match err {
        ResolveError::CyclicReference { chain } => assert_eq!(chain, vec!["A", "B", "A"]),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn self_reference_is_a_cycle() {
    let source = FakeSource::default().with("A", json!({ "_id": "A", "me": reference("A") }));
    let err = ReferenceResolver::new(source)
        .resolve(&json!({ "root": reference("A") }))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("[A,A]"), "{err}");
}

#[tokio::test]
async fn missing_and_failing_fetches_propagate() {
    let source = FakeSource::default();
    let err = ReferenceResolver::new(source.clone())
        .resolve(&reference("nowhere"))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::MissingDocument { ref id } if id == "nowhere"));

    let err = ReferenceResolver::new(source)
        .resolve(&json!([reference("broken")]))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::Fetch { ref id, .. } if id == "broken"));
}

#[tokio::test]
async fn reference_without_string_ref_is_rejected() {
    let err = ReferenceResolver::new(FakeSource::default())
        .resolve(&json!({ "x": { "_type": "reference", "_ref": 42 } }))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::InvalidReference { .. }));
}

#[test]
fn classify_distinguishes_node_shapes() {
    let r = reference("abc");
    assert_eq!(
        ContentNode::classify(&r).expect("classify"),
        ContentNode::Reference { id: "abc" }
    );

    let plain = json!({ "_type": "document", "_ref": "abc" });
    assert_eq!(
        ContentNode::classify(&plain).expect("classify"),
        ContentNode::Plain(&plain)
    );
}
