//! Anti-Recommendation Knowledge Graph (ARKG) backed by oxigraph.
//!
//! An ARKG links each record to review resources naming its anti-recommendations:
//!
//! ```text
//! <{base}{key}> schema:itemReviewed ?review .
//! ?review schema:name "Other record key" .
//! ```
//!
//! Record keys are percent-encoded into the subject IRI, relative to the base IRI.

use std::io::Read;
use std::path::Path;

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{BlankNode, GraphNameRef, Literal, NamedNode, NamedNodeRef, Quad, Term};
use oxigraph::sparql::{QueryResults, SparqlEvaluator};
use oxigraph::store::Store;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::record::RecordKey;

use super::{GraphResult, RelationGraph};

const ITEM_REVIEWED: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://schema.org/itemReviewed");
const NAME: NamedNodeRef<'static> = NamedNodeRef::new_unchecked("http://schema.org/name");

/// Serialization formats accepted for ARKG files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArkgFormat {
    #[default]
    Turtle,
    NTriples,
    RdfXml,
}

impl ArkgFormat {
    fn rdf_format(self) -> RdfFormat {
        match self {
            ArkgFormat::Turtle => RdfFormat::Turtle,
            ArkgFormat::NTriples => RdfFormat::NTriples,
            ArkgFormat::RdfXml => RdfFormat::RdfXml,
        }
    }
}

/// In-memory oxigraph store holding an ARKG.
pub struct ArkgStore {
    store: Store,
    base_iri: String,
}

impl ArkgStore {
    /// Create an empty store whose subjects live under `base_iri`.
    pub fn in_memory(base_iri: &str) -> GraphResult<Self> {
        NamedNode::new(base_iri).map_err(|e| GraphError::BaseIri {
            iri: base_iri.to_string(),
            message: e.to_string(),
        })?;
        let store = Store::new().map_err(|e| GraphError::Load {
            path: "<memory>".into(),
            message: format!("failed to create oxigraph store: {e}"),
        })?;
        Ok(Self {
            store,
            base_iri: base_iri.to_string(),
        })
    }

    /// Load an ARKG serialization from a file.
    pub fn load(path: &Path, format: ArkgFormat, base_iri: &str) -> GraphResult<Self> {
        let arkg = Self::in_memory(base_iri)?;
        let file = std::fs::File::open(path).map_err(|e| GraphError::Load {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        arkg.load_from_reader(format, std::io::BufReader::new(file))
            .map_err(|e| match e {
                GraphError::Load { message, .. } => GraphError::Load {
                    path: path.display().to_string(),
                    message,
                },
                other => other,
            })?;
        tracing::info!(path = %path.display(), quads = arkg.len(), "ARKG loaded");
        Ok(arkg)
    }

    /// Parse RDF from `reader` into the store, resolving relative IRIs against the base.
    pub fn load_from_reader(&self, format: ArkgFormat, reader: impl Read) -> GraphResult<()> {
        let parser = RdfParser::from_format(format.rdf_format())
            .with_base_iri(&self.base_iri)
            .map_err(|e| GraphError::BaseIri {
                iri: self.base_iri.clone(),
                message: e.to_string(),
            })?;
        self.store
            .load_from_reader(parser, reader)
            .map_err(|e| GraphError::Load {
                path: "<reader>".into(),
                message: e.to_string(),
            })
    }

    /// IRI naming the record `key` in this graph.
    pub fn subject_iri(&self, key: &RecordKey) -> GraphResult<NamedNode> {
        let iri = format!("{}{}", self.base_iri, encode_segment(key.as_str()));
        NamedNode::new(iri).map_err(|e| GraphError::Query {
            subject: key.to_string(),
            message: format!("cannot form subject IRI: {e}"),
        })
    }

    /// Record `object` as an anti-recommendation of `subject`.
    pub fn insert_edge(&self, subject: &RecordKey, object: &RecordKey) -> GraphResult<()> {
        let subject_node = self.subject_iri(subject)?;
        let review = BlankNode::default();
        let quads = [
            Quad::new(
                subject_node,
                ITEM_REVIEWED,
                review.clone(),
                GraphNameRef::DefaultGraph,
            ),
            Quad::new(
                review,
                NAME,
                Literal::new_simple_literal(object.as_str()),
                GraphNameRef::DefaultGraph,
            ),
        ];
        for quad in &quads {
            self.store.insert(quad).map_err(|e| GraphError::Query {
                subject: subject.to_string(),
                message: format!("insert failed: {e}"),
            })?;
        }
        Ok(())
    }

    /// Number of quads in the store.
    pub fn len(&self) -> usize {
        self.store.len().unwrap_or(0)
    }

    /// Whether the store holds no quads.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RelationGraph for ArkgStore {
    fn related_keys(&self, subject: &RecordKey) -> GraphResult<Vec<RecordKey>> {
        let subject_node = self.subject_iri(subject)?;
        let query = format!(
            "SELECT ?name WHERE {{ {subject_node} {ITEM_REVIEWED} ?review . ?review {NAME} ?name }}"
        );
        let query_err = |message: String| GraphError::Query {
            subject: subject.to_string(),
            message,
        };

        let results = SparqlEvaluator::new()
            .parse_query(&query)
            .map_err(|e| query_err(format!("malformed SPARQL query: {e}")))?
            .on_store(&self.store)
            .execute()
            .map_err(|e| query_err(format!("SPARQL query failed: {e}")))?;

        let QueryResults::Solutions(solutions) = results else {
            return Err(query_err("unexpected result type from SELECT query".into()));
        };

        let mut keys = Vec::new();
        for solution in solutions {
            let solution = solution.map_err(|e| query_err(format!("solution error: {e}")))?;
            if let Some(Term::Literal(name)) = solution.get("name") {
                if let Some(key) = RecordKey::new(name.value()) {
                    keys.push(key);
                }
            }
        }
        Ok(super::distinct_objects(subject, keys))
    }
}

impl std::fmt::Debug for ArkgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArkgStore")
            .field("base_iri", &self.base_iri)
            .finish()
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://example.org/arkg/";

    fn key(s: &str) -> RecordKey {
        RecordKey::new(s).unwrap()
    }

    fn sorted(mut keys: Vec<RecordKey>) -> Vec<RecordKey> {
        keys.sort();
        keys
    }

    #[test]
    fn encode_segment_escapes_reserved_bytes() {
        assert_eq!(encode_segment("Blue whale"), "Blue%20whale");
        assert_eq!(encode_segment("C++"), "C%2B%2B");
        assert_eq!(encode_segment("a-b_c.d~"), "a-b_c.d~");
    }

    #[test]
    fn insert_and_query_edges() {
        let arkg = ArkgStore::in_memory(BASE).unwrap();
        arkg.insert_edge(&key("Octopus"), &key("Blue whale")).unwrap();
        arkg.insert_edge(&key("Octopus"), &key("Tardigrade")).unwrap();

        let related = arkg.related_keys(&key("Octopus")).unwrap();
        assert_eq!(sorted(related), vec![key("Blue whale"), key("Tardigrade")]);
        assert!(arkg.related_keys(&key("Tardigrade")).unwrap().is_empty());
    }

    #[test]
    fn reserved_characters_in_subject_keys_query_cleanly() {
        let arkg = ArkgStore::in_memory(BASE).unwrap();
        arkg.insert_edge(&key("C++ (language)"), &key("Haskell")).unwrap();
        arkg.insert_edge(&key("Zürich <old town>"), &key("Mars")).unwrap();

        assert_eq!(
            arkg.related_keys(&key("C++ (language)")).unwrap(),
            vec![key("Haskell")]
        );
        assert_eq!(
            arkg.related_keys(&key("Zürich <old town>")).unwrap(),
            vec![key("Mars")]
        );
        assert!(arkg.related_keys(&key("C")).unwrap().is_empty());
    }

    #[test]
    fn load_turtle_with_relative_subjects() {
        let turtle = r#"
            @prefix schema: <http://schema.org/> .
            <Octopus> schema:itemReviewed [ schema:name "Blue whale" ] , [ schema:name "Octopus" ] .
            <Blue%20whale> schema:itemReviewed [ schema:name "Octopus" ] .
        "#;
        let arkg = ArkgStore::in_memory(BASE).unwrap();
        arkg.load_from_reader(ArkgFormat::Turtle, turtle.as_bytes())
            .unwrap();

        assert_eq!(arkg.related_keys(&key("Octopus")).unwrap(), vec![key("Blue whale")]);
        assert_eq!(arkg.related_keys(&key("Blue whale")).unwrap(), vec![key("Octopus")]);
    }

    #[test]
    fn malformed_rdf_is_a_load_error() {
        let arkg = ArkgStore::in_memory(BASE).unwrap();
        let err = arkg
            .load_from_reader(ArkgFormat::Turtle, "<a> <b> .".as_bytes())
            .unwrap_err();
        assert!(matches!(err, GraphError::Load { .. }));
    }

    #[test]
    fn relative_base_iri_is_rejected() {
        assert!(matches!(
            ArkgStore::in_memory("not an iri"),
            Err(GraphError::BaseIri { .. })
        ));
    }
}
