use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{Dataset, GraphName, Literal, NamedNode, Quad, QuadRef};
use oxttl::TriGSerializer;
use serde_json::Value;
use thiserror::Error;

use crate::rdf::jsonld::{self, JsonLdContext, JsonLdError};
use crate::rdf::vocab::{
    CLASS_HIERARCHY, DOCUMENT_NS, INSTANCE_NS, RDFS_NS, SCHEMA_ABOUT, SCHEMA_NAME, SCHEMA_NS,
    SCHEMA_TEXT_OBJECT, SCHEMA_URL,
};

#[derive(Debug, Error)]
pub enum CollateError {
    #[error("document graph {path} has no usable document linkage: {reason}")]
    MissingDocumentLinkage { path: PathBuf, reason: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("document graph {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("document graph {path} cannot be expanded: {source}")]
    Expansion {
        path: PathBuf,
        #[source]
        source: JsonLdError,
    },

    #[error("invalid graph name: {0}")]
    Iri(#[from] oxrdf::IriParseError),

    #[error("failed to write dataset: {0}")]
    Write(#[from] io::Error),
}

pub type CollateResult<T> = std::result::Result<T, CollateError>;

/// A document graph left out of the dataset, with the reason.
#[derive(Debug)]
pub struct SkippedGraph {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug)]
pub struct CollateStats {
    pub documents: usize,
    pub quads: usize,
    pub seed_triples: usize,
    pub skipped: Vec<SkippedGraph>,
    pub duration_ms: u64,
}

/// Quads seeding the schema.org class hierarchy into the default graph.
#[must_use]
pub fn seed_class_hierarchy() -> Vec<Quad> {
    CLASS_HIERARCHY
        .iter()
        .map(|(class, parent)| {
            Quad::new(
                NamedNode::new_unchecked(format!("{SCHEMA_NS}{class}")),
                rdfs::SUB_CLASS_OF,
                NamedNode::new_unchecked(format!("{SCHEMA_NS}{parent}")),
                GraphName::DefaultGraph,
            )
        })
        .collect()
}

/// Expands one normalized document graph into quads under its own named
/// graph, adding the four text-object triples that describe the source
/// document itself.
///
/// Fails with [`CollateError::MissingDocumentLinkage`] when the graph
/// carries no `subjectOf.@id` document URL or no resolvable root `@id`.
pub fn document_quads(path: &Path) -> CollateResult<Vec<Quad>> {
    let text = fs::read_to_string(path)
        .map_err(|source| CollateError::Read { path: path.to_path_buf(), source })?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|source| CollateError::Json { path: path.to_path_buf(), source })?;
    let root = jsonld::root_entity(&value)
        .map_err(|source| CollateError::Expansion { path: path.to_path_buf(), source })?;
    let context = JsonLdContext::from_entity(root)
        .map_err(|source| CollateError::Expansion { path: path.to_path_buf(), source })?;

    let url = root
        .get("subjectOf")
        .and_then(Value::as_object)
        .and_then(|subject_of| subject_of.get("@id"))
        .and_then(Value::as_str)
        .ok_or_else(|| linkage_error(path, "no subjectOf reference with an @id"))?;
    let document = NamedNode::new(url)
        .map_err(|_| linkage_error(path, format!("document URL {url:?} is not a valid IRI")))?;
    let about = root
        .get("@id")
        .and_then(Value::as_str)
        .and_then(|id| context.resolve_id(id))
        .ok_or_else(|| linkage_error(path, "root entity has no resolvable @id"))?;

    let stem = document_stem(path)
        .ok_or_else(|| linkage_error(path, "file name is not valid UTF-8"))?;
    let graph = NamedNode::new(format!("{DOCUMENT_NS}{}", stem.replace(' ', "%20")))?;

    let triples = jsonld::expand_entity(&value, stem)
        .map_err(|source| CollateError::Expansion { path: path.to_path_buf(), source })?;
    let mut quads: Vec<Quad> = triples
        .into_iter()
        .map(|triple| Quad::new(triple.subject, triple.predicate, triple.object, graph.clone()))
        .collect();

    quads.push(Quad::new(document.clone(), rdf::TYPE, SCHEMA_TEXT_OBJECT, graph.clone()));
    quads.push(Quad::new(document.clone(), SCHEMA_URL, document.clone(), graph.clone()));
    quads.push(Quad::new(document.clone(), SCHEMA_ABOUT, about, graph.clone()));
    quads.push(Quad::new(document, SCHEMA_NAME, Literal::from(readable_name(url)), graph));
    Ok(quads)
}

/// Builds the collated dataset in memory: the class-hierarchy seed in the
/// default graph plus one named sub-graph per normalized graph file under
/// `graphs_dir`.
///
/// A document that cannot be linked is skipped whole and reported in the
/// stats; the rest of the batch still lands.
pub fn collate_directory(graphs_dir: &Path) -> CollateResult<(Dataset, CollateStats)> {
    let started = Instant::now();
    let mut dataset = Dataset::new();
    for quad in seed_class_hierarchy() {
        dataset.insert(&quad);
    }
    let seed_triples = dataset.len();

    let mut documents = 0;
    let mut skipped = Vec::new();
    for path in graph_files(graphs_dir)? {
        match document_quads(&path) {
            Ok(quads) => {
                for quad in &quads {
                    dataset.insert(quad);
                }
                documents += 1;
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping document graph");
                skipped.push(SkippedGraph { path, reason: error.to_string() });
            }
        }
    }

    let stats = CollateStats {
        documents,
        quads: dataset.len(),
        seed_triples,
        skipped,
        duration_ms: elapsed_ms(started),
    };
    Ok((dataset, stats))
}

/// Collates every normalized graph under `graphs_dir` into one TriG dataset
/// at `dataset_path`.
///
/// Output quads are sorted before serialization, so the same inputs produce
/// the same bytes.
pub fn collate_to_file(graphs_dir: &Path, dataset_path: &Path) -> CollateResult<CollateStats> {
    let started = Instant::now();
    let (dataset, mut stats) = collate_directory(graphs_dir)?;
    write_dataset(&dataset, dataset_path)?;
    stats.duration_ms = elapsed_ms(started);
    tracing::info!(
        documents = stats.documents,
        quads = stats.quads,
        skipped = stats.skipped.len(),
        dataset = %dataset_path.display(),
        "collated dataset"
    );
    Ok(stats)
}

fn graph_files(graphs_dir: &Path) -> CollateResult<Vec<PathBuf>> {
    if !graphs_dir.exists() {
        tracing::warn!(path = %graphs_dir.display(), "graphs directory does not exist");
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(graphs_dir)
        .map_err(|source| CollateError::Read { path: graphs_dir.to_path_buf(), source })?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|source| CollateError::Read { path: graphs_dir.to_path_buf(), source })?;
        let path = entry.path();
        if path.extension().is_some_and(|extension| extension == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn write_dataset(dataset: &Dataset, path: &Path) -> CollateResult<()> {
    let mut quads: Vec<Quad> = dataset.iter().map(QuadRef::into_owned).collect();
    quads.sort_by_cached_key(|quad| (quad.graph_name.to_string(), quad.to_string()));

    let mut serializer = TriGSerializer::new()
        .with_prefix("schema", SCHEMA_NS)?
        .with_prefix("mun", INSTANCE_NS)?
        .with_prefix("docs", DOCUMENT_NS)?
        .with_prefix("rdfs", RDFS_NS)?
        .for_writer(Vec::new());
    for quad in &quads {
        serializer.serialize_quad(quad.as_ref())?;
    }
    let bytes = serializer.finish()?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let staging = path.with_extension("trig.tmp");
    fs::write(&staging, &bytes)?;
    fs::rename(&staging, path)?;
    Ok(())
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn document_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(OsStr::to_str)
}

/// Human-readable document name: base URL prefix stripped, `%20` decoded,
/// trailing four-character extension dropped. A name shorter than the
/// extension collapses to the empty string.
fn readable_name(url: &str) -> String {
    let decoded = url.replace("%20", " ");
    let name = decoded.strip_prefix(DOCUMENT_NS).unwrap_or(&decoded);
    match name.char_indices().nth_back(3) {
        Some((cut, _)) => name[..cut].to_owned(),
        None => String::new(),
    }
}

fn linkage_error(path: &Path, reason: impl Into<String>) -> CollateError {
    CollateError::MissingDocumentLinkage { path: path.to_path_buf(), reason: reason.into() }
}

#[cfg(test)]
mod tests {
    use oxttl::TriGParser;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn write_graph(dir: &Path, name: &str, value: &Value) {
        fs::write(dir.join(name), serde_json::to_string_pretty(value).unwrap()).unwrap();
    }

    fn m1_graph() -> Value {
        json!([{
            "@context": {"@vocab": SCHEMA_NS, "mun": INSTANCE_NS},
            "@id": "mun:board-meeting-m1",
            "@type": "Event",
            "name": "Board meeting",
            "subjectOf": {"@id": "https://townofbrunswick.org/files/M1.pdf"}
        }])
    }

    fn parse(path: &Path) -> Vec<Quad> {
        let bytes = fs::read(path).unwrap();
        TriGParser::new().for_slice(&bytes).map(Result::unwrap).collect()
    }

    fn named(iri: &str) -> NamedNode {
        NamedNode::new_unchecked(iri)
    }

    #[test]
    fn seeds_the_class_hierarchy_even_without_documents() {
        let dir = TempDir::new().unwrap();
        let dataset_path = dir.path().join("minutes.trig");

        let stats = collate_to_file(&dir.path().join("absent"), &dataset_path).unwrap();
        assert_eq!(stats.documents, 0);
        assert_eq!(stats.seed_triples, CLASS_HIERARCHY.len());
        assert_eq!(stats.quads, CLASS_HIERARCHY.len());

        let quads = parse(&dataset_path);
        assert_eq!(quads.len(), CLASS_HIERARCHY.len());
        assert!(quads.iter().all(|quad| quad.graph_name == GraphName::DefaultGraph));
        assert!(quads.contains(&Quad::new(
            named("http://schema.org/TextObject"),
            rdfs::SUB_CLASS_OF,
            named("http://schema.org/MediaObject"),
            GraphName::DefaultGraph,
        )));
    }

    #[test]
    fn each_document_gets_its_own_named_graph_with_text_object_triples() {
        let dir = TempDir::new().unwrap();
        write_graph(dir.path(), "M1.json", &m1_graph());
        let dataset_path = dir.path().join("minutes.trig");

        let stats = collate_to_file(dir.path(), &dataset_path).unwrap();
        assert_eq!(stats.documents, 1);
        assert!(stats.skipped.is_empty());

        let quads = parse(&dataset_path);
        let graph = GraphName::NamedNode(named("https://townofbrunswick.org/files/M1"));
        let document = named("https://townofbrunswick.org/files/M1.pdf");
        let entity = named("http://purl.org/gavel/us/ny/brunswick/board-meeting-m1");

        let in_graph: Vec<&Quad> =
            quads.iter().filter(|quad| quad.graph_name == graph).collect();
        assert_eq!(in_graph.len(), 7);

        let expect = |quad: Quad| assert!(quads.contains(&quad), "missing {quad}");
        expect(Quad::new(document.clone(), rdf::TYPE, SCHEMA_TEXT_OBJECT, graph.clone()));
        expect(Quad::new(document.clone(), SCHEMA_URL, document.clone(), graph.clone()));
        expect(Quad::new(document.clone(), SCHEMA_ABOUT, entity.clone(), graph.clone()));
        expect(Quad::new(document, SCHEMA_NAME, Literal::from("M1"), graph.clone()));
        expect(Quad::new(entity.clone(), rdf::TYPE, named("http://schema.org/Event"), graph.clone()));
        expect(Quad::new(entity, SCHEMA_NAME, Literal::from("Board meeting"), graph));
    }

    #[test]
    fn unlinkable_documents_are_skipped_without_aborting_the_batch() {
        let dir = TempDir::new().unwrap();
        write_graph(dir.path(), "M1.json", &m1_graph());
        write_graph(
            dir.path(),
            "broken.json",
            &json!([{
                "@context": {"@vocab": SCHEMA_NS},
                "@id": "mun:unlinked",
                "@type": "Event",
                "name": "No linkage"
            }]),
        );
        let dataset_path = dir.path().join("minutes.trig");

        let stats = collate_to_file(dir.path(), &dataset_path).unwrap();
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.skipped.len(), 1);
        assert!(stats.skipped[0].reason.contains("subjectOf"));

        let quads = parse(&dataset_path);
        let broken = GraphName::NamedNode(named("https://townofbrunswick.org/files/broken"));
        assert!(quads.iter().all(|quad| quad.graph_name != broken));
        assert!(quads
            .iter()
            .any(|quad| quad.graph_name
                == GraphName::NamedNode(named("https://townofbrunswick.org/files/M1"))));
    }

    #[test]
    fn in_memory_collation_exposes_the_dataset_before_serialization() {
        let dir = TempDir::new().unwrap();
        write_graph(dir.path(), "M1.json", &m1_graph());

        let (dataset, stats) = collate_directory(dir.path()).unwrap();
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.seed_triples, CLASS_HIERARCHY.len());
        assert_eq!(dataset.len(), CLASS_HIERARCHY.len() + 7);
    }

    #[test]
    fn collating_the_same_inputs_twice_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        write_graph(dir.path(), "M1.json", &m1_graph());
        let first = dir.path().join("first.trig");
        let second = dir.path().join("second.trig");

        collate_to_file(dir.path(), &first).unwrap();
        collate_to_file(dir.path(), &second).unwrap();
        assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    }

    #[test]
    fn names_shorter_than_the_extension_collapse_to_empty() {
        assert_eq!(readable_name("https://townofbrunswick.org/files/M1"), "");
        assert_eq!(readable_name("https://townofbrunswick.org/files/a.md"), "");
        assert_eq!(readable_name("https://townofbrunswick.org/files/M1.pdf"), "M1");
    }

    #[test]
    fn readable_names_keep_spaces_and_drop_the_extension() {
        let dir = TempDir::new().unwrap();
        write_graph(
            dir.path(),
            "Minutes Jan 2024.json",
            &json!([{
                "@context": {"@vocab": SCHEMA_NS, "mun": INSTANCE_NS},
                "@id": "mun:board-meeting-jan",
                "@type": "Event",
                "name": "January meeting",
                "subjectOf": {"@id": "https://townofbrunswick.org/files/Minutes%20Jan%202024.pdf"}
            }]),
        );
        let dataset_path = dir.path().join("minutes.trig");

        collate_to_file(dir.path(), &dataset_path).unwrap();
        let quads = parse(&dataset_path);
        let graph =
            GraphName::NamedNode(named("https://townofbrunswick.org/files/Minutes%20Jan%202024"));
        let document = named("https://townofbrunswick.org/files/Minutes%20Jan%202024.pdf");

        assert!(quads.contains(&Quad::new(
            document.clone(),
            SCHEMA_NAME,
            Literal::from("Minutes Jan 2024"),
            graph.clone(),
        )));
        assert!(quads.contains(&Quad::new(document.clone(), SCHEMA_URL, document, graph)));
    }
}
