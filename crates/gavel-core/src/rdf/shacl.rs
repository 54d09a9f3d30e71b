//! The SHACL subset the shipped shapes graph uses: node shapes targeted by
//! class, property shapes on IRI paths with cardinality, datatype, value
//! class, and node-kind constraints.

use oxrdf::vocab::rdf;
use oxrdf::{
    Graph, NamedNode, NamedNodeRef, SubjectRef, Term, TermRef, TripleRef,
};
use oxttl::TurtleParser;
use serde::Serialize;
use thiserror::Error;

const SH_NODE_SHAPE: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#NodeShape");
const SH_TARGET_CLASS: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#targetClass");
const SH_PROPERTY: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#property");
const SH_PATH: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#path");
const SH_MIN_COUNT: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#minCount");
const SH_MAX_COUNT: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#maxCount");
const SH_DATATYPE: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#datatype");
const SH_CLASS: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#class");
const SH_NODE_KIND: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#nodeKind");
const SH_MESSAGE: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#message");
const SH_IRI: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#IRI");
const SH_LITERAL: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#Literal");
const SH_BLANK_NODE: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#BlankNode");

#[derive(Debug, Error)]
pub enum ShapesError {
    #[error("invalid Turtle in shapes graph: {0}")]
    Syntax(#[from] oxttl::TurtleSyntaxError),
}

/// One failed constraint check against a focus node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub focus: String,
    pub path: Option<String>,
    pub constraint: String,
    pub message: String,
}

#[derive(Debug, Clone)]
struct PropertyConstraint {
    path: NamedNode,
    min_count: Option<u64>,
    max_count: Option<u64>,
    datatype: Option<NamedNode>,
    class: Option<NamedNode>,
    node_kind: Option<NamedNode>,
    message: Option<String>,
}

#[derive(Debug, Clone)]
struct NodeShape {
    target_class: NamedNode,
    properties: Vec<PropertyConstraint>,
}

/// A parsed shapes graph, reusable across documents.
#[derive(Debug, Clone, Default)]
pub struct ShapesGraph {
    shapes: Vec<NodeShape>,
}

impl ShapesGraph {
    /// Parses Turtle shape definitions.
    pub fn parse(turtle: &[u8]) -> Result<Self, ShapesError> {
        let mut graph = Graph::new();
        for triple in TurtleParser::new().for_slice(turtle) {
            let triple = triple?;
            graph.insert(triple.as_ref());
        }
        Ok(Self::from_graph(&graph))
    }

    fn from_graph(graph: &Graph) -> Self {
        let mut shapes = Vec::new();
        for shape in graph.subjects_for_predicate_object(rdf::TYPE, SH_NODE_SHAPE) {
            let Some(target_class) = graph
                .object_for_subject_predicate(shape, SH_TARGET_CLASS)
                .and_then(named)
            else {
                tracing::warn!(shape = %shape, "node shape without sh:targetClass, skipped");
                continue;
            };
            let mut properties = Vec::new();
            for property in graph.objects_for_subject_predicate(shape, SH_PROPERTY) {
                let Some(property) = as_subject(property) else { continue };
                match read_property(graph, property) {
                    Some(constraint) => properties.push(constraint),
                    None => {
                        tracing::warn!(shape = %shape, "property shape without an IRI sh:path, skipped");
                    }
                }
            }
            shapes.push(NodeShape { target_class, properties });
        }
        Self { shapes }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Checks every targeted focus node in `data`, returning all violations.
    #[must_use]
    pub fn check(&self, data: &Graph) -> Vec<Violation> {
        let mut violations = Vec::new();
        for shape in &self.shapes {
            for focus in
                data.subjects_for_predicate_object(rdf::TYPE, shape.target_class.as_ref())
            {
                for constraint in &shape.properties {
                    constraint.check(data, focus, &mut violations);
                }
            }
        }
        violations
    }
}

fn read_property(graph: &Graph, property: SubjectRef<'_>) -> Option<PropertyConstraint> {
    let path = graph.object_for_subject_predicate(property, SH_PATH).and_then(named)?;
    Some(PropertyConstraint {
        path,
        min_count: count(graph, property, SH_MIN_COUNT),
        max_count: count(graph, property, SH_MAX_COUNT),
        datatype: graph.object_for_subject_predicate(property, SH_DATATYPE).and_then(named),
        class: graph.object_for_subject_predicate(property, SH_CLASS).and_then(named),
        node_kind: graph.object_for_subject_predicate(property, SH_NODE_KIND).and_then(named),
        message: graph
            .object_for_subject_predicate(property, SH_MESSAGE)
            .and_then(|term| match term {
                TermRef::Literal(value) => Some(value.value().to_owned()),
                _ => None,
            }),
    })
}

impl PropertyConstraint {
    fn check(&self, data: &Graph, focus: SubjectRef<'_>, violations: &mut Vec<Violation>) {
        let values: Vec<Term> = data
            .objects_for_subject_predicate(focus, self.path.as_ref())
            .map(TermRef::into_owned)
            .collect();

        if let Some(min) = self.min_count {
            if (values.len() as u64) < min {
                self.record(
                    violations,
                    focus,
                    "MinCountConstraint",
                    format!("expected at least {min} value(s), found {}", values.len()),
                );
            }
        }
        if let Some(max) = self.max_count {
            if (values.len() as u64) > max {
                self.record(
                    violations,
                    focus,
                    "MaxCountConstraint",
                    format!("expected at most {max} value(s), found {}", values.len()),
                );
            }
        }
        if let Some(datatype) = &self.datatype {
            for value in &values {
                let conforms = matches!(
                    value,
                    Term::Literal(literal) if literal.datatype() == datatype.as_ref()
                );
                if !conforms {
                    self.record(
                        violations,
                        focus,
                        "DatatypeConstraint",
                        format!("value {value} is not a literal of datatype {datatype}"),
                    );
                }
            }
        }
        if let Some(class) = &self.class {
            for value in &values {
                if !has_type(data, value, class) {
                    self.record(
                        violations,
                        focus,
                        "ClassConstraint",
                        format!("value {value} is not typed as {class}"),
                    );
                }
            }
        }
        if let Some(kind) = &self.node_kind {
            for value in &values {
                if !kind_matches(kind.as_ref(), value) {
                    self.record(
                        violations,
                        focus,
                        "NodeKindConstraint",
                        format!("value {value} is not of kind {kind}"),
                    );
                }
            }
        }
    }

    fn record(
        &self,
        violations: &mut Vec<Violation>,
        focus: SubjectRef<'_>,
        constraint: &str,
        detail: String,
    ) {
        violations.push(Violation {
            focus: focus.to_string(),
            path: Some(self.path.to_string()),
            constraint: constraint.to_owned(),
            message: self.message.clone().unwrap_or(detail),
        });
    }
}

fn named(term: TermRef<'_>) -> Option<NamedNode> {
    match term {
        TermRef::NamedNode(node) => Some(node.into_owned()),
        _ => None,
    }
}

fn as_subject(term: TermRef<'_>) -> Option<SubjectRef<'_>> {
    match term {
        TermRef::NamedNode(node) => Some(SubjectRef::NamedNode(node)),
        TermRef::BlankNode(node) => Some(SubjectRef::BlankNode(node)),
        _ => None,
    }
}

fn count(graph: &Graph, property: SubjectRef<'_>, predicate: NamedNodeRef<'_>) -> Option<u64> {
    match graph.object_for_subject_predicate(property, predicate)? {
        TermRef::Literal(value) => value.value().parse().ok(),
        _ => None,
    }
}

fn has_type(data: &Graph, value: &Term, class: &NamedNode) -> bool {
    let subject = match value {
        Term::NamedNode(node) => SubjectRef::NamedNode(node.as_ref()),
        Term::BlankNode(node) => SubjectRef::BlankNode(node.as_ref()),
        _ => return false,
    };
    data.contains(TripleRef::new(subject, rdf::TYPE, class.as_ref()))
}

fn kind_matches(kind: NamedNodeRef<'_>, value: &Term) -> bool {
    if kind == SH_IRI {
        matches!(value, Term::NamedNode(_))
    } else if kind == SH_LITERAL {
        matches!(value, Term::Literal(_))
    } else if kind == SH_BLANK_NODE {
        matches!(value, Term::BlankNode(_))
    } else {
        true
    }
}
