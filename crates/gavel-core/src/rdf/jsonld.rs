//! JSON-LD handling scoped to the canonical graph files this pipeline
//! writes: a single root entity carrying an `@vocab`-plus-prefixes context.
//! Covers `@id`, `@type`, `@value` literals, nested entities, and arrays.

use std::collections::BTreeMap;

use oxrdf::vocab::rdf;
use oxrdf::{BlankNode, Literal, NamedNode, Subject, Term, Triple};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonLdError {
    #[error("expected a JSON object or a one-element array of objects")]
    NotAnEntity,

    #[error("@context must be a JSON object")]
    InvalidContext,
}

pub type JsonLdResult<T> = std::result::Result<T, JsonLdError>;

/// Prefix and vocabulary mappings drawn from a document's `@context`.
#[derive(Debug, Clone, Default)]
pub struct JsonLdContext {
    vocab: Option<String>,
    prefixes: BTreeMap<String, String>,
}

impl JsonLdContext {
    /// Reads the `@context` member of an entity object, if any.
    pub fn from_entity(entity: &Map<String, Value>) -> JsonLdResult<Self> {
        match entity.get("@context") {
            None => Ok(Self::default()),
            Some(Value::Object(members)) => {
                let mut context = Self::default();
                for (key, value) in members {
                    let Value::String(iri) = value else { continue };
                    if key == "@vocab" {
                        context.vocab = Some(iri.clone());
                    } else if !key.starts_with('@') {
                        context.prefixes.insert(key.clone(), iri.clone());
                    }
                }
                Ok(context)
            }
            Some(_) => Err(JsonLdError::InvalidContext),
        }
    }

    /// Resolves an `@id` value: `prefix:suffix` expands through the prefix
    /// table, anything else must already be a valid absolute IRI.
    #[must_use]
    pub fn resolve_id(&self, value: &str) -> Option<NamedNode> {
        if let Some((prefix, suffix)) = value.split_once(':') {
            if let Some(base) = self.prefixes.get(prefix) {
                return NamedNode::new(format!("{base}{suffix}")).ok();
            }
        }
        NamedNode::new(value).ok()
    }

    /// Resolves a property key or type name: prefixed names first, then the
    /// `@vocab` default for bare names.
    fn resolve_name(&self, name: &str) -> Option<NamedNode> {
        if let Some((prefix, suffix)) = name.split_once(':') {
            if let Some(base) = self.prefixes.get(prefix) {
                return NamedNode::new(format!("{base}{suffix}")).ok();
            }
            return NamedNode::new(name).ok();
        }
        let vocab = self.vocab.as_deref()?;
        NamedNode::new(format!("{vocab}{name}")).ok()
    }
}

/// Returns the single root entity object of a graph file (a bare object or
/// a one-element array).
pub fn root_entity(value: &Value) -> JsonLdResult<&Map<String, Value>> {
    match value {
        Value::Object(entity) => Ok(entity),
        Value::Array(items) if items.len() == 1 => match &items[0] {
            Value::Object(entity) => Ok(entity),
            _ => Err(JsonLdError::NotAnEntity),
        },
        _ => Err(JsonLdError::NotAnEntity),
    }
}

/// Expands one graph file's JSON tree into triples.
///
/// `label_seed` keys blank-node labels so expanding the same file twice
/// yields identical terms.
pub fn expand_entity(value: &Value, label_seed: &str) -> JsonLdResult<Vec<Triple>> {
    let entity = root_entity(value)?;
    let mut expansion = Expansion {
        context: JsonLdContext::from_entity(entity)?,
        labeler: BlankNodeLabeler::new(label_seed),
        triples: Vec::new(),
    };
    expansion.walk_entity(entity);
    Ok(expansion.triples)
}

struct BlankNodeLabeler {
    seed: String,
    counter: usize,
}

impl BlankNodeLabeler {
    fn new(seed: &str) -> Self {
        let mut seed: String = seed.chars().filter(char::is_ascii_alphanumeric).collect();
        if seed.is_empty() {
            seed.push('g');
        }
        Self { seed, counter: 0 }
    }

    fn next(&mut self) -> BlankNode {
        self.counter += 1;
        BlankNode::new_unchecked(format!("{}b{}", self.seed, self.counter))
    }
}

struct Expansion {
    context: JsonLdContext,
    labeler: BlankNodeLabeler,
    triples: Vec<Triple>,
}

impl Expansion {
    fn subject_for(&mut self, entity: &Map<String, Value>) -> Subject {
        match entity.get("@id").and_then(Value::as_str) {
            Some(id) => self.context.resolve_id(id).map_or_else(
                || {
                    tracing::warn!(id, "entity id is not a resolvable IRI, using a blank node");
                    Subject::from(self.labeler.next())
                },
                Subject::from,
            ),
            None => Subject::from(self.labeler.next()),
        }
    }

    fn walk_entity(&mut self, entity: &Map<String, Value>) -> Subject {
        let subject = self.subject_for(entity);
        for (key, value) in entity {
            if key == "@type" {
                self.emit_types(&subject, value);
            } else if key.starts_with('@') {
                continue;
            } else if let Some(predicate) = self.context.resolve_name(key) {
                self.emit_values(&subject, &predicate, value);
            } else {
                tracing::debug!(key, "property does not resolve against the context, skipped");
            }
        }
        subject
    }

    fn emit_types(&mut self, subject: &Subject, value: &Value) {
        let names: Vec<&str> = match value {
            Value::String(name) => vec![name.as_str()],
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        for name in names {
            if let Some(class) = self.context.resolve_name(name) {
                self.triples.push(Triple::new(subject.clone(), rdf::TYPE, class));
            }
        }
    }

    fn emit_values(&mut self, subject: &Subject, predicate: &NamedNode, value: &Value) {
        match value {
            Value::Null => {}
            Value::Bool(flag) => self.push(subject, predicate, Literal::from(*flag)),
            Value::Number(number) => self.push(subject, predicate, number_literal(number)),
            Value::String(text) => self.push(subject, predicate, Literal::from(text.as_str())),
            Value::Array(items) => {
                for item in items {
                    self.emit_values(subject, predicate, item);
                }
            }
            Value::Object(entity) => self.emit_entity_value(subject, predicate, entity),
        }
    }

    fn emit_entity_value(
        &mut self,
        subject: &Subject,
        predicate: &NamedNode,
        entity: &Map<String, Value>,
    ) {
        // {"@id": ...} alone is a reference, not a nested entity
        if entity.len() == 1 {
            if let Some(id) = entity.get("@id").and_then(Value::as_str) {
                match self.context.resolve_id(id) {
                    Some(node) => self.push(subject, predicate, node),
                    None => tracing::warn!(id, "reference is not a resolvable IRI, dropped"),
                }
                return;
            }
        }
        if let Some(literal) = self.value_literal(entity) {
            self.push(subject, predicate, literal);
            return;
        }
        let child = self.walk_entity(entity);
        self.triples.push(Triple::new(subject.clone(), predicate.clone(), child));
    }

    /// `{"@value": ..., "@type": ...}` literal objects.
    fn value_literal(&self, entity: &Map<String, Value>) -> Option<Literal> {
        let value = entity.get("@value")?;
        let datatype = entity
            .get("@type")
            .and_then(Value::as_str)
            .and_then(|name| self.context.resolve_name(name));
        match (value, datatype) {
            (Value::String(text), Some(datatype)) => {
                Some(Literal::new_typed_literal(text.as_str(), datatype))
            }
            (Value::String(text), None) => Some(Literal::from(text.as_str())),
            (Value::Bool(flag), _) => Some(Literal::from(*flag)),
            (Value::Number(number), _) => Some(number_literal(number)),
            _ => None,
        }
    }

    fn push(&mut self, subject: &Subject, predicate: &NamedNode, object: impl Into<Term>) {
        self.triples.push(Triple::new(subject.clone(), predicate.clone(), object));
    }
}

fn number_literal(number: &serde_json::Number) -> Literal {
    number.as_i64().map_or_else(
        || Literal::from(number.as_f64().unwrap_or_default()),
        Literal::from,
    )
}
