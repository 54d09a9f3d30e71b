pub mod jsonld;
pub mod shacl;
pub mod vocab;

pub use jsonld::{expand_entity, root_entity, JsonLdContext, JsonLdError, JsonLdResult};
pub use shacl::{ShapesError, ShapesGraph, Violation};
