use oxrdf::NamedNodeRef;

/// Default vocabulary for extracted entities.
pub const SCHEMA_NS: &str = "http://schema.org/";

/// Namespace for entity identifiers minted during extraction (the `mun:`
/// prefix in persisted graphs).
pub const INSTANCE_NS: &str = "http://purl.org/gavel/us/ny/brunswick/";

/// Base IRI of published source documents. Document URLs and named
/// sub-graphs are minted under this base.
pub const DOCUMENT_NS: &str = "https://townofbrunswick.org/files/";

pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";

pub const SCHEMA_TEXT_OBJECT: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://schema.org/TextObject");
pub const SCHEMA_URL: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://schema.org/url");
pub const SCHEMA_ABOUT: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://schema.org/about");
pub const SCHEMA_NAME: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://schema.org/name");

/// schema.org ancestry for the classes the extraction prompt asks for,
/// seeded into the default graph of every collated dataset so subclass
/// queries work without fetching the ontology.
pub const CLASS_HIERARCHY: &[(&str, &str)] = &[
    ("CreativeWork", "Thing"),
    ("Event", "Thing"),
    ("GovernmentOrganization", "Organization"),
    ("Intangible", "Thing"),
    ("Legislation", "CreativeWork"),
    ("MediaObject", "CreativeWork"),
    ("MonetaryAmount", "StructuredValue"),
    ("Organization", "Thing"),
    ("Person", "Thing"),
    ("Place", "Thing"),
    ("Report", "CreativeWork"),
    ("StructuredValue", "Intangible"),
    ("TextObject", "MediaObject"),
];
