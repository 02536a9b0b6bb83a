//! The Data Definition model: the internal twin of every OpenAPI schema node
//! that will appear in the GraphQL schema, and the per-translation registry
//! holding them.

use indexmap::IndexMap;
use openapiv3::Schema;

/// Handle to a [`DataDefinition`] inside its [`TypeRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefinitionId(pub(crate) usize);

/// The candidate names a schema node brings along, in falling priority:
/// the `$ref` component name, the schema's own title, a name inferred from
/// the operation's path.
#[derive(Clone, Debug, Default)]
pub struct SchemaNames {
    pub from_ref: Option<String>,
    pub from_schema: Option<String>,
    pub from_path: Option<String>,
}

impl SchemaNames {
    pub fn preferred(&self) -> Option<&str> {
        [&self.from_ref, &self.from_schema, &self.from_path]
            .into_iter()
            .find_map(|name| name.as_deref().filter(|name| !name.is_empty()))
    }
}

/// What a schema node becomes on the GraphQL side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    Object,
    List,
    Union,
    Enum,
    String,
    Integer,
    Float,
    Boolean,
    /// A schema that cannot be statically typed; both forms degrade to the
    /// JSON scalar.
    Json,
    /// A schema carrying no type information at all.
    Unknown,
}

impl TargetKind {
    /// Composite kinds are inserted into the registry before their children
    /// are built, so self-referential schemas terminate.
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            TargetKind::Object | TargetKind::List | TargetKind::Union | TargetKind::Enum
        )
    }
}

#[derive(Clone, Debug)]
pub struct EnumValue {
    /// The GraphQL identifier, upper-cased and sanitised.
    pub identifier: String,
    /// The literal as the upstream service speaks it.
    pub literal: String,
}

/// One OpenAPI schema node as it will appear in GraphQL: its source schema,
/// chosen names, target kind and children. Backed by one output type and one
/// input type once materialised.
#[derive(Debug)]
pub struct DataDefinition {
    /// The resolved source schema; structural equality on it drives
    /// registry sharing.
    pub schema: Schema,
    pub names: SchemaNames,
    pub type_name: String,
    pub input_type_name: String,
    pub kind: TargetKind,
    /// Whether the final types get a non-null wrapper. Composed from the
    /// declaring context's required flag and the schema's own nullability.
    pub required: bool,
    /// Object children, keyed by the verbatim property name.
    pub fields: IndexMap<String, DefinitionId>,
    /// List item.
    pub item: Option<DefinitionId>,
    /// Union members, in declaration order.
    pub members: Vec<DefinitionId>,
    pub enum_values: Vec<EnumValue>,
}

impl DataDefinition {
    pub(crate) fn new(
        schema: Schema,
        names: SchemaNames,
        type_name: String,
        kind: TargetKind,
        required: bool,
    ) -> Self {
        let input_type_name = format!("{type_name}Input");
        DataDefinition {
            schema,
            names,
            type_name,
            input_type_name,
            kind,
            required,
            fields: IndexMap::new(),
            item: None,
            members: Vec::new(),
            enum_values: Vec::new(),
        }
    }
}

/// All Data Definitions produced by one translation run, plus the
/// preferred-name index used for sharing and disambiguation. Owned
/// exclusively while the translation builds; immutable and shared once the
/// schema is assembled.
#[derive(Default)]
pub struct TypeRegistry {
    definitions: Vec<DataDefinition>,
    by_name: IndexMap<String, DefinitionId>,
}

impl TypeRegistry {
    pub(crate) fn insert(&mut self, definition: DataDefinition) -> DefinitionId {
        let id = DefinitionId(self.definitions.len());
        self.definitions.push(definition);
        id
    }

    pub(crate) fn register_name(&mut self, name: String, id: DefinitionId) {
        self.by_name.insert(name, id);
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<DefinitionId> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn definition_mut(&mut self, id: DefinitionId) -> &mut DataDefinition {
        &mut self.definitions[id.0]
    }

    /// Definitions that claimed a name, in registration order.
    pub(crate) fn named_definitions(&self) -> impl Iterator<Item = (&str, DefinitionId)> {
        self.by_name.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

impl std::ops::Index<DefinitionId> for TypeRegistry {
    type Output = DataDefinition;

    fn index(&self, id: DefinitionId) -> &DataDefinition {
        &self.definitions[id.0]
    }
}
