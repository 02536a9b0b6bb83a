//! Builds the Data Definition graph out of OpenAPI schema nodes.
//!
//! The central entry point is [`TypeBuilder::create_data_definition`].
//! Composite definitions are inserted into the registry *before* their
//! children are built, so self-referential schemas find the in-progress
//! entry and terminate.

use indexmap::IndexMap;
use openapiv3::{AnySchema, OpenAPI, ReferenceOr, Schema, SchemaKind, Type};

use crate::{
    document, naming,
    types::{DataDefinition, DefinitionId, EnumValue, SchemaNames, TargetKind, TypeRegistry},
    Error,
};

pub(crate) struct TypeBuilder<'a> {
    document: &'a OpenAPI,
    registry: TypeRegistry,
}

enum NameSlot {
    /// The name is taken by a structurally equal schema; share it.
    Existing(DefinitionId),
    /// A free slot, possibly carrying a numeric suffix.
    Fresh(String),
}

struct Property {
    name: String,
    title: Option<String>,
    required: bool,
    schema: ReferenceOr<Schema>,
}

impl<'a> TypeBuilder<'a> {
    pub fn new(document: &'a OpenAPI) -> Self {
        TypeBuilder {
            document,
            registry: TypeRegistry::default(),
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn into_registry(self) -> TypeRegistry {
        self.registry
    }

    /// Returns the Data Definition for a schema node, creating it (and its
    /// children) on first sight.
    ///
    /// `required` is the declaring context's flag; it is OR-composed with the
    /// schema's own nullability before it gates non-null wrapping.
    pub fn create_data_definition(
        &mut self,
        schema_ref: &ReferenceOr<Schema>,
        names: SchemaNames,
        path: &str,
        required: bool,
    ) -> Result<DefinitionId, Error> {
        let (schema, resolved_ref) = document::resolve_schema(self.document, schema_ref)?;
        let schema = schema.clone();

        let mut names = names;
        if names.from_ref.is_none() {
            names.from_ref = resolved_ref;
        }

        let kind = self.classify(&schema)?;
        let required = required || schema.schema_data.nullable;

        let mut preferred = names
            .preferred()
            .map(naming::to_pascal_case)
            .unwrap_or_default();
        if kind == TargetKind::Union {
            preferred.push_str("Union");
        }

        if !kind.is_composite() {
            let definition = DataDefinition::new(schema, names, preferred, kind, required);
            return Ok(self.registry.insert(definition));
        }

        let name = match self.available_name(&preferred, &schema) {
            NameSlot::Existing(id) => return Ok(id),
            NameSlot::Fresh(name) => name,
        };

        let definition = DataDefinition::new(schema.clone(), names, name.clone(), kind, required);
        let id = self.registry.insert(definition);
        self.registry.register_name(name, id);

        match kind {
            TargetKind::List => {
                let item = items(&schema).ok_or(Error::ArrayWithoutItems)?;
                let item_id =
                    self.create_data_definition(&item, SchemaNames::default(), path, false)?;
                self.registry.definition_mut(id).item = Some(item_id);
            }
            TargetKind::Object => {
                for property in self.object_properties(&schema)? {
                    let child_names = SchemaNames {
                        from_ref: None,
                        from_schema: Some(
                            property
                                .title
                                .filter(|title| !title.is_empty())
                                .unwrap_or_else(|| naming::to_pascal_case(&property.name)),
                        ),
                        from_path: None,
                    };
                    let child = self.create_data_definition(
                        &property.schema,
                        child_names,
                        path,
                        property.required,
                    )?;
                    self.registry
                        .definition_mut(id)
                        .fields
                        .insert(property.name, child);
                }
            }
            TargetKind::Union => {
                let mut members = Vec::new();
                if let Some(base) = strip_one_of(&schema) {
                    if self.classify(&base)? == TargetKind::Object {
                        // The base keeps the union's own names, without the
                        // Union suffix.
                        let base_names = self.registry[id].names.clone();
                        let base_ref = ReferenceOr::Item(base);
                        members.push(
                            self.create_data_definition(&base_ref, base_names, path, false)?,
                        );
                    }
                }
                for member in one_of(&schema) {
                    members.push(self.create_data_definition(
                        member,
                        SchemaNames::default(),
                        path,
                        false,
                    )?);
                }
                self.registry.definition_mut(id).members = members;
            }
            TargetKind::Enum => {
                self.registry.definition_mut(id).enum_values = enum_values(&schema);
            }
            _ => unreachable!("only composite kinds recurse"),
        }

        Ok(id)
    }

    /// Target-kind classification of a raw schema.
    fn classify(&self, schema: &Schema) -> Result<TargetKind, Error> {
        match &schema.schema_kind {
            SchemaKind::Type(Type::String(ty)) => Ok(if ty.enumeration.iter().flatten().count() > 0 {
                TargetKind::Enum
            } else {
                TargetKind::String
            }),
            SchemaKind::Type(Type::Integer(ty)) => Ok(if ty.enumeration.iter().flatten().count() > 0 {
                TargetKind::Enum
            } else {
                TargetKind::Integer
            }),
            SchemaKind::Type(Type::Number(ty)) => Ok(if ty.enumeration.iter().flatten().count() > 0 {
                TargetKind::Enum
            } else {
                TargetKind::Float
            }),
            SchemaKind::Type(Type::Boolean(_)) => Ok(TargetKind::Boolean),
            // An object without properties has nothing to hang a GraphQL
            // object on; it passes through as JSON.
            SchemaKind::Type(Type::Object(object)) if object.properties.is_empty() => {
                Ok(TargetKind::Json)
            }
            SchemaKind::Type(Type::Object(_)) => Ok(TargetKind::Object),
            SchemaKind::Type(Type::Array(_)) => Ok(TargetKind::List),
            SchemaKind::OneOf { one_of } => self.classify_one_of(one_of, TargetKind::Unknown),
            SchemaKind::AllOf { .. } => Ok(TargetKind::Object),
            SchemaKind::Not { .. } => Ok(TargetKind::Json),
            SchemaKind::Any(any) => self.classify_any(any),
        }
    }

    // `AnySchema` is the one place the flat OpenAPI keyword soup survives
    // parsing, so `allOf` and `oneOf` can actually coexist here.
    fn classify_any(&self, any: &AnySchema) -> Result<TargetKind, Error> {
        if !any.all_of.is_empty() && !any.one_of.is_empty() {
            return Ok(TargetKind::Json);
        }
        if !any.one_of.is_empty() {
            return self.classify_one_of(&any.one_of, classify_any_base(any));
        }
        Ok(classify_any_base(any))
    }

    /// Members that disagree on kind demote the whole schema to JSON; an
    /// all-object membership over an object (or empty) base forms a union;
    /// otherwise the members' common kind stands.
    fn classify_one_of(
        &self,
        members: &[ReferenceOr<Schema>],
        base: TargetKind,
    ) -> Result<TargetKind, Error> {
        let mut member_kind = None;
        for member in members {
            let (schema, _) = document::resolve_schema(self.document, member)?;
            let kind = self.classify(schema)?;
            match member_kind {
                None => member_kind = Some(kind),
                Some(existing) if existing != kind => return Ok(TargetKind::Json),
                Some(_) => {}
            }
        }

        match member_kind {
            Some(TargetKind::Object)
                if matches!(base, TargetKind::Object | TargetKind::Unknown) =>
            {
                Ok(TargetKind::Union)
            }
            Some(kind) => Ok(kind),
            None => Ok(TargetKind::Json),
        }
    }

    /// Resolves a preferred name to an available one. A structurally equal
    /// schema already holding the name (or a suffixed variant of it) is
    /// shared; otherwise ascending numeric suffixes are tried until a free
    /// slot is found.
    fn available_name(&self, preferred: &str, schema: &Schema) -> NameSlot {
        let mut suffix: usize = 1;
        loop {
            let candidate = if suffix == 1 {
                preferred.to_string()
            } else {
                format!("{preferred}{suffix}")
            };
            match self.registry.lookup(&candidate) {
                None => return NameSlot::Fresh(candidate),
                Some(id) if self.registry[id].schema == *schema => {
                    return NameSlot::Existing(id)
                }
                Some(_) => suffix += 1,
            }
        }
    }

    /// The object's own properties merged with the properties of every
    /// `allOf` member, with each property's title and required flag resolved.
    fn object_properties(&self, schema: &Schema) -> Result<Vec<Property>, Error> {
        let mut merged = IndexMap::new();

        if let Some((properties, required)) = object_parts(schema) {
            self.collect_properties(properties, required, &mut merged)?;
        }
        for member in all_of(schema) {
            let (member_schema, _) = document::resolve_schema(self.document, member)?;
            if let Some((properties, required)) = object_parts(member_schema) {
                self.collect_properties(properties, required, &mut merged)?;
            }
        }

        Ok(merged.into_values().collect())
    }

    fn collect_properties(
        &self,
        properties: &IndexMap<String, ReferenceOr<Box<Schema>>>,
        required: &[String],
        merged: &mut IndexMap<String, Property>,
    ) -> Result<(), Error> {
        for (name, schema_or_ref) in properties {
            let schema = schema_or_ref.clone().unbox();
            let (resolved, _) = document::resolve_schema(self.document, &schema)?;
            let title = resolved.schema_data.title.clone();
            merged.insert(
                name.clone(),
                Property {
                    name: name.clone(),
                    title,
                    required: required.contains(name),
                    schema,
                },
            );
        }
        Ok(())
    }
}

fn classify_any_base(any: &AnySchema) -> TargetKind {
    if !any.enumeration.is_empty() {
        return TargetKind::Enum;
    }
    if !any.all_of.is_empty() {
        return TargetKind::Object;
    }
    match any.typ.as_deref() {
        Some("object") if any.properties.is_empty() => TargetKind::Json,
        Some("object") => TargetKind::Object,
        Some("array") => TargetKind::List,
        Some("string") => TargetKind::String,
        Some("integer") => TargetKind::Integer,
        Some("number") => TargetKind::Float,
        Some("boolean") => TargetKind::Boolean,
        _ => TargetKind::Unknown,
    }
}

fn one_of(schema: &Schema) -> &[ReferenceOr<Schema>] {
    match &schema.schema_kind {
        SchemaKind::OneOf { one_of } => one_of,
        SchemaKind::Any(any) => &any.one_of,
        _ => &[],
    }
}

fn all_of(schema: &Schema) -> &[ReferenceOr<Schema>] {
    match &schema.schema_kind {
        SchemaKind::AllOf { all_of } => all_of,
        SchemaKind::Any(any) => &any.all_of,
        _ => &[],
    }
}

fn items(schema: &Schema) -> Option<ReferenceOr<Schema>> {
    match &schema.schema_kind {
        SchemaKind::Type(Type::Array(array)) => array.items.clone().map(ReferenceOr::unbox),
        SchemaKind::Any(any) => any.items.clone().map(ReferenceOr::unbox),
        _ => None,
    }
}

fn object_parts(schema: &Schema) -> Option<(&IndexMap<String, ReferenceOr<Box<Schema>>>, &[String])> {
    match &schema.schema_kind {
        SchemaKind::Type(Type::Object(object)) => Some((&object.properties, &object.required)),
        SchemaKind::Any(any) => Some((&any.properties, &any.required)),
        _ => None,
    }
}

/// The union's base: the schema with `oneOf` stripped. Only meaningful for
/// flat schemas; a pure `oneOf` has no base.
fn strip_one_of(schema: &Schema) -> Option<Schema> {
    match &schema.schema_kind {
        SchemaKind::Any(any) => {
            let mut stripped = any.clone();
            stripped.one_of = Vec::new();
            Some(Schema {
                schema_data: schema.schema_data.clone(),
                schema_kind: SchemaKind::Any(stripped),
            })
        }
        _ => None,
    }
}

fn enum_values(schema: &Schema) -> Vec<EnumValue> {
    let literals: Vec<String> = match &schema.schema_kind {
        SchemaKind::Type(Type::String(ty)) => ty.enumeration.iter().flatten().cloned().collect(),
        SchemaKind::Type(Type::Integer(ty)) => {
            ty.enumeration.iter().flatten().map(|v| v.to_string()).collect()
        }
        SchemaKind::Type(Type::Number(ty)) => {
            ty.enumeration.iter().flatten().map(|v| v.to_string()).collect()
        }
        SchemaKind::Any(any) => any
            .enumeration
            .iter()
            .filter(|value| !value.is_null())
            .map(naming::cast_to_string)
            .collect(),
        _ => Vec::new(),
    };

    literals
        .into_iter()
        .filter(|literal| !literal.is_empty())
        .filter_map(|literal| {
            let identifier = naming::sanitize(&literal.to_uppercase());
            (!identifier.is_empty()).then_some(EnumValue { identifier, literal })
        })
        .collect()
}
