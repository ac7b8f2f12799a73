//! Representation mapper: REST artifact union <-> store artifact node

use super::schema::KindSchema;
use super::{id, name, MappingError};
use crate::model::{
    Artifact, ArtifactKindTag, ArtifactState, CustomProperties, DocArtifact, MetadataValue,
    ModelArtifact,
};
use crate::store::{Properties, PropertyType, StoreArtifact, StoreContext, StoreState, StoreValue};

/// A store type the registry has registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub id: i64,
    pub name: String,
}

/// Ids and names of every store type the registry uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredTypes {
    pub model_artifact: TypeRef,
    pub doc_artifact: TypeRef,
    pub model_version: TypeRef,
}

impl RegisteredTypes {
    pub fn artifact(&self, kind: ArtifactKindTag) -> &TypeRef {
        match kind {
            ArtifactKindTag::Model => &self.model_artifact,
            ArtifactKindTag::Doc => &self.doc_artifact,
        }
    }

    /// Resolve the artifact kind of a node, by type id when present
    pub fn kind_of(&self, node: &StoreArtifact) -> Option<ArtifactKindTag> {
        [ArtifactKindTag::Model, ArtifactKindTag::Doc]
            .into_iter()
            .find(|&kind| {
                let ty = self.artifact(kind);
                match (node.type_id, node.type_name.as_deref()) {
                    (Some(type_id), _) => type_id == ty.id,
                    (None, Some(type_name)) => type_name == ty.name,
                    (None, None) => false,
                }
            })
    }

    pub fn is_model_version(&self, context: &StoreContext) -> bool {
        match (context.type_id, context.type_name.as_deref()) {
            (Some(type_id), _) => type_id == self.model_version.id,
            (None, Some(type_name)) => type_name == self.model_version.name,
            (None, None) => false,
        }
    }
}

/// Fields shared by every artifact kind
#[derive(Debug, Clone, Default)]
pub struct CommonFields {
    pub id: Option<String>,
    pub name: Option<String>,
    pub external_id: Option<String>,
    pub uri: Option<String>,
    pub state: Option<ArtifactState>,
    pub custom_properties: Option<CustomProperties>,
    pub create_time_since_epoch: Option<String>,
    pub last_update_time_since_epoch: Option<String>,
}

/// Kinds the mapper can translate
pub trait Mappable: KindSchema {
    fn common(&self) -> CommonFields;

    fn from_common(common: CommonFields) -> Self;
}

impl Mappable for ModelArtifact {
    fn common(&self) -> CommonFields {
        CommonFields {
            id: self.id.clone(),
            name: self.name.clone(),
            external_id: self.external_id.clone(),
            uri: self.uri.clone(),
            state: self.state,
            custom_properties: self.custom_properties.clone(),
            create_time_since_epoch: self.create_time_since_epoch.clone(),
            last_update_time_since_epoch: self.last_update_time_since_epoch.clone(),
        }
    }

    fn from_common(c: CommonFields) -> Self {
        Self {
            id: c.id,
            name: c.name,
            external_id: c.external_id,
            uri: c.uri,
            state: c.state,
            custom_properties: c.custom_properties,
            create_time_since_epoch: c.create_time_since_epoch,
            last_update_time_since_epoch: c.last_update_time_since_epoch,
            ..Default::default()
        }
    }
}

impl Mappable for DocArtifact {
    fn common(&self) -> CommonFields {
        CommonFields {
            id: self.id.clone(),
            name: self.name.clone(),
            external_id: self.external_id.clone(),
            uri: self.uri.clone(),
            state: self.state,
            custom_properties: self.custom_properties.clone(),
            create_time_since_epoch: self.create_time_since_epoch.clone(),
            last_update_time_since_epoch: self.last_update_time_since_epoch.clone(),
        }
    }

    fn from_common(c: CommonFields) -> Self {
        Self {
            id: c.id,
            name: c.name,
            external_id: c.external_id,
            uri: c.uri,
            state: c.state,
            custom_properties: c.custom_properties,
            create_time_since_epoch: c.create_time_since_epoch,
            last_update_time_since_epoch: c.last_update_time_since_epoch,
            ..Default::default()
        }
    }
}

/// Translates artifacts between the REST union and store nodes
#[derive(Debug, Clone)]
pub struct ArtifactMapper {
    types: RegisteredTypes,
}

impl ArtifactMapper {
    pub fn new(types: RegisteredTypes) -> Self {
        Self { types }
    }

    pub fn types(&self) -> &RegisteredTypes {
        &self.types
    }

    /// Build the store node for an artifact owned by `owner` (a model version id)
    pub fn map_from_artifact(
        &self,
        artifact: &Artifact,
        owner: Option<i64>,
    ) -> Result<StoreArtifact, MappingError> {
        match artifact {
            Artifact::Model(a) => self.map_from_kind(a, owner),
            Artifact::Doc(a) => self.map_from_kind(a, owner),
        }
    }

    pub fn map_from_kind<K: Mappable>(
        &self,
        record: &K,
        owner: Option<i64>,
    ) -> Result<StoreArtifact, MappingError> {
        let common = record.common();
        let ty = self.types.artifact(K::KIND);

        let display_name = common.name.as_deref().ok_or(MappingError::MissingField("name"))?;
        let stored_name = match owner {
            Some(owner) => name::qualify(owner, display_name),
            None => display_name.to_string(),
        };

        let mut properties = Properties::new();
        for prop in K::properties() {
            if let Some(value) = (prop.get)(record) {
                properties.insert(prop.key.to_string(), StoreValue::StringValue(value));
            }
        }

        let mut custom_properties = Properties::new();
        for (key, value) in common.custom_properties.iter().flatten() {
            custom_properties.insert(key.clone(), metadata_to_store(key, value)?);
        }

        Ok(StoreArtifact {
            id: id::decode_opt(common.id.as_deref())?,
            type_id: Some(ty.id),
            type_name: Some(ty.name.clone()),
            name: Some(stored_name),
            uri: common.uri,
            external_id: common.external_id,
            state: common.state.map(state_to_store),
            properties,
            custom_properties,
            create_time_since_epoch: parse_epoch(
                "createTimeSinceEpoch",
                common.create_time_since_epoch.as_deref(),
            )?,
            last_update_time_since_epoch: parse_epoch(
                "lastUpdateTimeSinceEpoch",
                common.last_update_time_since_epoch.as_deref(),
            )?,
        })
    }

    /// Translate a store node into whichever artifact kind its type names
    pub fn map_to_artifact(&self, node: &StoreArtifact) -> Result<Artifact, MappingError> {
        match self.kind_of(node)? {
            ArtifactKindTag::Model => self.map_to_kind::<ModelArtifact>(node).map(Artifact::Model),
            ArtifactKindTag::Doc => self.map_to_kind::<DocArtifact>(node).map(Artifact::Doc),
        }
    }

    /// Translate a store node that must be of kind `K`
    pub fn map_to_kind<K: Mappable>(&self, node: &StoreArtifact) -> Result<K, MappingError> {
        let found = self.kind_of(node)?;
        if found != K::KIND {
            return Err(MappingError::KindMismatch {
                expected: K::KIND,
                found,
            });
        }

        let custom_properties = if node.custom_properties.is_empty() {
            None
        } else {
            Some(
                node.custom_properties
                    .iter()
                    .map(|(k, v)| (k.clone(), store_to_metadata(v)))
                    .collect(),
            )
        };

        let mut record = K::from_common(CommonFields {
            id: node.id.map(id::encode),
            name: node.name.as_deref().map(|n| name::display_name(n).to_string()),
            external_id: node.external_id.clone(),
            uri: node.uri.clone(),
            state: node.state.map(state_from_store),
            custom_properties,
            create_time_since_epoch: node.create_time_since_epoch.map(|t| t.to_string()),
            last_update_time_since_epoch: node.last_update_time_since_epoch.map(|t| t.to_string()),
        });

        for (key, value) in &node.properties {
            let prop = K::property(key).ok_or_else(|| MappingError::UnexpectedProperty {
                kind: K::KIND,
                key: key.clone(),
            })?;
            match (prop.ty, value) {
                (PropertyType::String, StoreValue::StringValue(s)) => (prop.set)(&mut record, s.clone()),
                (expected, other) => {
                    return Err(MappingError::PropertyType {
                        key: key.clone(),
                        expected,
                        found: other.property_type(),
                    })
                }
            }
        }

        Ok(record)
    }

    fn kind_of(&self, node: &StoreArtifact) -> Result<ArtifactKindTag, MappingError> {
        self.types
            .kind_of(node)
            .ok_or_else(|| MappingError::UnknownType {
                type_id: node.type_id,
                type_name: node.type_name.clone(),
            })
    }
}

// === Value helpers ===

fn metadata_to_store(key: &str, value: &MetadataValue) -> Result<StoreValue, MappingError> {
    Ok(match value {
        MetadataValue::Int { int_value } => {
            let parsed = int_value.parse::<i64>().map_err(|_| MappingError::InvalidValue {
                field: format!("customProperties.{}", key),
                value: int_value.clone(),
            })?;
            StoreValue::IntValue(parsed)
        }
        MetadataValue::Double { double_value } => StoreValue::DoubleValue(*double_value),
        MetadataValue::String { string_value } => StoreValue::StringValue(string_value.clone()),
        MetadataValue::Bool { bool_value } => StoreValue::BoolValue(*bool_value),
        MetadataValue::Struct { struct_value } => StoreValue::StructValue(struct_value.clone()),
    })
}

fn store_to_metadata(value: &StoreValue) -> MetadataValue {
    match value {
        StoreValue::IntValue(v) => MetadataValue::int(*v),
        StoreValue::DoubleValue(v) => MetadataValue::double(*v),
        StoreValue::StringValue(v) => MetadataValue::string(v.clone()),
        StoreValue::BoolValue(v) => MetadataValue::bool(*v),
        StoreValue::StructValue(v) => MetadataValue::Struct {
            struct_value: v.clone(),
        },
    }
}

fn parse_epoch(field: &str, raw: Option<&str>) -> Result<Option<i64>, MappingError> {
    raw.map(|r| {
        r.parse::<i64>().map_err(|_| MappingError::InvalidValue {
            field: field.to_string(),
            value: r.to_string(),
        })
    })
    .transpose()
}

fn state_to_store(state: ArtifactState) -> StoreState {
    match state {
        ArtifactState::Unknown => StoreState::Unknown,
        ArtifactState::Pending => StoreState::Pending,
        ArtifactState::Live => StoreState::Live,
        ArtifactState::MarkedForDeletion => StoreState::MarkedForDeletion,
        ArtifactState::Deleted => StoreState::Deleted,
        ArtifactState::Abandoned => StoreState::Abandoned,
        ArtifactState::Reference => StoreState::Reference,
    }
}

fn state_from_store(state: StoreState) -> ArtifactState {
    match state {
        StoreState::Unknown => ArtifactState::Unknown,
        StoreState::Pending => ArtifactState::Pending,
        StoreState::Live => ArtifactState::Live,
        StoreState::MarkedForDeletion => ArtifactState::MarkedForDeletion,
        StoreState::Deleted => ArtifactState::Deleted,
        StoreState::Abandoned => ArtifactState::Abandoned,
        StoreState::Reference => ArtifactState::Reference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn types() -> RegisteredTypes {
        RegisteredTypes {
            model_artifact: TypeRef {
                id: 1,
                name: "kf.ModelArtifact".into(),
            },
            doc_artifact: TypeRef {
                id: 2,
                name: "kf.DocArtifact".into(),
            },
            model_version: TypeRef {
                id: 3,
                name: "kf.ModelVersion".into(),
            },
        }
    }

    fn full_model() -> ModelArtifact {
        ModelArtifact {
            id: Some("10".into()),
            name: Some("weights".into()),
            external_id: Some("ext-10".into()),
            description: Some("resnet weights".into()),
            uri: Some("s3://models/resnet".into()),
            state: Some(ArtifactState::Live),
            custom_properties: Some(HashMap::from([
                ("epochs".to_string(), MetadataValue::int(30)),
                ("accuracy".to_string(), MetadataValue::double(0.91)),
                ("framework".to_string(), MetadataValue::string("onnx")),
                ("validated".to_string(), MetadataValue::bool(true)),
            ])),
            create_time_since_epoch: Some("1700000000000".into()),
            last_update_time_since_epoch: Some("1700000000500".into()),
            model_format_name: Some("onnx".into()),
            model_format_version: Some("1.14".into()),
            storage_key: Some("aws-connection".into()),
            storage_path: Some("/models/resnet".into()),
            service_account_name: Some("registry-sa".into()),
        }
    }

    #[test]
    fn test_model_artifact_node_shape() {
        let mapper = ArtifactMapper::new(types());
        let node = mapper.map_from_kind(&full_model(), Some(7)).unwrap();

        assert_eq!(node.id, Some(10));
        assert_eq!(node.type_id, Some(1));
        assert_eq!(node.name.as_deref(), Some("7:weights"));
        assert_eq!(
            node.properties.get("storage_key"),
            Some(&StoreValue::StringValue("aws-connection".into()))
        );
        assert_eq!(node.custom_properties.get("epochs"), Some(&StoreValue::IntValue(30)));
        assert_eq!(node.state, Some(StoreState::Live));
    }

    #[test]
    fn test_model_artifact_round_trip() {
        let mapper = ArtifactMapper::new(types());
        let artifact = Artifact::Model(full_model());
        let node = mapper.map_from_artifact(&artifact, Some(7)).unwrap();
        assert_eq!(mapper.map_to_artifact(&node).unwrap(), artifact);
    }

    #[test]
    fn test_empty_custom_properties_read_back_as_none() {
        let mapper = ArtifactMapper::new(types());
        let mut doc = DocArtifact::new("card");
        doc.custom_properties = Some(HashMap::new());
        let node = mapper.map_from_kind(&doc, Some(1)).unwrap();
        assert!(node.custom_properties.is_empty());
        let read: DocArtifact = mapper.map_to_kind(&node).unwrap();
        assert_eq!(read.custom_properties, None);
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let mapper = ArtifactMapper::new(types());
        let err = mapper.map_from_kind(&DocArtifact::default(), Some(1)).unwrap_err();
        assert!(matches!(err, MappingError::MissingField("name")));
    }

    #[test]
    fn test_bad_int_custom_property_is_rejected() {
        let mapper = ArtifactMapper::new(types());
        let mut doc = DocArtifact::new("card");
        doc.custom_properties = Some(HashMap::from([(
            "pages".to_string(),
            MetadataValue::Int {
                int_value: "many".into(),
            },
        )]));
        let err = mapper.map_from_kind(&doc, Some(1)).unwrap_err();
        assert!(matches!(err, MappingError::InvalidValue { .. }));
    }

    #[test]
    fn test_bad_id_is_rejected() {
        let mapper = ArtifactMapper::new(types());
        let mut doc = DocArtifact::new("card");
        doc.id = Some("01".into());
        assert!(matches!(
            mapper.map_from_kind(&doc, Some(1)),
            Err(MappingError::InvalidId(_))
        ));
    }

    #[test]
    fn test_unknown_type_fails_loudly() {
        let mapper = ArtifactMapper::new(types());
        let node = StoreArtifact {
            id: Some(1),
            type_id: Some(99),
            name: Some("1:x".into()),
            ..Default::default()
        };
        assert!(matches!(
            mapper.map_to_artifact(&node),
            Err(MappingError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_property_outside_schema_fails_loudly() {
        let mapper = ArtifactMapper::new(types());
        let mut node = mapper.map_from_kind(&DocArtifact::new("card"), Some(1)).unwrap();
        node.properties
            .insert("storage_key".into(), StoreValue::StringValue("k".into()));
        assert!(matches!(
            mapper.map_to_artifact(&node),
            Err(MappingError::UnexpectedProperty { .. })
        ));

        let mut node = mapper.map_from_kind(&DocArtifact::new("card"), Some(1)).unwrap();
        node.properties
            .insert("description".into(), StoreValue::IntValue(1));
        assert!(matches!(
            mapper.map_to_artifact(&node),
            Err(MappingError::PropertyType { .. })
        ));
    }

    #[test]
    fn test_kind_mismatch_on_typed_read() {
        let mapper = ArtifactMapper::new(types());
        let node = mapper.map_from_kind(&DocArtifact::new("card"), Some(1)).unwrap();
        assert!(matches!(
            mapper.map_to_kind::<ModelArtifact>(&node),
            Err(MappingError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_kind_resolves_by_name_without_type_id() {
        let node = StoreArtifact {
            type_name: Some("kf.DocArtifact".into()),
            ..Default::default()
        };
        assert_eq!(types().kind_of(&node), Some(ArtifactKindTag::Doc));
    }

    fn opt_text() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[a-zA-Z0-9 _./:-]{0,16}")
    }

    fn metadata_value() -> impl Strategy<Value = MetadataValue> {
        prop_oneof![
            any::<i64>().prop_map(MetadataValue::int),
            any::<bool>().prop_map(MetadataValue::bool),
            "[a-z]{0,8}".prop_map(MetadataValue::string),
            (-1.0e6f64..1.0e6).prop_map(MetadataValue::double),
        ]
    }

    prop_compose! {
        fn doc_artifact()(
            id in proptest::option::of(0i64..i64::MAX),
            name in "[a-zA-Z0-9 _.:-]{1,16}",
            external_id in opt_text(),
            description in opt_text(),
            uri in opt_text(),
            custom in proptest::option::of(
                proptest::collection::hash_map("[a-z]{1,6}", metadata_value(), 0..4)
            ),
        ) -> DocArtifact {
            DocArtifact {
                id: id.map(|i| i.to_string()),
                name: Some(name),
                external_id,
                description,
                uri,
                custom_properties: custom,
                ..Default::default()
            }
        }
    }

    proptest! {
        #[test]
        fn prop_doc_artifact_round_trips(doc in doc_artifact(), owner in 0i64..10_000) {
            let mapper = ArtifactMapper::new(types());
            let node = mapper.map_from_kind(&doc, Some(owner)).unwrap();

            // The store keeps no distinction between an empty map and none
            let mut expected = doc;
            if expected.custom_properties.as_ref().is_some_and(|m| m.is_empty()) {
                expected.custom_properties = None;
            }
            prop_assert_eq!(mapper.map_to_artifact(&node).unwrap(), Artifact::Doc(expected));
        }
    }
}
