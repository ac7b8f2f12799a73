//! Upsert behaviour: create/update branching, ownership, not-editable fields.
//!
//! Run with: `cargo test --test artifact_upsert`

mod common;

use artifact_registry::store::{MetadataStore, StoreError};
use artifact_registry::{
    Artifact, ArtifactState, DocArtifact, MetadataValue, ModelArtifact, RegistryError,
};
use common::{harness, FaultyStore, Harness};
use std::collections::HashMap;

// ============================================================================
// Helpers
// ============================================================================

/// Create model versions until the last one has the requested id
async fn version_with_id(h: &Harness, wanted: &str) -> String {
    for n in 0.. {
        let id = h
            .service
            .create_model_version(&format!("v{}", n))
            .await
            .unwrap();
        if id == wanted {
            return id;
        }
        assert!(id.parse::<i64>().unwrap() < wanted.parse::<i64>().unwrap());
    }
    unreachable!()
}

fn model(name: &str) -> ModelArtifact {
    ModelArtifact {
        model_format_name: Some("onnx".into()),
        storage_key: Some("aws-connection".into()),
        ..ModelArtifact::new(name).with_uri("s3://bucket/model")
    }
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_under_model_version_assigns_id_and_edge() {
    let h = harness().await;
    let mv = version_with_id(&h, "7").await;

    let created = h
        .service
        .upsert_artifact(Artifact::Model(model("weights")), Some(&mv))
        .await
        .unwrap();

    let Artifact::Model(created) = created else {
        panic!("expected a model artifact, got {:?}", created);
    };
    let id: i64 = created.id.as_deref().unwrap().parse().unwrap();
    assert_eq!(created.name.as_deref(), Some("weights"));
    assert_eq!(created.model_format_name.as_deref(), Some("onnx"));
    assert!(created.create_time_since_epoch.is_some());
    assert!(h.store.inner.has_attribution(7, id));

    // Stored name is qualified by the owning model version
    let nodes = h.store.inner.get_artifacts_by_id(&[id]).await.unwrap();
    assert_eq!(nodes[0].name.as_deref(), Some("7:weights"));
}

#[tokio::test]
async fn test_create_without_model_version_is_rejected() {
    let h = harness().await;
    let err = h
        .service
        .upsert_artifact(Artifact::Doc(DocArtifact::new("card")), None)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidArgument(_)));
    assert_eq!(h.store.artifact_writes(), 0);
}

#[tokio::test]
async fn test_create_with_malformed_model_version_is_rejected() {
    let h = harness().await;
    for raw in ["", "abc", "007", "+1"] {
        let err = h
            .service
            .upsert_artifact(Artifact::Doc(DocArtifact::new("card")), Some(raw))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidArgument(_)), "{:?}", raw);
    }
    assert_eq!(h.store.artifact_writes(), 0);
}

#[tokio::test]
async fn test_create_under_missing_model_version_is_not_found() {
    let h = harness().await;
    let err = h
        .service
        .upsert_artifact(Artifact::Doc(DocArtifact::new("card")), Some("42"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(ref m) if m.contains("42")));
    assert_eq!(h.store.artifact_writes(), 0);
}

#[tokio::test]
async fn test_same_name_allowed_in_different_model_versions() {
    let h = harness().await;
    let first = h.service.create_model_version("v1").await.unwrap();
    let second = h.service.create_model_version("v2").await.unwrap();

    for mv in [&first, &second] {
        h.service
            .upsert_typed(DocArtifact::new("readme"), Some(mv))
            .await
            .unwrap();
    }

    let err = h
        .service
        .upsert_typed(DocArtifact::new("readme"), Some(&first))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Store(StoreError::AlreadyExists(_))));
}

#[tokio::test]
async fn test_create_ignores_caller_supplied_timestamps() {
    let h = harness().await;
    let mv = h.service.create_model_version("v1").await.unwrap();
    let doc = DocArtifact {
        create_time_since_epoch: Some("yesterday".into()),
        last_update_time_since_epoch: Some("1".into()),
        ..DocArtifact::new("card")
    };

    let created = h.service.upsert_typed(doc, Some(&mv)).await.unwrap();
    let created_at: i64 = created.create_time_since_epoch.unwrap().parse().unwrap();
    assert!(created_at > 1);
    assert_ne!(created.last_update_time_since_epoch.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_unmappable_custom_property_is_invalid_argument() {
    let h = harness().await;
    let mv = h.service.create_model_version("v1").await.unwrap();
    let mut doc = DocArtifact::new("card");
    doc.custom_properties = Some(HashMap::from([(
        "epochs".to_string(),
        MetadataValue::Int {
            int_value: "thirty".into(),
        },
    )]));

    let err = h.service.upsert_typed(doc, Some(&mv)).await.unwrap_err();
    assert!(matches!(err, RegistryError::InvalidArgument(_)));
    assert_eq!(h.store.artifact_writes(), 0);
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_changes_name_and_keeps_not_editable_fields() {
    let h = harness().await;
    let mv = h.service.create_model_version("v1").await.unwrap();
    let created = h.service.upsert_typed(model("weights"), Some(&mv)).await.unwrap();

    let update = ModelArtifact {
        id: created.id.clone(),
        name: Some("weights-v2".into()),
        state: Some(ArtifactState::Live),
        create_time_since_epoch: Some("1".into()),
        last_update_time_since_epoch: Some("2".into()),
        ..Default::default()
    };
    let updated = h.service.upsert_typed(update, None).await.unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.name.as_deref(), Some("weights-v2"));
    assert_eq!(updated.state, Some(ArtifactState::Live));
    assert_eq!(updated.create_time_since_epoch, created.create_time_since_epoch);
    assert_ne!(updated.create_time_since_epoch.as_deref(), Some("1"));
    assert_ne!(updated.last_update_time_since_epoch.as_deref(), Some("2"));
    // Absent fields keep their stored value
    assert_eq!(updated.uri, created.uri);
    assert_eq!(updated.storage_key.as_deref(), Some("aws-connection"));
}

#[tokio::test]
async fn test_update_with_same_model_version_is_accepted() {
    let h = harness().await;
    let mv = h.service.create_model_version("v1").await.unwrap();
    let created = h.service.upsert_typed(DocArtifact::new("card"), Some(&mv)).await.unwrap();

    let mut update = DocArtifact::new("card");
    update.id = created.id.clone();
    update.description = Some("usage notes".into());
    let updated = h.service.upsert_typed(update, Some(&mv)).await.unwrap();
    assert_eq!(updated.description.as_deref(), Some("usage notes"));
    // Update writes no new edge
    assert_eq!(h.store.attribution_writes(), 1);
}

#[tokio::test]
async fn test_update_cannot_move_to_another_model_version() {
    let h = harness().await;
    let first = h.service.create_model_version("v1").await.unwrap();
    let second = h.service.create_model_version("v2").await.unwrap();
    let created = h.service.upsert_typed(DocArtifact::new("card"), Some(&first)).await.unwrap();

    let mut update = DocArtifact::new("card");
    update.id = created.id.clone();
    let err = h.service.upsert_typed(update, Some(&second)).await.unwrap_err();
    assert!(matches!(err, RegistryError::InvalidArgument(_)));
    assert_eq!(h.store.artifact_writes(), 1);
}

#[tokio::test]
async fn test_update_of_unknown_id_is_not_found() {
    let h = harness().await;
    let mut update = DocArtifact::new("card");
    update.id = Some("99".into());
    let err = h.service.upsert_typed(update, None).await.unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(_)));
}

#[tokio::test]
async fn test_update_with_other_kind_is_rejected() {
    let h = harness().await;
    let mv = h.service.create_model_version("v1").await.unwrap();
    let created = h.service.upsert_typed(DocArtifact::new("card"), Some(&mv)).await.unwrap();

    let mut update = ModelArtifact::new("card");
    update.id = created.id.clone();
    let err = h
        .service
        .upsert_artifact(Artifact::Model(update), None)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_update_of_unattached_artifact_is_not_found() {
    let h = harness().await;
    let mv = h.service.create_model_version("v1").await.unwrap();
    FaultyStore::set(&h.store.fail_attributions, true);
    let _ = h.service.upsert_typed(DocArtifact::new("orphan"), Some(&mv)).await;
    FaultyStore::set(&h.store.fail_attributions, false);

    let mut update = DocArtifact::new("orphan");
    update.id = Some("1".into());
    let err = h.service.upsert_typed(update, None).await.unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(ref m) if m.contains("model version")));
}

// ============================================================================
// Store failures
// ============================================================================

#[tokio::test]
async fn test_attribution_failure_leaves_orphan_and_propagates() {
    let h = harness().await;
    let mv = h.service.create_model_version("v1").await.unwrap();
    FaultyStore::set(&h.store.fail_attributions, true);

    let err = h
        .service
        .upsert_typed(DocArtifact::new("card"), Some(&mv))
        .await
        .unwrap_err();

    assert!(matches!(err, RegistryError::Store(StoreError::Unavailable(_))));
    // The node write is not rolled back
    assert_eq!(h.store.inner.artifact_count(), 1);
    assert_eq!(h.store.inner.attribution_count(), 0);
}

#[tokio::test]
async fn test_write_returning_extra_ids_is_internal_error() {
    let h = harness().await;
    let mv = h.service.create_model_version("v1").await.unwrap();
    FaultyStore::set(&h.store.extra_write_ids, true);

    let err = h
        .service
        .upsert_typed(DocArtifact::new("card"), Some(&mv))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Store(StoreError::Internal(_))));
    assert_eq!(h.store.attribution_writes(), 0);
}
