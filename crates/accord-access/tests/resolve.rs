//! Resolve Orchestrator Tests
//!
//! Round trips through the manifest protocol, fail-closed type handling,
//! load failures and binding checks on the resolve path.

use accord_access::{ControllerError, ControllerOptions, Operation, Stage};
use accord_core::{
    BlockStoreEffects, CancelCause, ManifestAddress, ManifestEffects, ManifestParams,
    OperationContext,
};
use accord_effects::{
    init_test_tracing, CancellationSource, DagCborManifestHandler, MemoryBlockStore,
};
use accord_testkit::{
    Fault, Harness, MockControllerFactory, MockDatabase, RecordingManifestHandler,
};
use assert_matches::assert_matches;
use std::sync::Arc;
use std::time::Duration;

fn write_params() -> ManifestParams {
    ManifestParams::new()
        .with_name("events")
        .with_access("write", ["alice", "bob"])
        .with_access("admin", ["alice"])
}

async fn publish(store: &MemoryBlockStore, controller_type: &str) -> ManifestAddress {
    DagCborManifestHandler
        .create_manifest(
            &OperationContext::background(),
            store,
            controller_type,
            &write_params(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_then_resolve_round_trip() {
    init_test_tracing();
    let factory = MockControllerFactory::new("mock");
    let db = MockDatabase::builder("events")
        .register("mock", Arc::new(factory.clone()))
        .build();
    let harness = Harness::new();
    let ctx = OperationContext::background();
    let options = ControllerOptions::default();

    let address = harness
        .manager
        .create(&ctx, db.handle(), "mock", write_params(), &options)
        .await
        .unwrap();
    let controller = harness
        .manager
        .resolve(&ctx, db.handle(), &address.to_path(), &ManifestParams::new(), &options)
        .await
        .unwrap();

    assert_eq!(controller.controller_type(), "mock");
    assert_eq!(controller.address(), Some(address));
    assert_eq!(controller.save(&ctx).await.unwrap(), write_params());
    assert_eq!(factory.constructs(), 2);
    assert_eq!(factory.loads(), 1);
}

#[tokio::test]
async fn test_resolve_across_peers_sharing_a_store() {
    let store = Arc::new(MemoryBlockStore::new());
    let writer_factory = MockControllerFactory::new("mock");
    let reader_factory = MockControllerFactory::new("mock");
    let writer = MockDatabase::builder("events")
        .identity("alice")
        .block_store(store.clone())
        .register("mock", Arc::new(writer_factory))
        .build();
    let reader = MockDatabase::builder("events")
        .identity("bob")
        .block_store(store)
        .register("mock", Arc::new(reader_factory.clone()))
        .build();
    let harness = Harness::new();
    let ctx = OperationContext::background();
    let options = ControllerOptions::default();

    let address = harness
        .manager
        .create(&ctx, writer.handle(), "mock", write_params(), &options)
        .await
        .unwrap();
    let controller = harness
        .manager
        .resolve(&ctx, reader.handle(), &address.to_string(), &ManifestParams::new(), &options)
        .await
        .unwrap();

    assert!(controller.can_append(&ctx, "bob").await.unwrap());
    assert!(!controller.can_append(&ctx, "mallory").await.unwrap());
    assert_eq!(reader_factory.constructs(), 1);
}

#[tokio::test]
async fn test_unrecognized_manifest_type_fails_closed() {
    let store = Arc::new(MemoryBlockStore::new());
    let address = publish(&store, "retired").await;
    let factory = MockControllerFactory::new("mock");
    let db = MockDatabase::builder("events")
        .block_store(store)
        .register("mock", Arc::new(factory.clone()))
        .build();
    let harness = Harness::new();

    let result = harness
        .manager
        .resolve(
            &OperationContext::background(),
            db.handle(),
            &address.to_string(),
            &ManifestParams::new(),
            &ControllerOptions::default(),
        )
        .await;

    let err = result.unwrap_err();
    assert_matches!(
        err,
        ControllerError::UnrecognizedControllerType { ref controller_type, operation: Operation::Resolve }
            if controller_type == "retired"
    );
    assert!(err.is_configuration_error());
    assert_eq!(factory.constructs(), 0);
}

#[tokio::test]
async fn test_constructor_receives_manifest_params_not_hint() {
    let store = Arc::new(MemoryBlockStore::new());
    let address = publish(&store, "mock").await;
    let factory = MockControllerFactory::new("mock");
    let db = MockDatabase::builder("events")
        .block_store(store)
        .register("mock", Arc::new(factory))
        .build();
    let harness = Harness::new();
    let ctx = OperationContext::background();
    let hint = ManifestParams::new().with_access("write", ["mallory"]);

    let controller = harness
        .manager
        .resolve(&ctx, db.handle(), &address.to_string(), &hint, &ControllerOptions::default())
        .await
        .unwrap();

    assert_eq!(controller.save(&ctx).await.unwrap(), write_params());
    assert!(!controller.can_append(&ctx, "mallory").await.unwrap());
}

#[tokio::test]
async fn test_load_failure_returns_no_controller() {
    let store = Arc::new(MemoryBlockStore::new());
    let address = publish(&store, "mock").await;
    let factory = MockControllerFactory::new("mock").failing_at(Fault::Load);
    let db = MockDatabase::builder("events")
        .block_store(store)
        .register("mock", Arc::new(factory.clone()))
        .build();
    let harness = Harness::new();

    let result = harness
        .manager
        .resolve(
            &OperationContext::background(),
            db.handle(),
            &address.to_string(),
            &ManifestParams::new(),
            &ControllerOptions::default(),
        )
        .await;

    let err = result.err().expect("load failure must not yield a controller");
    assert_matches!(err, ControllerError::LoadFailed { ref address, .. } if !address.is_empty());
    assert_eq!(err.stage(), Stage::Load);
    assert_eq!(factory.loads(), 1);
    assert_eq!(factory.closes(), 1);
}

#[tokio::test]
async fn test_constructor_failure_on_resolve() {
    let store = Arc::new(MemoryBlockStore::new());
    let address = publish(&store, "mock").await;
    let factory = MockControllerFactory::new("mock").failing_at(Fault::Construct);
    let db = MockDatabase::builder("events")
        .block_store(store)
        .register("mock", Arc::new(factory.clone()))
        .build();
    let harness = Harness::new();

    let err = harness
        .manager
        .resolve(
            &OperationContext::background(),
            db.handle(),
            &address.to_string(),
            &ManifestParams::new(),
            &ControllerOptions::default(),
        )
        .await
        .unwrap_err();

    assert_matches!(err, ControllerError::ConstructionFailed { .. });
    assert_eq!(factory.loads(), 0);
}

#[tokio::test]
async fn test_missing_manifest_fails_resolution() {
    let factory = MockControllerFactory::new("mock");
    let db = MockDatabase::builder("events")
        .register("mock", Arc::new(factory.clone()))
        .build();
    let harness = Harness::new();
    let address = ManifestAddress::for_bytes(b"never published");

    let err = harness
        .manager
        .resolve(
            &OperationContext::background(),
            db.handle(),
            &address.to_string(),
            &ManifestParams::new(),
            &ControllerOptions::default(),
        )
        .await
        .unwrap_err();

    assert_matches!(err, ControllerError::ManifestResolutionFailed { .. });
    assert!(err.is_retryable());
    assert_eq!(factory.constructs(), 0);
}

#[tokio::test]
async fn test_tampered_manifest_fails_resolution() {
    let store = Arc::new(MemoryBlockStore::new());
    let address = publish(&store, "mock").await;
    let forged = accord_core::Manifest::new(
        "mock",
        ManifestParams::new().with_access("write", ["*"]),
    );
    store
        .insert_unchecked(*address.hash(), forged.encode().unwrap())
        .await;
    let factory = MockControllerFactory::new("mock");
    let db = MockDatabase::builder("events")
        .block_store(store)
        .register("mock", Arc::new(factory.clone()))
        .build();
    let harness = Harness::new();

    let err = harness
        .manager
        .resolve(
            &OperationContext::background(),
            db.handle(),
            &address.to_string(),
            &ManifestParams::new(),
            &ControllerOptions::default(),
        )
        .await
        .unwrap_err();

    assert_matches!(err, ControllerError::ManifestResolutionFailed { .. });
    assert_eq!(factory.constructs(), 0);
}

#[tokio::test]
async fn test_type_mismatch_is_rejected() {
    let store = Arc::new(MemoryBlockStore::new());
    let address = publish(&store, "mock").await;
    let factory = MockControllerFactory::new("mock").reporting_type("impostor");
    let db = MockDatabase::builder("events")
        .block_store(store)
        .register("mock", Arc::new(factory.clone()))
        .build();
    let harness = Harness::new();

    let err = harness
        .manager
        .resolve(
            &OperationContext::background(),
            db.handle(),
            &address.to_string(),
            &ManifestParams::new(),
            &ControllerOptions::default(),
        )
        .await
        .unwrap_err();

    assert_matches!(err, ControllerError::ManifestMismatch { .. });
    assert_eq!(factory.closes(), 1);
}

#[tokio::test]
async fn test_skip_manifest_hint_resolves_without_fetch() {
    let factory = MockControllerFactory::new("mock");
    let store = Arc::new(MemoryBlockStore::new());
    let db = MockDatabase::builder("events")
        .block_store(store.clone())
        .register("mock", Arc::new(factory.clone()))
        .build();
    let harness = Harness::new();
    let fixed = ManifestAddress::for_bytes(b"well-known");

    let controller = harness
        .manager
        .resolve(
            &OperationContext::background(),
            db.handle(),
            &fixed.to_string(),
            &ManifestParams::skip_manifest("mock", fixed),
            &ControllerOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(controller.address(), Some(fixed));
    assert!(!store.has_block(fixed.hash()).await.unwrap());
    assert_eq!(factory.loads(), 1);
}

#[tokio::test]
async fn test_resolve_failure_from_protocol() {
    let factory = MockControllerFactory::new("mock");
    let db = MockDatabase::builder("events")
        .register("mock", Arc::new(factory.clone()))
        .build();
    let harness = Harness::with_handler(RecordingManifestHandler::new().failing_resolve());

    let err = harness
        .manager
        .resolve(
            &OperationContext::background(),
            db.handle(),
            &ManifestAddress::for_bytes(b"x").to_string(),
            &ManifestParams::new(),
            &ControllerOptions::default(),
        )
        .await
        .unwrap_err();

    assert_matches!(err, ControllerError::ManifestResolutionFailed { .. });
    assert_eq!(harness.manifests.resolves(), 1);
    assert_eq!(factory.constructs(), 0);
}

#[tokio::test]
async fn test_deadline_interrupts_resolution() {
    let factory = MockControllerFactory::new("mock");
    let db = MockDatabase::builder("events")
        .register("mock", Arc::new(factory.clone()))
        .build();
    let harness =
        Harness::with_handler(RecordingManifestHandler::new().with_delay(Duration::from_secs(30)));
    let ctx = OperationContext::background().with_timeout(Duration::from_millis(20));

    let err = harness
        .manager
        .resolve(
            &ctx,
            db.handle(),
            &ManifestAddress::for_bytes(b"slow").to_string(),
            &ManifestParams::new(),
            &ControllerOptions::default(),
        )
        .await
        .unwrap_err();

    assert_matches!(
        err,
        ControllerError::Cancelled {
            stage: Stage::Resolve,
            cause: CancelCause::DeadlineExceeded,
            ..
        }
    );
    assert_eq!(factory.constructs(), 0);
}

#[tokio::test]
async fn test_cancel_during_load_discards_controller() {
    let store = Arc::new(MemoryBlockStore::new());
    let address = publish(&store, "mock").await;
    let factory = MockControllerFactory::new("mock").with_delay(Duration::from_secs(30));
    let db = MockDatabase::builder("events")
        .block_store(store)
        .register("mock", Arc::new(factory.clone()))
        .build();
    let harness = Harness::new();
    let source = CancellationSource::new();
    let ctx = source.context();
    let options = ControllerOptions::default();
    let hint = ManifestParams::new();

    let address_str = address.to_string();
    let resolve = harness
        .manager
        .resolve(&ctx, db.handle(), &address_str, &hint, &options);
    let cancel = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        source.cancel();
    };
    let (result, ()) = tokio::join!(resolve, cancel);

    let err = result.err().expect("cancelled load must not yield a controller");
    assert_matches!(
        err,
        ControllerError::Cancelled {
            stage: Stage::Load,
            cause: CancelCause::Requested,
            ..
        }
    );
    assert_eq!(factory.loads(), 1);
    assert_eq!(factory.closes(), 1);
}
