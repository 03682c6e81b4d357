mod common;

use common::{CountingFetcher, FailingFetcher, TestProject, discovery_with_uri};
use stackport_core::{DiscoveryConfig, NormalizedOutputMap};
use stackport_pipeline::{Pipeline, SinkError, SinkKind, SinkStatus, Stage};
use stackport_registry::{InMemoryRegistry, RegistryCall, ServiceRegistration};
use stackport_sink::{HandlerError, HandlerRegistry};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

type Seen = Arc<Mutex<Vec<(String, NormalizedOutputMap)>>>;

/// Handlers that record which reference ran and what it saw
fn recording_handlers() -> (HandlerRegistry, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let mut handlers = HandlerRegistry::new();
    for reference in ["scripts/notify.deployed", "scripts/notify.removed"] {
        let seen = seen.clone();
        handlers
            .register_fn(reference, move |outputs, _| {
                seen.lock()
                    .unwrap()
                    .push((reference.to_string(), outputs.clone()));
                Ok(())
            })
            .unwrap();
    }
    (handlers, seen)
}

fn status(report: &stackport_pipeline::PipelineReport, sink: SinkKind) -> &SinkStatus {
    &report.outcome(sink).unwrap().status
}

#[tokio::test]
async fn test_nothing_configured_is_a_no_op() {
    let project = TestProject::new();
    let fetcher = Arc::new(CountingFetcher::new(&[("ServiceEndpoint", "https://x")]));
    let registry = Arc::new(InMemoryRegistry::new());

    let pipeline = Pipeline::new(project.identity(), DiscoveryConfig::default(), fetcher.clone())
        .with_registry(registry.clone());
    let report = pipeline.deploy().await.unwrap();

    assert!(report.is_success());
    assert!(
        report
            .outcomes
            .iter()
            .all(|o| matches!(o.status, SinkStatus::Skipped))
    );
    assert_eq!(fetcher.calls(), 1);
    assert!(registry.calls().is_empty());
    assert_eq!(std::fs::read_dir(project.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_deploy_fans_out_to_every_sink() {
    let project = TestProject::new();
    std::fs::create_dir(project.path().join("out")).unwrap();
    let fetcher = Arc::new(CountingFetcher::new(&[
        ("ServiceEndpoint", "https://api.example.com/dev"),
        ("Foo", "Bar"),
    ]));
    let registry = Arc::new(InMemoryRegistry::new());
    let (handlers, seen) = recording_handlers();

    let discovery = DiscoveryConfig {
        deploy_handler: Some("scripts/notify.deployed".to_string()),
        remove_handler: Some("scripts/notify.removed".to_string()),
        file: Some("out/stack.json".to_string()),
        version: Some("1.2.0".to_string()),
        ..discovery_with_uri()
    };
    let pipeline = Pipeline::new(project.identity(), discovery, fetcher.clone())
        .with_registry(registry.clone())
        .with_handlers(Arc::new(handlers));

    let report = pipeline.deploy().await.unwrap();
    assert!(report.is_success(), "{:?}", report);
    assert_eq!(fetcher.calls(), 1);

    let records = registry.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].service_name, "orders");
    assert_eq!(records[0].stage_name, "dev");
    assert_eq!(records[0].service_url, "https://api.example.com/dev");
    assert_eq!(records[0].version.as_deref(), Some("1.2.0"));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "scripts/notify.deployed");
    assert_eq!(seen[0].1.get("Foo"), Some("Bar"));

    let written: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(project.path().join("out/stack.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(
        written,
        serde_json::json!({"Foo": "Bar", "ServiceEndpoint": "https://api.example.com/dev"})
    );
}

#[tokio::test]
async fn test_file_sink_writes_exact_map() {
    let project = TestProject::new();
    std::fs::create_dir(project.path().join("out")).unwrap();

    let discovery = DiscoveryConfig {
        file: Some("out/stack.json".to_string()),
        ..Default::default()
    };
    let pipeline = Pipeline::new(
        project.identity(),
        discovery,
        Arc::new(CountingFetcher::new(&[("Foo", "Bar")])),
    );
    let report = pipeline.deploy().await.unwrap();

    assert!(matches!(status(&report, SinkKind::File), SinkStatus::Succeeded(_)));
    let written: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(project.path().join("out/stack.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(written, serde_json::json!({"Foo": "Bar"}));
}

#[tokio::test]
async fn test_repeated_deploy_registers_twice() {
    let project = TestProject::new();
    let registry = Arc::new(InMemoryRegistry::new());
    let pipeline = Pipeline::new(
        project.identity(),
        discovery_with_uri(),
        Arc::new(CountingFetcher::new(&[("ServiceEndpoint", "https://x")])),
    )
    .with_registry(registry.clone());

    // No existence check before register: each deploy adds a record.
    pipeline.deploy().await.unwrap();
    pipeline.deploy().await.unwrap();

    let registers = registry
        .calls()
        .into_iter()
        .filter(|c| matches!(c, RegistryCall::Register(_)))
        .count();
    assert_eq!(registers, 2);
    assert_eq!(registry.records().len(), 2);
}

#[tokio::test]
async fn test_remove_without_registration() {
    let project = TestProject::new();
    let registry = Arc::new(InMemoryRegistry::new());
    let (handlers, seen) = recording_handlers();

    let discovery = DiscoveryConfig {
        deploy_handler: Some("scripts/notify.deployed".to_string()),
        remove_handler: Some("scripts/notify.removed".to_string()),
        ..discovery_with_uri()
    };
    let pipeline = Pipeline::new(
        project.identity(),
        discovery,
        Arc::new(CountingFetcher::new(&[])),
    )
    .with_registry(registry.clone())
    .with_handlers(Arc::new(handlers));

    let report = pipeline.remove().await.unwrap();

    assert!(report.is_success());
    assert!(matches!(status(&report, SinkKind::Registry), SinkStatus::Succeeded(_)));
    assert!(report.outcome(SinkKind::File).is_none());
    assert!(
        !registry
            .calls()
            .iter()
            .any(|c| matches!(c, RegistryCall::Delete(_)))
    );

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "scripts/notify.removed");
}

#[tokio::test]
async fn test_remove_deletes_matching_registration() {
    let project = TestProject::new();
    let registry = Arc::new(
        InMemoryRegistry::new()
            .with_record(ServiceRegistration::new("orders", "dev", "https://x"))
            .with_record(ServiceRegistration::new("orders", "prod", "https://y")),
    );

    let pipeline = Pipeline::new(
        project.identity(),
        discovery_with_uri(),
        Arc::new(CountingFetcher::new(&[])),
    )
    .with_registry(registry.clone());
    let report = pipeline.remove().await.unwrap();

    match status(&report, SinkKind::Registry) {
        SinkStatus::Succeeded(summary) => assert!(summary.contains("svc-1")),
        other => panic!("Expected deregistration, got {:?}", other),
    }
    let remaining = registry.records();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].stage_name, "prod");
}

#[tokio::test]
async fn test_failed_sink_does_not_undo_others() {
    let project = TestProject::new();
    let registry = Arc::new(InMemoryRegistry::new());

    let discovery = DiscoveryConfig {
        file: Some("missing/stack.json".to_string()),
        ..discovery_with_uri()
    };
    let pipeline = Pipeline::new(
        project.identity(),
        discovery,
        Arc::new(CountingFetcher::new(&[("ServiceEndpoint", "https://x")])),
    )
    .with_registry(registry.clone());
    let report = pipeline.deploy().await.unwrap();

    assert!(!report.is_success());
    assert!(matches!(
        status(&report, SinkKind::File),
        SinkStatus::Failed(SinkError::File(_))
    ));
    assert!(matches!(status(&report, SinkKind::Registry), SinkStatus::Succeeded(_)));
    assert_eq!(registry.records().len(), 1);
}

#[tokio::test]
async fn test_failing_registry_does_not_cancel_handler() {
    let project = TestProject::new();
    let (handlers, seen) = recording_handlers();

    let discovery = DiscoveryConfig {
        deploy_handler: Some("scripts/notify.deployed".to_string()),
        ..discovery_with_uri()
    };
    let pipeline = Pipeline::new(
        project.identity(),
        discovery,
        Arc::new(CountingFetcher::new(&[("Foo", "Bar")])),
    )
    .with_registry(Arc::new(InMemoryRegistry::failing(500)))
    .with_handlers(Arc::new(handlers));
    let report = pipeline.deploy().await.unwrap();

    assert!(matches!(
        status(&report, SinkKind::Registry),
        SinkStatus::Failed(SinkError::Registry(_))
    ));
    assert!(matches!(status(&report, SinkKind::Handler), SinkStatus::Succeeded(_)));
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unresolvable_handler_is_reported() {
    let project = TestProject::new();
    let discovery = DiscoveryConfig {
        deploy_handler: Some("scripts/missing.run".to_string()),
        ..Default::default()
    };
    let pipeline = Pipeline::new(
        project.identity(),
        discovery,
        Arc::new(CountingFetcher::new(&[])),
    );
    let report = pipeline.deploy().await.unwrap();

    match status(&report, SinkKind::Handler) {
        SinkStatus::Failed(SinkError::Handler(e)) => {
            assert!(matches!(e, HandlerError::Resolution { .. }))
        }
        other => panic!("Expected resolution failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_handler_receives_options() {
    let project = TestProject::new();
    let seen = Arc::new(Mutex::new(BTreeMap::new()));
    let mut handlers = HandlerRegistry::new();
    {
        let seen = seen.clone();
        handlers
            .register_fn("hooks.deployed", move |_, ctx| {
                *seen.lock().unwrap() = ctx.options.clone();
                Ok(())
            })
            .unwrap();
    }

    let discovery = DiscoveryConfig {
        deploy_handler: Some("hooks.deployed".to_string()),
        ..Default::default()
    };
    let options = BTreeMap::from([("channel".to_string(), "#deploys".to_string())]);
    Pipeline::new(project.identity(), discovery, Arc::new(CountingFetcher::new(&[])))
        .with_handlers(Arc::new(handlers))
        .with_options(options.clone())
        .deploy()
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), options);
}

#[tokio::test]
async fn test_fetch_failure_aborts_before_sinks() {
    let project = TestProject::new();
    let registry = Arc::new(InMemoryRegistry::new());

    let pipeline = Pipeline::new(project.identity(), discovery_with_uri(), Arc::new(FailingFetcher))
        .with_registry(registry.clone());
    let err = pipeline.deploy().await.unwrap_err();

    assert_eq!(err.stage, Stage::Fetching);
    assert!(err.to_string().contains("orders-dev"));
    assert!(registry.calls().is_empty());

    // Host hook swallows the error
    pipeline.after_deploy().await;
    assert!(registry.calls().is_empty());
}

#[tokio::test]
async fn test_no_deploy_skips_before_fetch() {
    let project = TestProject::new();
    let fetcher = Arc::new(CountingFetcher::new(&[]));
    let pipeline = Pipeline::new(project.identity(), discovery_with_uri(), fetcher.clone())
        .with_no_deploy(true);

    let err = pipeline.deploy().await.unwrap_err();
    assert!(err.is_skip());
    assert_eq!(err.stage, Stage::Validating);
    assert_eq!(fetcher.calls(), 0);
}
