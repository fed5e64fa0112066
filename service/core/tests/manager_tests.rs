// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

mod common;

use entrypoint_core::application::{build_services, ManagerError, Services};
use entrypoint_core::domain::entrypoint::{EntrypointFilter, EntrypointLookup};
use entrypoint_core::domain::launch::LaunchOptions;
use entrypoint_core::domain::repository::StoreError;
use entrypoint_core::domain::service_config::ServiceConfig;
use serde_json::json;

const CONFIG: &str = r#"
database_url: "sqlite::memory:"
executable: jupyter-labhub
contexts:
  - name: cori
  - name: perlmutter
entrypoint_types:
  - kind: trusted_path
    paths:
      - /opt/envs/conda1/bin
      - /opt/envs/conda2/bin
  - kind: trusted_script
    scripts:
      - /global/common/jupyter/vasp.sh
"#;

async fn services() -> Services {
    let config = ServiceConfig::from_yaml_str(CONFIG).unwrap();
    build_services(&config).await.unwrap()
}

fn conda(name: &str, path: &str) -> serde_json::Map<String, serde_json::Value> {
    common::data(json!({"entrypoint_name": name, "path": path}))
}

#[tokio::test]
async fn test_bootstrap_creates_configured_contexts() {
    let services = services().await;
    assert_eq!(
        services.manager.list_contexts().await.unwrap(),
        vec!["cori", "perlmutter"]
    );

    // Running it again changes nothing
    services.manager.bootstrap_contexts().await.unwrap();
    assert_eq!(services.manager.list_contexts().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_select_then_launch() {
    let services = services().await;
    let manager = &services.manager;

    manager
        .create_entrypoint(
            "alice",
            "trusted_path",
            conda("conda1", "/opt/envs/conda1/bin"),
            common::names(&["cori", "perlmutter"]),
        )
        .await
        .unwrap();
    manager.select("alice", "conda1", "perlmutter").await.unwrap();

    let command = services
        .launcher
        .resolve("alice", "perlmutter", &LaunchOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(command.cmd, vec!["/opt/envs/conda1/bin/jupyter-labhub"]);

    let batch = services
        .launcher
        .resolve("alice", "perlmutter", &LaunchOptions { batchspawner: true })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        batch.batchspawner_singleuser_cmd.as_deref(),
        Some("/opt/envs/conda1/bin/batchspawner-singleuser")
    );

    assert!(services
        .launcher
        .resolve("alice", "cori", &LaunchOptions::default())
        .await
        .unwrap()
        .is_none());
    assert!(services
        .launcher
        .resolve("bob", "perlmutter", &LaunchOptions::default())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_create_defaults_to_every_configured_context() {
    let services = services().await;
    services
        .manager
        .create_entrypoint(
            "alice",
            "trusted_path",
            conda("conda1", "/opt/envs/conda1/bin"),
            Vec::new(),
        )
        .await
        .unwrap();

    let record = services
        .manager
        .get_entrypoint("alice", &EntrypointLookup::Name("conda1".into()))
        .await
        .unwrap();
    assert_eq!(record.context_names, vec!["cori", "perlmutter"]);
}

#[tokio::test]
async fn test_create_rejects_invalid_submissions() {
    let services = services().await;
    let manager = &services.manager;

    let cases = [
        // Path outside the trusted set
        ("trusted_path", conda("bad", "/tmp/evil"), Vec::new()),
        // Extra property
        (
            "trusted_path",
            common::data(json!({
                "entrypoint_name": "x",
                "path": "/opt/envs/conda1/bin",
                "extra": 1
            })),
            Vec::new(),
        ),
        // Missing name
        (
            "trusted_path",
            common::data(json!({"path": "/opt/envs/conda1/bin"})),
            Vec::new(),
        ),
        // Unregistered type
        ("container_image", conda("x", "/opt/envs/conda1/bin"), Vec::new()),
        // Context that is not configured
        (
            "trusted_path",
            conda("x", "/opt/envs/conda1/bin"),
            common::names(&["edison"]),
        ),
    ];

    for (kind, data, contexts) in cases {
        let result = manager.create_entrypoint("alice", kind, data, contexts).await;
        assert!(
            matches!(result, Err(ManagerError::Validation(_))),
            "expected validation failure, got {:?}",
            result
        );
    }

    assert!(manager
        .list_entrypoints("alice", &EntrypointFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_create_duplicate_name_is_a_store_error() {
    let services = services().await;
    let manager = &services.manager;
    manager
        .create_entrypoint(
            "alice",
            "trusted_path",
            conda("conda1", "/opt/envs/conda1/bin"),
            Vec::new(),
        )
        .await
        .unwrap();

    let result = manager
        .create_entrypoint(
            "alice",
            "trusted_path",
            conda("conda1", "/opt/envs/conda2/bin"),
            Vec::new(),
        )
        .await;
    assert!(matches!(
        result,
        Err(ManagerError::Store(StoreError::DuplicateName(_)))
    ));
}

#[tokio::test]
async fn test_update_renames_and_retags() {
    let services = services().await;
    let manager = &services.manager;
    let uuid = manager
        .create_entrypoint(
            "alice",
            "trusted_path",
            conda("conda1", "/opt/envs/conda1/bin"),
            common::names(&["cori"]),
        )
        .await
        .unwrap();
    manager.select("alice", "conda1", "cori").await.unwrap();

    manager
        .update_entrypoint(
            "alice",
            uuid,
            conda("renamed", "/opt/envs/conda2/bin"),
            common::names(&["perlmutter"]),
        )
        .await
        .unwrap();

    let record = manager
        .get_entrypoint("alice", &EntrypointLookup::Uuid(uuid))
        .await
        .unwrap();
    assert_eq!(record.entrypoint_name, "renamed");
    assert_eq!(record.entrypoint_type, "trusted_path");
    assert_eq!(record.entrypoint_data["path"], "/opt/envs/conda2/bin");
    assert_eq!(record.context_names, vec!["perlmutter"]);

    // Leaving cori dropped the selection there
    assert!(matches!(
        manager.get_selection("alice", "cori").await,
        Err(ManagerError::Store(StoreError::NotFound(_)))
    ));
}

#[tokio::test]
async fn test_failed_update_changes_nothing() {
    let services = services().await;
    let manager = &services.manager;
    let uuid = manager
        .create_entrypoint(
            "alice",
            "trusted_path",
            conda("conda1", "/opt/envs/conda1/bin"),
            common::names(&["cori"]),
        )
        .await
        .unwrap();
    manager
        .create_entrypoint(
            "alice",
            "trusted_path",
            conda("conda2", "/opt/envs/conda2/bin"),
            common::names(&["cori"]),
        )
        .await
        .unwrap();

    // Renaming onto an existing name fails after the diff was computed
    let result = manager
        .update_entrypoint(
            "alice",
            uuid,
            conda("conda2", "/opt/envs/conda2/bin"),
            common::names(&["cori", "perlmutter"]),
        )
        .await;
    assert!(matches!(
        result,
        Err(ManagerError::Store(StoreError::DuplicateName(_)))
    ));

    let record = manager
        .get_entrypoint("alice", &EntrypointLookup::Uuid(uuid))
        .await
        .unwrap();
    assert_eq!(record.entrypoint_name, "conda1");
    assert_eq!(record.entrypoint_data["path"], "/opt/envs/conda1/bin");
    assert_eq!(record.context_names, vec!["cori"]);

    // Invalid data never reaches the store
    let invalid = manager
        .update_entrypoint("alice", uuid, conda("conda1", "/tmp/evil"), Vec::new())
        .await;
    assert!(matches!(invalid, Err(ManagerError::Validation(_))));
}

#[tokio::test]
async fn test_update_keeps_stored_type() {
    let services = services().await;
    let manager = &services.manager;
    let uuid = manager
        .create_entrypoint(
            "alice",
            "trusted_script",
            common::data(json!({
                "entrypoint_name": "vasp",
                "script": "/global/common/jupyter/vasp.sh"
            })),
            Vec::new(),
        )
        .await
        .unwrap();

    // trusted_path data does not satisfy the stored type's schema
    let result = manager
        .update_entrypoint("alice", uuid, conda("vasp", "/opt/envs/conda1/bin"), Vec::new())
        .await;
    assert!(matches!(result, Err(ManagerError::Validation(_))));
}

#[tokio::test]
async fn test_delete_entrypoint() {
    let services = services().await;
    let manager = &services.manager;
    manager
        .create_entrypoint(
            "alice",
            "trusted_path",
            conda("conda1", "/opt/envs/conda1/bin"),
            Vec::new(),
        )
        .await
        .unwrap();

    manager.delete_entrypoint("alice", "conda1").await.unwrap();
    assert!(matches!(
        manager.delete_entrypoint("alice", "conda1").await,
        Err(ManagerError::Store(StoreError::NotFound(_)))
    ));
}

#[tokio::test]
async fn test_field_options() {
    let services = services().await;

    let options = services
        .manager
        .field_options("alice", "trusted_path")
        .await
        .unwrap();
    assert_eq!(
        options["path"],
        Some(vec![
            "/opt/envs/conda1/bin".to_string(),
            "/opt/envs/conda2/bin".to_string()
        ])
    );
    assert_eq!(options["entrypoint_name"], None);

    assert!(matches!(
        services.manager.field_options("alice", "nope").await,
        Err(ManagerError::UnknownType(_))
    ));
}

#[tokio::test]
async fn test_entrypoint_types_are_described() {
    let services = services().await;
    let names: Vec<_> = services
        .manager
        .entrypoint_types()
        .into_iter()
        .map(|t| t.type_name)
        .collect();
    assert_eq!(names, vec!["trusted_path", "trusted_script"]);
}

#[tokio::test]
async fn test_container_image_uses_inventory() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/list/alice")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"images": [{"tag": ["registry/jupyter:1.0"], "ENV": ["JUPYTER_IMAGE=YES"]}]}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let yaml = format!(
        r#"
database_url: "sqlite::memory:"
contexts:
  - name: perlmutter
entrypoint_types:
  - kind: container_image
    api_url: "{}"
    required_env: JUPYTER_IMAGE=YES
"#,
        server.url()
    );
    let config = ServiceConfig::from_yaml_str(&yaml).unwrap();
    let services = build_services(&config).await.unwrap();
    let manager = &services.manager;

    let options = manager.field_options("alice", "container_image").await.unwrap();
    assert_eq!(options["image"], Some(vec!["registry/jupyter:1.0".to_string()]));

    manager
        .create_entrypoint(
            "alice",
            "container_image",
            common::data(json!({"entrypoint_name": "img", "image": "registry/jupyter:1.0"})),
            Vec::new(),
        )
        .await
        .unwrap();

    let rejected = manager
        .create_entrypoint(
            "alice",
            "container_image",
            common::data(json!({"entrypoint_name": "other", "image": "registry/other:1.0"})),
            Vec::new(),
        )
        .await;
    assert!(matches!(rejected, Err(ManagerError::Validation(_))));

    manager.select("alice", "img", "perlmutter").await.unwrap();
    let command = services
        .launcher
        .resolve("alice", "perlmutter", &LaunchOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        command.cmd,
        vec!["shifter", "--image=registry/jupyter:1.0", "jupyter-labhub"]
    );

    // One inventory call served all three lookups
    mock.assert_async().await;
}
