//! Address resolution against a mocked metadata API.

mod common;

use common::mock_server::{Canned, MockServer};
use modelrelay_core::resolver::Resolver;
use modelrelay_core::TransferError;

fn metadata(server: &MockServer) -> String {
    format!(
        r#"{{
            "id": 4201,
            "name": "Test Model",
            "description": "<p>desc</p>",
            "type": "LORA",
            "tags": ["style", {{"name": "anime"}}],
            "modelVersions": [
                {{
                    "id": 130072,
                    "name": "v2",
                    "files": [
                        {{"name": "extra.pt", "downloadUrl": "{base}/files/extra.pt"}},
                        {{"name": "test_model.safetensors", "primary": true,
                          "downloadUrl": "{base}/api/download/models/130072"}}
                    ],
                    "images": [{{"url": "{base}/img/1.jpeg"}}]
                }},
                {{
                    "id": 120000,
                    "name": "v1",
                    "files": [
                        {{"name": "old.safetensors", "downloadUrl": "{base}/api/download/models/120000"}}
                    ]
                }}
            ]
        }}"#,
        base = server.base()
    )
}

#[test]
fn page_url_resolves_to_primary_file_of_latest_version() {
    let server = MockServer::start();
    server.route("GET", "/api/v1/models/4201", Canned::json(200, metadata(&server)));
    let cfg = common::config_for(server.base());
    let client = common::client();
    let resolver = Resolver::new(&client, &cfg.source, Some("civkey"));

    let page = server.url("/models/4201/test-model");
    let resolved = resolver.resolve(&page).unwrap();

    assert_eq!(resolved.url, server.url("/api/download/models/130072"));
    assert_ne!(resolved.url, page);
    assert_eq!(resolved.file_name.as_deref(), Some("test_model.safetensors"));
    let info = resolved.model.expect("model info");
    assert_eq!(info.model_version_id, 130072);
    assert_eq!(info.model_tags, vec!["style", "anime"]);
    assert_eq!(info.preview_image_url, Some(server.url("/img/1.jpeg")));
    assert_eq!(info.model_url, server.url("/models/4201"));

    let calls = server.requests_to("GET", "/api/v1/models/4201");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].header("authorization"), Some("Bearer civkey"));
}

#[test]
fn explicit_version_is_honored() {
    let server = MockServer::start();
    server.route("GET", "/api/v1/models/4201", Canned::json(200, metadata(&server)));
    let cfg = common::config_for(server.base());
    let client = common::client();
    let resolver = Resolver::new(&client, &cfg.source, None);

    let resolved = resolver
        .resolve(&server.url("/models/4201?modelVersionId=120000"))
        .unwrap();
    assert_eq!(resolved.url, server.url("/api/download/models/120000"));
    assert_eq!(resolved.file_name.as_deref(), Some("old.safetensors"));
    assert_eq!(
        server.requests_to("GET", "/api/v1/models/4201")[0].header("authorization"),
        None
    );
}

#[test]
fn unknown_version_is_resolution_error() {
    let server = MockServer::start();
    server.route("GET", "/api/v1/models/4201", Canned::json(200, metadata(&server)));
    let cfg = common::config_for(server.base());
    let client = common::client();
    let resolver = Resolver::new(&client, &cfg.source, None);

    let err = resolver
        .resolve(&server.url("/models/4201?modelVersionId=999"))
        .unwrap_err();
    assert!(matches!(err, TransferError::Resolution { .. }), "{err:?}");
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn missing_model_is_resolution_error() {
    let server = MockServer::start();
    let cfg = common::config_for(server.base());
    let client = common::client();
    let resolver = Resolver::new(&client, &cfg.source, None);

    // No route: the mock answers 404.
    let err = resolver.resolve(&server.url("/models/77")).unwrap_err();
    assert!(matches!(err, TransferError::Resolution { .. }), "{err:?}");
}

#[test]
fn metadata_server_error_is_network_error() {
    let server = MockServer::start();
    server.route("GET", "/api/v1/models/5", Canned::new(500, "boom"));
    let cfg = common::config_for(server.base());
    let client = common::client();
    let resolver = Resolver::new(&client, &cfg.source, None);

    let err = resolver.resolve(&server.url("/models/5")).unwrap_err();
    assert!(matches!(err, TransferError::Network { .. }), "{err:?}");
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn garbage_metadata_is_resolution_error() {
    let server = MockServer::start();
    server.route("GET", "/api/v1/models/5", Canned::json(200, "<html>nope</html>"));
    let cfg = common::config_for(server.base());
    let client = common::client();
    let resolver = Resolver::new(&client, &cfg.source, None);

    let err = resolver.resolve(&server.url("/models/5")).unwrap_err();
    assert!(matches!(err, TransferError::Resolution { .. }), "{err:?}");
}

#[test]
fn unrecognized_address_is_resolution_error() {
    let server = MockServer::start();
    let cfg = common::config_for(server.base());
    let client = common::client();
    let resolver = Resolver::new(&client, &cfg.source, None);

    for address in ["not a url", "ftp://host/model.ckpt", &server.url("/users/someone")] {
        let err = resolver.resolve(address).unwrap_err();
        assert!(matches!(err, TransferError::Resolution { .. }), "{address}");
    }
    assert!(server.requests().is_empty());
}

#[test]
fn direct_url_is_returned_unchanged() {
    let server = MockServer::start();
    let cfg = common::config_for(server.base());
    let client = common::client();
    let resolver = Resolver::new(&client, &cfg.source, Some("civkey"));

    let direct = "https://files.example.org/models/model.ckpt";
    let resolved = resolver.resolve(direct).unwrap();
    assert_eq!(resolved.url, direct);
    assert!(resolved.model.is_none());
    assert!(server.requests().is_empty());
}
