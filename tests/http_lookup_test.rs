use httpmock::prelude::*;
use labware_console::adapters::HttpLabwareLookup;
use labware_console::core::{ItemLookup, Labware};
use labware_console::{IdleStatus, WorklistController, WorklistState};
use std::sync::Arc;
use std::time::Duration;

fn tube_json(barcode: &str) -> serde_json::Value {
    serde_json::json!({
        "barcode": barcode,
        "labware_type": "Tube",
        "grid": {
            "num_rows": 1,
            "num_columns": 1,
            "slots": [{"address": "A1", "occupied": true}]
        }
    })
}

#[tokio::test]
async fn test_lookup_returns_labware() {
    let server = MockServer::start();
    let labware_mock = server.mock(|when, then| {
        when.method(GET).path("/api/labware/STAN-0001");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(tube_json("STAN-0001"));
    });

    let timeout = Some(Duration::from_secs(5));
    let lookup = HttpLabwareLookup::new(&server.url("/api/labware"), timeout).unwrap();
    let labware = lookup.find("STAN-0001").await.unwrap();

    labware_mock.assert();
    assert_eq!(labware.barcode, "STAN-0001");
    assert_eq!(labware.labware_type, "Tube");
    assert_eq!(labware.location, None);
    assert!(labware.grid.slot("A1").is_some_and(|slot| slot.occupied));
}

#[tokio::test]
async fn test_not_found_message_comes_from_error_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/labware/STAN-9999");
        then.status(404)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "message": "Labware lookup : No labware found with barcode: STAN-9999"
            }));
    });

    let lookup = HttpLabwareLookup::new(&server.url("/api/labware"), None).unwrap();
    let error = lookup.find("STAN-9999").await.unwrap_err();

    assert_eq!(error.reason(), "No labware found with barcode: STAN-9999");
}

#[tokio::test]
async fn test_server_error_without_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/labware/STAN-0001");
        then.status(500);
    });

    let lookup = HttpLabwareLookup::new(&server.url("/api/labware"), None).unwrap();
    let error = lookup.find("STAN-0001").await.unwrap_err();

    assert!(error.reason().starts_with("Server responded with 500"));
}

#[tokio::test]
async fn test_controller_scans_through_http_lookup() {
    let server = MockServer::start();
    let found = server.mock(|when, then| {
        when.method(GET).path("/api/labware/STAN-0001");
        then.status(200).json_body(tube_json("STAN-0001"));
    });
    let missing = server.mock(|when, then| {
        when.method(GET).path("/api/labware/STAN-0002");
        then.status(404)
            .json_body(serde_json::json!({"message": "Fetch failed : Unknown barcode STAN-0002"}));
    });

    let lookup = HttpLabwareLookup::new(&server.url("/api/labware/"), None).unwrap();
    let mut controller = WorklistController::<Labware>::new(Arc::new(lookup));

    controller.scan("STAN-0001").await;
    controller.scan("STAN-0001").await;
    found.assert_hits(1);
    assert_eq!(controller.items().len(), 1);

    controller.scan("STAN-0002").await;
    missing.assert();
    assert_eq!(controller.state(), WorklistState::Idle(IdleStatus::Error));
    assert_eq!(controller.message().as_deref(), Some("Unknown barcode STAN-0002"));
    assert_eq!(controller.items().len(), 1);
}
