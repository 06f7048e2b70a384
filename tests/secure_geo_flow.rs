// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Record lifecycle through the public service API, backed by a real data
//! directory.

use chrono::Utc;
use secure_geo_server::{
    auth::Role,
    geo::{
        AuditAction, DeleteOptions, GeoError, GetOptions, ImportOptions, PayloadCipher,
        Requester, SecureGeoService, SecurityLevel, StoreOptions,
    },
    storage::{AuditEventType, AuditRepository, FileStorage, StoragePaths},
};
use serde_json::json;
use tempfile::TempDir;

fn open_service(temp: &TempDir) -> SecureGeoService {
    let mut storage = FileStorage::new(StoragePaths::new(temp.path()));
    storage.initialize().unwrap();
    let cipher = PayloadCipher::new(&[42u8; 32]).unwrap();
    SecureGeoService::open(storage, cipher).unwrap()
}

fn today_events(service: &SecureGeoService) -> Vec<AuditEventType> {
    let date = Utc::now().format("%Y-%m-%d").to_string();
    AuditRepository::new(service.files())
        .read_events(&date)
        .unwrap()
        .into_iter()
        .map(|event| event.event_type)
        .collect()
}

#[test]
fn internal_record_is_read_by_matrix_and_audited() {
    let temp = TempDir::new().unwrap();
    let service = open_service(&temp);
    let admin = Requester::new("admin-1", Role::Admin);

    let payload = json!({
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [10.0, 20.0]}, "properties": {"name": "well"}}
        ]
    });
    let summary = service
        .store_geo_data(
            "village-7",
            payload.clone(),
            StoreOptions {
                security_level: SecurityLevel::Internal,
                requester: Some(admin.clone()),
                ..StoreOptions::default()
            },
        )
        .unwrap();
    assert_eq!(summary.revision, 1);
    assert_eq!(summary.metadata.total_features, 1);

    let surveyor = Requester::new("surveyor-1", Role::Surveyor);
    let view = service
        .get_geo_data(
            "village-7",
            &surveyor,
            GetOptions {
                log_access: false,
                ..GetOptions::default()
            },
        )
        .unwrap();
    assert_eq!(view.data, payload);

    let viewer = Requester::new("viewer-1", Role::Viewer);
    let denied = service.get_geo_data("village-7", &viewer, GetOptions::default());
    assert!(matches!(denied, Err(GeoError::PermissionDenied(_))));

    service
        .get_geo_data("village-7", &admin, GetOptions::default())
        .unwrap();

    let trail = service
        .get_audit_log("village-7", &admin, Default::default())
        .unwrap();
    let actions: Vec<AuditAction> = trail.iter().map(|entry| entry.action).collect();
    assert_eq!(actions, vec![AuditAction::Created, AuditAction::Accessed]);
    assert_eq!(trail[1].user_id, "admin-1");

    let archived = today_events(&service);
    assert!(archived.contains(&AuditEventType::GeoDataCreated));
    assert!(archived.contains(&AuditEventType::PermissionDenied));
    assert_eq!(
        archived
            .iter()
            .filter(|t| **t == AuditEventType::GeoDataAccessed)
            .count(),
        1
    );
}

#[test]
fn ndjson_import_then_delete() {
    let temp = TempDir::new().unwrap();
    let service = open_service(&temp);
    let manager = Requester::new("manager-1", Role::Manager);

    let source = temp.path().join("imports").join("survey.ndjson");
    std::fs::write(
        &source,
        concat!(
            "{\"type\":\"Feature\",\"geometry\":null,\"properties\":{\"id\":1}}\n",
            "{\"type\":\"Feature\",\"geometry\":null,\"properties\":{\"id\":2}}\n",
            "\n",
            "{\"type\":\"Feature\",\"geometry\":null,\"properties\":{\"id\":3}}\n",
        ),
    )
    .unwrap();

    let imported = service
        .import_from_file(
            &source,
            "survey-2026",
            ImportOptions {
                remove_original: true,
                requester: Some(manager.clone()),
                ..ImportOptions::default()
            },
        )
        .unwrap();
    assert_eq!(imported.record.metadata.total_features, 3);
    assert_eq!(imported.record.security_level, SecurityLevel::Confidential);
    assert!(imported.source_removed);
    assert!(!source.exists());

    let view = service
        .get_geo_data("survey-2026", &manager, GetOptions::default())
        .unwrap();
    assert_eq!(view.data["type"], "FeatureCollection");
    assert_eq!(view.data["features"].as_array().unwrap().len(), 3);

    let refused = service.delete_geo_data("survey-2026", &manager, DeleteOptions::default());
    assert!(matches!(refused, Err(GeoError::PermissionDenied(_))));

    let admin = Requester::new("admin-1", Role::Admin);
    let removed = service
        .delete_geo_data("survey-2026", &admin, DeleteOptions::default())
        .unwrap();
    assert_eq!(removed.project_id, "survey-2026");

    let gone = service.get_geo_data("survey-2026", &admin, GetOptions::default());
    assert!(matches!(gone, Err(GeoError::NotFound(_))));
    assert!(today_events(&service).contains(&AuditEventType::GeoDataDeleted));
}

#[test]
fn records_survive_reopening_the_data_directory() {
    let temp = TempDir::new().unwrap();
    let admin = Requester::new("admin-1", Role::Admin);

    {
        let service = open_service(&temp);
        service
            .store_geo_data(
                "reopen",
                json!({"type": "FeatureCollection", "features": []}),
                StoreOptions::default(),
            )
            .unwrap();
    }

    let service = open_service(&temp);
    let view = service
        .get_geo_data(
            "reopen",
            &admin,
            GetOptions {
                log_access: false,
                ..GetOptions::default()
            },
        )
        .unwrap();
    assert_eq!(view.revision, 1);
    assert_eq!(view.data["features"], json!([]));
}
