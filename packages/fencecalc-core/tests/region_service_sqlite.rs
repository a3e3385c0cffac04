//! Region service over a file-backed SQLite database

use std::sync::Arc;

use fencecalc_core::features::catalog::standard::{params, region_types};
use fencecalc_core::{Catalog, ControlKind, FenceConfig, Overrides, RegionService, TieBreak};
use fencecalc_storage::{NewRegion, ParamValue, SqliteConfigStore};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn open(path: &std::path::Path, config: &FenceConfig) -> RegionService<SqliteConfigStore> {
    RegionService::new(
        Arc::new(SqliteConfigStore::open(path).unwrap()),
        Arc::new(Catalog::standard()),
        config,
    )
}

#[test]
fn test_state_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("projects").join("fence.db");
    let config = FenceConfig::default();

    let region = {
        let service = open(&path, &config);
        assert!(service.bootstrap().unwrap());
        let region = service
            .create_region(&NewRegion {
                project_id: 7,
                region_type: region_types::PROFLIST_FENCE_VER,
                description: "street side".into(),
                nr: 1,
            })
            .unwrap()
            .id;
        service
            .update_region(
                region,
                &Overrides::new()
                    .param(params::TOTAL_LENGTH, 42.5)
                    .param(params::PROFILE_SHEET_THICKNESS, 0.45)
                    .param(params::HSTICK_PAINT, 1.0)
                    .param(params::HSTICK_COLOR, 0x6c4e3c as f64),
            )
            .unwrap();
        region
    };

    let service = open(&path, &config);
    assert!(!service.bootstrap().unwrap());
    let view = service.view_region(region).unwrap();
    assert_eq!(view.description, "street side");
    assert_eq!(view.param(params::TOTAL_LENGTH).unwrap().value, ParamValue::new(42.5));
    assert_eq!(
        view.param(params::PROFILE_SHEET_THICKNESS).unwrap().value,
        ParamValue::new(0.45)
    );
    let rail_color = view.param(params::HSTICK_COLOR).unwrap();
    assert_eq!(rail_color.label.as_deref(), Some("Printech \"Wood\" 4201"));
    assert_eq!(
        view.param(params::TOTAL_LENGTH).unwrap().control.kind,
        ControlKind::NumericInput
    );
}

#[test]
fn test_delete_then_recreate_project_region() {
    let dir = tempdir().unwrap();
    let service = open(&dir.path().join("fence.db"), &FenceConfig::default());
    service.bootstrap().unwrap();

    let project = NewRegion {
        project_id: 3,
        region_type: region_types::PROJECT,
        description: String::new(),
        nr: 0,
    };
    let first = service.create_region(&project).unwrap().id;
    assert!(service.create_region(&project).unwrap_err().is_input());

    assert!(service.delete_region(first).unwrap());
    let second = service.create_region(&project).unwrap().id;
    assert_ne!(first, second);
}

#[test]
fn test_first_declared_tie_break_from_config() {
    let config = FenceConfig::from_yaml_str("version: 1\ntie_break: first_declared\n", "inline")
        .unwrap();
    assert_eq!(config.tie_break, TieBreak::FirstDeclared);

    let dir = tempdir().unwrap();
    let service = open(&dir.path().join("fence.db"), &config);
    service.bootstrap().unwrap();
    let region = service
        .create_region(&NewRegion {
            project_id: 1,
            region_type: region_types::KNX_PROFLIST_FENCE,
            description: String::new(),
            nr: 2,
        })
        .unwrap()
        .id;

    // undeclared step length falls back to the first declared value
    let view = service
        .update_region(region, &Overrides::new().param(params::COLUMN_STEP_LENGTH, 5.0))
        .unwrap();
    assert_eq!(
        view.param(params::COLUMN_STEP_LENGTH).unwrap().value,
        ParamValue::new(2.0)
    );
}

#[test]
fn test_unknown_param_override_is_rejected_without_writing() {
    let dir = tempdir().unwrap();
    let service = open(&dir.path().join("fence.db"), &FenceConfig::default());
    service.bootstrap().unwrap();
    let region = service
        .create_region(&NewRegion {
            project_id: 1,
            region_type: region_types::PROFLIST_FENCE_HOR,
            description: String::new(),
            nr: 1,
        })
        .unwrap()
        .id;
    let before = service.view_region(region).unwrap();

    // rails do not exist on a horizontal profile sheet fence
    let err = service
        .update_region(
            region,
            &Overrides::new()
                .param(params::TOTAL_HEIGHT, 2.0)
                .param(params::HSTICK_COUNT, 3.0),
        )
        .unwrap_err();
    assert!(err.is_input());
    assert_eq!(service.view_region(region).unwrap(), before);
}
