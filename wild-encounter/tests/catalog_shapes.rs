mod common;

use common::load_catalog;
use wild_encounter::{
    CountClass, EncounterCatalog, EncounterConfig, EncounterError, GroupCondition, GroupId,
    ToolKind,
};

#[test]
fn fixture_parses_with_expected_shapes() {
    let catalog = load_catalog();
    assert_eq!(catalog.groups.len(), 8);

    let horde = &catalog.groups[catalog.index_of(&GroupId::new("route1_horde")).unwrap()];
    assert_eq!(horde.count, CountClass::Horde);
    assert!(horde.tool.is_none());

    let tools: Vec<ToolKind> = catalog.groups.iter().filter_map(|group| group.tool).collect();
    assert_eq!(
        tools,
        vec![
            ToolKind::OldRod,
            ToolKind::GoodRod,
            ToolKind::SuperRod,
            ToolKind::RockSmash
        ]
    );
    let fishing = catalog.groups.iter().filter(|group| group.is_fishing()).count();
    assert_eq!(fishing, 3);

    let night = &catalog.groups[catalog
        .index_of(&GroupId::new("route1_night_double"))
        .unwrap()];
    assert_eq!(night.count, CountClass::Double);
    assert!(night
        .conditions
        .iter()
        .any(|condition| matches!(condition, GroupCondition::TimeOfDay { .. })));
}

#[test]
fn catalog_serialization_round_trips() {
    let catalog = load_catalog();
    let json = serde_json::to_string(&catalog).unwrap();
    let reparsed = EncounterCatalog::from_json(&json).unwrap();
    assert_eq!(catalog, reparsed);
}

#[test]
fn authoring_errors_name_the_group() {
    let zero_steps = r#"{ "groups": [{
        "id": "broken",
        "tables": [{ "species": "a", "level_range": [1, 2] }],
        "location": { "system_tag": "grass" },
        "average_steps": 0
    }] }"#;
    match EncounterCatalog::from_json(zero_steps).unwrap_err() {
        EncounterError::Catalog { group, .. } => assert_eq!(group, "broken"),
        other => panic!("unexpected error {other}"),
    }

    let inverted_levels = r#"{ "groups": [{
        "id": "inverted",
        "tables": [{ "species": "a", "level_range": [9, 2] }],
        "location": { "system_tag": "grass" },
        "average_steps": 10
    }] }"#;
    assert!(matches!(
        EncounterCatalog::from_json(inverted_levels),
        Err(EncounterError::Catalog { .. })
    ));

    let no_tables = r#"{ "groups": [{
        "id": "empty",
        "tables": [],
        "location": { "system_tag": "grass" },
        "average_steps": 10
    }] }"#;
    assert!(matches!(
        EncounterCatalog::from_json(no_tables),
        Err(EncounterError::Catalog { .. })
    ));

    assert!(matches!(
        EncounterCatalog::from_json("{ not json"),
        Err(EncounterError::Data(_))
    ));
}

#[test]
fn partial_config_keeps_defaults() {
    let cfg = EncounterConfig::from_json(r#"{ "fishing": { "super_rod": 0.9 } }"#).unwrap();
    assert!((cfg.fishing.super_rod - 0.9).abs() < 1e-9);
    assert_eq!(cfg.fishing.old_rod, EncounterConfig::default().fishing.old_rod);
    assert_eq!(cfg.horde_size, 5);

    assert!(matches!(
        EncounterConfig::from_json(r#"{ "fishing": { "old_rod": 1.5 } }"#),
        Err(EncounterError::Config(_))
    ));
}
