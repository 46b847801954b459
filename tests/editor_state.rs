//! Integration tests for the editor state machine

use mailsmith::template::{CustomTypeDraft, TemplateVariable};
use mailsmith::{
    is_valid_persisted_data, EditorState, ExportFormat, PersistedData, StylePatch, StyleToken,
};
use pretty_assertions::assert_eq;

fn assert_invariants(editor: &EditorState) {
    for template in editor.templates() {
        assert!(!template.variants().is_empty());
        let active_id = &editor.active_variant_ids()[template.template_type()];
        let active = template
            .variant(active_id)
            .unwrap_or_else(|| panic!("{} has dangling active id", template.template_type()));
        assert_eq!(template.subject(), active.subject);
        assert_eq!(template.body_html(), active.body_html);
    }
    let snapshot = editor.get_persisted_data().to_value().unwrap();
    assert!(is_valid_persisted_data(&snapshot));
}

/// The six collections that a snapshot replaces
fn collections(data: &PersistedData) -> PersistedData {
    PersistedData {
        last_modified: String::new(),
        ..data.clone()
    }
}

#[test]
fn test_create_variant_three_times() {
    let (info, _) = CustomTypeDraft::new("Receipt").build().unwrap();
    let mut editor = EditorState::default();
    editor.add_custom_template_type(info, vec![]).unwrap();
    assert_eq!(editor.current_template().unwrap().variants().len(), 1);

    let ids: Vec<String> = (0..3).map(|_| editor.create_variant().unwrap()).collect();

    let template = editor.current_template().unwrap();
    let names: Vec<&str> = template.variants().iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["Default", "Variant 2", "Variant 3", "Variant 4"]);
    assert_eq!(editor.active_variant_id(), Some(ids[2].as_str()));
    assert_invariants(&editor);
}

#[test]
fn test_add_then_delete_custom_type_restores_state() {
    let mut editor = EditorState::default();
    let before = collections(&editor.get_persisted_data());
    let types_before = editor.all_template_types().len();
    let vars_before = editor.all_variables().len();

    let (info, _) = CustomTypeDraft::new("Welcome").build().unwrap();
    assert_eq!(info.id, "custom-welcome");
    editor.add_custom_template_type(info, vec![]).unwrap();
    assert_eq!(editor.selected_type(), "custom-welcome");

    editor.delete_custom_template_type("custom-welcome").unwrap();
    assert_eq!(collections(&editor.get_persisted_data()), before);
    assert_eq!(editor.all_template_types().len(), types_before);
    assert_eq!(editor.all_variables().len(), vars_before);
    assert_eq!(editor.selected_type(), "confirm-signup");
}

#[test]
fn test_delete_custom_type_detaches_shared_variables() {
    let mut editor = EditorState::default();
    let (first, first_vars) = CustomTypeDraft::new("First")
        .with_variable("Only", "")
        .build()
        .unwrap();
    editor.add_custom_template_type(first, first_vars).unwrap();

    let (second, _) = CustomTypeDraft::new("Second").build().unwrap();
    let shared = TemplateVariable::new(
        "Shared",
        "{{Shared}}",
        "Shared",
        vec!["custom-first".to_string(), "custom-second".to_string()],
    );
    editor.add_custom_template_type(second, vec![shared]).unwrap();

    editor.delete_custom_template_type("custom-first").unwrap();
    let custom: Vec<&TemplateVariable> = editor.variables().custom().iter().collect();
    assert_eq!(custom.len(), 1);
    assert_eq!(custom[0].name, "Shared");
    assert_eq!(custom[0].available_for, vec!["custom-second".to_string()]);
}

#[test]
fn test_snapshot_roundtrip() {
    let mut editor = EditorState::default();
    editor.update_style(&StylePatch::new().with(StyleToken::BrandName, "Acme"));
    editor.create_variant();
    editor.set_subject("Changed");
    editor.edit_global();
    editor.set_body_html("<div><!-- BODY_CONTENT --></div>");

    let snapshot = editor.get_persisted_data();
    let mut restored = EditorState::default();
    restored.apply_persisted_data(snapshot.clone());
    assert_eq!(collections(&restored.get_persisted_data()), collections(&snapshot));

    editor.apply_persisted_data(snapshot.clone());
    assert_eq!(collections(&editor.get_persisted_data()), collections(&snapshot));
}

#[test]
fn test_snapshot_is_detached_from_live_state() {
    let mut editor = EditorState::default();
    let snapshot = editor.get_persisted_data();
    editor.set_subject("After snapshot");
    assert_ne!(snapshot.templates[0].subject(), "After snapshot");
}

#[test]
fn test_import_missing_template_style_rejected() {
    let mut editor = EditorState::default();
    editor.set_subject("Local edit");
    let before = collections(&editor.get_persisted_data());

    let mut value = EditorState::default().get_persisted_data().to_value().unwrap();
    value.as_object_mut().unwrap().remove("templateStyle");
    assert!(!is_valid_persisted_data(&value));

    let result = editor.import_json(&value.to_string());
    assert!(result.is_err());
    assert_eq!(collections(&editor.get_persisted_data()), before);
}

#[test]
fn test_invariants_hold_across_operation_sequence() {
    let mut editor = EditorState::default();
    for type_id in ["confirm-signup", "magic-link"] {
        editor.change_type(type_id).unwrap();
        let a = editor.create_variant().unwrap();
        assert_invariants(&editor);
        let b = editor.duplicate_variant(&a).unwrap();
        assert_invariants(&editor);
        editor.set_body_html(format!("<p>{}</p>", b));
        assert_invariants(&editor);
        assert!(editor.delete_variant(&b));
        assert_eq!(editor.active_variant_id(), Some("default"));
        assert_invariants(&editor);
        editor.select_variant(&a);
        assert!(editor.delete_variant("default"));
        assert_invariants(&editor);
        while editor.current_template().unwrap().variants().len() > 1 {
            let id = editor.current_template().unwrap().variants()[0].id.clone();
            assert!(editor.delete_variant(&id));
            assert_invariants(&editor);
        }
        let last = editor.active_variant_id().unwrap().to_string();
        assert!(!editor.delete_variant(&last));
        assert_invariants(&editor);
    }
}

fn custom_type_json(id: &str, label: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "label": label,
        "description": "Imported",
        "icon": "mail",
        "variables": [],
        "category": "custom",
        "isBuiltIn": false
    })
}

#[test]
fn test_import_reconciles_custom_types_with_catalog() {
    let mut value = EditorState::default().get_persisted_data().to_value().unwrap();
    value["customTemplateTypes"] = serde_json::json!([
        custom_type_json("magic-link", "Shadow"),
        custom_type_json("custom-orphan", "Orphan"),
        custom_type_json("custom-orphan", "Orphan again"),
    ]);
    value["customVariables"] = serde_json::json!([
        { "name": "Gone", "syntax": "{{ .Gone }}", "description": "", "availableFor": ["custom-ghost"] },
        { "name": "Kept", "syntax": "{{ .Kept }}", "description": "", "availableFor": ["custom-orphan", "custom-ghost"] },
    ]);

    let mut editor = EditorState::default();
    editor.import_json(&value.to_string()).unwrap();

    let mut ids: Vec<&str> = editor.catalog().ids().collect();
    let count = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), count);
    assert_eq!(editor.catalog().custom().len(), 1);
    assert_eq!(editor.catalog().get("magic-link").map(|t| t.is_built_in), Some(true));

    let orphan = editor.template("custom-orphan").expect("starter template synthesized");
    assert_eq!(orphan.subject(), "Orphan");
    assert_eq!(editor.active_variant_ids()["custom-orphan"], "default");

    let names: Vec<&str> = editor.variables().custom().iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["Kept"]);
    assert_eq!(
        editor.variables().custom()[0].available_for,
        vec!["custom-orphan".to_string()]
    );

    editor.change_type("custom-orphan").unwrap();
    assert!(editor.create_variant().is_some());
    assert_eq!(editor.current_template().unwrap().variants().len(), 2);
    assert_invariants(&editor);
}

#[test]
fn test_import_restores_missing_builtin_template() {
    let mut value = EditorState::default().get_persisted_data().to_value().unwrap();
    let templates = value["templates"].as_array_mut().unwrap();
    templates.retain(|t| t["type"] != "confirm-signup");
    let dupe = templates[0].clone();
    templates.push(dupe);

    let mut editor = EditorState::default();
    editor.import_json(&value.to_string()).unwrap();

    assert_eq!(editor.templates().len(), 6);
    assert_eq!(editor.selected_type(), "confirm-signup");
    assert_eq!(editor.current_template().unwrap().variants().len(), 3);
    assert_invariants(&editor);
}

#[test]
fn test_import_keeps_export_paths_inside_output_dir() {
    let mut value = EditorState::default().get_persisted_data().to_value().unwrap();
    value["templates"][0]["variants"][0]["id"] = serde_json::json!("../../../tmp/pwned");
    value["activeVariantIds"]["confirm-signup"] = serde_json::json!("../../../tmp/pwned");

    let mut editor = EditorState::default();
    editor.import_json(&value.to_string()).unwrap();

    let active = editor.active_variant_ids()["confirm-signup"].clone();
    assert!(active.starts_with("variant-"));
    assert_eq!(editor.template("confirm-signup").unwrap().variants()[0].id, active);

    let entries = editor.export_all(ExportFormat::Html, None).unwrap();
    for entry in &entries {
        let path = std::path::Path::new(&entry.path);
        assert!(path.is_relative(), "{}", entry.path);
        assert!(
            path.components().all(|c| matches!(c, std::path::Component::Normal(_))),
            "{}",
            entry.path
        );
    }
    assert_invariants(&editor);
}

#[test]
fn test_apply_selects_initial_type_when_selection_vanishes() {
    let (info, _) = CustomTypeDraft::new("Receipt").build().unwrap();
    let mut editor = EditorState::default();
    editor.add_custom_template_type(info, vec![]).unwrap();
    assert_eq!(editor.selected_type(), "custom-receipt");

    editor.apply_persisted_data(EditorState::default().get_persisted_data());
    assert_eq!(editor.selected_type(), "confirm-signup");
    assert!(!editor.is_editing_global());
}
