// ==========================================
// SettingsStore 集成测试
// ==========================================
// 测试目标: 配置加载/更新的规范化与持久化
// ==========================================

use field_service_agenda::config::SettingsStore;
use field_service_agenda::domain::settings::AppSettings;
use serde_json::json;
use tempfile::TempDir;

// ==========================================
// 测试辅助函数
// ==========================================

fn create_test_store() -> (TempDir, SettingsStore) {
    let dir = TempDir::new().expect("临时目录创建失败");
    let db_path = dir.path().join("test.db");
    let store = SettingsStore::new(&db_path.to_string_lossy()).expect("配置存储创建失败");
    (dir, store)
}

#[test]
fn test_first_load_seeds_defaults() {
    let (_dir, store) = create_test_store();
    let loaded = store.load().unwrap();
    assert_eq!(loaded, AppSettings::default());

    // 再次加载读到同样内容（已落库）
    let reloaded = store.load().unwrap();
    assert_eq!(reloaded, loaded);
}

#[test]
fn test_update_normalizes_and_persists() {
    let (_dir, store) = create_test_store();
    let updated = store
        .update(&json!({
            "agenda_capacity": {"1": {"mon": 12, "sat": -1}},
            "filiais": {"2": "  Nova Filial  "},
            "subject_groups": {"outros": [99]},
            "campo_desconhecido": true
        }))
        .unwrap();

    let week = updated.agenda_capacity.branches.get("1").unwrap();
    assert_eq!(week.mon, 12);
    assert_eq!(week.sat, 0); // 负数截到 0
    assert_eq!(week.tue, 5); // 未提供的保留默认
    assert_eq!(updated.branch_names.get("2").unwrap(), "Nova Filial");
    assert_eq!(updated.subject_groups.other, vec!["99"]);

    // 持久化：重新加载一致
    let reloaded = store.load().unwrap();
    assert_eq!(reloaded, updated);
}

#[test]
fn test_default_filter_ids_roundtrip() {
    let (_dir, store) = create_test_store();
    let updated = store
        .update(&json!({
            "default_filters": {"agenda": "filtro-x", "manutencoes": null}
        }))
        .unwrap();
    assert_eq!(updated.default_filters.agenda.as_deref(), Some("filtro-x"));
    assert!(updated.default_filters.maintenances.is_none());

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded.default_filters.agenda.as_deref(), Some("filtro-x"));
}
