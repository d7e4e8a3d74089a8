//! 加载顺序合并的端到端测试
//!
//! 在临时目录中构造数据目录、模组目录和加载顺序文件，
//! 检查查找、解码和按优先级合并的整体行为。

mod common;

use esp_merger::extractors::SkillCategory;
use esp_merger::{
    merge_parallel, merge_sequential, pipeline, EspError, ExtractorRegistry, FormId, LoadOrder,
    MergeConfig, Plugin, Priority, RecordType,
};
use std::path::Path;

fn skill_name(store: &esp_merger::ResolvedRecordStore, form_id: u32) -> Option<String> {
    store
        .get(RecordType::Avif, FormId(form_id))
        .map(|resolved| resolved.record.name().to_string())
}

fn write_load_order(dir: &Path, lines: &str) -> std::path::PathBuf {
    common::write(dir, "loadorder.txt", lines.as_bytes())
}

#[test]
fn test_later_plugin_overrides_base() {
    let data = tempfile::tempdir().unwrap();
    let mods = tempfile::tempdir().unwrap();

    common::write(
        data.path(),
        "Base.esp",
        &common::plugin(&[common::group(b"AVIF", &[common::skill_tree(0xABC, "Alpha", &[])])]),
    );
    common::write(
        &mods.path().join("SomeMod"),
        "Mod.esp",
        &common::plugin(&[common::group(b"AVIF", &[common::skill_tree(0xABC, "Beta", &[0x58F7A])])]),
    );
    let load_order = write_load_order(data.path(), "Base.esp\nMod.esp\n");

    let config = MergeConfig {
        base_plugin: "Base.esp".to_string(),
        ..MergeConfig::default()
    };
    let (store, stats) = pipeline::run(&config, &load_order, data.path(), mods.path()).unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(skill_name(&store, 0xABC).as_deref(), Some("Beta"));

    let resolved = store.get(RecordType::Avif, FormId(0xABC)).unwrap();
    assert_eq!(resolved.plugin, "Mod.esp");
    assert_eq!(resolved.priority, Priority(2));

    let tree = resolved.record.as_skill_tree().unwrap();
    assert_eq!(tree.category, SkillCategory::Combat);
    assert_eq!(tree.perks.len(), 1);
    assert_eq!(tree.perks[0].perk_id, FormId(0x58F7A));
    assert_eq!(tree.perks[0].x_pos, Some(1.5));
    assert_eq!(tree.perks[0].y_pos, Some(2.5));

    assert_eq!(stats.plugins, 2);
    assert_eq!(stats.superseded, 1);
    println!("{}", stats);
}

#[test]
fn test_missing_plugins_are_reported_together() {
    let data = tempfile::tempdir().unwrap();
    let mods = tempfile::tempdir().unwrap();
    common::write(data.path(), "Skyrim.esm", &common::plugin(&[]));
    let load_order = write_load_order(data.path(), "Skyrim.esm\nB.esp\nA.esp\n");

    let err = pipeline::run(&MergeConfig::default(), &load_order, data.path(), mods.path()).unwrap_err();

    assert!(matches!(err, EspError::UnresolvedLoadOrderEntries { .. }));
    assert_eq!(
        err.to_string(),
        "Could not find the following plugins:\nA.esp\nB.esp"
    );
}

#[test]
fn test_parallel_and_sequential_agree() {
    let dir = tempfile::tempdir().unwrap();
    let mut plugins = Vec::new();

    // 三个插件各自覆盖一部分记录，同时包含 PERK
    for (index, name) in ["First.esp", "Second.esp", "Third.esp"].iter().enumerate() {
        let skills: Vec<_> = (0..4u32)
            .filter(|id| id % (index as u32 + 1) == 0)
            .map(|id| common::skill_tree(0x0100_0000 + id, &format!("{}{}", name, id), &[]))
            .collect();
        let perks = vec![common::perk(0x0200_0000, name, Some(0x0200_0001))];
        let path = common::write(
            dir.path(),
            name,
            &common::plugin(&[common::group(b"AVIF", &skills), common::group(b"PERK", &perks)]),
        );
        plugins.push(Plugin::new(*name, Priority(index as u32 + 1), path));
    }

    let registry = ExtractorRegistry::default();
    let (sequential, sequential_stats) = merge_sequential(&plugins, &registry).unwrap();
    let (parallel, parallel_stats) = merge_parallel(&plugins, &registry, None).unwrap();

    assert_eq!(sequential.sorted(), parallel.sorted());
    assert_eq!(sequential_stats.resolved, parallel_stats.resolved);

    // Third.esp 优先级最高
    let perk = parallel.get(RecordType::Perk, FormId(0x0200_0000)).unwrap();
    assert_eq!(perk.plugin, "Third.esp");
    assert_eq!(perk.record.as_perk().unwrap().next_perk, Some(FormId(0x0200_0001)));
    assert_eq!(skill_name(&parallel, 0x0100_0000).as_deref(), Some("Third.esp0"));
    assert_eq!(skill_name(&parallel, 0x0100_0002).as_deref(), Some("Second.esp2"));
    assert_eq!(skill_name(&parallel, 0x0100_0001).as_deref(), Some("First.esp1"));
}

#[test]
fn test_record_types_restricted_by_config() {
    let data = tempfile::tempdir().unwrap();
    let mods = tempfile::tempdir().unwrap();
    common::write(
        data.path(),
        "Skyrim.esm",
        &common::plugin(&[
            common::group(b"AVIF", &[common::skill_tree(0x10, "OneHanded", &[])]),
            common::group(b"PERK", &[common::perk(0x20, "Armsman", None)]),
        ]),
    );
    let load_order = write_load_order(data.path(), "Skyrim.esm\n");

    let config = MergeConfig::from_json(r#"{ "record_types": ["PERK"], "parallel": false }"#).unwrap();
    let (store, _) = pipeline::run(&config, &load_order, data.path(), mods.path()).unwrap();

    assert_eq!(store.count(RecordType::Perk), 1);
    assert_eq!(store.count(RecordType::Avif), 0);
}

#[test]
fn test_corrupt_plugin_fails_merge() {
    let data = tempfile::tempdir().unwrap();
    let mods = tempfile::tempdir().unwrap();
    common::write(data.path(), "Skyrim.esm", &common::plugin(&[]));

    // 组声明的大小超出文件
    let mut truncated = common::plugin(&[common::group(b"AVIF", &[common::skill_tree(0x1, "Cut", &[])])]);
    truncated.truncate(truncated.len() - 10);
    common::write(mods.path(), "Broken.esp", &truncated);

    let load_order = write_load_order(data.path(), "Skyrim.esm\nBroken.esp\n");
    let err = pipeline::run(&MergeConfig::default(), &load_order, data.path(), mods.path()).unwrap_err();

    assert!(matches!(err, EspError::TruncatedInput { .. }));
    assert_eq!(err.plugin(), Some("Broken.esp"));
}

#[test]
fn test_load_order_comments_and_priorities() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_load_order(dir.path(), "# managed by mod organizer\nSkyrim.esm\n\n#Off.esp\nOn.esp\n");

    let order = LoadOrder::from_file(&path).unwrap();
    assert_eq!(order.names_by_priority(), vec!["On.esp", "Skyrim.esm"]);
}
