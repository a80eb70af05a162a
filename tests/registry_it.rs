use std::path::PathBuf;

use plc_tag_engine::codec;
use plc_tag_engine::{
    catalog, import_vendor_rows, AddressGrammar, DataType, EngineConfig, JsonDirTagStore,
    ParsedAddress, TagDraft, TagErrorKind, TagRegistry, TagStore, Vendor,
};
use serde_json::json;
use uuid::Uuid;

fn temp_store_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("plc-tag-engine-{label}-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[tokio::test]
async fn tags_survive_a_reopen_of_the_json_store() {
    let dir = temp_store_dir("reopen");

    let tag = {
        let store = JsonDirTagStore::new(&dir);
        let mut registry = TagRegistry::open(store, EngineConfig::allen_bradley())
            .await
            .unwrap();
        let tag = registry
            .upsert(TagDraft::new("Program:Main.Motor[2].Run", DataType::Dint))
            .await
            .unwrap();
        registry.record_usage(&[tag.id], "seq-startup").await.unwrap();
        tag
    };

    let registry = TagRegistry::open(JsonDirTagStore::new(&dir), EngineConfig::allen_bradley())
        .await
        .unwrap();
    assert_eq!(registry.count_loaded(), 1);
    assert_eq!(registry.count_persisted().await.unwrap(), 1);
    let loaded = registry.get(tag.id).unwrap();
    assert!(loaded.usage.contains("seq-startup"));
    assert!(loaded.updated_at.is_some());
    assert_eq!(
        registry.scope_path_of(tag.id).map(|p| p.as_str()),
        Some("program:main.motor[2].run")
    );
    assert!(registry
        .is_duplicate(&TagDraft::new("motor[2].RUN", DataType::Dint).with_program("main")));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn corrupt_files_do_not_stop_the_load() {
    let dir = temp_store_dir("corrupt");
    let store = JsonDirTagStore::new(&dir);

    let good = Uuid::from_u128(0x10);
    let later = Uuid::from_u128(0x30);
    store
        .set(
            plc_tag_engine::TagId(good),
            json!({"id": good, "tagname": "Good", "datatype": "INT"}),
        )
        .await
        .unwrap();
    std::fs::write(dir.join(format!("{}.json", Uuid::from_u128(0x20))), "{ not json").unwrap();
    store
        .set(
            plc_tag_engine::TagId(later),
            json!({"id": later, "tagname": "Later", "datatype": "BOOL"}),
        )
        .await
        .unwrap();

    let registry = TagRegistry::open(store, EngineConfig::allen_bradley())
        .await
        .unwrap();
    assert_eq!(registry.count_loaded(), 2);
    assert_eq!(registry.count_persisted().await.unwrap(), 3);
    assert_eq!(registry.last_load().skipped, 1);
    assert!(registry.find_by_address("", "later").is_some());

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn shared_registry_serializes_concurrent_claims() {
    let registry = TagRegistry::open(
        plc_tag_engine::MemoryTagStore::new(),
        EngineConfig::allen_bradley(),
    )
    .await
    .unwrap()
    .shared();

    let mut handles = Vec::new();
    for i in 0..8 {
        let registry = registry.clone();
        let tagname = if i % 2 == 0 { "Contested" } else { "CONTESTED" };
        handles.push(tokio::spawn(async move {
            registry
                .lock()
                .await
                .upsert(TagDraft::new(tagname, DataType::Int))
                .await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(err) => assert_eq!(err.kind(), TagErrorKind::DuplicateAddress),
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(registry.lock().await.count_loaded(), 1);
}

#[tokio::test]
async fn m340_rows_import_with_vendor_type_names() {
    let store = plc_tag_engine::MemoryTagStore::new();
    let mut registry = TagRegistry::open(store, EngineConfig::m340())
        .await
        .unwrap();

    let rows: Vec<plc_tag_engine::usecase::import::VendorTagRow> = serde_json::from_value(json!([
        {"tagname": "Pump_On", "datatype": "EBOOL", "smpAddress": "%M100"},
        {"tagname": "Flow", "program": "SR1", "datatype": "REAL", "smpAddress": "%MF20"},
        {"tagname": "Level", "datatype": "INT", "smpAddress": "MW5"},
        {"tagname": "Tiny", "datatype": "SINT"},
    ]))
    .unwrap();

    let report = import_vendor_rows(&mut registry, rows).await;
    assert_eq!(report.accepted.len(), 2);
    assert_eq!(report.dropped, 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].rejection.kind, TagErrorKind::InvalidAddress);

    let flow = registry.find_by_address("sr1", "flow").unwrap();
    assert_eq!(
        catalog::translate_to_display(Vendor::SchneiderM340, flow.datatype),
        Some("REAL")
    );
}

#[test]
fn bit_suffix_of_an_address_drives_the_codec() {
    let grammar = AddressGrammar::for_vendor(Vendor::AllenBradleyCip, Default::default());
    let parsed = grammar.parse("Status.15").unwrap();
    assert!(matches!(parsed, ParsedAddress::UserTag(_)));
    let bit = u32::from(parsed.bit().unwrap());

    let raw = codec::write_bit(DataType::Int, 0, bit, true).unwrap();
    assert_eq!(raw, -32768);
    assert_eq!(codec::read_bit(DataType::Int, raw, bit).unwrap(), 1);
    assert!(codec::write_bit(DataType::Sint, 0, bit, true).is_err());

    assert_eq!(codec::clamp(DataType::Int, Some(bit), 7.0), 1.0);
    assert_eq!(codec::clamp(DataType::Int, None, 40000.0), 32767.0);
}
