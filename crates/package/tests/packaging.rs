//! End-to-end packaging tests
//!
//! Build packages in every output mode and read them back.

use calcpack_array::{BuildConfig, FormatFn};
use calcpack_core::{FormatResult, Record, Row, RowSchema, Value};
use calcpack_keys::AttributeRecord;
use calcpack_package::{
    archive_path, DataPackage, IndexResource, License, PackageError, PackageMetadata,
    PackageOptions, PackageReader, PackageRequest, PackageWriter, Resource, DATAPACKAGE_FILE,
    INDEX_FIELDS_KEY,
};
use serde_json::json;
use std::fs;
use tempfile::tempdir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn exchanges(n: u32) -> Vec<Record> {
    (0..n)
        .map(|i| {
            Record::fields([
                ("row", Value::from(n - i)),
                ("col", Value::from(i % 7)),
                ("amount", Value::from(i as f64 * 0.5)),
            ])
        })
        .collect()
}

fn activities() -> Vec<AttributeRecord> {
    [
        json!({"id": 1, "name": "electricity", "location": "DE", "unit": "kWh"}),
        json!({"id": 2, "name": "electricity", "location": "FR", "unit": "kWh"}),
        json!({"id": 3, "name": "steel", "location": "DE", "unit": "kg"}),
    ]
    .into_iter()
    .filter_map(|v| match v {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    })
    .collect()
}

fn request(name: &str) -> PackageRequest<'static> {
    PackageRequest::new(name)
        .with_resource(
            Resource::new("technosphere", "technosphere_matrix", exchanges(100))
                .with_expected_rows(100)
                .with_field("title", "Technosphere exchanges"),
        )
        .with_resource(Resource::new("biosphere", "biosphere_matrix", exchanges(40)))
        .with_index(
            IndexResource::new("activities", activities())
                .with_matrix("technosphere_matrix")
                .with_include(["unit"]),
        )
        .with_metadata(PackageMetadata::new().with_field("seed", 42))
}

#[test]
fn test_archive_roundtrip() {
    init_tracing();
    let dir = tempdir().unwrap();
    let options = PackageOptions::default().with_build(BuildConfig::for_testing());
    let output = PackageWriter::new(options)
        .package(Some(dir.path()), request("lca-db"))
        .unwrap();
    let path = output.path().unwrap();
    assert_eq!(path, archive_path(dir.path(), "lca-db"));

    let contents = PackageReader::open(path).unwrap();
    let manifest = &contents.datapackage;
    assert_eq!(manifest.name, "lca-db");
    assert_eq!(manifest.licenses, vec![License::pddl()]);
    assert_eq!(manifest.extra.get("seed"), Some(&json!(42)));
    assert_eq!(manifest.resources.len(), 3);

    let techno = contents.array("technosphere").unwrap();
    assert_eq!(techno.len(), 100);
    assert!(techno.is_sorted());
    assert_eq!(techno.rows()[0].row_value, 1);
    assert_eq!(contents.array("biosphere").unwrap().len(), 40);

    let index = contents.index("activities").unwrap();
    assert_eq!(
        serde_json::Value::Object(index[0].clone()),
        json!({"id": 1, "name": "electricity", "location": "DE", "unit": "kWh"})
    );
    let descriptor = manifest.resource("activities").unwrap();
    assert_eq!(
        descriptor.extra.get(INDEX_FIELDS_KEY),
        Some(&json!(["location", "name"]))
    );
    assert_eq!(descriptor.matrix.as_deref(), Some("technosphere_matrix"));
}

#[test]
fn test_resource_descriptor_keys() {
    let dir = tempdir().unwrap();
    PackageWriter::new(PackageOptions::directory())
        .package(Some(dir.path()), request("keys"))
        .unwrap();

    let raw: serde_json::Value =
        serde_json::from_slice(&fs::read(dir.path().join(DATAPACKAGE_FILE)).unwrap()).unwrap();
    let first = &raw["resources"][0];
    assert_eq!(first["format"], "npy");
    assert_eq!(first["mediatype"], "application/octet-stream");
    assert_eq!(first["profile"], "data-resource");
    assert_eq!(first["name"], "technosphere");
    assert_eq!(first["matrix"], "technosphere_matrix");
    assert_eq!(first["title"], "Technosphere exchanges");
    assert!(first["md5"].as_str().map(|s| s.len() == 32).unwrap_or(false));
    assert!(first["path"].as_str().unwrap().ends_with(".npy"));
    assert_eq!(raw["profile"], "data-package");
}

#[test]
fn test_second_build_conflicts_without_replace() {
    let dir = tempdir().unwrap();
    let first = PackageWriter::new(PackageOptions::default())
        .package(Some(dir.path()), request("twice"))
        .unwrap();
    let archive = first.path().unwrap().to_path_buf();
    let before = fs::read(&archive).unwrap();

    let err = PackageWriter::new(PackageOptions::default().with_replace(false))
        .package(Some(dir.path()), request("twice"))
        .unwrap_err();
    assert!(matches!(err, PackageError::Conflict(_)));
    assert_eq!(fs::read(&archive).unwrap(), before);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_too_many_rows_writes_nothing() {
    let dir = tempdir().unwrap();
    let request = PackageRequest::new("overflow").with_resource(
        Resource::new("flows", "technosphere_matrix", exchanges(200)).with_expected_rows(100),
    );
    let err = PackageWriter::new(PackageOptions::directory())
        .package(Some(dir.path()), request)
        .unwrap_err();
    match err {
        PackageError::Resource { resource, source } => {
            assert_eq!(resource, "flows");
            assert!(matches!(
                source,
                calcpack_array::ArrayError::TooManyRows { expected: 100 }
            ));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_custom_formatter() {
    // Records are (from, to, value) triples in a plain tuple
    let triples: Vec<Record> = vec![
        Record::tuple([3u32, 1u32, 7u32]),
        Record::tuple([1u32, 2u32, 5u32]),
    ];
    let formatter = FormatFn(
        |record: &Record, _schema: &RowSchema| -> FormatResult<Vec<Value>> {
            let get = |i: usize| match record {
                Record::Tuple(values) => values.get(i).cloned().unwrap_or(Value::Null),
                Record::Fields(_) => Value::Null,
            };
            let row = Row::new(0, 0, 0.0);
            let mut values = row.to_values();
            values[0] = get(0);
            values[1] = get(1);
            values[5] = get(2);
            values[6] = get(2);
            Ok(values)
        },
    );

    let contents = PackageWriter::new(PackageOptions::in_memory())
        .package(
            None,
            PackageRequest::new("custom")
                .with_resource(Resource::new("flows", "m", triples).with_formatter(formatter)),
        )
        .unwrap()
        .into_contents()
        .unwrap();

    let rows = contents.array("flows").unwrap().rows();
    assert_eq!((rows[0].row_value, rows[0].col_value, rows[0].amount), (1, 2, 5.0));
    assert_eq!((rows[1].row_value, rows[1].col_value, rows[1].amount), (3, 1, 7.0));
}

#[test]
fn test_non_unique_index_fails() {
    let duplicate: Vec<AttributeRecord> = [json!({"id": 1, "a": 1}), json!({"id": 2, "a": 1})]
        .into_iter()
        .filter_map(|v| match v {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();
    let err = PackageWriter::new(PackageOptions::in_memory())
        .package(
            None,
            PackageRequest::new("dup").with_index(IndexResource::new("things", duplicate)),
        )
        .unwrap_err();
    assert!(matches!(err, PackageError::Keys(_)));
}

#[test]
fn test_directory_manifest_parses() {
    let dir = tempdir().unwrap();
    PackageWriter::new(PackageOptions::directory())
        .package(Some(dir.path()), request("loose").with_id("0123"))
        .unwrap();
    let manifest =
        DataPackage::from_slice(&fs::read(dir.path().join(DATAPACKAGE_FILE)).unwrap()).unwrap();
    assert_eq!(manifest.id, "0123");
    assert!(manifest.created.ends_with('Z'));
}
