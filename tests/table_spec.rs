mod common;

use std::collections::HashMap;

use chrono::NaiveDate;
use common::{people, DbfBuilder, ACTIVE, DELETED};
use dbf_reader::dbf::codec::codepages::CP437;
use dbf_reader::{
    DbfError, DefaultBuilder, LoadedTable, MapBuilder, PairsBuilder, Record, Table, TableOptions,
    Value,
};
use encoding_rs::{WINDOWS_1251, WINDOWS_1252};
use tempfile::TempDir;

fn open_people() -> (TempDir, Table) {
    let dir = TempDir::new().expect("temp dir");
    let path = people().write(dir.path(), "people.dbf");
    let table = Table::open(&path).expect("open people.dbf");
    (dir, table)
}

fn collect<I: Iterator<Item = dbf_reader::Result<Record>>>(iter: I) -> Vec<Record> {
    iter.map(|r| r.expect("record ok")).collect()
}

#[test]
fn active_records_are_decoded_in_order() {
    let (_dir, table) = open_people();
    let records = collect(table.iter());

    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["NAME"], Value::Text("Alice".into()));
    assert_eq!(records[0]["AGE"], Value::Integer(34));
    assert_eq!(
        records[0]["BORN"],
        Value::Date(NaiveDate::from_ymd_opt(1990, 1, 15).unwrap())
    );
    assert_eq!(records[0]["ACTIVE"], Value::Bool(true));

    assert_eq!(records[1]["NAME"], Value::Text("Carol".into()));
    assert_eq!(records[1]["ACTIVE"], Value::Null);

    assert_eq!(records[2]["AGE"], Value::Null);
    assert_eq!(records[2]["BORN"], Value::Null);
    assert_eq!(
        records[2].names().collect::<Vec<_>>(),
        vec!["NAME", "AGE", "BORN", "ACTIVE"]
    );
}

#[test]
fn deleted_records_are_served_separately() {
    let (_dir, table) = open_people();
    let deleted = collect(table.deleted().stream());
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0]["NAME"], Value::Text("Bob".into()));
    assert_eq!(table.deleted().len().unwrap(), 1);
}

#[test]
fn header_metadata_is_exposed() {
    let dir = TempDir::new().unwrap();
    let path = people().date(24, 3, 9).write(dir.path(), "People.dbf");
    let table = Table::open(&path).unwrap();

    assert_eq!(table.name(), "people");
    assert_eq!(table.date(), NaiveDate::from_ymd_opt(2024, 3, 9));
    assert_eq!(table.header().num_records, 4);
    assert_eq!(table.header().record_len, 23);
    assert_eq!(table.header().header_len, 32 + 4 * 32 + 1);
    assert_eq!(table.encoding(), WINDOWS_1252);
    assert_eq!(
        table.field_names().collect::<Vec<_>>(),
        vec!["NAME", "AGE", "BORN", "ACTIVE"]
    );
    assert_eq!(table.fields()[1].type_code, 'N');
    assert_eq!(table.fields()[1].length, 3);
    assert!(table.memo_path().is_none());
    assert!(!table.is_loaded());
}

#[test]
fn header_year_uses_century_window() {
    let dir = TempDir::new().unwrap();
    let path = people().date(80, 1, 1).write(dir.path(), "old.dbf");
    assert_eq!(Table::open(&path).unwrap().date(), NaiveDate::from_ymd_opt(1980, 1, 1));

    let path = people().date(79, 1, 1).write(dir.path(), "new.dbf");
    assert_eq!(Table::open(&path).unwrap().date(), NaiveDate::from_ymd_opt(2079, 1, 1));
}

#[test]
fn invalid_header_date_does_not_prevent_opening() {
    let dir = TempDir::new().unwrap();
    let path = people().date(0, 0, 0).write(dir.path(), "undated.dbf");
    let table = Table::open(&path).unwrap();
    assert_eq!(table.date(), None);
    assert_eq!(table.len().unwrap(), 3);
}

#[test]
fn loaded_and_unloaded_iteration_agree() {
    let (_dir, mut table) = open_people();
    let streamed = collect(table.iter());
    let streamed_deleted = collect(table.deleted().iter());

    table.load().unwrap();
    assert!(table.is_loaded());
    assert_eq!(collect(table.iter()), streamed);
    assert_eq!(collect(table.deleted().iter()), streamed_deleted);
    assert_eq!(table.records().get(1), streamed.get(1));
    assert_eq!(table.len().unwrap(), 3);

    table.unload();
    assert!(!table.is_loaded());
    assert!(table.records().get(0).is_none());
    assert_eq!(collect(table.iter()), streamed);
}

#[test]
fn load_option_loads_on_open() {
    let dir = TempDir::new().unwrap();
    let path = people().write(dir.path(), "people.dbf");
    let table = Table::open_with(&path, TableOptions::default().load(true), DefaultBuilder).unwrap();
    assert!(table.is_loaded());
    assert_eq!(table.records().as_slice().map(<[Record]>::len), Some(3));
    assert_eq!(table.deleted().as_slice().map(<[Record]>::len), Some(1));
}

#[test]
fn skip_count_matches_decode_count_and_markers() {
    let markers = [ACTIVE, DELETED, DELETED, ACTIVE, ACTIVE, DELETED, ACTIVE];
    let mut builder = DbfBuilder::new().field("N", 'N', 4, 0);
    for (i, marker) in markers.iter().enumerate() {
        builder = builder.marked(*marker, &[i.to_string().as_bytes()]);
    }
    let dir = TempDir::new().unwrap();
    let table = Table::open(builder.write(dir.path(), "markers.dbf")).unwrap();

    let active_markers = markers.iter().filter(|&&m| m == ACTIVE).count();
    assert_eq!(table.len().unwrap(), active_markers);
    assert_eq!(table.records().stream().count(), active_markers);
    assert_eq!(
        table.deleted().len().unwrap() + table.len().unwrap(),
        markers.len()
    );
}

#[test]
fn active_and_deleted_never_overlap() {
    let dir = TempDir::new().unwrap();
    let builder = DbfBuilder::new()
        .field("ID", 'N', 3, 0)
        .record(&[b"1"])
        .deleted(&[b"2"])
        .record(&[b"3"])
        .deleted(&[b"4"]);
    let table = Table::open(builder.write(dir.path(), "ids.dbf")).unwrap();

    let ids = |records: Vec<Record>| -> Vec<i64> {
        records.iter().filter_map(|r| r["ID"].as_i64()).collect()
    };
    let active = ids(collect(table.records().stream()));
    let deleted = ids(collect(table.deleted().stream()));
    assert_eq!(active, vec![1, 3]);
    assert_eq!(deleted, vec![2, 4]);
}

#[test]
fn end_of_data_marker_stops_the_scan() {
    let dir = TempDir::new().unwrap();
    let builder = people().trailing(b" garbage that is never read");
    let table = Table::open(builder.write(dir.path(), "people.dbf")).unwrap();
    assert_eq!(table.len().unwrap(), 3);
    assert_eq!(collect(table.iter()).len(), 3);
}

#[test]
fn records_start_at_declared_header_length() {
    let dir = TempDir::new().unwrap();
    let builder = DbfBuilder::new()
        .field("ID", 'N', 3, 0)
        .header_padding(263)
        .record(&[b"1"])
        .record(&[b"2"]);
    let table = Table::open(builder.write(dir.path(), "vfp.dbf")).unwrap();

    assert_eq!(table.header().header_len, 32 + 32 + 1 + 263);
    let ids: Vec<Value> = collect(table.iter())
        .into_iter()
        .map(|r| r["ID"].clone())
        .collect();
    assert_eq!(ids, vec![Value::Integer(1), Value::Integer(2)]);
    assert_eq!(table.len().unwrap(), 2);
}

#[test]
fn truncated_last_record_fails_count_and_decode_alike() {
    let dir = TempDir::new().unwrap();
    let builder = DbfBuilder::new()
        .field("ID", 'N', 3, 0)
        .record(&[b"1"])
        .raw_record(ACTIVE, b"2".to_vec())
        .without_terminator();
    let table = Table::open(builder.write(dir.path(), "short.dbf")).unwrap();

    let is_eof = |err: &DbfError| {
        matches!(err, DbfError::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof)
    };
    assert!(is_eof(&table.len().unwrap_err()));
    assert!(is_eof(&table.deleted().len().unwrap_err()));

    let mut stream = table.records().stream();
    assert_eq!(stream.next().unwrap().unwrap()["ID"], Value::Integer(1));
    assert!(is_eof(&stream.next().unwrap().unwrap_err()));
    assert!(stream.next().is_none());
}

#[test]
fn physical_end_of_file_stops_the_scan() {
    let dir = TempDir::new().unwrap();
    let table = Table::open(people().without_terminator().write(dir.path(), "people.dbf")).unwrap();
    assert_eq!(table.len().unwrap(), 3);
    assert_eq!(table.deleted().len().unwrap(), 1);
}

#[test]
fn invalid_marker_aborts_the_traversal() {
    let dir = TempDir::new().unwrap();
    let builder = DbfBuilder::new()
        .field("ID", 'N', 3, 0)
        .record(&[b"1"])
        .marked(b'X', &[b"2"])
        .record(&[b"3"]);
    let table = Table::open(builder.write(dir.path(), "corrupt.dbf")).unwrap();

    let mut stream = table.records().stream();
    assert_eq!(stream.next().unwrap().unwrap()["ID"], Value::Integer(1));
    match stream.next() {
        Some(Err(err @ DbfError::InvalidRecordSeparator { byte: b'X', .. })) => {
            assert!(err.is_corrupt_stream());
        }
        other => panic!("expected invalid separator, got {:?}", other),
    }
    assert!(stream.next().is_none());

    assert!(table.len().unwrap_err().is_corrupt_stream());
}

#[test]
fn load_fails_on_corrupt_record_area() {
    let dir = TempDir::new().unwrap();
    let builder = DbfBuilder::new().field("ID", 'N', 3, 0).marked(0x00, &[b"1"]);
    let mut table = Table::open(builder.write(dir.path(), "corrupt.dbf")).unwrap();
    assert!(table.load().unwrap_err().is_corrupt_stream());
    assert!(!table.is_loaded());
}

#[test]
fn raw_mode_returns_unmodified_slots() {
    let dir = TempDir::new().unwrap();
    let path = people().write(dir.path(), "people.dbf");
    let table = Table::open_with(&path, TableOptions::default().raw(true), DefaultBuilder).unwrap();
    assert!(table.is_raw());

    let first = table.iter().next().unwrap().unwrap();
    assert_eq!(first["NAME"], Value::Bytes(b"Alice     ".to_vec()));
    assert_eq!(first["AGE"], Value::Bytes(b" 34".to_vec()));
    assert_eq!(first["BORN"], Value::Bytes(b"19900115".to_vec()));
    assert_eq!(first["ACTIVE"], Value::Bytes(b"T".to_vec()));
    for field in table.fields() {
        assert_eq!(first[field.name.as_str()].as_bytes().unwrap().len(), field.length as usize);
    }
}

#[test]
fn lower_names_option() {
    let dir = TempDir::new().unwrap();
    let path = people().write(dir.path(), "people.dbf");
    let table =
        Table::open_with(&path, TableOptions::default().lower_names(true), DefaultBuilder).unwrap();
    assert_eq!(
        table.field_names().collect::<Vec<_>>(),
        vec!["name", "age", "born", "active"]
    );
    let first = table.iter().next().unwrap().unwrap();
    assert_eq!(first["name"], Value::Text("Alice".into()));
}

#[test]
fn table_path_is_resolved_ignoring_case() {
    let dir = TempDir::new().unwrap();
    people().write(dir.path(), "PEOPLE.DBF");

    let table = Table::open(dir.path().join("people.dbf")).unwrap();
    assert_eq!(table.path(), dir.path().join("PEOPLE.DBF"));
    assert_eq!(table.name(), "people");

    let exact = TableOptions::default().ignore_case(false);
    let err = Table::open_with(dir.path().join("people.dbf"), exact, DefaultBuilder).unwrap_err();
    assert!(matches!(err, DbfError::MissingFile(_)));
}

#[test]
fn missing_table_is_reported() {
    let dir = TempDir::new().unwrap();
    let err = Table::open(dir.path().join("nowhere.dbf")).unwrap_err();
    assert!(err.is_missing_file());
    assert!(matches!(err, DbfError::MissingFile(path) if path.ends_with("nowhere.dbf")));
}

#[test]
fn encoding_follows_language_driver_unless_overridden() {
    let dir = TempDir::new().unwrap();
    let builder = DbfBuilder::new()
        .language_driver(0xc9)
        .field("CITY", 'C', 8, 0)
        .record(&[&[0xCC, 0xEE, 0xF1, 0xEA, 0xE2, 0xE0]]);
    let path = builder.write(dir.path(), "cities.dbf");

    let table = Table::open(&path).unwrap();
    assert_eq!(table.encoding(), WINDOWS_1251);
    assert_eq!(
        table.iter().next().unwrap().unwrap()["CITY"],
        Value::Text("Москва".into())
    );

    let latin = TableOptions::default().encoding(WINDOWS_1252);
    let table = Table::open_with(&path, latin, DefaultBuilder).unwrap();
    assert_eq!(table.encoding(), WINDOWS_1252);
    assert_eq!(
        table.iter().next().unwrap().unwrap()["CITY"],
        Value::Text("Ìîñêâà".into())
    );
}

#[test]
fn unknown_language_driver_falls_back() {
    let dir = TempDir::new().unwrap();
    let path = people().language_driver(0x05).write(dir.path(), "people.dbf");
    let table = Table::open(&path).unwrap();
    assert_eq!(table.encoding(), WINDOWS_1252);
}

#[test]
fn dos_language_drivers_decode_oem_text() {
    let dir = TempDir::new().unwrap();
    let path = DbfBuilder::new()
        .language_driver(0x01)
        .field("CITY", 'C', 8, 0)
        .record(&[b"Z\x81rich"])
        .write(dir.path(), "dos.dbf");

    let table = Table::open(&path).unwrap();
    assert_eq!(table.encoding(), CP437);
    assert_eq!(table.encoding().name(), "cp437");
    assert_eq!(
        table.iter().next().unwrap().unwrap()["CITY"],
        Value::Text("Zürich".into())
    );
}

#[test]
fn record_shape_comes_from_the_builder() {
    let dir = TempDir::new().unwrap();
    let path = people().write(dir.path(), "people.dbf");

    let maps = Table::open_with(&path, TableOptions::default(), MapBuilder).unwrap();
    let first: HashMap<String, Value> = maps.iter().next().unwrap().unwrap();
    assert_eq!(first["AGE"], Value::Integer(34));

    let pairs = Table::open_with(&path, TableOptions::default(), PairsBuilder).unwrap();
    let first = pairs.iter().next().unwrap().unwrap();
    assert_eq!(first[0], ("NAME".to_string(), Value::Text("Alice".into())));

    let names = Table::open_with(&path, TableOptions::default(), |fields: Vec<(String, Value)>| {
        fields
            .into_iter()
            .find(|(name, _)| name == "NAME")
            .and_then(|(_, value)| value.as_str().map(str::to_owned))
    })
    .unwrap();
    let all: Vec<Option<String>> = names.iter().map(|r| r.unwrap()).collect();
    assert_eq!(
        all,
        vec![Some("Alice".into()), Some("Carol".into()), Some("Dave".into())]
    );
}

#[test]
fn loaded_table_behaves_like_a_slice() {
    let dir = TempDir::new().unwrap();
    let path = people().write(dir.path(), "people.dbf");
    let table = LoadedTable::open(&path).unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(table[0]["NAME"], Value::Text("Alice".into()));
    assert_eq!(table.iter().filter(|r| r["ACTIVE"] == Value::Bool(true)).count(), 2);
    assert_eq!(table.deleted().len(), 1);
    assert!(table.table().is_loaded());
    assert_eq!(table.table().fields().len(), 4);
}

#[test]
fn concurrent_traversals_do_not_interfere() {
    let (_dir, table) = open_people();
    let mut a = table.records().stream();
    let mut b = table.records().stream();

    let a0 = a.next().unwrap().unwrap();
    let b0 = b.next().unwrap().unwrap();
    let b1 = b.next().unwrap().unwrap();
    let a1 = a.next().unwrap().unwrap();
    assert_eq!(a0, b0);
    assert_eq!(a1, b1);

    let expected = collect(table.iter());
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| collect(table.iter())))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn abandoned_iteration_leaves_the_table_usable() {
    let (_dir, table) = open_people();
    {
        let mut stream = table.records().stream();
        stream.next().unwrap().unwrap();
    }
    assert_eq!(table.iter().take(1).count(), 1);
    assert_eq!(table.len().unwrap(), 3);
}

#[test]
fn table_iterates_by_reference() {
    let (_dir, table) = open_people();
    let mut names = Vec::new();
    for record in &table {
        names.push(record.unwrap()["NAME"].clone());
    }
    assert_eq!(names.len(), 3);
    assert!(!table.is_empty().unwrap());
}
