use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use uconfig::document::{META_COLUMN_DELIMITER, META_FILENAME, META_ROW_DELIMITER};
use uconfig::{
    Codec, Csv, Delimiter, Document, Entry, EntryObject, EntryRef, Error, Format, Ini, Json, Key,
    KeyValue, Table, TableOptions, Value, Xml,
};

const INI_FIXTURE: &str = "; global settings\n\
[database]\n\
host=db.local ; primary\n\
port=5432\n\
# replicas below\n\
\n\
[cache]\n\
enabled=true\n\
ttl=300\n";

const TABLE_FIXTURE: &str = "# device mount type\n\
/dev/sda1\t/\text4\n\
/dev/sda2\t/home\text4\n\
tmpfs\t/tmp\ttmpfs\n";

const JSON_FIXTURE: &str = r#"{
    "name": "service",
    "version": 3,
    "ratio": 0.75,
    "enabled": false,
    "tags": ["a", "b", "c"],
    "limits": {
        "cpu": 2,
        "memory": "512M",
        "nested": [{"x": 1}, {"x": 2}]
    }
}
"#;

const XML_FIXTURE: &str = r#"<?xml version="1.0"?>
<settings version="2">
  <!-- network -->
  <network>
    <host name="alpha" port="80"/>
    <host name="beta" port="81"/>
  </network>
  <title>Main settings</title>
</settings>
"#;

fn fixture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Reads `name`, writes it back to a second file, reads that, and checks
/// that both trees are identical.
fn assert_round_trip<C: Codec>(name: &str, contents: &str) -> Document {
    let dir = TempDir::new().unwrap();
    let source = fixture(&dir, name, contents);
    let copy = dir.path().join(format!("copy-{}", name));

    let mut first = Document::new();
    let warnings = C::read(&source, &mut first).unwrap();
    assert!(warnings.is_empty(), "{:?}", warnings);
    C::write(&copy, &first).unwrap();

    let mut second = Document::new();
    C::read(&copy, &mut second).unwrap();
    assert!(first.root().subentry_count() > 0, "{} parsed empty", name);
    assert_eq!(second.root().node_count(), first.root().node_count());
    assert_eq!(second.root().to_entry(), first.root().to_entry());
    first.tree().validate().unwrap();
    first
}

fn names(entry: EntryRef<'_>) -> Vec<String> {
    entry
        .subentries()
        .filter_map(|e| e.name().map(|n| String::from_utf8_lossy(n).into_owned()))
        .collect()
}

#[test]
fn test_key_value_round_trip() {
    let doc = assert_round_trip::<KeyValue>("app.conf", "a=1\n# comment\nraw line\nb=x #tail\n");
    assert_eq!(names(doc.root()), vec!["a", "b"]);
    assert_eq!(doc.format(), Some(Format::KeyValue));
}

#[test]
fn test_ini_round_trip() {
    let doc = assert_round_trip::<Ini>("app.ini", INI_FIXTURE);
    let root = doc.root();
    // preamble, database, cache
    assert_eq!(root.subentry_count(), 3);
    assert_eq!(names(root), vec!["database", "cache"]);

    let database = doc.get_entry(b"database", None).unwrap();
    assert_eq!(database.subentry_count(), 3);
    let port = doc.get_entry(b"port", Some(b"database")).unwrap();
    assert_eq!(port.keys()[0].value, Value::Raw(b"5432".to_vec()));
}

#[test]
fn test_table_round_trip() {
    let dir = TempDir::new().unwrap();
    let source = fixture(&dir, "fstab.tsv", TABLE_FIXTURE);
    let options = TableOptions::new().with_column_delimiter(Delimiter::Tab);

    let mut doc = Document::new();
    Table::read_with(&source, &mut doc, &options).unwrap();
    let root = doc.root();
    assert_eq!(names(root), vec!["Comment", "Table"]);
    let table = root.subentry(1).unwrap();
    assert_eq!(table.subentry_count(), 3);
    assert!(table.subentries().all(|row| row.key_count() == 3));

    // written without options: the tab comes back from metadata
    let copy = dir.path().join("copy.tsv");
    Table::write(&copy, &doc).unwrap();
    assert_eq!(fs::read_to_string(&copy).unwrap(), TABLE_FIXTURE);
}

#[test]
fn test_table_metadata() {
    let dir = TempDir::new().unwrap();
    let source = fixture(&dir, "data.txt", "a;b\n");
    let mut doc = Document::new();
    Table::read_with(
        &source,
        &mut doc,
        &TableOptions::new().with_column_delimiter(Delimiter::Semicolon),
    )
    .unwrap();

    assert_eq!(doc.format(), Some(Format::Table));
    assert_eq!(
        doc.metadata_value(META_COLUMN_DELIMITER),
        Some(&Value::Chars(b";".to_vec()))
    );
    assert_eq!(
        doc.metadata_value(META_ROW_DELIMITER),
        Some(&Value::Chars(b"\n".to_vec()))
    );
    assert_eq!(
        doc.metadata_value(META_FILENAME).and_then(Value::as_str),
        Some(source.to_string_lossy().as_ref())
    );
}

#[test]
fn test_csv_round_trip() {
    let doc = assert_round_trip::<Csv>(
        "hosts.csv",
        "host,port,note\nalpha,80,\"web, public\"\nbeta,81,internal\n",
    );
    let beta = doc.get_entry(b"beta", None).unwrap();
    let fields = beta.key_map();
    assert_eq!(fields[&b"port"[..]], &Value::Chars(b"81".to_vec()));
    let alpha = doc.get_entry(b"alpha", None).unwrap();
    assert_eq!(
        alpha.search_key(b"note").unwrap().value,
        Value::Chars(b"web, public".to_vec())
    );
}

#[test]
fn test_json_round_trip() {
    let doc = assert_round_trip::<Json>("service.json", JSON_FIXTURE);
    let object = doc.root().subentry(0).unwrap();
    assert_eq!(
        object.search_key(b"version").unwrap().value,
        Value::Integer(3)
    );
    assert_eq!(
        object.search_key(b"ratio").unwrap().value,
        Value::Double(0.75)
    );
    assert_eq!(
        object.search_key(b"enabled").unwrap().value,
        Value::Bool(false)
    );

    let nested = doc.get_entry(b"nested", Some(b"limits")).unwrap();
    assert_eq!(nested.subentry_count(), 2);
    assert_eq!(
        nested.subentry(1).unwrap().keys()[0].value,
        Value::Integer(2)
    );
}

#[test]
fn test_xml_round_trip() {
    let doc = assert_round_trip::<Xml>("settings.xml", XML_FIXTURE);
    let network = doc.get_entry(b"network", Some(b"settings")).unwrap();
    assert_eq!(network.subentry_count(), 2);
    let beta = network.subentry(1).unwrap();
    assert_eq!(beta.search_key(b"name").unwrap().value, Value::from("beta"));
    assert_eq!(beta.search_key(b"port").unwrap().value, Value::from("81"));
}

#[test]
fn test_missing_file_leaves_document_untouched() {
    let dir = TempDir::new().unwrap();
    let mut doc = Document::new();
    doc.add_entry(Entry::named("keep", 1), None).unwrap();

    let err = Json::read(dir.path().join("absent.json"), &mut doc).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(doc.get_entry(b"keep", None).is_some());
}

#[test]
fn test_read_resets_previous_content() {
    let dir = TempDir::new().unwrap();
    let ini = fixture(&dir, "a.ini", "[one]\nk=v\n");
    let xml = fixture(&dir, "b.xml", "<two/>");

    let mut doc = Document::new();
    uconfig::read(&ini, &mut doc).unwrap();
    uconfig::read(&xml, &mut doc).unwrap();
    assert!(doc.get_entry(b"one", None).is_none());
    assert!(doc.get_entry(b"two", None).is_some());
    assert_eq!(doc.format(), Some(Format::Xml));
    assert_eq!(doc.metadata().key_count(), 2);
}

#[test]
fn test_conversion_to_xml_escapes_values() {
    let dir = TempDir::new().unwrap();
    let source = fixture(&dir, "quotes.ini", "[quotes]\nq=say \"hi\" it's\nexpr=a<b & c ; note\n");
    let target = dir.path().join("quotes.xml");

    let mut doc = Document::new();
    uconfig::read(&source, &mut doc).unwrap();
    uconfig::write(&target, &doc).unwrap();

    let mut converted = Document::new();
    let warnings = uconfig::read(&target, &mut converted).unwrap();
    assert!(warnings.is_empty(), "{:?}", warnings);
    let q = converted.get_entry(b"q", Some(b"quotes")).unwrap();
    assert_eq!(
        q.search_key(b"q").unwrap().value,
        Value::from("say \"hi\" it's")
    );
    let expr = converted.get_entry(b"expr", Some(b"quotes")).unwrap();
    assert_eq!(
        expr.search_key(b"expr").unwrap().value,
        Value::from("a<b & c ")
    );
}

#[test]
fn test_conversion_by_extension() {
    let dir = TempDir::new().unwrap();
    let source = fixture(&dir, "app.ini", INI_FIXTURE);
    let target = dir.path().join("app.json");

    let mut doc = Document::new();
    uconfig::read(&source, &mut doc).unwrap();
    uconfig::write(&target, &doc).unwrap();

    let mut converted = Document::new();
    let warnings = uconfig::read(&target, &mut converted).unwrap();
    assert!(warnings.is_empty(), "{:?}", warnings);
    let database = converted.get_entry(b"database", None).unwrap();
    let host = database.search_subentry(b"host", false).unwrap();
    assert_eq!(
        host.search_key(b"host").unwrap().value,
        Value::Chars(b"db.local ".to_vec())
    );
}

#[test]
fn test_write_without_extension_uses_recorded_format() {
    let dir = TempDir::new().unwrap();
    let source = fixture(&dir, "list.csv", "a,b\nc,d\n");
    let target = dir.path().join("list");

    let mut doc = Document::new();
    uconfig::read(&source, &mut doc).unwrap();
    uconfig::write(&target, &doc).unwrap();
    assert_eq!(fs::read_to_string(target).unwrap(), "a,b\nc,d\n");
}

#[test]
fn test_deep_copy_isolation() {
    let mut e1 = Entry::named("TestEntry", 1);
    e1.add_key(Key::new("Hello", "world"));
    e1.add_key(Key::new("blob", Value::Raw((0u8..32).collect())));

    let mut doc = Document::new();
    let root = doc.root_id();
    doc.tree_mut().add_subentry(root, e1.clone()).unwrap();

    let e2 = doc.get_entry(b"TestEntry", None).unwrap();
    let e3 = EntryObject::from(e2).clone();
    assert!(e3.is_owned());

    if let Value::Raw(bytes) = &mut e1.keys[1].value {
        bytes.iter_mut().for_each(|b| *b = 0xff);
    }
    e1.keys[0].name = Some(b"Changed".to_vec());

    let expected: Vec<u8> = (0u8..32).collect();
    assert_eq!(e2.keys()[1].value.as_bytes(), Some(&expected[..]));
    assert_eq!(e3.keys()[1].value.as_bytes(), Some(&expected[..]));
    assert!(e2.search_key(b"Hello").is_some());
    assert!(e3.search_key(b"Hello").is_some());

    let ptr = |key: &Key| key.value.as_bytes().unwrap().as_ptr();
    assert_ne!(ptr(&e2.keys()[1]), ptr(&e3.keys()[1]));
    assert_ne!(ptr(&e2.keys()[1]), ptr(&e1.keys[1]));
    assert_ne!(ptr(&e3.keys()[1]), ptr(&e1.keys[1]));
}

#[test]
fn test_copies_survive_parent_mutation() {
    let (mut doc, _) = Ini::from_slice(b"[a]\nx=1\n[b]\ny=2\n").unwrap();
    let copies: Vec<EntryObject<'static>> = doc
        .root()
        .subentries()
        .map(|child| EntryObject::from(child).clone().into_owned().into())
        .collect();

    doc.delete_entry(b"a", None).unwrap();
    doc.delete_entry(b"b", None).unwrap();
    assert_eq!(doc.root().subentry_count(), 0);
    assert_eq!(copies.len(), 2);
    assert_eq!(copies[1].name(), Some(&b"b"[..]));
    assert_eq!(copies[1].subentry_count(), 1);
}

#[test]
fn test_unique_rename_deletion_never_collides() {
    let mut doc = Document::new();
    let root = doc.root_id();
    let tree = doc.tree_mut();
    // siblings squatting on the synthetic names
    for n in 1..=50 {
        let name = format!("~uconfig-pending-delete-{}", n);
        tree.add_subentry(root, Entry::named(name, 0)).unwrap();
    }
    for round in 0..200 {
        let held = tree.add_subentry(root, Entry::named("tmp", 0)).unwrap();
        let other = tree.add_subentry(root, Entry::named("tmp", 0)).unwrap();
        tree.delete_node(held).unwrap();
        assert!(tree.get(held).is_none());
        assert!(tree.get(other).is_some(), "round {}", round);
        tree.delete_node(other).unwrap();
    }
    assert_eq!(tree.entry(root).unwrap().subentry_count(), 50);
    tree.validate().unwrap();
}

#[test]
fn test_delete_key_by_index_with_duplicates() {
    let (mut doc, _) = Json::from_slice(br#"[1, 1, 1]"#).unwrap();
    let array = doc.root().subentry(0).unwrap().id();
    doc.tree_mut().delete_key_at(array, 1).unwrap();
    assert_eq!(doc.tree().entry(array).unwrap().key_count(), 2);
}

#[test]
fn test_document_serializes_with_serde() {
    let (doc, _) = Csv::from_slice(b"k,v\na,1\n").unwrap();
    let json = serde_json::to_value(&doc).unwrap();
    let table = &json["root"]["subentries"][0];
    assert_eq!(table["subentries"].as_array().unwrap().len(), 2);
    assert!(json["metadata"]["keys"].as_array().unwrap().len() >= 3);
}
