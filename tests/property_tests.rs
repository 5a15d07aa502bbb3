use proptest::prelude::*;
use uconfig::json::JsonKind;
use uconfig::{
    guess_value_type, Codec, Document, Entry, EntryRef, Json, Key, NodeId, Table, Value, ValueType,
};

fn live_ids(entry: EntryRef<'_>, out: &mut Vec<NodeId>) {
    out.push(entry.id());
    for child in entry.subentries() {
        live_ids(child, out);
    }
}

proptest! {
    #[test]
    fn prop_guess_agrees_with_type(expression in proptest::collection::vec(any::<u8>(), 0..24)) {
        let value = Value::guess(&expression);
        let guessed = guess_value_type(&expression);
        let found = value.value_type();
        match guessed {
            ValueType::Integer => {
                prop_assert!(matches!(found, ValueType::Integer | ValueType::Raw))
            }
            ValueType::Double | ValueType::Float => {
                prop_assert!(matches!(found, ValueType::Double | ValueType::Raw))
            }
            other => prop_assert_eq!(found, other),
        }
    }

    #[test]
    fn prop_guess_numbers(n in any::<i32>(), cents in -100_000_000i64..100_000_000) {
        let f = cents as f64 / 100.0;
        prop_assert_eq!(Value::guess(n.to_string().as_bytes()), Value::Integer(n));
        let text = Value::Double(f).to_text();
        prop_assert_eq!(Value::guess(&text), Value::Double(f));
    }

    #[test]
    fn prop_table_round_trip(
        rows in proptest::collection::vec(
            proptest::collection::vec("[a-zA-Z0-9]{1,8}", 2..6),
            1..20,
        )
    ) {
        let input: String = rows.iter().map(|cells| cells.join(" ") + "\n").collect();
        let (doc, _) = Table::from_slice(input.as_bytes()).unwrap();
        let table = doc.root().subentry(0).unwrap();
        prop_assert_eq!(table.subentry_count(), rows.len());
        prop_assert_eq!(Table::to_vec(&doc).unwrap(), input.into_bytes());
    }

    #[test]
    fn prop_json_string_round_trip(text in any::<String>()) {
        let mut array = Entry::new(JsonKind::Array as i32);
        array.add_key(Key::unnamed(Value::from(text.as_str())));
        let mut root = Entry::new(JsonKind::Object as i32);
        root.add_subentry(array);

        let out = Json::to_vec(&Document::from_root(root)).unwrap();
        let (doc, warnings) = Json::from_slice(&out).unwrap();
        prop_assert!(warnings.is_empty());
        let value = &doc.root().subentry(0).unwrap().keys()[0].value;
        prop_assert_eq!(value.as_str(), Some(text.as_str()));
    }

    #[test]
    fn prop_tree_stays_consistent(
        ops in proptest::collection::vec((any::<bool>(), any::<usize>(), 0u8..4), 1..80)
    ) {
        let mut doc = Document::new();
        for (add, pick, name) in ops {
            let mut ids = Vec::new();
            live_ids(doc.root(), &mut ids);
            let tree = doc.tree_mut();
            if add || ids.len() == 1 {
                let parent = ids[pick % ids.len()];
                tree.add_subentry(parent, Entry::named(vec![b'a' + name], 0)).unwrap();
            } else {
                let victim = ids[1 + pick % (ids.len() - 1)];
                tree.delete_node(victim).unwrap();
                prop_assert!(tree.get(victim).is_none());
            }
            prop_assert!(tree.validate().is_ok());
            let live = tree.len();
            prop_assert_eq!(live, doc.root().node_count());
        }
    }
}
