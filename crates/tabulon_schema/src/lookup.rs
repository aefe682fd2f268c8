//! Name-based lookup over ordered record sequences.

use serde_json::Value;

/// A record addressed by its `name` field.
pub trait Named {
    fn name(&self) -> &str;
}

/// Return the first item whose name matches `name`.
pub fn find_by_name<'a, T: Named>(items: &'a [T], name: &str) -> Option<&'a T> {
    items.iter().find(|item| item.name() == name)
}

/// Mutable variant of [`find_by_name`].
pub fn find_by_name_mut<'a, T: Named>(items: &'a mut [T], name: &str) -> Option<&'a mut T> {
    items.iter_mut().find(|item| item.name() == name)
}

/// Lookup over raw JSON objects, for records that have not been typed yet.
pub fn find_value_by_name<'a>(items: &'a [Value], name: &str) -> Option<&'a Value> {
    items
        .iter()
        .find(|item| item.get("name").and_then(Value::as_str) == Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Item(&'static str, u32);

    impl Named for Item {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn returns_first_match() {
        let items = [Item("a", 1), Item("b", 2), Item("b", 3)];
        assert_eq!(find_by_name(&items, "b").map(|i| i.1), Some(2));
        assert!(find_by_name(&items, "z").is_none());
    }

    #[test]
    fn mutable_lookup_edits_in_place() {
        let mut items = [Item("a", 1), Item("b", 2)];
        if let Some(item) = find_by_name_mut(&mut items, "a") {
            item.1 = 10;
        }
        assert_eq!(items[0].1, 10);
    }

    #[test]
    fn raw_value_lookup_skips_unnamed_records() {
        let items = vec![json!({"value": 1}), json!({"name": "x", "value": 2})];
        assert_eq!(find_value_by_name(&items, "x"), Some(&items[1]));
        assert!(find_value_by_name(&items, "y").is_none());
    }
}
