//! Tagged YAML tree with typed accessors.
//!
//! Records are arbitrary nested mappings, sequences and scalars. [`Node`]
//! keeps that shape explicit so rule code asks for a mapping or a string and
//! gets an [`AccessError`] back when the data says otherwise.

use std::collections::BTreeMap;

use serde::de::{self, Deserialize, Deserializer, EnumAccess, MapAccess, SeqAccess, Visitor};

/// Key-ordered mapping. Traversal order is stable regardless of file order.
pub type Mapping = BTreeMap<String, Node>;

/// A YAML value.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Sequence(Vec<Node>),
    Mapping(Mapping),
}

/// Why a typed lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("missing key '{key}'")]
    Missing { key: String },

    #[error("'{key}' should be {expected}, found {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("expected a mapping, found {found}")]
    NotAMapping { found: &'static str },
}

impl Node {
    /// Short type name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "boolean",
            Node::Number(_) => "number",
            Node::String(_) => "string",
            Node::Sequence(_) => "sequence",
            Node::Mapping(_) => "mapping",
        }
    }

    /// Null, or a string with no visible characters.
    pub fn is_blank(&self) -> bool {
        match self {
            Node::Null => true,
            Node::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Numbers without a fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Plain lookup: `None` when the key is absent or `self` is not a mapping.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Whether `self` is a mapping containing `key`.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Look up a field, distinguishing "absent" from "not a mapping".
    pub fn field(&self, key: &str) -> Result<&Node, AccessError> {
        let map = self
            .as_mapping()
            .ok_or(AccessError::NotAMapping { found: self.kind() })?;
        map.get(key).ok_or_else(|| AccessError::Missing {
            key: key.to_string(),
        })
    }

    /// Look up a string field.
    pub fn str_field(&self, key: &str) -> Result<&str, AccessError> {
        let node = self.field(key)?;
        node.as_str().ok_or_else(|| wrong_type(key, "a string", node))
    }

    /// Look up a mapping field.
    pub fn mapping_field(&self, key: &str) -> Result<&Mapping, AccessError> {
        let node = self.field(key)?;
        node.as_mapping()
            .ok_or_else(|| wrong_type(key, "a mapping", node))
    }

    /// Look up a sequence field.
    pub fn sequence_field(&self, key: &str) -> Result<&[Node], AccessError> {
        let node = self.field(key)?;
        node.as_sequence()
            .ok_or_else(|| wrong_type(key, "a sequence", node))
    }

    /// Look up a numeric field.
    pub fn number_field(&self, key: &str) -> Result<f64, AccessError> {
        let node = self.field(key)?;
        node.as_f64().ok_or_else(|| wrong_type(key, "a number", node))
    }
}

fn wrong_type(key: &str, expected: &'static str, found: &Node) -> AccessError {
    AccessError::WrongType {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Deserialization
// ---------------------------------------------------------------------------

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a scalar, sequence, or mapping")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Node, E> {
        Ok(Node::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Node, E> {
        Ok(Node::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Node, E> {
        Ok(Node::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Node, E> {
        Ok(Node::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Node, E> {
        Ok(Node::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Node, E> {
        Ok(Node::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Node, D::Error> {
        Node::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Node, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Node>()? {
            items.push(item);
        }
        Ok(Node::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Node, A::Error> {
        let mut out = Mapping::new();
        while let Some(MapKey(key)) = map.next_key::<MapKey>()? {
            let value = map.next_value::<Node>()?;
            if out.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate key '{key}'")));
            }
            out.insert(key, value);
        }
        Ok(Node::Mapping(out))
    }

    fn visit_enum<A: EnumAccess<'de>>(self, _data: A) -> Result<Node, A::Error> {
        Err(de::Error::custom("custom tags are not supported"))
    }
}

/// Mapping key: any scalar, stringified.
struct MapKey(String);

impl<'de> Deserialize<'de> for MapKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MapKeyVisitor)
    }
}

struct MapKeyVisitor;

impl<'de> Visitor<'de> for MapKeyVisitor {
    type Value = MapKey;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a scalar mapping key")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<MapKey, E> {
        Ok(MapKey(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Node {
        serde_json::from_str(json).expect("parse node")
    }

    #[test]
    fn typed_accessors_report_missing_and_wrong_type() {
        let node = parse(r#"{"name": "Aluminum", "category": 3, "tags": ["a"]}"#);

        assert_eq!(node.str_field("name"), Ok("Aluminum"));
        assert_eq!(
            node.str_field("subcategory"),
            Err(AccessError::Missing {
                key: "subcategory".into()
            })
        );
        assert_eq!(
            node.str_field("category"),
            Err(AccessError::WrongType {
                key: "category".into(),
                expected: "a string",
                found: "number",
            })
        );
        assert_eq!(node.sequence_field("tags").map(<[Node]>::len), Ok(1));
    }

    #[test]
    fn field_on_scalar_is_not_a_mapping() {
        let node = Node::from("bare");
        assert_eq!(
            node.field("id"),
            Err(AccessError::NotAMapping { found: "string" })
        );
    }

    #[test]
    fn blank_values() {
        assert!(Node::Null.is_blank());
        assert!(Node::from("  ").is_blank());
        assert!(!Node::from("x").is_blank());
        assert!(!Node::Number(0.0).is_blank());
    }

    #[test]
    fn integers_only_for_whole_numbers() {
        assert_eq!(Node::Number(3.0).as_i64(), Some(3));
        assert_eq!(Node::Number(3.5).as_i64(), None);
    }

    #[test]
    fn numeric_keys_are_stringified() {
        let node = parse(r#"{"1": {"value": 2}}"#);
        assert!(node.get("1").is_some());
    }
}
