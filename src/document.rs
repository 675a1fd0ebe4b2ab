//! Projects a `serde_json::Value` into a navigable, ordered tree.
//!
//! The whole document is flattened once into an arena of nodes in pre-order,
//! so a node id doubles as its document-order position and parent lookup is a
//! single index. [`Node`] is a cheap handle holding a counted reference to
//! the arena; values derived from an evaluation stay usable after the
//! environment that produced them is gone.

use serde_json::Value as Json;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug)]
struct NodeData<'a> {
    name: &'a str,
    json: &'a Json,
    parent: Option<usize>,
    index: Option<usize>,
    children: Vec<usize>,
}

/// An immutable arena over a JSON document.
///
/// Node 0 is the synthetic root: empty local-name, effective JSON value is
/// the entire document. Object members appear in JSON source order; an
/// array-valued member contributes one child per element, each named by the
/// member key and parented by the containing object's node.
#[derive(Debug)]
pub struct Document<'a> {
    nodes: Vec<NodeData<'a>>,
}

impl<'a> Document<'a> {
    /// Builds the arena for `json`. The document must outlive every `Node`
    /// and node-set derived from it.
    pub fn new(json: &'a Json) -> Arc<Self> {
        let mut doc = Document { nodes: Vec::new() };
        doc.nodes.push(NodeData {
            name: "",
            json,
            parent: None,
            index: None,
            children: Vec::new(),
        });
        doc.build_children(0);
        Arc::new(doc)
    }

    /// The synthetic root node.
    pub fn root(doc: &Arc<Document<'a>>) -> Node<'a> {
        Node {
            doc: Arc::clone(doc),
            id: 0,
        }
    }

    /// Total number of nodes, including the synthetic root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn build_children(&mut self, id: usize) {
        let json = self.nodes[id].json;
        match json {
            Json::Object(map) => {
                for (key, value) in map {
                    if let Json::Array(items) = value {
                        for (i, item) in items.iter().enumerate() {
                            self.build_node(id, key, item, Some(i));
                        }
                    } else {
                        self.build_node(id, key, value, None);
                    }
                }
            }
            Json::Array(items) => {
                // Only reachable for nested arrays (or a top-level array
                // document); elements repeat the owning node's name.
                let name = self.nodes[id].name;
                for (i, item) in items.iter().enumerate() {
                    self.build_node(id, name, item, Some(i));
                }
            }
            _ => {}
        }
    }

    fn build_node(&mut self, parent: usize, name: &'a str, json: &'a Json, index: Option<usize>) {
        let id = self.nodes.len();
        self.nodes.push(NodeData {
            name,
            json,
            parent: Some(parent),
            index,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        // Recurse before the next sibling so ids are pre-order, i.e.
        // document order.
        self.build_children(id);
    }
}

/// A position in the virtual tree derived from a JSON document.
#[derive(Clone)]
pub struct Node<'a> {
    doc: Arc<Document<'a>>,
    id: usize,
}

impl<'a> Node<'a> {
    fn data(&self) -> &NodeData<'a> {
        &self.doc.nodes[self.id]
    }

    fn at(&self, id: usize) -> Node<'a> {
        Node {
            doc: Arc::clone(&self.doc),
            id,
        }
    }

    /// The object key under which this node was selected; empty for the
    /// synthetic root. Array-element nodes carry the array's key.
    pub fn name(&self) -> &'a str {
        self.data().name
    }

    /// The node's effective JSON value: for an array-element node, the
    /// element itself.
    pub fn json(&self) -> &'a Json {
        self.data().json
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        self.data().parent.map(|id| self.at(id))
    }

    /// The synthetic root of this node's document.
    pub fn root(&self) -> Node<'a> {
        self.at(0)
    }

    pub fn is_root(&self) -> bool {
        self.id == 0
    }

    /// True if this node was selected from a JSON array element.
    pub fn is_array_child(&self) -> bool {
        self.data().index.is_some()
    }

    pub fn array_index(&self) -> Option<usize> {
        self.data().index
    }

    /// True if the effective JSON value is a primitive (number, boolean,
    /// string or null).
    pub fn is_value(&self) -> bool {
        !matches!(self.json(), Json::Object(_) | Json::Array(_))
    }

    /// The member (and array-element) children, in document order.
    pub fn children(&self) -> Vec<Node<'a>> {
        self.data().children.iter().map(|&id| self.at(id)).collect()
    }

    /// The XPath string-value: the textual form of a primitive, or the
    /// concatenation of descendant primitives in document order.
    pub fn string_value(&self) -> String {
        let mut out = String::new();
        collect_text(self.json(), &mut out);
        out
    }

    /// The string-value read as an XPath number; NaN when malformed.
    pub fn number_value(&self) -> f64 {
        match self.json() {
            Json::Number(n) => n.as_f64().unwrap_or(f64::NAN),
            Json::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Json::String(s) => str_to_number(s),
            Json::Null => f64::NAN,
            _ => str_to_number(&self.string_value()),
        }
    }

    /// The truth value of the effective JSON: containers are true, `null`
    /// false, primitives per the XPath conversion of their type.
    pub fn boolean_value(&self) -> bool {
        match self.json() {
            Json::Bool(b) => *b,
            Json::Number(n) => {
                let v = n.as_f64().unwrap_or(f64::NAN);
                v != 0.0 && !v.is_nan()
            }
            Json::String(s) => !s.is_empty(),
            Json::Null => false,
            _ => true,
        }
    }
}

fn collect_text(json: &Json, out: &mut String) {
    match json {
        Json::Object(map) => {
            for value in map.values() {
                collect_text(value, out);
            }
        }
        Json::Array(items) => {
            for item in items {
                collect_text(item, out);
            }
        }
        primitive => out.push_str(&primitive_string(primitive)),
    }
}

pub(crate) fn primitive_string(json: &Json) -> String {
    match json {
        Json::String(s) => s.clone(),
        Json::Number(n) => number_to_string(n.as_f64().unwrap_or(f64::NAN)),
        Json::Bool(true) => "true".to_string(),
        Json::Bool(false) => "false".to_string(),
        _ => String::new(),
    }
}

/// The canonical XPath string form of a number.
pub(crate) fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        // Rust's f64 Display is already the shortest round-trip decimal
        // form, without a trailing ".0" for integral values.
        format!("{}", n)
    }
}

/// Parses a string as an XPath number: optional whitespace, optional minus,
/// decimal digits with an optional fraction. Anything else is NaN.
pub(crate) fn str_to_number(s: &str) -> f64 {
    let t = s.trim();
    let unsigned = t.strip_prefix('-').unwrap_or(t);
    let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    let well_formed = match unsigned.split_once('.') {
        Some((int, frac)) => {
            (all_digits(int) && (frac.is_empty() || all_digits(frac)))
                || (int.is_empty() && all_digits(frac))
        }
        None => all_digits(unsigned),
    };
    if well_formed {
        t.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

impl<'a> PartialEq for Node<'a> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.doc, &other.doc) && self.id == other.id
    }
}
impl<'a> Eq for Node<'a> {}

impl<'a> PartialOrd for Node<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'a> Ord for Node<'a> {
    /// Document order within one document; nodes of distinct documents get
    /// an arbitrary but consistent order.
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = (Arc::as_ptr(&self.doc) as usize, self.id);
        let rhs = (Arc::as_ptr(&other.doc) as usize, other.id);
        lhs.cmp(&rhs)
    }
}

impl<'a> Hash for Node<'a> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.doc) as usize).hash(state);
        self.id.hash(state);
    }
}

impl<'a> fmt::Debug for Node<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish()
    }
}

impl<'a> fmt::Display for Node<'a> {
    /// The raw JSON form of the node's effective value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_members_keep_insertion_order() {
        let data = json!({"a": {"z": 1, "m": 2, "a": 3}});
        let doc = Document::new(&data);
        let a = Document::root(&doc).children().remove(0);
        let names: Vec<_> = a.children().iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["z", "m", "a"]);
    }

    #[test]
    fn test_arrays_are_transparent() {
        let data = json!({"a": {"b": [1, 2, 3]}});
        let doc = Document::new(&data);
        let a = Document::root(&doc).children().remove(0);
        let bs = a.children();
        assert_eq!(bs.len(), 3);
        for (i, b) in bs.iter().enumerate() {
            assert_eq!(b.name(), "b");
            assert_eq!(b.array_index(), Some(i));
            assert_eq!(b.parent().unwrap(), a);
            assert!(b.is_value());
        }
        assert_eq!(bs[1].string_value(), "2");
    }

    #[test]
    fn test_root_projection() {
        let data = json!({"a": 3});
        let doc = Document::new(&data);
        let root = Document::root(&doc);
        assert!(root.is_root());
        assert_eq!(root.name(), "");
        assert!(root.parent().is_none());
        let children = root.children();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name(), "a");
        assert_eq!(children[0].root(), root);
    }

    #[test]
    fn test_ids_are_preorder_document_order() {
        let data = json!({"a": [{"a": 1}, {"a": 2}, {"b": 3}]});
        let doc = Document::new(&data);
        let root = Document::root(&doc);
        let top = root.children();
        // a[0] precedes its own member, which precedes a[1].
        let nested = top[0].children();
        assert!(top[0] < nested[0]);
        assert!(nested[0] < top[1]);
        assert_eq!(doc.len(), 7);
    }

    #[test]
    fn test_string_value_concatenates_in_document_order() {
        let data = json!({"a": {"b": 1, "c": true, "d": "foo"}});
        let doc = Document::new(&data);
        let root = Document::root(&doc);
        assert_eq!(root.string_value(), "1truefoo");
        let a = root.children().remove(0);
        assert_eq!(a.string_value(), "1truefoo");
        assert_eq!(a.children()[1].string_value(), "true");
    }

    #[test]
    fn test_null_is_an_empty_primitive() {
        let data = json!({"a": null});
        let doc = Document::new(&data);
        let a = Document::root(&doc).children().remove(0);
        assert!(a.is_value());
        assert_eq!(a.string_value(), "");
        assert!(a.number_value().is_nan());
        assert!(!a.boolean_value());
    }

    #[test]
    fn test_nested_array_elements_repeat_the_name() {
        let data = json!({"m": [[1, 2], [3]]});
        let doc = Document::new(&data);
        let ms = Document::root(&doc).children();
        assert_eq!(ms.len(), 2);
        let inner = ms[0].children();
        assert_eq!(inner.len(), 2);
        assert_eq!(inner[0].name(), "m");
        assert_eq!(inner[0].string_value(), "1");
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(number_to_string(4.0), "4");
        assert_eq!(number_to_string(-2.5), "-2.5");
        assert_eq!(number_to_string(0.0), "0");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::INFINITY), "Infinity");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_str_to_number_grammar() {
        assert_eq!(str_to_number(" 42 "), 42.0);
        assert_eq!(str_to_number("-1.5"), -1.5);
        assert_eq!(str_to_number(".5"), 0.5);
        assert_eq!(str_to_number("1."), 1.0);
        assert!(str_to_number("").is_nan());
        assert!(str_to_number("abc").is_nan());
        assert!(str_to_number("1e3").is_nan());
        assert!(str_to_number("+1").is_nan());
        assert!(str_to_number("1 2").is_nan());
    }
}
