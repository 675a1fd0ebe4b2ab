//! Contains pure functions for collecting nodes along each XPath axis.

use crate::document::Node;
use std::collections::HashSet;

fn add_node<'a>(node: Node<'a>, seen: &mut HashSet<Node<'a>>, results: &mut Vec<Node<'a>>) {
    if seen.insert(node.clone()) {
        results.push(node);
    }
}

pub fn collect_self_nodes<'a>(
    node: &Node<'a>,
    seen: &mut HashSet<Node<'a>>,
    results: &mut Vec<Node<'a>>,
) {
    add_node(node.clone(), seen, results);
}

pub fn collect_child_nodes<'a>(
    node: &Node<'a>,
    seen: &mut HashSet<Node<'a>>,
    results: &mut Vec<Node<'a>>,
) {
    for child in node.children() {
        add_node(child, seen, results);
    }
}

/// Descendants are emitted in document order (pre-order).
pub fn collect_descendant_nodes<'a>(
    node: &Node<'a>,
    seen: &mut HashSet<Node<'a>>,
    results: &mut Vec<Node<'a>>,
) {
    for child in node.children() {
        add_node(child.clone(), seen, results);
        collect_descendant_nodes(&child, seen, results);
    }
}

pub fn collect_descendant_or_self_nodes<'a>(
    node: &Node<'a>,
    seen: &mut HashSet<Node<'a>>,
    results: &mut Vec<Node<'a>>,
) {
    add_node(node.clone(), seen, results);
    collect_descendant_nodes(node, seen, results);
}

pub fn collect_parent_nodes<'a>(
    node: &Node<'a>,
    seen: &mut HashSet<Node<'a>>,
    results: &mut Vec<Node<'a>>,
) {
    if let Some(parent) = node.parent() {
        add_node(parent, seen, results);
    }
}

/// Ancestors are emitted nearest-first, the reverse-axis order.
pub fn collect_ancestor_nodes<'a>(
    node: &Node<'a>,
    seen: &mut HashSet<Node<'a>>,
    results: &mut Vec<Node<'a>>,
) {
    let mut current = node.parent();
    while let Some(p) = current {
        current = p.parent();
        add_node(p, seen, results);
    }
}

pub fn collect_ancestor_or_self_nodes<'a>(
    node: &Node<'a>,
    seen: &mut HashSet<Node<'a>>,
    results: &mut Vec<Node<'a>>,
) {
    add_node(node.clone(), seen, results);
    collect_ancestor_nodes(node, seen, results);
}

pub fn collect_following_sibling_nodes<'a>(
    node: &Node<'a>,
    seen: &mut HashSet<Node<'a>>,
    results: &mut Vec<Node<'a>>,
) {
    if let Some(parent) = node.parent() {
        let mut found_self = false;
        for sibling in parent.children() {
            if found_self {
                add_node(sibling, seen, results);
            } else if sibling == *node {
                found_self = true;
            }
        }
    }
}

/// Preceding siblings are emitted nearest-first, the reverse-axis order.
pub fn collect_preceding_sibling_nodes<'a>(
    node: &Node<'a>,
    seen: &mut HashSet<Node<'a>>,
    results: &mut Vec<Node<'a>>,
) {
    if let Some(parent) = node.parent() {
        let mut siblings = Vec::new();
        for sibling in parent.children() {
            if sibling == *node {
                break;
            }
            siblings.push(sibling);
        }
        for sibling in siblings.into_iter().rev() {
            add_node(sibling, seen, results);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use serde_json::json;

    fn names(nodes: &[Node]) -> Vec<String> {
        nodes
            .iter()
            .map(|n| format!("{}:{}", n.name(), n.string_value()))
            .collect()
    }

    #[test]
    fn test_collect_child() {
        let data = json!({"a": {"b": [1, 2], "c": 3}});
        let doc = Document::new(&data);
        let a = Document::root(&doc).children().remove(0);
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        collect_child_nodes(&a, &mut seen, &mut results);
        assert_eq!(names(&results), vec!["b:1", "b:2", "c:3"]);
    }

    #[test]
    fn test_collect_descendant_in_document_order() {
        let data = json!({"a": [{"a": 1}, {"a": 2}, {"b": 3}]});
        let doc = Document::new(&data);
        let root = Document::root(&doc);
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        collect_descendant_nodes(&root, &mut seen, &mut results);
        assert_eq!(
            names(&results),
            vec!["a:1", "a:1", "a:2", "a:2", "a:3", "b:3"]
        );
    }

    #[test]
    fn test_collect_ancestor_nearest_first() {
        let data = json!({"a": {"b": {"c": 1}}});
        let doc = Document::new(&data);
        let root = Document::root(&doc);
        let a = root.children().remove(0);
        let b = a.children().remove(0);
        let c = b.children().remove(0);
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        collect_ancestor_nodes(&c, &mut seen, &mut results);
        assert_eq!(results, vec![b.clone(), a.clone(), root.clone()]);

        seen.clear();
        results.clear();
        collect_ancestor_or_self_nodes(&c, &mut seen, &mut results);
        assert_eq!(results, vec![c, b, a, root]);
    }

    #[test]
    fn test_collect_siblings() {
        let data = json!({"a": {"b": [1, 2, 3, 4]}});
        let doc = Document::new(&data);
        let a = Document::root(&doc).children().remove(0);
        let bs = a.children();

        let mut seen = HashSet::new();
        let mut following = Vec::new();
        collect_following_sibling_nodes(&bs[1], &mut seen, &mut following);
        assert_eq!(following, vec![bs[2].clone(), bs[3].clone()]);

        seen.clear();
        let mut preceding = Vec::new();
        collect_preceding_sibling_nodes(&bs[2], &mut seen, &mut preceding);
        // Nearest sibling first.
        assert_eq!(preceding, vec![bs[1].clone(), bs[0].clone()]);
    }

    #[test]
    fn test_descendant_or_self_includes_self() {
        let data = json!({"a": {"a": {"a": 1}}});
        let doc = Document::new(&data);
        let a1 = Document::root(&doc).children().remove(0);
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        collect_descendant_or_self_nodes(&a1, &mut seen, &mut results);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], a1);
    }
}
