//! Contains pure functions for evaluating XPath binary operators.

use crate::ast::BinaryOperator;
use crate::document::Node;
use crate::engine::Value;
use crate::error::XPathError;

pub(crate) fn evaluate<'a>(
    op: BinaryOperator,
    left: Value<'a>,
    right: Value<'a>,
) -> Result<Value<'a>, XPathError> {
    use BinaryOperator::*;
    match op {
        Or => Ok(Value::Boolean(left.to_bool() || right.to_bool())),
        And => Ok(Value::Boolean(left.to_bool() && right.to_bool())),
        Equals | NotEquals => Ok(Value::Boolean(compare_equality(op, &left, &right))),
        LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            check_ordering_relation_args(&left, &right)?;
            let l = left.to_number();
            let r = right.to_number();
            let result = match op {
                LessThan => l < r,
                LessThanOrEqual => l <= r,
                GreaterThan => l > r,
                _ => l >= r,
            };
            Ok(Value::Boolean(result))
        }
        Plus => Ok(Value::Number(left.to_number() + right.to_number())),
        Minus => Ok(Value::Number(left.to_number() - right.to_number())),
        Multiply => Ok(Value::Number(left.to_number() * right.to_number())),
        Divide => Ok(Value::Number(left.to_number() / right.to_number())),
        // Truncating remainder: the result carries the sign of the dividend.
        Modulo => Ok(Value::Number(left.to_number() % right.to_number())),
        Union => evaluate_union(left, right),
    }
}

/// Equality with a node-set operand is exists-quantified: the comparison
/// holds iff some node satisfies it against the other operand. `!=` is
/// quantified independently, not as the negation of `=`.
fn compare_equality(op: BinaryOperator, left: &Value, right: &Value) -> bool {
    let negate = op == BinaryOperator::NotEquals;
    match (left, right) {
        (Value::NodeSet(l_nodes), Value::NodeSet(r_nodes)) => {
            let r_strings: Vec<String> = r_nodes.iter().map(|n| n.string_value()).collect();
            l_nodes.iter().any(|l| {
                let ls = l.string_value();
                r_strings
                    .iter()
                    .any(|rs| if negate { *rs != ls } else { *rs == ls })
            })
        }
        (Value::NodeSet(nodes), other) | (other, Value::NodeSet(nodes)) => {
            nodes.iter().any(|n| {
                let equal = node_equals_primitive(n, other);
                if negate {
                    !equal
                } else {
                    equal
                }
            })
        }
        _ => {
            let equal = if matches!(left, Value::Boolean(_)) || matches!(right, Value::Boolean(_)) {
                left.to_bool() == right.to_bool()
            } else if matches!(left, Value::Number(_)) || matches!(right, Value::Number(_)) {
                left.to_number() == right.to_number()
            } else {
                left.string() == right.string()
            };
            if negate {
                !equal
            } else {
                equal
            }
        }
    }
}

fn node_equals_primitive(node: &Node, primitive: &Value) -> bool {
    match primitive {
        Value::Number(d) => node.number_value() == *d,
        Value::Boolean(b) => node.boolean_value() == *b,
        Value::String(s) => node.string_value() == *s,
        Value::NodeSet(_) => false, // handled by the node-set arm
    }
}

/// Ordering comparisons only apply to single values: primitives or a
/// singleton node-set whose node is primitive.
fn check_ordering_relation_args(left: &Value, right: &Value) -> Result<(), XPathError> {
    if !left.is_value() || !right.is_value() {
        return Err(XPathError::TypeError(format!(
            "cannot order {} against {}; both operands must be single values",
            left.type_name(),
            right.type_name()
        )));
    }
    Ok(())
}

fn evaluate_union<'a>(left: Value<'a>, right: Value<'a>) -> Result<Value<'a>, XPathError> {
    let l_nodes = match left {
        Value::NodeSet(nodes) => nodes,
        other => {
            return Err(XPathError::TypeError(format!(
                "left-hand side of '|' must be a node-set, got {}",
                other.type_name()
            )));
        }
    };
    let r_nodes = match right {
        Value::NodeSet(nodes) => nodes,
        other => {
            return Err(XPathError::TypeError(format!(
                "right-hand side of '|' must be a node-set, got {}",
                other.type_name()
            )));
        }
    };

    let mut merged = l_nodes;
    merged.extend(r_nodes);
    merged.sort();
    merged.dedup();
    Ok(Value::NodeSet(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use serde_json::json;

    #[test]
    fn test_logical_operators() {
        let t = Value::Boolean(true);
        let f = Value::Boolean(false);
        assert!(evaluate(BinaryOperator::Or, t.clone(), f.clone())
            .unwrap()
            .to_bool());
        assert!(!evaluate(BinaryOperator::And, t, f).unwrap().to_bool());
    }

    #[test]
    fn test_arithmetic_operators() {
        let ten = Value::Number(10.0);
        let three = Value::Number(3.0);
        assert_eq!(
            evaluate(BinaryOperator::Plus, ten.clone(), three.clone())
                .unwrap()
                .to_number(),
            13.0
        );
        assert_eq!(
            evaluate(BinaryOperator::Modulo, ten, three)
                .unwrap()
                .to_number(),
            1.0
        );
        // The remainder takes the dividend's sign.
        assert_eq!(
            evaluate(BinaryOperator::Modulo, Value::Number(5.0), Value::Number(-2.0))
                .unwrap()
                .to_number(),
            1.0
        );
        assert_eq!(
            evaluate(BinaryOperator::Modulo, Value::Number(-5.0), Value::Number(-2.0))
                .unwrap()
                .to_number(),
            -1.0
        );
    }

    #[test]
    fn test_division_never_errors() {
        let inf = evaluate(BinaryOperator::Divide, Value::Number(1.0), Value::Number(0.0))
            .unwrap()
            .to_number();
        assert!(inf.is_infinite() && inf > 0.0);
        let nan = evaluate(BinaryOperator::Divide, Value::Number(0.0), Value::Number(0.0))
            .unwrap()
            .to_number();
        assert!(nan.is_nan());
    }

    #[test]
    fn test_equality_type_precedence() {
        // A boolean operand forces boolean comparison.
        assert!(
            evaluate(
                BinaryOperator::Equals,
                Value::Boolean(true),
                Value::Number(7.0)
            )
            .unwrap()
            .to_bool()
        );
        // A number operand forces numeric comparison.
        assert!(evaluate(
            BinaryOperator::Equals,
            Value::Number(1.0),
            Value::String("1".to_string())
        )
        .unwrap()
        .to_bool());
        // NaN is never equal to itself, but always unequal.
        let nan = Value::Number(f64::NAN);
        assert!(!evaluate(BinaryOperator::Equals, nan.clone(), nan.clone())
            .unwrap()
            .to_bool());
        assert!(evaluate(BinaryOperator::NotEquals, nan.clone(), nan)
            .unwrap()
            .to_bool());
    }

    #[test]
    fn test_node_set_equality_is_exists_quantified() {
        let data = json!({"a": {"b": [1, 2, 3]}});
        let doc = Document::new(&data);
        let bs = Document::root(&doc).children().remove(0).children();
        let set = Value::NodeSet(bs);

        assert!(evaluate(BinaryOperator::Equals, set.clone(), Value::Number(2.0))
            .unwrap()
            .to_bool());
        assert!(!evaluate(BinaryOperator::Equals, set.clone(), Value::Number(9.0))
            .unwrap()
            .to_bool());
        // Some node differs from 2, so != also holds.
        assert!(evaluate(BinaryOperator::NotEquals, set.clone(), Value::Number(2.0))
            .unwrap()
            .to_bool());

        // Node-set vs node-set compares string-values pairwise.
        let other = json!({"x": {"y": [3, 9]}});
        let other_doc = Document::new(&other);
        let ys = Document::root(&other_doc).children().remove(0).children();
        let other_set = Value::NodeSet(ys);
        assert!(evaluate(BinaryOperator::Equals, set.clone(), other_set.clone())
            .unwrap()
            .to_bool());
        assert!(evaluate(BinaryOperator::NotEquals, set, other_set)
            .unwrap()
            .to_bool());
    }

    #[test]
    fn test_ordering_rejects_node_sets() {
        let data = json!({"a": {"b": [1, 2]}});
        let doc = Document::new(&data);
        let bs = Document::root(&doc).children().remove(0).children();
        let multi = Value::NodeSet(bs.clone());
        assert!(matches!(
            evaluate(BinaryOperator::LessThan, multi, Value::Number(3.0)),
            Err(XPathError::TypeError(_))
        ));

        // A singleton set over a primitive is a single value.
        let single = Value::NodeSet(vec![bs[0].clone()]);
        assert!(
            evaluate(BinaryOperator::LessThan, single, Value::Number(3.0))
                .unwrap()
                .to_bool()
        );
    }

    #[test]
    fn test_union_operator() {
        let data = json!({"a": {"b": 1, "c": 2, "d": 3}});
        let doc = Document::new(&data);
        let kids = Document::root(&doc).children().remove(0).children();
        let (b, c, d) = (kids[0].clone(), kids[1].clone(), kids[2].clone());

        let left = Value::NodeSet(vec![d.clone(), b.clone()]); // out of order
        let right = Value::NodeSet(vec![c.clone(), b.clone()]);
        let result = evaluate(BinaryOperator::Union, left, right).unwrap();
        match result {
            Value::NodeSet(nodes) => assert_eq!(nodes, vec![b, c, d]),
            other => panic!("expected node-set, got {}", other.type_name()),
        }

        assert!(matches!(
            evaluate(
                BinaryOperator::Union,
                Value::Number(1.0),
                Value::NodeSet(vec![])
            ),
            Err(XPathError::TypeError(_))
        ));
    }
}
