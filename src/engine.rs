//! The evaluation engine for executing a parsed XPath AST against a JSON
//! document tree.

use crate::ast::{Axis, Expr, LocationPath, NodeTest, NodeTypeTest, Step, UnaryOperator};
use crate::document::{number_to_string, str_to_number, Document, Node};
use crate::error::XPathError;
use crate::{axes, functions, operators};
use serde_json::Value as Json;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Represents the possible result types of an XPath expression evaluation.
#[derive(Debug, Clone)]
pub enum Value<'a> {
    Number(f64),
    Boolean(bool),
    String(String),
    NodeSet(Vec<Node<'a>>),
}

impl<'a> Value<'a> {
    /// Coerces the value to a boolean as per XPath 1.0 rules.
    pub fn to_bool(&self) -> bool {
        match self {
            Value::NodeSet(nodes) => !nodes.is_empty(),
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Boolean(b) => *b,
        }
    }

    /// Coerces the value to a number as per XPath 1.0 rules.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::String(s) => str_to_number(s),
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::NodeSet(nodes) => nodes.first().map(|n| n.number_value()).unwrap_or(f64::NAN),
        }
    }

    /// The XPath `string()` conversion: for a node-set, the string-value of
    /// the first node (empty string if the set is empty).
    pub fn string(&self) -> String {
        match self {
            Value::Number(n) => number_to_string(*n),
            Value::Boolean(b) => b.to_string(),
            Value::String(s) => s.clone(),
            Value::NodeSet(nodes) => nodes.first().map(|n| n.string_value()).unwrap_or_default(),
        }
    }

    /// The string-value of the whole result: primitives convert as
    /// `string()`, a node-set concatenates every node's string-value in
    /// the set's order.
    pub fn string_value(&self) -> String {
        match self {
            Value::NodeSet(nodes) => {
                let mut out = String::new();
                for node in nodes {
                    out.push_str(&node.string_value());
                }
                out
            }
            _ => self.string(),
        }
    }

    /// True for primitives and for a node-set of exactly one node whose
    /// effective JSON value is primitive.
    pub fn is_value(&self) -> bool {
        match self {
            Value::NodeSet(nodes) => nodes.len() == 1 && nodes[0].is_value(),
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::NodeSet(_) => "node-set",
        }
    }
}

impl fmt::Display for Value<'_> {
    /// Diagnostic form: numbers and booleans in their canonical XPath
    /// strings, node-sets as `[<raw json>, …]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", number_to_string(*n)),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{}", s),
            Value::NodeSet(nodes) => {
                write!(f, "[")?;
                for (i, node) in nodes.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", node)?;
                }
                write!(f, "]")
            }
        }
    }
}

const DEFAULT_RECURSION_LIMIT: usize = 64;

/// Holds the context value and the variable bindings for an evaluation.
pub struct Environment<'a> {
    context: Value<'a>,
    variables: HashMap<String, Value<'a>>,
    recursion_limit: usize,
}

impl<'a> Environment<'a> {
    /// An environment whose context is the synthetic root over `json`.
    pub fn new(json: &'a Json) -> Self {
        let doc = Document::new(json);
        let root = Document::root(&doc);
        Environment {
            context: Value::NodeSet(vec![root]),
            variables: HashMap::new(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// An environment with an explicit context: a primitive value or a
    /// node-set with exactly one node.
    pub fn with_context(context: Value<'a>) -> Result<Self, XPathError> {
        if let Value::NodeSet(nodes) = &context {
            if nodes.len() != 1 {
                return Err(XPathError::TypeError(format!(
                    "context must be a primitive value or a single node, got a node-set of {}",
                    nodes.len()
                )));
            }
        }
        Ok(Environment {
            context,
            variables: HashMap::new(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        })
    }

    /// Caps the expression nesting depth; exceeding it fails the evaluation
    /// with a resource error.
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn add_variable(&mut self, name: impl Into<String>, value: Value<'a>) {
        self.variables.insert(name.into(), value);
    }

    pub fn variable(&self, name: &str) -> Result<&Value<'a>, XPathError> {
        self.variables
            .get(name)
            .ok_or_else(|| XPathError::UnknownVariable(name.to_string()))
    }

    pub fn context(&self) -> &Value<'a> {
        &self.context
    }
}

/// The state threaded through one evaluation: the context triple plus the
/// environment's bindings.
#[derive(Clone, Copy)]
pub(crate) struct EvaluationContext<'a, 'd> {
    pub context: &'d Value<'a>,
    pub position: usize, // 1-based
    pub size: usize,
    pub variables: &'d HashMap<String, Value<'a>>,
    depth: usize,
    recursion_limit: usize,
}

impl<'a, 'd> EvaluationContext<'a, 'd> {
    /// The context node: the first node of the context node-set.
    pub fn context_node(&self) -> Result<Node<'a>, XPathError> {
        match self.context {
            Value::NodeSet(nodes) => nodes.first().cloned().ok_or(XPathError::NoContextNode),
            _ => Err(XPathError::NoContextNode),
        }
    }

    fn root_node(&self) -> Result<Node<'a>, XPathError> {
        Ok(self.context_node()?.root())
    }

    fn descend(&self) -> Result<Self, XPathError> {
        if self.depth >= self.recursion_limit {
            return Err(XPathError::ResourceError(self.recursion_limit));
        }
        Ok(EvaluationContext {
            depth: self.depth + 1,
            ..*self
        })
    }
}

pub(crate) fn evaluate_with_env<'a>(
    expr: &Expr,
    env: &Environment<'a>,
) -> Result<Value<'a>, XPathError> {
    let e_ctx = EvaluationContext {
        context: &env.context,
        position: 1,
        size: 1,
        variables: &env.variables,
        depth: 0,
        recursion_limit: env.recursion_limit,
    };
    evaluate(expr, &e_ctx)
}

/// Evaluates a compiled expression and returns a concrete [`Value`].
pub(crate) fn evaluate<'a>(
    expr: &Expr,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<Value<'a>, XPathError> {
    match expr {
        Expr::Literal(s) => Ok(Value::String(s.clone())),
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::LocationPath(path) => {
            let nodes = evaluate_location_path(path, e_ctx)?;
            Ok(Value::NodeSet(nodes))
        }
        Expr::Variable(name) => e_ctx
            .variables
            .get(name)
            .cloned()
            .ok_or_else(|| XPathError::UnknownVariable(name.clone())),
        Expr::FunctionCall { name, args } => {
            let sub = e_ctx.descend()?;
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                evaluated_args.push(evaluate(arg, &sub)?);
            }
            functions::evaluate_function(name, evaluated_args, e_ctx)
        }
        Expr::BinaryOp { left, op, right } => {
            let sub = e_ctx.descend()?;
            let left_val = evaluate(left, &sub)?;
            let right_val = evaluate(right, &sub)?;
            operators::evaluate(*op, left_val, right_val)
        }
        Expr::UnaryOp { op, expr } => {
            let sub = e_ctx.descend()?;
            let val = evaluate(expr, &sub)?;
            match op {
                UnaryOperator::Minus => Ok(Value::Number(-val.to_number())),
            }
        }
    }
}

fn evaluate_location_path<'a>(
    path: &LocationPath,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<Vec<Node<'a>>, XPathError> {
    // A bare relative path with no steps refers to the context node-set.
    if path.steps.is_empty() && !path.is_absolute && path.start_point.is_none() {
        return match e_ctx.context {
            Value::NodeSet(nodes) => Ok(nodes.clone()),
            _ => Err(XPathError::NoContextNode),
        };
    }

    let initial_context = if let Some(start_expr) = &path.start_point {
        // The path starts from the result of another expression.
        match evaluate(start_expr, &e_ctx.descend()?)? {
            Value::NodeSet(nodes) => nodes,
            // If the start expression doesn't evaluate to a node-set, the path is empty.
            _ => return Ok(vec![]),
        }
    } else if path.is_absolute {
        vec![e_ctx.root_node()?]
    } else {
        match e_ctx.context {
            Value::NodeSet(nodes) => nodes.clone(),
            _ => return Err(XPathError::NoContextNode),
        }
    };

    let mut current_nodes = initial_context;
    for step in &path.steps {
        current_nodes = evaluate_step(step, &current_nodes, e_ctx)?;
    }
    Ok(current_nodes)
}

/// Evaluates a single step by chaining axis collection, node testing, and
/// predicate application.
fn evaluate_step<'a>(
    step: &Step,
    context_nodes: &[Node<'a>],
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<Vec<Node<'a>>, XPathError> {
    let axis_nodes = collect_axis_nodes(step.axis, context_nodes)?;
    let tested_nodes = filter_by_node_test(axis_nodes, &step.node_test);
    apply_predicates(tested_nodes, &step.predicates, e_ctx)
}

/// Stage 1: Collects all unique nodes from the context set along a given
/// axis. Forward-axis results are re-sorted into document order after the
/// per-node concatenation; reverse axes keep their nearest-first order until
/// a subsequent step consumes it.
fn collect_axis_nodes<'a>(
    axis: Axis,
    context_nodes: &[Node<'a>],
) -> Result<Vec<Node<'a>>, XPathError> {
    let mut result_nodes = Vec::new();
    let mut seen = HashSet::new();

    for node in context_nodes {
        match axis {
            Axis::Child => axes::collect_child_nodes(node, &mut seen, &mut result_nodes),
            Axis::Descendant => axes::collect_descendant_nodes(node, &mut seen, &mut result_nodes),
            Axis::DescendantOrSelf => {
                axes::collect_descendant_or_self_nodes(node, &mut seen, &mut result_nodes)
            }
            Axis::Parent => axes::collect_parent_nodes(node, &mut seen, &mut result_nodes),
            Axis::Ancestor => axes::collect_ancestor_nodes(node, &mut seen, &mut result_nodes),
            Axis::AncestorOrSelf => {
                axes::collect_ancestor_or_self_nodes(node, &mut seen, &mut result_nodes)
            }
            Axis::SelfAxis => axes::collect_self_nodes(node, &mut seen, &mut result_nodes),
            Axis::FollowingSibling => {
                axes::collect_following_sibling_nodes(node, &mut seen, &mut result_nodes)
            }
            Axis::PrecedingSibling => {
                axes::collect_preceding_sibling_nodes(node, &mut seen, &mut result_nodes)
            }
            Axis::Attribute | Axis::Namespace | Axis::Following | Axis::Preceding => {
                return Err(XPathError::UnsupportedAxis(axis.name()));
            }
        }
    }
    if !axis.is_reverse() {
        result_nodes.sort();
    }
    Ok(result_nodes)
}

/// Stage 2: Filters a set of nodes based on a `NodeTest`.
fn filter_by_node_test<'a>(nodes: Vec<Node<'a>>, test: &NodeTest) -> Vec<Node<'a>> {
    nodes
        .into_iter()
        .filter(|node| match test {
            NodeTest::Wildcard => true,
            NodeTest::Name(name_to_test) => node.name() == name_to_test,
            NodeTest::NodeType(NodeTypeTest::Node) => true,
            NodeTest::NodeType(NodeTypeTest::Text) => node.is_value(),
        })
        .collect()
}

/// Stage 3: Filters a set of nodes by applying a series of predicates.
///
/// Predicates see the merged candidate list of the step, with (position,
/// size) taken from it; a numeric predicate result keeps a candidate iff it
/// equals the candidate's position.
fn apply_predicates<'a>(
    nodes: Vec<Node<'a>>,
    predicates: &[Expr],
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<Vec<Node<'a>>, XPathError> {
    let mut final_nodes = nodes;
    for predicate in predicates {
        let sub = e_ctx.descend()?;
        let context_size = final_nodes.len();
        let mut predicate_results = Vec::new();
        for (i, node) in final_nodes.iter().enumerate() {
            let context_value = Value::NodeSet(vec![node.clone()]);
            let predicate_e_ctx = EvaluationContext {
                context: &context_value,
                position: i + 1,
                size: context_size,
                variables: sub.variables,
                depth: sub.depth,
                recursion_limit: sub.recursion_limit,
            };
            let result = evaluate(predicate, &predicate_e_ctx)?;
            let keep = match result {
                Value::Number(n) => n == (i + 1) as f64,
                other => other.to_bool(),
            };
            if keep {
                predicate_results.push(node.clone());
            }
        }
        final_nodes = predicate_results;
    }
    Ok(final_nodes)
}
