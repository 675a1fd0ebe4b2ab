//! A Schematron-style rule layer on top of the XPath engine.
//!
//! A rule document is itself JSON:
//!
//! ```json
//! {
//!   "patterns": [
//!     {
//!       "rules": [
//!         {
//!           "context": "/order/items",
//!           "asserts": [
//!             { "test": "price > 0", "message": "price must be positive" }
//!           ]
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! For every rule, the nodes matching its `context` expression are selected;
//! each assertion is then evaluated with each selected node as the context
//! node, and its message is reported when the test does not hold.

use crate::engine::{Environment, Value};
use crate::error::SchematronError;
use crate::Expression;
use serde::Deserialize;
use serde_json::Value as Json;
use std::io::Write;

#[derive(Debug, Deserialize)]
struct Schema {
    #[serde(default)]
    patterns: Vec<Pattern>,
}

#[derive(Debug, Deserialize)]
struct Pattern {
    #[serde(default)]
    rules: Vec<Rule>,
}

#[derive(Debug, Deserialize)]
struct Rule {
    context: String,
    #[serde(default)]
    asserts: Vec<Assert>,
}

#[derive(Debug, Deserialize)]
struct Assert {
    test: String,
    message: String,
}

/// Evaluates a rule document against `data`, writing one diagnostic line per
/// failed assertion to `out`. Returns `Ok(true)` iff every assertion held.
pub fn eval(rules: &Json, data: &Json, out: &mut dyn Write) -> Result<bool, SchematronError> {
    let schema = Schema::deserialize(rules).map_err(|e| SchematronError::InvalidRules(e.to_string()))?;

    let env = Environment::new(data);
    let mut all_hold = true;

    for pattern in &schema.patterns {
        for rule in &pattern.rules {
            let context_expr = Expression::new(&rule.context)?;
            let asserts: Vec<(Expression, &Assert)> = rule
                .asserts
                .iter()
                .map(|a| Ok((Expression::new(&a.test)?, a)))
                .collect::<Result<_, SchematronError>>()?;

            let selected = match context_expr.eval(&env)? {
                Value::NodeSet(nodes) => nodes,
                other => {
                    return Err(SchematronError::InvalidRules(format!(
                        "rule context '{}' must select nodes, got a {}",
                        rule.context,
                        other.type_name()
                    )));
                }
            };
            log::debug!(
                "rule context '{}' selected {} node(s)",
                rule.context,
                selected.len()
            );

            for node in selected {
                for (test, assert) in &asserts {
                    let node_env = Environment::with_context(Value::NodeSet(vec![node.clone()]))?;
                    if !test.eval(&node_env)?.to_bool() {
                        all_hold = false;
                        writeln!(out, "assert '{}' failed: {}", assert.test, assert.message)?;
                    }
                }
            }
        }
    }

    Ok(all_hold)
}
