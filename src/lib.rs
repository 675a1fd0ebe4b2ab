//! XPath 1.0 over JSON.
//!
//! This crate evaluates XPath 1.0 expressions against a JSON document,
//! treating the JSON tree as if it were an XML element tree: object members
//! become named elements, array elements become repeated siblings under the
//! array's key, and primitives carry the text. On top of the engine sits a
//! small Schematron-style rule layer ([`schematron`]).
//!
//! ```
//! use serde_json::json;
//!
//! let data = json!({ "a": { "b": [1, 2, 3] } });
//! let result = jxpath::eval("count(/a/b[. > 1])", &data).unwrap();
//! assert_eq!(result.to_number(), 2.0);
//! ```
//!
//! A compiled [`Expression`] is immutable and can be evaluated repeatedly,
//! also from several threads at once, as long as each thread brings its own
//! [`Environment`]. Node-sets borrow from the JSON document, so the document
//! must outlive every [`Value`] derived from it.

pub mod ast;
pub mod document;
pub mod engine;
pub mod error;
pub mod parser;
pub mod schematron;

mod axes;
mod functions;
mod operators;

pub use document::{Document, Node};
pub use engine::{Environment, Value};
pub use error::{SchematronError, XPathError};
pub use parser::parse_expression;

use serde_json::Value as Json;

/// A compiled XPath expression.
#[derive(Debug, Clone)]
pub struct Expression {
    root: ast::Expr,
}

impl Expression {
    /// Parses `text` as an XPath 1.0 expression.
    pub fn new(text: &str) -> Result<Self, XPathError> {
        Ok(Expression {
            root: parser::parse_expression(text)?,
        })
    }

    /// Evaluates the expression against an environment.
    pub fn eval<'a>(&self, env: &Environment<'a>) -> Result<Value<'a>, XPathError> {
        engine::evaluate_with_env(&self.root, env)
    }
}

/// Parses and evaluates `xpath` against `json` in one go.
pub fn eval<'a>(xpath: &str, json: &'a Json) -> Result<Value<'a>, XPathError> {
    let expression = Expression::new(xpath)?;
    let env = Environment::new(json);
    expression.eval(&env)
}
