//! The built-in XPath 1.0 function library.

use crate::engine::{EvaluationContext, Value};
use crate::error::XPathError;

/// Dispatches a function call to the correct implementation.
pub(crate) fn evaluate_function<'a>(
    name: &str,
    args: Vec<Value<'a>>,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<Value<'a>, XPathError> {
    match name {
        // Node-set
        "count" => func_count(args),
        "position" => func_position(args, e_ctx),
        "last" => func_last(args, e_ctx),
        "local-name" => func_local_name(args, e_ctx),
        // Without namespaces, name() and local-name() coincide.
        "name" => func_local_name(args, e_ctx),
        "sum" => func_sum(args),

        // String
        "string" => func_string(args, e_ctx),
        "concat" => func_concat(args),
        "starts-with" => func_starts_with(args),
        "contains" => func_contains(args),
        "substring-before" => func_substring_before(args),
        "substring-after" => func_substring_after(args),
        "substring" => func_substring(args),
        "string-length" => func_string_length(args, e_ctx),
        "normalize-space" => func_normalize_space(args, e_ctx),
        "translate" => func_translate(args),

        // Boolean
        "boolean" => func_boolean(args),
        "not" => func_not(args),
        "true" => func_true(args),
        "false" => func_false(args),

        // Number
        "number" => func_number(args, e_ctx),
        "floor" => func_floor(args),
        "ceiling" => func_ceiling(args),
        "round" => func_round(args),

        _ => Err(XPathError::UnknownFunction(name.to_string())),
    }
}

fn check_arity(
    function: &'static str,
    expected: &'static str,
    ok: bool,
    actual: usize,
) -> Result<(), XPathError> {
    if ok {
        Ok(())
    } else {
        Err(XPathError::ArityError {
            function,
            expected,
            actual,
        })
    }
}

// --- Node-set functions ---

fn func_count<'a>(mut args: Vec<Value<'a>>) -> Result<Value<'a>, XPathError> {
    check_arity("count", "1", args.len() == 1, args.len())?;
    match args.remove(0) {
        Value::NodeSet(nodes) => Ok(Value::Number(nodes.len() as f64)),
        v => Err(XPathError::TypeError(format!(
            "count() argument must be a node-set, got {}",
            v.type_name()
        ))),
    }
}

fn func_position<'a>(
    args: Vec<Value<'a>>,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<Value<'a>, XPathError> {
    check_arity("position", "0", args.is_empty(), args.len())?;
    Ok(Value::Number(e_ctx.position as f64))
}

fn func_last<'a>(
    args: Vec<Value<'a>>,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<Value<'a>, XPathError> {
    check_arity("last", "0", args.is_empty(), args.len())?;
    Ok(Value::Number(e_ctx.size as f64))
}

fn func_local_name<'a>(
    mut args: Vec<Value<'a>>,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<Value<'a>, XPathError> {
    check_arity("local-name", "0 or 1", args.len() <= 1, args.len())?;
    let name = if args.is_empty() {
        e_ctx.context_node()?.name().to_string()
    } else {
        match args.remove(0) {
            Value::NodeSet(nodes) => nodes
                .first()
                .map(|n| n.name().to_string())
                .unwrap_or_default(),
            v => {
                return Err(XPathError::TypeError(format!(
                    "local-name() argument must be a node-set, got {}",
                    v.type_name()
                )));
            }
        }
    };
    Ok(Value::String(name))
}

fn func_sum<'a>(mut args: Vec<Value<'a>>) -> Result<Value<'a>, XPathError> {
    check_arity("sum", "1", args.len() == 1, args.len())?;
    match args.remove(0) {
        Value::NodeSet(nodes) => Ok(Value::Number(
            nodes.iter().map(|node| node.number_value()).sum(),
        )),
        v => Err(XPathError::TypeError(format!(
            "sum() argument must be a node-set, got {}",
            v.type_name()
        ))),
    }
}

// --- String functions ---

fn func_string<'a>(
    mut args: Vec<Value<'a>>,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<Value<'a>, XPathError> {
    check_arity("string", "0 or 1", args.len() <= 1, args.len())?;
    let s = if args.is_empty() {
        e_ctx.context.string()
    } else {
        args.remove(0).string()
    };
    Ok(Value::String(s))
}

fn func_concat<'a>(args: Vec<Value<'a>>) -> Result<Value<'a>, XPathError> {
    check_arity("concat", "at least 2", args.len() >= 2, args.len())?;
    let result = args.iter().map(|v| v.string()).collect::<String>();
    Ok(Value::String(result))
}

fn func_starts_with<'a>(mut args: Vec<Value<'a>>) -> Result<Value<'a>, XPathError> {
    check_arity("starts-with", "2", args.len() == 2, args.len())?;
    let s2 = args.remove(1).string();
    let s1 = args.remove(0).string();
    Ok(Value::Boolean(s1.starts_with(&s2)))
}

fn func_contains<'a>(mut args: Vec<Value<'a>>) -> Result<Value<'a>, XPathError> {
    check_arity("contains", "2", args.len() == 2, args.len())?;
    let s2 = args.remove(1).string();
    let s1 = args.remove(0).string();
    Ok(Value::Boolean(s1.contains(&s2)))
}

fn func_substring_before<'a>(mut args: Vec<Value<'a>>) -> Result<Value<'a>, XPathError> {
    check_arity("substring-before", "2", args.len() == 2, args.len())?;
    let s2 = args.remove(1).string();
    let s1 = args.remove(0).string();
    match s1.find(&s2) {
        Some(index) => Ok(Value::String(s1[..index].to_string())),
        None => Ok(Value::String(String::new())),
    }
}

fn func_substring_after<'a>(mut args: Vec<Value<'a>>) -> Result<Value<'a>, XPathError> {
    check_arity("substring-after", "2", args.len() == 2, args.len())?;
    let s2 = args.remove(1).string();
    let s1 = args.remove(0).string();
    match s1.find(&s2) {
        Some(index) => Ok(Value::String(s1[index + s2.len()..].to_string())),
        None => Ok(Value::String(String::new())),
    }
}

fn func_substring<'a>(mut args: Vec<Value<'a>>) -> Result<Value<'a>, XPathError> {
    check_arity("substring", "2 or 3", (2..=3).contains(&args.len()), args.len())?;
    let length_val = if args.len() == 3 {
        Some(args.remove(2).to_number())
    } else {
        None
    };
    let start_val = args.remove(1).to_number();
    let s = args.remove(0).string();

    // XPath rounding rules for start/length; positions are 1-based.
    let first = (start_val + 0.5).floor();
    let last = match length_val {
        Some(l) => first + (l + 0.5).floor(),
        None => f64::INFINITY,
    };

    let result = s
        .chars()
        .enumerate()
        .filter_map(|(i, c)| {
            let pos = (i + 1) as f64;
            if pos >= first && pos < last {
                Some(c)
            } else {
                None
            }
        })
        .collect::<String>();
    Ok(Value::String(result))
}

fn func_string_length<'a>(
    mut args: Vec<Value<'a>>,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<Value<'a>, XPathError> {
    check_arity("string-length", "0 or 1", args.len() <= 1, args.len())?;
    let s = if args.is_empty() {
        e_ctx.context.string()
    } else {
        args.remove(0).string()
    };
    Ok(Value::Number(s.chars().count() as f64))
}

fn func_normalize_space<'a>(
    mut args: Vec<Value<'a>>,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<Value<'a>, XPathError> {
    check_arity("normalize-space", "0 or 1", args.len() <= 1, args.len())?;
    let s = if args.is_empty() {
        e_ctx.context.string()
    } else {
        args.remove(0).string()
    };
    let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
    Ok(Value::String(normalized))
}

fn func_translate<'a>(mut args: Vec<Value<'a>>) -> Result<Value<'a>, XPathError> {
    check_arity("translate", "3", args.len() == 3, args.len())?;
    let to_str: Vec<char> = args.remove(2).string().chars().collect();
    let from_str: Vec<char> = args.remove(1).string().chars().collect();
    let source_str = args.remove(0).string();
    let result = source_str
        .chars()
        .filter_map(|c| match from_str.iter().position(|&fc| fc == c) {
            Some(pos) => to_str.get(pos).copied(),
            None => Some(c),
        })
        .collect::<String>();
    Ok(Value::String(result))
}

// --- Boolean functions ---

fn func_boolean<'a>(mut args: Vec<Value<'a>>) -> Result<Value<'a>, XPathError> {
    check_arity("boolean", "1", args.len() == 1, args.len())?;
    Ok(Value::Boolean(args.remove(0).to_bool()))
}

fn func_not<'a>(mut args: Vec<Value<'a>>) -> Result<Value<'a>, XPathError> {
    check_arity("not", "1", args.len() == 1, args.len())?;
    Ok(Value::Boolean(!args.remove(0).to_bool()))
}

fn func_true<'a>(args: Vec<Value<'a>>) -> Result<Value<'a>, XPathError> {
    check_arity("true", "0", args.is_empty(), args.len())?;
    Ok(Value::Boolean(true))
}

fn func_false<'a>(args: Vec<Value<'a>>) -> Result<Value<'a>, XPathError> {
    check_arity("false", "0", args.is_empty(), args.len())?;
    Ok(Value::Boolean(false))
}

// --- Number functions ---

fn func_number<'a>(
    mut args: Vec<Value<'a>>,
    e_ctx: &EvaluationContext<'a, '_>,
) -> Result<Value<'a>, XPathError> {
    check_arity("number", "0 or 1", args.len() <= 1, args.len())?;
    let n = if args.is_empty() {
        e_ctx.context.to_number()
    } else {
        args.remove(0).to_number()
    };
    Ok(Value::Number(n))
}

fn func_floor<'a>(mut args: Vec<Value<'a>>) -> Result<Value<'a>, XPathError> {
    check_arity("floor", "1", args.len() == 1, args.len())?;
    Ok(Value::Number(args.remove(0).to_number().floor()))
}

fn func_ceiling<'a>(mut args: Vec<Value<'a>>) -> Result<Value<'a>, XPathError> {
    check_arity("ceiling", "1", args.len() == 1, args.len())?;
    Ok(Value::Number(args.remove(0).to_number().ceil()))
}

fn func_round<'a>(mut args: Vec<Value<'a>>) -> Result<Value<'a>, XPathError> {
    check_arity("round", "1", args.len() == 1, args.len())?;
    let n = args.remove(0).to_number();
    if n.is_nan() || n.is_infinite() || n == 0.0 {
        return Ok(Value::Number(n));
    }
    // Halves round towards positive infinity; floor(n + 0.5) covers both
    // signs.
    Ok(Value::Number((n + 0.5).floor()))
}
