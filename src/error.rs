use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum XPathError {
    #[error("Parse error at offset {position}: {message}")]
    ParseError { position: usize, message: String },

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Variable '{0}' not found")]
    UnknownVariable(String),

    #[error("Unknown XPath function '{0}'")]
    UnknownFunction(String),

    #[error("{function}() expects {expected} arguments, got {actual}")]
    ArityError {
        function: &'static str,
        expected: &'static str,
        actual: usize,
    },

    #[error("Axis '{0}' is not supported for JSON documents")]
    UnsupportedAxis(&'static str),

    #[error("Evaluation exceeded the recursion limit of {0}")]
    ResourceError(usize),

    #[error("Context node required")]
    NoContextNode,
}

#[derive(Error, Debug)]
pub enum SchematronError {
    #[error("Invalid rule document: {0}")]
    InvalidRules(String),

    #[error(transparent)]
    Xpath(#[from] XPathError),

    #[error("Failed to write diagnostics: {0}")]
    Io(#[from] std::io::Error),
}
