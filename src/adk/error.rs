// SPDX-License-Identifier: MIT

//! Typed error handling for stepflow-rs
//!
//! The hierarchy mirrors the life of a workflow: problems in the static
//! graph surface as [`GraphConfigError`] before anything runs, state access
//! problems as [`StateError`], and everything that goes wrong while a run is
//! in flight as [`RunError`]. Collaborators (models, HTTP, tools) report
//! through [`StepflowError`], which is also what step implementations return.

use thiserror::Error;

/// Top-level error type for stepflow-rs
#[derive(Debug, Error)]
pub enum StepflowError {
    /// API errors from external services (LLM endpoints, search, target APIs)
    #[error("API error from {provider}: {message}")]
    Api { provider: String, message: String },

    /// Tool not found in the registry
    #[error("Tool '{name}' not found")]
    ToolNotFound { name: String },

    /// Configuration errors (missing env vars, invalid config)
    #[error("Configuration error: {0}")]
    Config(String),

    /// LLM invocation errors
    #[error(transparent)]
    Model(#[from] ModelError),

    /// State access errors raised inside a step
    #[error(transparent)]
    State(#[from] StateError),

    /// Static graph errors
    #[error(transparent)]
    Graph(#[from] GraphConfigError),

    /// Errors raised while a run is in flight
    #[error(transparent)]
    Run(#[from] RunError),

    /// OpenAPI reduction errors
    #[error(transparent)]
    OpenApi(#[from] OpenApiError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

impl StepflowError {
    /// Create an API error
    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a tool not found error
    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Self::ToolNotFound { name: name.into() }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create from a generic message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<&str> for StepflowError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for StepflowError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

/// Errors reading or updating a workflow state snapshot
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    /// Field is not part of the state schema
    #[error("State field '{field}' is not declared in the schema")]
    MissingField { field: String },

    /// Value does not match the declared field type
    #[error("State field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// A typed record could not be converted to or from the state
    #[error("State record conversion failed: {0}")]
    Record(String),
}

impl StateError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}

/// Structural problems in a graph definition, detected by `GraphBuilder::compile`
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphConfigError {
    #[error("Graph has no steps")]
    EmptyGraph,

    #[error("Step '{0}' is declared more than once")]
    DuplicateStep(String),

    #[error("Step name '{0}' is reserved for a terminal marker")]
    ReservedName(String),

    #[error("Graph has no entry point")]
    MissingEntryPoint,

    #[error("Entry point '{0}' is not a declared step")]
    UnknownEntryPoint(String),

    #[error("Edge source '{0}' is not a declared step")]
    UnknownSource(String),

    #[error("Edge from '{from}' references undeclared step '{to}'")]
    DanglingEdge { from: String, to: String },

    #[error("Step '{0}' has more than one outgoing edge configuration")]
    ConflictingEdges(String),

    #[error("Step '{0}' has no outgoing edge")]
    MissingEdge(String),

    #[error("Steps unreachable from the entry point: {0:?}")]
    Unreachable(Vec<String>),

    #[error("Invalid router condition on '{step}': {message}")]
    InvalidCondition { step: String, message: String },

    /// An embedded failure leaves no directive, so a command-routed step has nowhere to go
    #[error("Step '{0}' embeds its errors but is routed only by its own directives")]
    EmbedWithoutRoute(String),
}

/// Failures of a single run
#[derive(Debug, Error)]
pub enum RunError {
    /// A step with a propagate policy failed
    #[error("Step '{step}' failed: {source}")]
    StepInvocation {
        step: String,
        #[source]
        source: Box<StepflowError>,
    },

    /// A directive or router resolved to a name the graph does not declare
    #[error("Step '{step}' routed to undeclared step '{target}'")]
    RouterResolution { step: String, target: String },

    /// A command-routed step returned no directive
    #[error("Step '{0}' returned no next step and has no configured edge")]
    NoRoute(String),

    /// Merging a step update failed, or its router read an undeclared field
    #[error("State error after step '{step}': {source}")]
    State {
        step: String,
        #[source]
        source: StateError,
    },

    /// Optional safety limit configured through `RunOptions`
    #[error("Run exceeded the step limit of {0}")]
    StepLimitExceeded(usize),
}

/// Condition expression parse errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConditionError {
    #[error("Could not parse condition: {0}")]
    InvalidExpression(String),

    #[error("Could not parse literal: {0}")]
    InvalidLiteral(String),
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// API key not configured
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    /// The endpoint could not be called or returned an error status
    #[error("Model invocation failed: {0}")]
    Invocation(String),

    /// The model answered, but not in the requested shape
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        Self::Invocation(err.to_string())
    }
}

/// OpenAPI reduction errors
#[derive(Debug, Error)]
pub enum OpenApiError {
    #[error("Failed to read OpenAPI document: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse OpenAPI document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Failed to convert OpenAPI document: {0}")]
    Convert(#[from] serde_json::Error),

    #[error("No server matches environment '{0}'")]
    NoMatchingServer(String),

    #[error("Unresolvable reference: {0}")]
    UnresolvedRef(String),
}
