//! Build error types and diagnostics.
//!
//! Every error is fatal and raised on the first violation: the build is pure,
//! so retrying with the same input reproduces the same error.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error raised while composing a deployment document.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum ComposeError {
    #[error("invalid naming input: {message}")]
    #[diagnostic(code(stagecraft::naming::invalid_argument))]
    InvalidArgument { message: String },

    #[error(
        "unknown stage `{stage}`{}",
        .variable.as_ref().map(|v| format!(" for variable `{v}`")).unwrap_or_default()
    )]
    #[diagnostic(code(stagecraft::variables::unknown_stage))]
    UnknownStage {
        stage: String,
        variable: Option<String>,
    },

    #[error("duplicate export name `{name}`")]
    #[diagnostic(
        code(stagecraft::stack::duplicate_export),
        help("export names are imported by plain lookup; give output `{second}` a different fragment")
    )]
    DuplicateExportName {
        name: String,
        first: String,
        second: String,
    },

    #[error("duplicate function name `{name}`")]
    #[diagnostic(
        code(stagecraft::registry::duplicate_function),
        help("rename `{name}` in one of the registries; merging never overwrites")
    )]
    DuplicateFunctionName {
        name: String,
        first: String,
        second: String,
    },

    #[error("no deployment stage was supplied")]
    #[diagnostic(code(stagecraft::stage::missing))]
    MissingStage,

    #[error("duplicate resource `{logical_id}` in stack `{stack}`")]
    #[diagnostic(code(stagecraft::stack::duplicate_resource))]
    DuplicateResource { stack: String, logical_id: String },

    #[error("`{from}` references `{target}`, which is not a resource of stack `{stack}`")]
    #[diagnostic(
        code(stagecraft::stack::unknown_resource),
        help("structural references stay inside one stack; cross-stack values go through an export")
    )]
    UnknownResource {
        stack: String,
        from: String,
        target: String,
    },

    #[error("invalid manifest: {message}")]
    #[diagnostic(code(stagecraft::manifest::invalid))]
    InvalidManifest { message: String },
}

impl ComposeError {
    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an invalid-manifest error.
    pub fn invalid_manifest(message: impl Into<String>) -> Self {
        Self::InvalidManifest {
            message: message.into(),
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.to_string());

        if let Some(code) = MietteDiagnostic::code(self) {
            diag = diag.with_code(code.to_string());
        }

        match self {
            ComposeError::UnknownStage {
                stage,
                variable: Some(variable),
            } => {
                diag = diag.with_suggestion(format!(
                    "Add `{} = \"...\"` under [variables.{}] in Stagecraft.toml",
                    stage, variable
                ));
            }
            ComposeError::UnknownStage { variable: None, .. } => {
                diag = diag.with_suggestion(suggestions::UNDECLARED_STAGE);
            }
            ComposeError::MissingStage => {
                diag = diag.with_suggestion(suggestions::NO_STAGE);
            }
            ComposeError::DuplicateExportName { first, second, .. } => {
                diag = diag
                    .with_context(format!("exported by output `{}`", first))
                    .with_context(format!("exported again by output `{}`", second));
            }
            ComposeError::DuplicateFunctionName { first, second, .. } => {
                diag = diag
                    .with_context(format!("first defined in {}", first))
                    .with_context(format!("redefined in {}", second));
            }
            _ => {}
        }

        if let Some(help) = MietteDiagnostic::help(self) {
            diag = diag.with_suggestion(help.to_string());
        }

        diag
    }
}

/// Result type alias for composition operations.
pub type Result<T> = std::result::Result<T, ComposeError>;
