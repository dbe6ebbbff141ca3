//! Compiler Errors

use thiserror::Error;

use crate::parse_util::SourcePosition;

pub type Result<T> = std::result::Result<T, CompilerError>;

#[derive(Debug, Error)]
pub enum CompilerError {
    /// Malformed commands, missing names and other structural problems.
    #[error("{message}")]
    Syntax {
        message: String,
        index: usize,
        line: usize,
        column: usize,
    },

    /// A binding expression that cannot be translated to server code.
    /// Positions are relative to the fragment until remapped.
    #[error("{message}")]
    Translation {
        message: String,
        index: usize,
        line: usize,
        column: usize,
    },

    #[error("{message}")]
    InvalidView { message: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CompilerError {
    pub fn syntax(message: impl Into<String>, position: Option<SourcePosition>) -> Self {
        let position = position.unwrap_or_default();
        CompilerError::Syntax {
            message: message.into(),
            index: position.index,
            line: position.line,
            column: position.column,
        }
    }

    pub fn translation(message: impl Into<String>, position: SourcePosition) -> Self {
        CompilerError::Translation {
            message: message.into(),
            index: position.index,
            line: position.line,
            column: position.column,
        }
    }

    pub fn invalid_view(message: impl Into<String>) -> Self {
        CompilerError::InvalidView {
            message: message.into(),
        }
    }

    pub fn is_translation(&self) -> bool {
        matches!(self, CompilerError::Translation { .. })
    }

    pub fn position(&self) -> Option<SourcePosition> {
        match self {
            CompilerError::Syntax { index, line, column, .. }
            | CompilerError::Translation { index, line, column, .. } => {
                Some(SourcePosition::new(*index, *line, *column))
            }
            CompilerError::Json(err) => Some(SourcePosition::new(0, err.line(), err.column())),
            _ => None,
        }
    }
}
