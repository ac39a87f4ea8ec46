use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SymmetryError {
    #[error("Invalid assembly operator expression: '{0}'")]
    InvalidOperatorExpression(String),

    #[error("Assembly '{assembly}' references undefined operator '{id}'")]
    UndefinedOperator { assembly: String, id: String },

    #[error("Invalid symmetry operation '{0}'")]
    InvalidSymop(String),

    #[error("Unit cell parameters are degenerate")]
    DegenerateCell,
}
