//! Syntax nodes surfaced to the patch planner.

use crate::location::{SourceLocation, SourceRange};

/// A function declaration or definition found in a translation unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionNode {
    pub name: String,
    /// False for prototypes (`int f(void);`).
    pub is_definition: bool,
    /// Begin of the declaration up to the opening brace of the body
    /// (or the end of the declaration when there is no body).
    pub declaration: SourceRange,
    /// Compound statement including both braces.
    pub body: Option<SourceRange>,
    /// Last statement directly inside the body, comments excluded.
    pub last_statement: Option<StatementNode>,
}

impl FunctionNode {
    #[must_use]
    pub const fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// True if the body ends with a `return` statement.
    #[must_use]
    pub fn ends_with_return(&self) -> bool {
        self.last_statement.is_some_and(|s| s.is_return)
    }
}

/// A statement directly inside a function body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatementNode {
    pub range: SourceRange,
    pub is_return: bool,
}

/// Where a `return` sits syntactically.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnPlacement {
    /// Inside a statement list (compound statement, case arm, label).
    StatementList,
    /// The sole, unbraced arm of an `if`/`else`/`while`/`for`/`do`.
    UnbracedArm,
}

/// A `return` statement nested anywhere inside a function body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReturnNode {
    pub begin: SourceLocation,
    /// One past the terminating semicolon.
    pub end: SourceLocation,
    pub placement: ReturnPlacement,
}

/// Read access to a parsed translation unit.
///
/// The planner is written against this trait so it never touches the
/// parser directly.
pub trait SyntaxTree {
    /// Original text of the translation unit.
    fn source(&self) -> &str;

    /// Every function declaration and definition, in source order.
    fn functions(&self) -> Vec<FunctionNode>;

    /// Every return statement in `function`'s body, in source order.
    fn returns(&self, function: &FunctionNode) -> Vec<ReturnNode>;
}
