//! tree-sitter backed C parser.

use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

use crate::location::{LineColumn, SourceLocation, SourceRange};
use crate::node::{FunctionNode, ReturnNode, ReturnPlacement, StatementNode, SyntaxTree};
use crate::{AstError, Result};

/// Statement kinds whose body is a single statement rather than a list.
const CONTROL_ARMS: &[&str] = &[
    "if_statement",
    "else_clause",
    "while_statement",
    "for_statement",
    "do_statement",
];

/// Reusable C parser.
pub struct CParser {
    parser: Parser,
}

impl CParser {
    /// Create a parser for the C grammar.
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar ABI does not match the linked
    /// tree-sitter runtime.
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_c::LANGUAGE.into())
            .map_err(|e| AstError::Language(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Parse one translation unit.
    ///
    /// # Errors
    ///
    /// Fails if parsing is aborted or the tree contains a syntax error.
    pub fn parse(&mut self, source: impl Into<String>) -> Result<TranslationUnit> {
        let source = source.into();
        let tree = self
            .parser
            .parse(&source, None)
            .ok_or(AstError::ParseAborted)?;

        if tree.root_node().has_error() {
            let at = first_error(tree.root_node()).map_or(0, |n| n.start_byte());
            let pos = LineColumn::locate(&source, SourceLocation::new(at));
            return Err(AstError::Syntax {
                line: pos.line,
                column: pos.column,
            });
        }

        debug!(bytes = source.len(), "parsed translation unit");
        Ok(TranslationUnit { source, tree })
    }
}

/// A parsed C file.
pub struct TranslationUnit {
    source: String,
    tree: Tree,
}

impl TranslationUnit {
    fn text(&self, node: Node<'_>) -> Option<String> {
        node.utf8_text(self.source.as_bytes()).ok().map(str::to_string)
    }

    fn definition(&self, node: Node<'_>) -> Option<FunctionNode> {
        let name = declarator_name(node.child_by_field_name("declarator")?)
            .and_then(|n| self.text(n))?;
        let body = node.child_by_field_name("body")?;

        let mut cursor = body.walk();
        let last_statement = body
            .named_children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .last()
            .map(|s| {
                let s = unlabeled(s);
                StatementNode {
                    range: range_of(s),
                    is_return: s.kind() == "return_statement",
                }
            });

        Some(FunctionNode {
            name,
            is_definition: true,
            declaration: SourceRange::from_offsets(node.start_byte(), body.start_byte()),
            body: Some(range_of(body)),
            last_statement,
        })
    }

    fn prototypes(&self, node: Node<'_>, out: &mut Vec<FunctionNode>) {
        let mut cursor = node.walk();
        for declarator in node.children_by_field_name("declarator", &mut cursor) {
            let Some(func) = strip_pointers(declarator).filter(|d| d.kind() == "function_declarator")
            else {
                continue;
            };
            let Some(ident) = func
                .child_by_field_name("declarator")
                .filter(|d| d.kind() == "identifier")
            else {
                continue;
            };
            if let Some(name) = self.text(ident) {
                out.push(FunctionNode {
                    name,
                    is_definition: false,
                    declaration: range_of(node),
                    body: None,
                    last_statement: None,
                });
            }
        }
    }
}

impl SyntaxTree for TranslationUnit {
    fn source(&self) -> &str {
        &self.source
    }

    fn functions(&self) -> Vec<FunctionNode> {
        let mut out = Vec::new();
        visit(self.tree.root_node(), |node| match node.kind() {
            "function_definition" => {
                out.extend(self.definition(node));
                false
            }
            "declaration" => {
                self.prototypes(node, &mut out);
                false
            }
            _ => true,
        });
        out
    }

    fn returns(&self, function: &FunctionNode) -> Vec<ReturnNode> {
        let Some(body) = function.body else {
            return Vec::new();
        };
        let (lo, hi) = (body.begin.offset(), body.end.offset());

        let mut out = Vec::new();
        visit(self.tree.root_node(), |node| {
            if node.end_byte() <= lo || node.start_byte() >= hi {
                return false;
            }
            if node.kind() == "return_statement" && node.start_byte() > lo {
                let placement = match node.parent() {
                    Some(p) if CONTROL_ARMS.contains(&p.kind()) => ReturnPlacement::UnbracedArm,
                    _ => ReturnPlacement::StatementList,
                };
                out.push(ReturnNode {
                    begin: SourceLocation::new(node.start_byte()),
                    end: SourceLocation::new(node.end_byte()),
                    placement,
                });
            }
            true
        });
        out
    }
}

fn range_of(node: Node<'_>) -> SourceRange {
    SourceRange::from_offsets(node.start_byte(), node.end_byte())
}

/// Pre-order walk; the callback returns whether to descend into a node.
fn visit<'t>(root: Node<'t>, mut f: impl FnMut(Node<'t>) -> bool) {
    let mut cursor = root.walk();
    loop {
        if f(cursor.node()) && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Strip `label:` prefixes, so `out: return rc;` yields the `return`.
fn unlabeled(node: Node<'_>) -> Node<'_> {
    let mut current = node;
    while current.kind() == "labeled_statement" {
        let mut cursor = current.walk();
        let inner = current
            .named_children(&mut cursor)
            .filter(|c| c.kind() != "comment" && c.kind() != "statement_identifier")
            .last();
        match inner {
            Some(inner) => current = inner,
            None => break,
        }
    }
    current
}

fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut found = None;
    visit(root, |node| {
        if found.is_some() {
            return false;
        }
        if node.is_error() || node.is_missing() {
            found = Some(node);
            return false;
        }
        node.has_error()
    });
    found
}

/// Follow a declarator chain down to the declared identifier.
fn declarator_name(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node;
    loop {
        match current.kind() {
            "identifier" => return Some(current),
            "parenthesized_declarator" | "attributed_declarator" => {
                let mut cursor = current.walk();
                let inner = current.named_children(&mut cursor).next()?;
                current = inner;
            }
            _ => current = current.child_by_field_name("declarator")?,
        }
    }
}

fn strip_pointers(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node;
    while current.kind() == "pointer_declarator" {
        current = current.child_by_field_name("declarator")?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> TranslationUnit {
        CParser::new().unwrap().parse(src).unwrap()
    }

    #[test]
    fn test_definitions_and_prototypes() {
        let unit = parse(
            "int add(int a, int b);\n\
             int add(int a, int b) {\n    return a + b;\n}\n\
             static char *name(void) { return 0; }\n",
        );
        let funcs = unit.functions();
        let names: Vec<_> = funcs.iter().map(|f| (f.name.as_str(), f.has_body())).collect();
        assert_eq!(names, vec![("add", false), ("add", true), ("name", true)]);
        assert!(!funcs[0].is_definition);
        assert!(funcs[1].is_definition);
    }

    #[test]
    fn test_body_and_declaration_ranges() {
        let src = "int main() {\n    return 0;\n}\n";
        let unit = parse(src);
        let main = &unit.functions()[0];
        let body = main.body.unwrap();
        assert_eq!(&src[body.begin.offset()..body.end.offset()], "{\n    return 0;\n}");
        assert_eq!(
            &src[main.declaration.begin.offset()..main.declaration.end.offset()],
            "int main() "
        );
        assert_eq!(main.body.unwrap().end.offset() - 1, src.rfind('}').unwrap());
        assert!(main.ends_with_return());
    }

    #[test]
    fn test_nested_returns() {
        let src = "int max(int a, int b) {\n\
                   if (a > b) {\n return a;\n } else {\n return b;\n }\n}\n\
                   void loop(int n) { while (n) { if (n == 3) return; n--; } }\n";
        let unit = parse(src);
        let funcs = unit.functions();

        let max_returns = unit.returns(&funcs[0]);
        assert_eq!(max_returns.len(), 2);
        assert!(max_returns.iter().all(|r| r.placement == ReturnPlacement::StatementList));
        assert_eq!(&src[max_returns[0].begin.offset()..max_returns[0].end.offset()], "return a;");
        assert!(!funcs[0].ends_with_return());

        let loop_returns = unit.returns(&funcs[1]);
        assert_eq!(loop_returns.len(), 1);
        assert_eq!(loop_returns[0].placement, ReturnPlacement::UnbracedArm);
    }

    #[test]
    fn test_returns_scoped_to_function() {
        let unit = parse("int a(void) { return 1; }\nint b(void) { return 2; }\n");
        let funcs = unit.functions();
        assert_eq!(unit.returns(&funcs[0]).len(), 1);
        assert_eq!(unit.returns(&funcs[1]).len(), 1);
        assert!(unit.returns(&funcs[0])[0].begin < unit.returns(&funcs[1])[0].begin);
    }

    #[test]
    fn test_pointer_returning_definition_name() {
        let unit = parse("int (*pick(int k))(int) { return 0; }\n");
        assert_eq!(unit.functions()[0].name, "pick");
    }

    #[test]
    fn test_last_statement_ignores_comments() {
        let unit = parse("int f(void) {\n    return 1;\n    /* done */\n}\n");
        assert!(unit.functions()[0].ends_with_return());
    }

    #[test]
    fn test_labeled_trailing_return() {
        let src = "int f(int x) {\n    goto out;\nout:\ndone: return x;\n}\n";
        let unit = parse(src);
        let f = &unit.functions()[0];
        assert!(f.ends_with_return());
        let last = f.last_statement.unwrap();
        assert_eq!(&src[last.range.begin.offset()..last.range.end.offset()], "return x;");
        assert_eq!(unit.returns(f)[0].placement, ReturnPlacement::StatementList);

        let unit = parse("void g(void) {\nend:\n    ;\n}\n");
        assert!(!unit.functions()[0].ends_with_return());
    }

    #[test]
    fn test_syntax_error_reports_position() {
        let err = CParser::new().unwrap().parse("int f( {\n").err().unwrap();
        assert!(matches!(err, AstError::Syntax { .. }));
        assert!(err.to_string().starts_with("syntax error at"));
    }

    #[test]
    fn test_preprocessor_directives_are_transparent() {
        let unit = parse("#include <stdio.h>\n#ifdef X\nint g(void) { return 0; }\n#endif\n");
        assert_eq!(unit.functions().len(), 1);
    }
}
