//! Patch planning over a parsed translation unit.
//!
//! Every function definition with a body is instrumented exactly once:
//!
//! - the entry point gets a canonical `(argc, argv)` signature, an init call
//!   after its opening brace and a finalize call where it finishes;
//! - every other function gets an entry call after its opening brace, an exit
//!   call before each `return`, and an exit call before its closing brace.
//!
//! Insertion points are taken from syntax nodes, never from character
//! offsets relative to the text around them.

use cprobe_ast::{FunctionNode, ReturnNode, ReturnPlacement, SourceRange, SyntaxTree};
use tracing::debug;

use crate::compose::Compositor;
use crate::config::{EntryFinalize, PlanConfig, TrailingExit};
use crate::patch::PatchSet;
use crate::probe::ProbeText;
use crate::Result;

/// What a planning pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlanSummary {
    /// Instrumented function names, in source order (entry point included).
    pub functions: Vec<String>,
    /// True if the entry point was found and rewritten.
    pub entry_point: bool,
    /// Return statements that received a probe call.
    pub return_sites: usize,
    /// Prototypes and other bodiless declarations that were left alone.
    pub skipped: usize,
}

/// Patches for one file plus what produced them.
#[derive(Clone, Debug)]
pub struct Plan {
    pub patches: PatchSet,
    pub summary: PlanSummary,
}

/// Instrumented text for one file.
#[derive(Clone, Debug)]
pub struct Instrumented {
    pub source: String,
    pub summary: PlanSummary,
}

/// Computes the patch set for a translation unit.
pub struct PatchPlanner {
    config: PlanConfig,
}

impl PatchPlanner {
    #[must_use]
    pub const fn new(config: PlanConfig) -> Self {
        Self { config }
    }

    /// Walk `tree` once and collect every patch.
    pub fn plan<T: SyntaxTree + ?Sized>(&self, tree: &T) -> Plan {
        let mut patches = PatchSet::new();
        let mut summary = PlanSummary::default();

        for func in tree.functions() {
            let Some(body) = func.body.filter(|_| func.is_definition) else {
                debug!(function = %func.name, "skipping declaration");
                summary.skipped += 1;
                continue;
            };

            if func.name == self.config.entry_point {
                self.plan_entry_point(tree, &func, body, &mut patches, &mut summary);
            } else {
                self.plan_function(tree, &func, body, &mut patches, &mut summary);
            }
            summary.functions.push(func.name);
        }

        debug!(
            functions = summary.functions.len(),
            patches = patches.len(),
            returns = summary.return_sites,
            "planned translation unit"
        );
        Plan { patches, summary }
    }

    /// Plan and apply, prepending the runtime header include.
    ///
    /// A line that already includes the runtime header is dropped, so the
    /// output has exactly one such directive, at the very start.
    ///
    /// # Errors
    ///
    /// Fails only if the planned patches violate the compositor's invariants.
    pub fn instrument<T: SyntaxTree + ?Sized>(&self, tree: &T) -> Result<Instrumented> {
        let Plan {
            mut patches,
            summary,
        } = self.plan(tree);
        let include = ProbeText::new(&self.config).include_directive();
        for line in directive_lines(tree.source(), &include) {
            debug!(range = %line, "dropping existing runtime header include");
            patches.replace(line, "");
        }
        let source = Compositor::new(tree.source())
            .with_header(include)
            .compose(&patches)?;
        Ok(Instrumented { source, summary })
    }

    fn plan_entry_point<T: SyntaxTree + ?Sized>(
        &self,
        tree: &T,
        func: &FunctionNode,
        body: SourceRange,
        patches: &mut PatchSet,
        summary: &mut PlanSummary,
    ) {
        let text = ProbeText::new(&self.config);
        let open = body.begin + 1;
        let close = body.end - 1;

        // The replaced range ends just past `{`, so the init call lands
        // after the canonical signature's own brace.
        patches.replace(
            SourceRange::new(func.declaration.begin, open),
            text.entry_signature(),
        );
        patches.insert(open, text.init_call());

        match self.config.entry_finalize {
            EntryFinalize::BeforeTrailingStatement => {
                let at = func
                    .last_statement
                    .filter(|s| s.is_return)
                    .map_or(close, |s| s.range.begin);
                patches.insert(at, text.finalize_call());
            }
            EntryFinalize::EveryReturn => {
                let call = text.return_finalize_call();
                for ret in tree.returns(func) {
                    self.guard_return(patches, &ret, &call);
                    summary.return_sites += 1;
                }
                if !func.ends_with_return() {
                    patches.insert(close, text.finalize_call());
                }
            }
        }

        debug!(function = %func.name, "instrumented entry point");
        summary.entry_point = true;
    }

    fn plan_function<T: SyntaxTree + ?Sized>(
        &self,
        tree: &T,
        func: &FunctionNode,
        body: SourceRange,
        patches: &mut PatchSet,
        summary: &mut PlanSummary,
    ) {
        let text = ProbeText::new(&self.config);
        let name = func.name.as_str();

        patches.insert(body.begin + 1, text.entry_call(name));

        // Returns are emitted before the closing-brace exit: a return ending
        // right at `}` may carry a closing brace of its own that must come
        // first.
        let call = text.return_exit_call(name);
        let returns = tree.returns(func);
        for ret in &returns {
            self.guard_return(patches, ret, &call);
        }
        summary.return_sites += returns.len();

        let elide = self.config.trailing_exit == TrailingExit::Elide && func.ends_with_return();
        if !elide {
            patches.insert(body.end - 1, text.exit_call(name));
        }

        debug!(function = name, returns = returns.len(), elide, "instrumented function");
    }

    fn guard_return(&self, patches: &mut PatchSet, ret: &ReturnNode, call: &str) {
        if ret.placement == ReturnPlacement::UnbracedArm && self.config.brace_unbraced_returns {
            patches.insert(ret.begin, format!("{{\n{call}"));
            patches.insert(ret.end, "\n}");
        } else {
            patches.insert(ret.begin, call);
        }
    }
}

/// Lines of `source` (newline included) consisting of `directive` alone.
fn directive_lines(source: &str, directive: &str) -> Vec<SourceRange> {
    let wanted = directive.trim();
    let mut begin = 0;
    let mut lines = Vec::new();
    for line in source.split_inclusive('\n') {
        if line.trim() == wanted {
            lines.push(SourceRange::from_offsets(begin, begin + line.len()));
        }
        begin += line.len();
    }
    lines
}

/// Instrument `tree` with `config`.
///
/// # Errors
///
/// See [`PatchPlanner::instrument`].
pub fn instrument<T: SyntaxTree + ?Sized>(tree: &T, config: &PlanConfig) -> Result<Instrumented> {
    PatchPlanner::new(config.clone()).instrument(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cprobe_ast::CParser;

    const HEADER: &str = "#include \"runtime_library.h\"\n";

    fn run(src: &str, config: PlanConfig) -> Instrumented {
        let unit = CParser::new().unwrap().parse(src).unwrap();
        instrument(&unit, &config).unwrap()
    }

    fn run_default(src: &str) -> String {
        run(src, PlanConfig::default()).source
    }

    #[test]
    fn test_standard_function_layout() {
        let out = run_default("int add(int a, int b) {\n    return a + b;\n}\n");
        assert_eq!(
            out,
            format!(
                "{HEADER}int add(int a, int b) {{\n\
                 runtime_function_entry(\"add\");\n\
                 \n    runtime_function_exit(\"add\");\n\
                 return a + b;\n\
                 \nruntime_function_exit(\"add\");\n}}\n"
            )
        );
    }

    #[test]
    fn test_entry_point_layout() {
        let out = run_default("int main() {\n    int s = add(1, 2);\n    return 0;\n}\n");
        assert_eq!(
            out,
            format!(
                "{HEADER}int main(int argc, char *argv[]) {{\n\
                 runtime_library_init(argc, argv);\n\
                 \n    int s = add(1, 2);\n    \n\
                 runtime_library_finalize();\n\
                 return 0;\n}}\n"
            )
        );
    }

    #[test]
    fn test_entry_point_signatures_canonicalized() {
        for sig in [
            "int main()",
            "int main(void)",
            "int main(int argc, char **argv)",
            "void main()",
            "static int\nmain (int argc, const char *argv[])",
        ] {
            let out = run_default(&format!("{sig} {{\n    return 0;\n}}\n"));
            assert!(
                out.starts_with(&format!("{HEADER}int main(int argc, char *argv[]) {{\n")),
                "{sig}: {out}"
            );
            assert_eq!(out.matches("int main(").count(), 1);
            assert!(!out.contains("runtime_function_entry"));
        }
    }

    #[test]
    fn test_entry_point_without_trailing_return() {
        let out = run_default("int main(void) {\n    puts(\"x\");\n}\n");
        assert!(out.ends_with("puts(\"x\");\n\nruntime_library_finalize();\n}\n"), "{out}");
    }

    #[test]
    fn test_entry_point_early_return_skips_finalize() {
        let src = "int main(int argc, char **argv) {\n\
                   if (argc > 1) {\n return 1;\n }\n return 0;\n}\n";
        let out = run_default(src);
        assert_eq!(out.matches("runtime_library_finalize();").count(), 1);
        assert!(out.contains("runtime_library_finalize();\nreturn 0;"));
        assert!(out.contains("{\n return 1;"));
    }

    #[test]
    fn test_entry_point_every_return_policy() {
        let src = "int main(int argc, char **argv) {\n\
                   if (argc > 1) return 1;\n return 0;\n}\n";
        let config = PlanConfig::default().with_entry_finalize(EntryFinalize::EveryReturn);
        let result = run(src, config);
        let out = result.source;
        assert_eq!(out.matches("runtime_library_finalize();").count(), 2);
        assert!(out.contains("if (argc > 1) {\nruntime_library_finalize();\nreturn 1;\n}"));
        assert!(out.contains("runtime_library_finalize();\nreturn 0;\n}"));
        assert_eq!(result.summary.return_sites, 2);
    }

    #[test]
    fn test_every_return_exit_precedes_return() {
        let src = "int max(int a, int b) {\n\
                   if (a > b) {\n return a;\n } else {\n return b;\n }\n}\n";
        let out = run_default(src);
        assert!(out.contains("runtime_function_exit(\"max\");\nreturn a;"));
        assert!(out.contains("runtime_function_exit(\"max\");\nreturn b;"));
        // Plus the closing-brace exit.
        assert_eq!(out.matches("runtime_function_exit(\"max\");").count(), 3);
        assert_eq!(out.matches("runtime_function_entry(\"max\");").count(), 1);
    }

    #[test]
    fn test_trailing_return_gets_two_exits() {
        let out = run_default("int mul(int a,int b)\n{\n    return a*b;\n}\n");
        let exit = "runtime_function_exit(\"mul\");";
        let first = out.find(exit).unwrap();
        let ret = out.find("return a*b;").unwrap();
        let second = out.rfind(exit).unwrap();
        assert!(first < ret && ret < second);
        assert_eq!(out.matches(exit).count(), 2);
    }

    #[test]
    fn test_entry_point_labeled_trailing_return() {
        let src = "int main(void) {\n    int rc = 0;\n    goto out;\nout:\n    return rc;\n}\n";
        let out = run_default(src);
        assert!(
            out.ends_with("out:\n    \nruntime_library_finalize();\nreturn rc;\n}\n"),
            "{out}"
        );
        assert_eq!(out.matches("runtime_library_finalize();").count(), 1);
    }

    #[test]
    fn test_labeled_trailing_return_elided() {
        let src = "int f(int x) {\n    if (x) goto done;\n    x++;\ndone:\n    return x;\n}\n";
        let config = PlanConfig::default().with_trailing_exit(TrailingExit::Elide);
        let out = run(src, config).source;
        assert_eq!(out.matches("runtime_function_exit(\"f\");").count(), 1);
        assert!(out.contains("done:\n    runtime_function_exit(\"f\");\nreturn x;\n}"));

        // The default keeps the unreachable closing exit.
        assert_eq!(run_default(src).matches("runtime_function_exit(\"f\");").count(), 2);
    }

    #[test]
    fn test_trailing_exit_elided() {
        let config = PlanConfig::default().with_trailing_exit(TrailingExit::Elide);
        let out = run("int mul(int a,int b)\n{\n    return a*b;\n}\n", config).source;
        assert_eq!(out.matches("runtime_function_exit(\"mul\");").count(), 1);

        // A void function that falls off the end keeps its closing exit.
        let config = PlanConfig::default().with_trailing_exit(TrailingExit::Elide);
        let out = run("void f(int x) {\n    if (x) { return; }\n    g();\n}\n", config).source;
        assert_eq!(out.matches("runtime_function_exit(\"f\");").count(), 2);
    }

    #[test]
    fn test_unbraced_return_is_wrapped() {
        let src = "int sign(int x) {\n    if (x < 0) return -1;\n    else return 1;\n}\n";
        let out = run_default(src);
        assert!(out.contains("if (x < 0) {\nruntime_function_exit(\"sign\");\nreturn -1;\n}"));
        assert!(out.contains("else {\nruntime_function_exit(\"sign\");\nreturn 1;\n}"));

        let config = PlanConfig::default().with_brace_unbraced_returns(false);
        let out = run(src, config).source;
        assert!(out.contains("if (x < 0) runtime_function_exit(\"sign\");\nreturn -1;"));
    }

    #[test]
    fn test_unbraced_return_at_closing_brace() {
        let out = run_default("int f(int x) { if (x) return 1;}\n");
        assert!(
            out.contains("return 1;\n}\nruntime_function_exit(\"f\");\n}"),
            "{out}"
        );
    }

    #[test]
    fn test_empty_bodies() {
        let out = run_default("void f(void) {}\nint main(void) {}\n");
        assert!(out.contains(
            "void f(void) {\nruntime_function_entry(\"f\");\n\nruntime_function_exit(\"f\");\n}"
        ));
        assert!(out.contains(
            "int main(int argc, char *argv[]) {\nruntime_library_init(argc, argv);\n\nruntime_library_finalize();\n}"
        ));
    }

    #[test]
    fn test_nested_loop_returns() {
        let src = "void scan(int *v, int n) {\n\
                   for (int i = 0; i < n; i++) {\n\
                   while (v[i]) {\n if (v[i] == 7) { return; }\n v[i]--;\n }\n }\n}\n";
        let result = run(src, PlanConfig::default());
        assert_eq!(result.summary.return_sites, 1);
        assert!(result.source.contains("{ runtime_function_exit(\"scan\");\nreturn; }"));
    }

    #[test]
    fn test_header_exactly_once() {
        for src in [
            "",
            "int x;\n",
            "int f(void);\n",
            "int a(void) { return 1; }\nint b(void) { return 2; }\nint main(void) { return a() + b(); }\n",
        ] {
            let out = run_default(src);
            assert!(out.starts_with(HEADER));
            assert_eq!(out.matches(HEADER.trim_end()).count(), 1);
        }
    }

    #[test]
    fn test_existing_header_include_not_duplicated() {
        let src = "#include \"runtime_library.h\"\n#include <stdio.h>\n\
                   #include \"runtime_library.h\"\nint f(void) { return 0; }\n";
        let out = run_default(src);
        assert!(out.starts_with(&format!("{HEADER}#include <stdio.h>\nint f(void) {{")), "{out}");
        assert_eq!(out.matches("runtime_library.h").count(), 1);

        // Surrounding blanks do not hide the directive.
        let out = run_default("int x;\n  #include \"runtime_library.h\"  \nint y;\n");
        assert_eq!(out, format!("{HEADER}int x;\nint y;\n"));
    }

    #[test]
    fn test_declarations_skipped() {
        let result = run(
            "int helper(int);\nint helper(int x) { return x; }\n",
            PlanConfig::default(),
        );
        assert_eq!(result.summary.functions, vec!["helper".to_string()]);
        assert_eq!(result.summary.skipped, 1);
        assert!(result.source.contains("int helper(int);\nint helper(int x) {"));
        assert!(!result.summary.entry_point);

        let plan = PatchPlanner::new(PlanConfig::default()).plan(
            &CParser::new().unwrap().parse("int helper(int);\nextern int g;\n").unwrap(),
        );
        assert!(plan.patches.is_empty());
        assert_eq!(plan.summary.skipped, 1);
    }

    #[test]
    fn test_every_definition_instrumented_once() {
        let src = "static inline int sq(int x) { return x * x; }\n\
                   int fact(int n) { if (n <= 1) { return 1; } return n * fact(n - 1); }\n\
                   int main(void) { return sq(fact(3)); }\n";
        let result = run(src, PlanConfig::default());
        assert_eq!(result.summary.functions, vec!["sq", "fact", "main"]);
        assert!(result.summary.entry_point);
        for name in ["sq", "fact"] {
            let entry = format!("runtime_function_entry(\"{name}\");");
            assert_eq!(result.source.matches(&entry).count(), 1);
        }
    }

    #[test]
    fn test_custom_probe_names() {
        let config = PlanConfig::default()
            .with_runtime_header("probe.h")
            .with_probes(crate::ProbeNames {
                init: "p_init".into(),
                entry: "p_enter".into(),
                exit: "p_leave".into(),
                finalize: "p_fini".into(),
            });
        let out = run("void f(void) { }\nint main(void) { f(); return 0; }\n", config).source;
        assert!(out.starts_with("#include \"probe.h\"\n"));
        assert!(out.contains("p_enter(\"f\");"));
        assert!(out.contains("p_leave(\"f\");"));
        assert!(out.contains("p_init(argc, argv);"));
        assert!(out.contains("p_fini();\nreturn 0;"));
    }
}
