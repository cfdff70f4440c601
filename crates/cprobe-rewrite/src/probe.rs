//! Text of the generated probe calls.

use crate::config::PlanConfig;

/// Canonical entry-point signature, including the opening brace.
pub const CANONICAL_ENTRY_SIGNATURE: &str = "int main(int argc, char *argv[]) {";

/// Renders probe-call snippets for one configuration.
pub struct ProbeText<'a> {
    config: &'a PlanConfig,
}

impl<'a> ProbeText<'a> {
    #[must_use]
    pub const fn new(config: &'a PlanConfig) -> Self {
        Self { config }
    }

    /// `#include "<header>"` line placed at the start of every file.
    #[must_use]
    pub fn include_directive(&self) -> String {
        format!("#include \"{}\"\n", self.config.runtime_header)
    }

    /// Signature replacing the entry point's declaration through `{`.
    #[must_use]
    pub fn entry_signature(&self) -> String {
        if self.config.entry_point == "main" {
            CANONICAL_ENTRY_SIGNATURE.to_string()
        } else {
            format!("int {}(int argc, char *argv[]) {{", self.config.entry_point)
        }
    }

    /// Inserted after the entry point's opening brace.
    #[must_use]
    pub fn init_call(&self) -> String {
        format!("\n{}(argc, argv);\n", self.config.probes.init)
    }

    /// Inserted where the entry point finishes.
    #[must_use]
    pub fn finalize_call(&self) -> String {
        format!("\n{}();\n", self.config.probes.finalize)
    }

    /// Inserted directly before a `return` of the entry point.
    #[must_use]
    pub fn return_finalize_call(&self) -> String {
        format!("{}();\n", self.config.probes.finalize)
    }

    /// Inserted after a function's opening brace.
    #[must_use]
    pub fn entry_call(&self, function: &str) -> String {
        format!("\n{}(\"{function}\");\n", self.config.probes.entry)
    }

    /// Inserted before a function's closing brace.
    #[must_use]
    pub fn exit_call(&self, function: &str) -> String {
        format!("\n{}(\"{function}\");\n", self.config.probes.exit)
    }

    /// Inserted directly before a `return`.
    #[must_use]
    pub fn return_exit_call(&self, function: &str) -> String {
        format!("{}(\"{function}\");\n", self.config.probes.exit)
    }
}
