//! Firewall policy: rule model, rule-file loading and compilation.

mod compiler;
mod loader;
mod rule;
mod types;

pub use compiler::{
    CompileWarning, CompiledEntry, Compilation, Outcome, PolicyCompiler, DEFAULT_POLICY_PRIORITY,
};
pub use loader::{Policy, RawRuleRecord};
pub use rule::{Rule, RuleScope};
pub use types::{Permission, PortLocation, Protocol};
