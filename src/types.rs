use std::fmt;

use serde::Deserialize;

/// What a task does when it runs.
///
/// Every `[task.<name>]` section names one of these. `Group` has no body of
/// its own and only exists to order its `after` list, which is how the
/// `default` pipeline is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Clean,
    Bundle,
    Generate,
    Serve,
    Watch,
    Reload,
    Command,
    Group,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Clean => "clean",
            StepKind::Bundle => "bundle",
            StepKind::Generate => "generate",
            StepKind::Serve => "serve",
            StepKind::Watch => "watch",
            StepKind::Reload => "reload",
            StepKind::Command => "command",
            StepKind::Group => "group",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
