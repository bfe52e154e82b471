// Core data models for shield-mcp

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Identifying field a free-form scan target is sent as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Email,
    Ip,
    Url,
    Domain,
}

impl TargetKind {
    /// Query parameter name used by the Shield API
    pub fn param_name(&self) -> &'static str {
        match self {
            TargetKind::Email => "email",
            TargetKind::Ip => "ip",
            TargetKind::Url => "url",
            TargetKind::Domain => "domain",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.param_name())
    }
}

/// A classified target: exactly one identifying parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetParameters {
    pub kind: TargetKind,
    pub value: String,
}

impl TargetParameters {
    pub fn new(kind: TargetKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// The one-entry query parameter set for this target
    pub fn into_params(self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert(self.kind.param_name().to_string(), self.value);
        params
    }
}

/// Static description of one tool exposed over MCP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameter_name: &'static str,
    pub parameter_description: &'static str,
    pub endpoint_path: &'static str,
}

/// One incoming tool call
#[derive(Debug, Clone, Default)]
pub struct InvocationRequest {
    pub tool_name: String,
    pub arguments: HashMap<String, String>,
}

impl InvocationRequest {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments: HashMap::new(),
        }
    }

    /// Builder-style helper for a single argument
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }
}

/// Process-wide operating mode, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    /// No wallet: every request carries `demo=true` and gets sample data
    Demo,
    /// Wallet configured: 402 challenges are paid and retried once
    Paid,
}

impl OperatingMode {
    pub fn is_demo(&self) -> bool {
        matches!(self, OperatingMode::Demo)
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatingMode::Demo => write!(f, "demo"),
            OperatingMode::Paid => write!(f, "paid"),
        }
    }
}
