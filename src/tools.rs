// Tool catalog and dispatcher
//
// Every tool takes one string argument and maps it 1:1 onto a query parameter
// of its endpoint, except `full_scan`: its `target` argument is classified
// first and sent as whichever of email/ip/url/domain it looks like.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::classifier::classify;
use crate::engine::ApiInvoker;
use crate::error::ToolError;
use crate::models::{InvocationRequest, ToolDefinition};
use crate::reporting::{format_result, ToolReply};

/// Name of the one tool whose parameter is classified before dispatch
pub const FULL_SCAN: &str = "full_scan";

pub static TOOLS: [ToolDefinition; 7] = [
    ToolDefinition {
        name: "check_url",
        description: "Check a URL for phishing, malware and other threats. Returns a risk verdict with the signals that contributed to it.",
        parameter_name: "url",
        parameter_description: "The full URL to check, including scheme (e.g. https://example.com/login)",
        endpoint_path: "check-url",
    },
    ToolDefinition {
        name: "check_password",
        description: "Check whether a password hash appears in known data breaches.",
        parameter_name: "hash",
        parameter_description: "SHA-1 hash of the password, hex encoded. Never send the plaintext password.",
        endpoint_path: "check-password",
    },
    ToolDefinition {
        name: "check_password_range",
        description: "k-anonymity breach lookup: returns all breached hash suffixes sharing a SHA-1 prefix, so the full hash never leaves the client.",
        parameter_name: "prefix",
        parameter_description: "First 5 hex characters of the SHA-1 password hash",
        endpoint_path: "check-password-range",
    },
    ToolDefinition {
        name: "check_domain",
        description: "Check a domain's reputation, registration age, DNS and TLS posture.",
        parameter_name: "domain",
        parameter_description: "Domain name to check (e.g. example.com)",
        endpoint_path: "check-domain",
    },
    ToolDefinition {
        name: "check_ip",
        description: "Check an IPv4 address against threat feeds, blocklists and abuse reports.",
        parameter_name: "ip",
        parameter_description: "IPv4 address to check (e.g. 8.8.8.8)",
        endpoint_path: "check-ip",
    },
    ToolDefinition {
        name: "check_email",
        description: "Check an email address for breach exposure, disposable providers and deliverability issues.",
        parameter_name: "email",
        parameter_description: "Email address to check",
        endpoint_path: "check-email",
    },
    ToolDefinition {
        name: FULL_SCAN,
        description: "Run every applicable check against a target. The target type (email, IP address, URL or domain) is detected automatically.",
        parameter_name: "target",
        parameter_description: "An email address, IPv4 address, URL or domain",
        endpoint_path: "full-scan",
    },
];

/// Look up a tool by name
pub fn find_tool(name: &str) -> Option<&'static ToolDefinition> {
    TOOLS.iter().find(|tool| tool.name == name)
}

/// Outgoing query parameters for an invocation of `tool`
pub fn request_params(
    tool: &ToolDefinition,
    request: &InvocationRequest,
) -> Result<BTreeMap<String, String>, ToolError> {
    let value = request
        .arguments
        .get(tool.parameter_name)
        .ok_or_else(|| ToolError::MissingArgument {
            tool: tool.name.to_string(),
            parameter: tool.parameter_name.to_string(),
        })?;

    if tool.name == FULL_SCAN {
        return Ok(classify(value).into_params());
    }

    let mut params = BTreeMap::new();
    params.insert(tool.parameter_name.to_string(), value.clone());
    Ok(params)
}

/// Routes tool invocations to the Shield API
pub struct ToolDispatcher {
    invoker: ApiInvoker,
}

impl ToolDispatcher {
    pub fn new(invoker: ApiInvoker) -> Self {
        Self { invoker }
    }

    /// The full static catalog, for registration with the host
    pub fn tools(&self) -> &'static [ToolDefinition] {
        &TOOLS
    }

    pub fn invoker(&self) -> &ApiInvoker {
        &self.invoker
    }

    /// Invoke a tool and return the raw JSON from the API
    pub async fn dispatch(&self, request: &InvocationRequest) -> Result<Value, ToolError> {
        let tool = find_tool(&request.tool_name)
            .ok_or_else(|| ToolError::UnknownTool(request.tool_name.clone()))?;
        let params = request_params(tool, request)?;

        tracing::info!(tool = %tool.name, endpoint = %tool.endpoint_path, "Invoking tool");
        self.invoker.invoke(tool.endpoint_path, &params).await
    }

    /// Invoke a tool and format the result for the host
    pub async fn call(&self, request: &InvocationRequest) -> Result<ToolReply, ToolError> {
        let value = self.dispatch(request).await?;
        Ok(format_result(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_names_are_unique() {
        let names: HashSet<_> = TOOLS.iter().map(|t| t.name).collect();
        assert_eq!(names.len(), TOOLS.len());
    }

    #[test]
    fn test_catalog_table() {
        let table: Vec<_> = TOOLS
            .iter()
            .map(|t| (t.name, t.parameter_name, t.endpoint_path))
            .collect();
        assert_eq!(
            table,
            vec![
                ("check_url", "url", "check-url"),
                ("check_password", "hash", "check-password"),
                ("check_password_range", "prefix", "check-password-range"),
                ("check_domain", "domain", "check-domain"),
                ("check_ip", "ip", "check-ip"),
                ("check_email", "email", "check-email"),
                ("full_scan", "target", "full-scan"),
            ]
        );
    }

    #[test]
    fn test_ordinary_tool_maps_parameter_directly() {
        let tool = find_tool("check_ip").unwrap();
        let request = InvocationRequest::new("check_ip").with_argument("ip", "user@example.com");
        let params = request_params(tool, &request).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("ip").map(String::as_str), Some("user@example.com"));
    }

    #[test]
    fn test_full_scan_classifies_target() {
        let tool = find_tool(FULL_SCAN).unwrap();
        let request = InvocationRequest::new(FULL_SCAN).with_argument("target", "user@example.com");
        let params = request_params(tool, &request).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("email").map(String::as_str), Some("user@example.com"));
        assert!(!params.contains_key("target"));
    }

    #[test]
    fn test_full_scan_empty_target_passes_through_as_domain() {
        let tool = find_tool(FULL_SCAN).unwrap();
        let request = InvocationRequest::new(FULL_SCAN).with_argument("target", "");
        let params = request_params(tool, &request).unwrap();
        assert_eq!(params.get("domain").map(String::as_str), Some(""));
    }

    #[test]
    fn test_missing_argument() {
        let tool = find_tool("check_url").unwrap();
        let request = InvocationRequest::new("check_url").with_argument("link", "https://x.test");
        match request_params(tool, &request) {
            Err(ToolError::MissingArgument { tool, parameter }) => {
                assert_eq!(tool, "check_url");
                assert_eq!(parameter, "url");
            }
            other => panic!("expected MissingArgument, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_tool_lookup() {
        assert!(find_tool("check_everything").is_none());
    }
}
