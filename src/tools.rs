//! Tool registry: the two AgentOps tools, their input schemas, and handlers.
//!
//! Every schema carries two injected credential fields, `AGENTOPS_API_KEY`
//! (required) and `AGENTOPS_API_URL` (optional), next to the tool's own
//! parameters. Each invocation builds its own [`AgentOpsClient`], so session
//! tokens never outlive a single call.

use std::sync::Arc;
use std::time::Duration;

use rmcp::model::{JsonObject, Tool};
use serde_json::{json, Value};

use crate::client::AgentOpsClient;
use crate::config::AdapterConfig;
use crate::error::{AdapterError, Result};
use crate::observability::mask_key;

pub const API_KEY_FIELD: &str = "AGENTOPS_API_KEY";
pub const API_URL_FIELD: &str = "AGENTOPS_API_URL";

pub const DEFAULT_LIMIT: u32 = 5;
/// `limit` must be strictly greater than this.
pub const LIMIT_EXCLUSIVE_MIN: i64 = 0;
/// `limit` must be strictly less than this.
pub const LIMIT_EXCLUSIVE_MAX: i64 = 100;

// ---------------------------------------------------------------------------
// ToolKind
// ---------------------------------------------------------------------------

/// The registered tools, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    ListTraces,
    TraceDetail,
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::ListTraces, ToolKind::TraceDetail];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ListTraces => "list_traces",
            Self::TraceDetail => "trace_detail",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// API key and base URL pulled out of a tool call's arguments.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_url: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &mask_key(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Credentials {
    /// Remove the credential fields from `args`.
    ///
    /// A missing or null URL falls back to `default_url`. The URL is not
    /// checked for well-formedness; a bad one fails in the HTTP layer.
    pub fn extract(args: &mut JsonObject, default_url: &str) -> Result<Self> {
        let api_key = args.remove(API_KEY_FIELD);
        let api_url = args.remove(API_URL_FIELD);

        let api_key = match api_key {
            Some(Value::String(key)) if !key.is_empty() => key,
            Some(Value::String(_)) | Some(Value::Null) | None => {
                return Err(AdapterError::Validation(format!("{API_KEY_FIELD} is required")))
            }
            Some(_) => {
                return Err(AdapterError::Validation(format!("{API_KEY_FIELD} must be a string")))
            }
        };

        let api_url = match api_url {
            Some(Value::String(url)) => url,
            Some(Value::Null) | None => default_url.to_string(),
            Some(_) => {
                return Err(AdapterError::Validation(format!("{API_URL_FIELD} must be a string")))
            }
        };

        Ok(Self { api_key, api_url })
    }
}

// ---------------------------------------------------------------------------
// Parameter validation
// ---------------------------------------------------------------------------

/// Validate `limit` against the exclusive bounds (0, 100).
pub fn validate_limit(limit: i64) -> Result<u32> {
    if limit <= LIMIT_EXCLUSIVE_MIN || limit >= LIMIT_EXCLUSIVE_MAX {
        return Err(AdapterError::Validation(format!(
            "limit must be greater than {LIMIT_EXCLUSIVE_MIN} and less than {LIMIT_EXCLUSIVE_MAX}, got {limit}"
        )));
    }
    u32::try_from(limit).map_err(|_| AdapterError::Validation(format!("invalid limit: {limit}")))
}

/// Read `limit`, accepting integral floats (`5.0`) and decimal-integer
/// strings (`"5"`) as well as plain integers.
fn parse_limit(args: &JsonObject) -> Result<u32> {
    let not_integer =
        |v: &Value| AdapterError::Validation(format!("limit must be an integer, got {v}"));

    let value = match args.get("limit") {
        None | Some(Value::Null) => return Ok(DEFAULT_LIMIT),
        Some(value) => value,
    };
    let limit = match value {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i,
            // Float-to-int casts saturate, so huge values still fail the bounds check.
            (None, Some(f)) if f.fract() == 0.0 => f as i64,
            _ => return Err(not_integer(value)),
        },
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| not_integer(value))?,
        _ => return Err(not_integer(value)),
    };
    validate_limit(limit)
}

fn parse_trace_id(args: &JsonObject) -> Result<String> {
    match args.get("trace_id") {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(Value::String(_)) | Some(Value::Null) | None => {
            Err(AdapterError::Validation("trace_id is required".into()))
        }
        Some(_) => Err(AdapterError::Validation("trace_id must be a string".into())),
    }
}

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

fn credential_properties(default_url: &str) -> (Value, Value) {
    (
        json!({
            "type": "string",
            "description": "AgentOps API key for authentication. This key is required for all API requests.",
        }),
        json!({
            "type": "string",
            "description": format!(
                "Optional custom URL for AgentOps API. Use this to override the default endpoint \
                 when connecting to a non-production server. Default: {default_url}"
            ),
            "default": default_url,
        }),
    )
}

fn into_object(value: Value) -> JsonObject {
    match value {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

/// Input schema for `list_traces`.
pub fn list_traces_schema(default_url: &str) -> JsonObject {
    let (api_key, api_url) = credential_properties(default_url);
    into_object(json!({
        "type": "object",
        "title": "ListTraces",
        "properties": {
            "limit": {
                "type": "integer",
                "description": "Maximum number of traces to return",
                "default": DEFAULT_LIMIT,
                "exclusiveMinimum": LIMIT_EXCLUSIVE_MIN,
                "exclusiveMaximum": LIMIT_EXCLUSIVE_MAX,
            },
            API_KEY_FIELD: api_key,
            API_URL_FIELD: api_url,
        },
        "required": [API_KEY_FIELD],
    }))
}

/// Input schema for `trace_detail`.
pub fn trace_detail_schema(default_url: &str) -> JsonObject {
    let (api_key, api_url) = credential_properties(default_url);
    into_object(json!({
        "type": "object",
        "title": "TraceDetail",
        "properties": {
            "trace_id": {
                "type": "string",
                "description": "Trace ID to retrieve details for (from trace_id field in list_traces response)",
            },
            API_KEY_FIELD: api_key,
            API_URL_FIELD: api_url,
        },
        "required": ["trace_id", API_KEY_FIELD],
    }))
}

fn list_traces_description(default_url: &str) -> String {
    format!(
        "List traces from AgentOps API.\n\n\
         Returns the most recent traces from your project, including:\n\
         - Trace ID, number of spans, start time, and end time\n\
         - Total number of traces in the database\n\n\
         This tool requires:\n\
         - {API_KEY_FIELD}: Your AgentOps API authentication key\n\n\
         Optional parameters:\n\
         - {API_URL_FIELD}: Override the default API endpoint (default: {default_url})"
    )
}

fn trace_detail_description(default_url: &str) -> String {
    format!(
        "Get detailed information about a specific trace from AgentOps API.\n\n\
         Returns complete information about a trace, including:\n\
         - All spans in the trace\n\
         - Detailed metadata\n\
         - Timing information\n\n\
         This tool requires:\n\
         - {API_KEY_FIELD}: Your AgentOps API authentication key\n\
         - trace_id: The trace ID to retrieve (from the trace_id field in list_traces response)\n\n\
         Optional parameters:\n\
         - {API_URL_FIELD}: Override the default API endpoint (default: {default_url})"
    )
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ToolRegistry {
    default_api_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl ToolRegistry {
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            default_api_url: config.api_url.clone(),
            timeout: config.request_timeout(),
            http: reqwest::Client::new(),
        }
    }

    pub fn default_api_url(&self) -> &str {
        &self.default_api_url
    }

    /// Tool descriptors in registration order.
    pub fn tools_list(&self) -> Vec<Tool> {
        ToolKind::ALL
            .into_iter()
            .map(|kind| self.descriptor(kind))
            .collect()
    }

    fn descriptor(&self, kind: ToolKind) -> Tool {
        let url = self.default_api_url.as_str();
        let (description, schema) = match kind {
            ToolKind::ListTraces => (list_traces_description(url), list_traces_schema(url)),
            ToolKind::TraceDetail => (trace_detail_description(url), trace_detail_schema(url)),
        };
        Tool::new(kind.name(), description, Arc::new(schema))
    }

    /// Look up a handler by tool name. Unknown names yield `None`.
    pub fn handler(&self, name: &str) -> Option<ToolKind> {
        ToolKind::from_name(name)
    }

    /// Run a tool. Credentials and parameters are validated before any
    /// network I/O; the upstream body is returned unmodified.
    pub async fn call(&self, kind: ToolKind, mut args: JsonObject) -> Result<String> {
        let creds = Credentials::extract(&mut args, &self.default_api_url)?;
        tracing::info!(
            tool = %kind,
            api_url = %creds.api_url,
            api_key = %mask_key(&creds.api_key),
            "tool call"
        );

        let mut client = AgentOpsClient::with_http(
            self.http.clone(),
            creds.api_key,
            creds.api_url,
            self.timeout,
        );

        match kind {
            ToolKind::ListTraces => {
                let limit = parse_limit(&args)?;
                client.list_traces(limit).await
            }
            ToolKind::TraceDetail => {
                let trace_id = parse_trace_id(&args)?;
                client.trace_detail(&trace_id).await
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
