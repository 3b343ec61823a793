//! In-memory NSP stand-in for tests.
//!
//! `ScriptedTransport` answers the token, revocation, search and module
//! endpoints from scripted data and records every request it sees. It never
//! touches the network. The only timer is the optional revoke delay, which
//! follows the tokio clock and so works under a paused test runtime.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::endpoints::{
    AUTH_REVOKE_PATH, AUTH_TOKEN_PATH, INTENT_TYPE_PATH_PREFIX, SEARCH_INTENT_TYPES_PATH,
};
use crate::error::TransportError;
use crate::models::YangModule;
use crate::transport::{ApiRequest, ApiResponse, Auth, Body, Transport};

struct Script {
    requests: Vec<ApiRequest>,
    ttl_secs: u64,
    issued: u64,
    auth_status: Option<u16>,
    revoke_fails: bool,
    revoke_delay: Option<Duration>,
    revoked: Vec<String>,
    intent_types: Vec<(String, u32)>,
    misreported_total: Option<u64>,
    modules: HashMap<(String, u32), Vec<YangModule>>,
    raw_module_body: Option<String>,
    network_down: bool,
}

pub struct ScriptedTransport {
    script: Mutex<Script>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    /// Tokens default to a one hour lifetime
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                requests: Vec::new(),
                ttl_secs: 3600,
                issued: 0,
                auth_status: None,
                revoke_fails: false,
                revoke_delay: None,
                revoked: Vec::new(),
                intent_types: Vec::new(),
                misreported_total: None,
                modules: HashMap::new(),
                raw_module_body: None,
                network_down: false,
            }),
        }
    }

    fn with_script<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut script)
    }

    /// Lifetime of tokens issued from now on
    pub fn set_ttl(&self, ttl_secs: u64) {
        self.with_script(|s| s.ttl_secs = ttl_secs);
    }

    /// Answer token requests with this status instead of issuing a token
    pub fn set_auth_status(&self, status: Option<u16>) {
        self.with_script(|s| s.auth_status = status);
    }

    pub fn set_revoke_fails(&self, fails: bool) {
        self.with_script(|s| s.revoke_fails = fails);
    }

    /// Hold every revocation call for this long before answering
    pub fn set_revoke_delay(&self, delay: Duration) {
        self.with_script(|s| s.revoke_delay = Some(delay));
    }

    /// Fail every request with a network error
    pub fn set_network_down(&self, down: bool) {
        self.with_script(|s| s.network_down = down);
    }

    /// Catalog served by the search endpoint, in order
    pub fn set_intent_types(&self, entries: &[(&str, u32)]) {
        let entries = entries
            .iter()
            .map(|(name, version)| (name.to_string(), *version))
            .collect();
        self.with_script(|s| s.intent_types = entries);
    }

    /// Report this total and return full pages of generated entries forever
    pub fn misreport_total(&self, total: u64) {
        self.with_script(|s| s.misreported_total = Some(total));
    }

    pub fn set_modules(&self, name: &str, version: u32, modules: Vec<YangModule>) {
        self.with_script(|s| {
            s.modules.insert((name.to_string(), version), modules);
        });
    }

    /// Serve this body verbatim from the module endpoint
    pub fn set_raw_module_body(&self, body: &str) {
        self.with_script(|s| s.raw_module_body = Some(body.to_string()));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.with_script(|s| s.requests.clone())
    }

    fn count_path(&self, predicate: impl Fn(&str) -> bool) -> usize {
        self.with_script(|s| s.requests.iter().filter(|r| predicate(&r.path)).count())
    }

    pub fn auth_calls(&self) -> usize {
        self.count_path(|p| p == AUTH_TOKEN_PATH)
    }

    pub fn revoke_calls(&self) -> usize {
        self.count_path(|p| p == AUTH_REVOKE_PATH)
    }

    pub fn search_calls(&self) -> usize {
        self.count_path(|p| p == SEARCH_INTENT_TYPES_PATH)
    }

    pub fn module_calls(&self) -> usize {
        self.count_path(|p| p.starts_with(INTENT_TYPE_PATH_PREFIX))
    }

    /// Tokens successfully revoked, in order
    pub fn revoked_tokens(&self) -> Vec<String> {
        self.with_script(|s| s.revoked.clone())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        if request.path == AUTH_REVOKE_PATH {
            if let Some(delay) = self.with_script(|s| s.revoke_delay) {
                tokio::time::sleep(delay).await;
            }
        }

        self.with_script(|s| {
            s.requests.push(request.clone());
            if s.network_down {
                return Err(TransportError::Network("connection refused".to_string()));
            }

            let path = request.path.as_str();
            if path == AUTH_TOKEN_PATH {
                Ok(s.issue_token())
            } else if path == AUTH_REVOKE_PATH {
                Ok(s.revoke(&request))
            } else if path == SEARCH_INTENT_TYPES_PATH {
                Ok(s.search(&request))
            } else if let Some(rest) = path.strip_prefix(INTENT_TYPE_PATH_PREFIX) {
                Ok(s.modules(&request, rest))
            } else {
                Ok(ApiResponse::new(404, "no such endpoint"))
            }
        })
    }
}

fn has_bearer(request: &ApiRequest) -> bool {
    matches!(&request.auth, Auth::Bearer(token) if !token.is_empty())
}

impl Script {
    fn issue_token(&mut self) -> ApiResponse {
        if let Some(status) = self.auth_status {
            return ApiResponse::new(status, r#"{"error":"invalid_client"}"#);
        }
        self.issued += 1;
        let body = json!({
            "access_token": format!("token-{}", self.issued),
            "token_type": "Bearer",
            "expires_in": self.ttl_secs,
        });
        ApiResponse::new(200, body.to_string())
    }

    fn revoke(&mut self, request: &ApiRequest) -> ApiResponse {
        if self.revoke_fails {
            return ApiResponse::new(500, "revocation unavailable");
        }
        if let Body::Form(fields) = &request.body {
            if let Some((_, token)) = fields.iter().find(|(k, _)| k == "token") {
                self.revoked.push(token.clone());
            }
        }
        ApiResponse::new(200, "")
    }

    fn search(&self, request: &ApiRequest) -> ApiResponse {
        if !has_bearer(request) {
            return ApiResponse::new(401, "missing bearer token");
        }
        let (page_number, page_size) = match &request.body {
            Body::Json(body) => (
                page_field(body, "page-number"),
                page_field(body, "page-size"),
            ),
            _ => return ApiResponse::new(400, "expected JSON body"),
        };

        let (total, entries): (u64, Vec<Value>) = match self.misreported_total {
            Some(total) => (
                total,
                (0..page_size)
                    .map(|i| json!({"name": format!("ghost-{}-{}", page_number, i), "version": 1}))
                    .collect(),
            ),
            None => (
                self.intent_types.len() as u64,
                self.intent_types
                    .iter()
                    .skip((page_number * page_size) as usize)
                    .take(page_size as usize)
                    .map(|(name, version)| json!({"name": name, "version": version}))
                    .collect(),
            ),
        };

        let body = json!({
            "ibn-administration:output": {
                "page-size": page_size,
                "total-count": total,
                "intent-type": entries,
            }
        });
        ApiResponse::new(200, body.to_string())
    }

    fn modules(&self, request: &ApiRequest, key: &str) -> ApiResponse {
        if !has_bearer(request) {
            return ApiResponse::new(401, "missing bearer token");
        }
        if let Some(body) = &self.raw_module_body {
            return ApiResponse::new(200, body.clone());
        }

        let Some((name, version)) = key.rsplit_once(',') else {
            return ApiResponse::new(400, "bad key");
        };
        let name = urlencoding::decode(name)
            .map(|n| n.into_owned())
            .unwrap_or_else(|_| name.to_string());
        let Ok(version) = version.parse::<u32>() else {
            return ApiResponse::new(400, "bad version");
        };

        match self.modules.get(&(name, version)) {
            Some(modules) => {
                let body = json!({
                    "ibn-administration:intent-type": { "module": modules }
                });
                ApiResponse::new(200, body.to_string())
            }
            None => ApiResponse::new(404, "intent type not found"),
        }
    }
}

fn page_field(body: &Value, field: &str) -> u32 {
    body.get("ibn-administration:input")
        .and_then(|input| input.get(field))
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32
}
