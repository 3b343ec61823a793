use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct IntentTypeSearchRequest {
    #[serde(rename = "ibn-administration:input")]
    pub input: SearchInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchInput {
    #[serde(rename = "page-number")]
    pub page_number: u32,
    #[serde(rename = "page-size")]
    pub page_size: u32,
}

impl IntentTypeSearchRequest {
    pub fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            input: SearchInput {
                page_number,
                page_size,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntentTypeSearchResponse {
    #[serde(rename = "ibn-administration:output", alias = "output")]
    pub output: SearchOutput,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchOutput {
    #[serde(rename = "page-size", default)]
    pub page_size: u32,
    #[serde(rename = "total-count", default)]
    pub total_count: u64,
    #[serde(rename = "intent-type", default)]
    pub intent_type: Vec<IntentTypeEntry>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IntentTypeEntry {
    pub name: String,
    pub version: u32,
}

/// One YANG module attached to an intent type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct YangModule {
    pub name: String,
    #[serde(rename = "yang-content", default)]
    pub yang_content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntentTypeDefinition {
    #[serde(rename = "ibn-administration:intent-type", alias = "intent-type")]
    pub intent_type: IntentTypeModules,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntentTypeModules {
    #[serde(default)]
    pub module: Vec<YangModule>,
}
