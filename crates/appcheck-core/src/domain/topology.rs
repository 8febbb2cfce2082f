//! Expected pod topology per application template.

use serde::{Deserialize, Serialize};

/// Separator between the application name and a pod role.
pub const POD_NAME_SEPARATOR: &str = "--";

/// Main pods of the `rag` template.
pub const RAG_MAIN_PODS: &[&str] = &["vllm-server", "milvus", "chat-bot"];

/// Pod name for `suffix` within `application`.
pub fn pod_name(application: &str, suffix: &str) -> String {
    format!("{application}{POD_NAME_SEPARATOR}{suffix}")
}

/// Ordered pod-name suffixes that must exist for an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExpectedTopology {
    suffixes: Vec<String>,
}

impl ExpectedTopology {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Built-in topology for a known template (case-insensitive).
    pub fn for_template(template: &str) -> Option<Self> {
        match template.to_ascii_lowercase().as_str() {
            "rag" => Some(Self::new(RAG_MAIN_PODS.iter().copied())),
            _ => None,
        }
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }

    /// Full pod names, in order.
    pub fn pod_names(&self, application: &str) -> Vec<String> {
        self.suffixes
            .iter()
            .map(|s| pod_name(application, s))
            .collect()
    }
}
