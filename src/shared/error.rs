// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use thiserror::Error;
pub type Result<T> = std::result::Result<T, JeraError>;

#[derive(Error, Debug)]
pub enum JeraError {
    #[error("'{tool}' was not found on PATH. Install it and try again")]
    ToolMissing { tool: String },

    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Resource not found: {resource_type} '{name}' in {scope}")]
    NotFound {
        resource_type: String,
        name: String,
        scope: String,
    },

    #[error("`{tool} {command}` failed: {stderr}")]
    ToolFailure {
        tool: String,
        command: String,
        stderr: String,
    },

    #[error("Metrics Server unavailable: {0}")]
    MetricsUnavailable(String),

    #[error("Malformed response from {source_name}: {detail}")]
    MalformedResponse { source_name: String, detail: String },

    #[error("Invalid {kind} quantity '{value}'")]
    InvalidQuantity { value: String, kind: String },

    #[error("Resource totals of {0} exceed the supported range")]
    TotalOverflow(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Kubernetes API error: {0}")]
    KubeError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<kube::Error> for JeraError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ae) if ae.code == 401 || ae.code == 403 => {
                JeraError::AuthFailure(ae.message)
            }
            other => JeraError::KubeError(other.to_string()),
        }
    }
}

impl JeraError {
    pub fn config_error(context: impl Into<String>) -> Self {
        Self::ConfigError(context.into())
    }

    pub fn tool_missing(tool: impl Into<String>) -> Self {
        Self::ToolMissing { tool: tool.into() }
    }

    pub fn not_found(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
            scope: scope.into(),
        }
    }

    pub fn tool_failure(
        tool: impl Into<String>,
        command: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::ToolFailure {
            tool: tool.into(),
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    pub fn malformed(source_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            source_name: source_name.into(),
            detail: detail.into(),
        }
    }

    pub fn invalid_quantity(value: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::InvalidQuantity {
            value: value.into(),
            kind: kind.into(),
        }
    }

    pub fn total_overflow(scope: impl Into<String>) -> Self {
        Self::TotalOverflow(scope.into())
    }

    /// Exit status category reported by the binary.
    pub fn kind(&self) -> ExitKind {
        match self {
            JeraError::NotFound { .. } => ExitKind::NotFound,
            JeraError::AuthFailure(_) | JeraError::SessionExpired(_) => ExitKind::AuthFailure,
            JeraError::ToolMissing { .. } => ExitKind::ToolMissing,
            JeraError::Cancelled => ExitKind::Cancelled,
            _ => ExitKind::Failure,
        }
    }
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Success,
    Failure,
    NotFound,
    AuthFailure,
    ToolMissing,
    Cancelled,
}

impl ExitKind {
    pub fn code(self) -> u8 {
        match self {
            ExitKind::Success => 0,
            ExitKind::Failure => 1,
            ExitKind::NotFound => 2,
            ExitKind::AuthFailure => 3,
            ExitKind::ToolMissing => 4,
            ExitKind::Cancelled => 130,
        }
    }

    /// Classify an error returned from a command handler.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        err.chain()
            .find_map(|cause| cause.downcast_ref::<JeraError>())
            .map(JeraError::kind)
            .unwrap_or(ExitKind::Failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitKind::Success.code(), 0);
        assert_eq!(JeraError::tool_missing("aws").kind().code(), 4);
        assert_eq!(JeraError::not_found("Pod", "web", "prod").kind().code(), 2);
        assert_eq!(JeraError::AuthFailure("denied".into()).kind().code(), 3);
        assert_eq!(JeraError::SessionExpired("token".into()).kind().code(), 3);
        assert_eq!(JeraError::Cancelled.kind().code(), 130);
        assert_eq!(
            JeraError::invalid_quantity("12Xi", "memory").kind().code(),
            1
        );
        assert_eq!(JeraError::total_overflow("pod 'web'").kind().code(), 1);
    }

    #[test]
    fn test_exit_kind_through_context() {
        let err = anyhow::Error::new(JeraError::not_found("Pod", "web", "prod"))
            .context("Failed to describe pod");
        assert_eq!(ExitKind::from_anyhow(&err), ExitKind::NotFound);

        let plain = anyhow::anyhow!("something else");
        assert_eq!(ExitKind::from_anyhow(&plain), ExitKind::Failure);
    }

    #[test]
    fn test_messages() {
        let err = JeraError::tool_failure("kubectl", "top pods", "boom");
        assert_eq!(err.to_string(), "`kubectl top pods` failed: boom");
        let err = JeraError::invalid_quantity("12Xi", "memory");
        assert_eq!(err.to_string(), "Invalid memory quantity '12Xi'");
    }
}
