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

use super::IdentityCli;
use crate::infrastructure::constants::{
    AWS_ACCESS_DENIED, AWS_CLI, AWS_CONFIG_FILE, AWS_EXPIRED_TOKEN, AWS_RESOURCE_NOT_FOUND,
    AWS_SSO_KEYS,
};
use crate::infrastructure::process::{to_args, CommandRunner};
use crate::shared::error::{JeraError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct EksClusterList {
    #[serde(default)]
    clusters: Vec<String>,
}

/// Map AWS CLI stderr onto the error taxonomy.
pub fn classify_aws_error(command: &str, stderr: &str) -> JeraError {
    let stderr = stderr.trim();
    if AWS_ACCESS_DENIED.iter().any(|m| stderr.contains(m)) {
        JeraError::AuthFailure(format!("profile is not allowed to run `aws {}`", command))
    } else if stderr.contains(AWS_EXPIRED_TOKEN) {
        JeraError::SessionExpired("AWS token expired, run `jera login-aws`".to_string())
    } else {
        JeraError::tool_failure(AWS_CLI, command, stderr)
    }
}

/// Whether the AWS config text defines every key an SSO profile needs.
pub fn sso_config_complete(content: &str) -> bool {
    AWS_SSO_KEYS.iter().all(|key| content.contains(key))
}

/// Parse `aws eks list-clusters` output.
pub fn parse_eks_clusters(json: &str) -> Result<Vec<String>> {
    let list: EksClusterList = serde_json::from_str(json)
        .map_err(|e| JeraError::malformed("aws eks list-clusters", e.to_string()))?;
    Ok(list.clusters)
}

/// The `aws` binary.
#[derive(Clone)]
pub struct AwsCli {
    runner: Arc<dyn CommandRunner>,
    config_path: PathBuf,
}

impl AwsCli {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        let config_path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(AWS_CONFIG_FILE);
        Self {
            runner,
            config_path,
        }
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// True when `~/.aws/config` carries a complete SSO profile.
    pub fn sso_configured(&self) -> bool {
        std::fs::read_to_string(&self.config_path)
            .map(|c| sso_config_complete(&c))
            .unwrap_or(false)
    }

    pub async fn list_profiles(&self) -> Result<Vec<String>> {
        let args = to_args(&["configure", "list-profiles"]);
        let stdout = self
            .runner
            .capture(AWS_CLI, &args)
            .await?
            .into_stdout(AWS_CLI, &args)?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// `aws sts get-caller-identity` succeeds for the profile.
    pub async fn verify_profile(&self, profile: &str, region: Option<&str>) -> Result<bool> {
        let mut args = to_args(&["sts", "get-caller-identity", "--profile", profile]);
        if let Some(region) = region {
            args.push("--region".to_string());
            args.push(region.to_string());
        }
        Ok(self.runner.capture(AWS_CLI, &args).await?.success)
    }

    /// First profile holding a valid session, if any.
    pub async fn active_profile(&self) -> Result<Option<String>> {
        if !self.config_path.exists() {
            return Ok(None);
        }
        for profile in self.list_profiles().await? {
            if self.verify_profile(&profile, None).await? {
                return Ok(Some(profile));
            }
        }
        Ok(None)
    }

    /// Interactive `aws configure sso`.
    pub async fn configure_sso(&self) -> Result<()> {
        let args = to_args(&["configure", "sso"]);
        let code = self.runner.interactive(AWS_CLI, &args).await?;
        if code != 0 {
            return Err(JeraError::tool_failure(
                AWS_CLI,
                "configure sso",
                format!("exited with status {}", code),
            ));
        }
        Ok(())
    }

    /// Interactive `aws sso login`, verified with `sts get-caller-identity`.
    pub async fn sso_login(&self, profile: &str) -> Result<()> {
        let args = to_args(&["sso", "login", "--profile", profile]);
        self.runner.interactive(AWS_CLI, &args).await?;
        if self.verify_profile(profile, None).await? {
            Ok(())
        } else {
            Err(JeraError::AuthFailure(format!(
                "login with profile '{}' failed",
                profile
            )))
        }
    }

    pub async fn list_eks_clusters(&self, region: &str, profile: &str) -> Result<Vec<String>> {
        let args = to_args(&[
            "eks",
            "list-clusters",
            "--region",
            region,
            "--profile",
            profile,
            "--output",
            "json",
        ]);
        let output = self.runner.capture(AWS_CLI, &args).await?;
        if !output.success {
            return Err(classify_aws_error("eks list-clusters", &output.stderr));
        }
        parse_eks_clusters(&output.stdout)
    }

    pub async fn update_kubeconfig(&self, name: &str, region: &str, profile: &str) -> Result<()> {
        let args = to_args(&[
            "eks",
            "update-kubeconfig",
            "--name",
            name,
            "--region",
            region,
            "--profile",
            profile,
        ]);
        let output = self.runner.capture(AWS_CLI, &args).await?;
        if output.success {
            return Ok(());
        }
        if output.stderr.contains(AWS_RESOURCE_NOT_FOUND) {
            return Err(JeraError::not_found("EKS cluster", name, format!("region {}", region)));
        }
        Err(classify_aws_error("eks update-kubeconfig", &output.stderr))
    }
}

#[async_trait::async_trait]
impl IdentityCli for AwsCli {
    fn tool(&self) -> &'static str {
        AWS_CLI
    }

    async fn ensure_installed(&self) -> Result<()> {
        let output = self
            .runner
            .capture(AWS_CLI, &to_args(&["--version"]))
            .await?;
        if output.success {
            Ok(())
        } else {
            Err(JeraError::tool_missing(AWS_CLI))
        }
    }

    async fn has_active_session(&self) -> Result<bool> {
        Ok(self.active_profile().await?.is_some())
    }
}
