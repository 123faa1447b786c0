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
use crate::infrastructure::constants::{AKS_LIST_QUERY, AZURE_CLI};
use crate::infrastructure::process::{to_args, CommandRunner};
use crate::shared::error::{JeraError, Result};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureSubscription {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AksCluster {
    pub name: String,
    pub resource_group: String,
}

/// Map Azure CLI stderr onto the error taxonomy.
pub fn classify_azure_error(command: &str, stderr: &str) -> JeraError {
    let stderr = stderr.trim();
    if stderr.contains("az login") || stderr.contains("AADSTS") {
        JeraError::AuthFailure("Azure session is missing or expired, run `jera login-azure`".into())
    } else if stderr.contains("AuthorizationFailed") {
        JeraError::AuthFailure(format!("not allowed to run `az {}`", command))
    } else {
        JeraError::tool_failure(AZURE_CLI, command, stderr)
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(source: &str, json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| JeraError::malformed(source, e.to_string()))
}

/// The `az` binary.
#[derive(Clone)]
pub struct AzureCli {
    runner: Arc<dyn CommandRunner>,
}

impl AzureCli {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn run(&self, command: &str, args: &[&str]) -> Result<String> {
        let output = self.runner.capture(AZURE_CLI, &to_args(args)).await?;
        if output.success {
            Ok(output.stdout)
        } else {
            Err(classify_azure_error(command, &output.stderr))
        }
    }

    /// Subscription `az` currently targets, `None` without a session.
    pub async fn current_subscription(&self) -> Result<Option<AzureSubscription>> {
        let output = self
            .runner
            .capture(AZURE_CLI, &to_args(&["account", "show", "-o", "json"]))
            .await?;
        if !output.success {
            return Ok(None);
        }
        parse_json("az account show", &output.stdout).map(Some)
    }

    pub async fn list_subscriptions(&self) -> Result<Vec<AzureSubscription>> {
        let stdout = self
            .run("account list", &["account", "list", "-o", "json"])
            .await?;
        parse_json("az account list", &stdout)
    }

    pub async fn set_subscription(&self, subscription: &str) -> Result<()> {
        self.run(
            "account set",
            &["account", "set", "--subscription", subscription],
        )
        .await?;
        Ok(())
    }

    /// Interactive browser login.
    pub async fn login(&self) -> Result<()> {
        self.runner
            .interactive(AZURE_CLI, &to_args(&["login"]))
            .await?;
        if self.has_active_session().await? {
            Ok(())
        } else {
            Err(JeraError::AuthFailure("Azure login failed".to_string()))
        }
    }

    pub async fn list_aks_clusters(&self, subscription: Option<&str>) -> Result<Vec<AksCluster>> {
        let mut args = vec!["aks", "list", "--query", AKS_LIST_QUERY, "-o", "json"];
        if let Some(subscription) = subscription {
            args.push("--subscription");
            args.push(subscription);
        }
        let stdout = self.run("aks list", &args).await?;
        parse_json("az aks list", &stdout)
    }

    /// Merge AKS credentials into the kubeconfig.
    pub async fn get_credentials(
        &self,
        name: &str,
        resource_group: &str,
        subscription: Option<&str>,
    ) -> Result<()> {
        let mut args = vec![
            "aks",
            "get-credentials",
            "--name",
            name,
            "--resource-group",
            resource_group,
            "--overwrite-existing",
        ];
        if let Some(subscription) = subscription {
            args.push("--subscription");
            args.push(subscription);
        }
        let output = self.runner.capture(AZURE_CLI, &to_args(&args)).await?;
        if output.success {
            return Ok(());
        }
        if output.stderr.contains("ResourceNotFound") || output.stderr.contains("was not found") {
            return Err(JeraError::not_found(
                "AKS cluster",
                name,
                format!("resource group {}", resource_group),
            ));
        }
        Err(classify_azure_error("aks get-credentials", &output.stderr))
    }
}

#[async_trait::async_trait]
impl IdentityCli for AzureCli {
    fn tool(&self) -> &'static str {
        AZURE_CLI
    }

    async fn ensure_installed(&self) -> Result<()> {
        let output = self
            .runner
            .capture(AZURE_CLI, &to_args(&["--version"]))
            .await?;
        if output.success {
            Ok(())
        } else {
            Err(JeraError::tool_missing(AZURE_CLI))
        }
    }

    async fn has_active_session(&self) -> Result<bool> {
        Ok(self.current_subscription().await?.is_some())
    }
}
