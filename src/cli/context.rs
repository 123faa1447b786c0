//! Shared state handed to every command

use crate::domain::config::{ConfigRepository, FileConfigRepository, JeraConfig};
use crate::infrastructure::cloud::{AwsCli, AzureCli};
use crate::infrastructure::constants::DEFAULT_KUBECTL;
use crate::infrastructure::kubernetes::{ClusterResourceProvider, KubeClusterProvider, Kubectl};
use crate::infrastructure::process::{CommandRunner, SystemRunner};
use crate::shared::error::{JeraError, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Injected collaborators of a command: the state file, the process
/// runner and the Kubernetes API client (built on first use).
pub struct AppContext {
    config: Arc<dyn ConfigRepository>,
    runner: Arc<dyn CommandRunner>,
    kubeconfig: Option<PathBuf>,
    kube_context: Option<String>,
    kubectl_binary: String,
    aws_config: Option<PathBuf>,
    provider: OnceCell<Arc<dyn ClusterResourceProvider>>,
}

impl AppContext {
    pub fn new(config: Arc<dyn ConfigRepository>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config,
            runner,
            kubeconfig: None,
            kube_context: None,
            kubectl_binary: DEFAULT_KUBECTL.to_string(),
            aws_config: None,
            provider: OnceCell::new(),
        }
    }

    /// Context wired to the real file system and processes.
    pub fn system(config_path: Option<PathBuf>, timeout: Option<Duration>) -> Self {
        Self::new(
            Arc::new(FileConfigRepository::from_override(config_path)),
            Arc::new(SystemRunner::with_timeout(timeout)),
        )
    }

    pub fn with_kubeconfig(mut self, kubeconfig: Option<PathBuf>, context: Option<String>) -> Self {
        self.kubeconfig = kubeconfig;
        self.kube_context = context;
        self
    }

    pub fn with_kubectl(mut self, binary: impl Into<String>) -> Self {
        self.kubectl_binary = binary.into();
        self
    }

    /// Use `provider` instead of connecting to the API server.
    pub fn with_provider(self, provider: Arc<dyn ClusterResourceProvider>) -> Self {
        Self {
            provider: OnceCell::new_with(Some(provider)),
            ..self
        }
    }

    pub fn config(&self) -> &dyn ConfigRepository {
        self.config.as_ref()
    }

    pub fn load_config(&self) -> Result<JeraConfig> {
        self.config.load()
    }

    pub fn runner(&self) -> Arc<dyn CommandRunner> {
        Arc::clone(&self.runner)
    }

    pub fn kubectl(&self) -> Kubectl {
        Kubectl::new(self.runner())
            .with_binary(self.kubectl_binary.clone())
            .with_kubeconfig(self.kubeconfig.clone(), self.kube_context.clone())
    }

    /// Read the AWS CLI config from `path` instead of `~/.aws/config`.
    pub fn with_aws_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.aws_config = Some(path.into());
        self
    }

    pub fn aws(&self) -> AwsCli {
        let aws = AwsCli::new(self.runner());
        match &self.aws_config {
            Some(path) => aws.with_config_path(path.clone()),
            None => aws,
        }
    }

    pub fn azure(&self) -> AzureCli {
        AzureCli::new(self.runner())
    }

    /// Kubernetes API access, connecting on first call.
    pub async fn provider(&self) -> Result<Arc<dyn ClusterResourceProvider>> {
        let provider = self
            .provider
            .get_or_try_init(|| async {
                let provider = KubeClusterProvider::new_with_config(
                    self.kubeconfig.clone(),
                    self.kube_context.clone(),
                )
                .await?;
                Ok::<_, JeraError>(Arc::new(provider) as Arc<dyn ClusterResourceProvider>)
            })
            .await?;
        Ok(Arc::clone(provider))
    }

    /// Namespace saved by `jera use`.
    pub fn current_namespace(&self) -> Result<String> {
        self.load_config()?.namespace.ok_or_else(|| {
            JeraError::config_error("No namespace selected. Run 'jera use <namespace>' first")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_current_namespace_requires_selection() {
        let dir = TempDir::new().unwrap();
        let ctx = AppContext::system(Some(dir.path().join("config")), None);
        assert!(matches!(
            ctx.current_namespace(),
            Err(JeraError::ConfigError(_))
        ));

        ctx.config()
            .update(&mut |c| c.namespace = Some("prod".to_string()))
            .unwrap();
        assert_eq!(ctx.current_namespace().unwrap(), "prod");
    }
}
