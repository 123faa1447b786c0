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

#[cfg(test)]
mod tests {
    use jera_kube::cli::cluster::{InitAzureCommand, InitCommand, UseClusterCommand};
    use jera_kube::domain::config::CloudKind;
    use jera_kube::infrastructure::process::{CommandRunner, ProcessOutput};
    use jera_kube::*;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Answers commands by the longest matching prefix and records every call.
    #[derive(Default)]
    struct ScriptedRunner {
        responses: Vec<(String, ProcessOutput)>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn on(mut self, prefix: &str, output: ProcessOutput) -> Self {
            self.responses.push((prefix.to_string(), output));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn answer(&self, program: &str, args: &[String]) -> Option<ProcessOutput> {
            let line = format!("{} {}", program, args.join(" "));
            self.calls.lock().unwrap().push(line.clone());
            self.responses
                .iter()
                .filter(|(prefix, _)| line.starts_with(prefix.as_str()))
                .max_by_key(|(prefix, _)| prefix.len())
                .map(|(_, output)| output.clone())
        }
    }

    #[async_trait::async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn capture(&self, program: &str, args: &[String]) -> Result<ProcessOutput> {
            self.answer(program, args)
                .ok_or_else(|| JeraError::tool_missing(program))
        }

        async fn interactive(&self, program: &str, args: &[String]) -> Result<i32> {
            self.answer(program, args)
                .map(|o| o.code.unwrap_or(1))
                .ok_or_else(|| JeraError::tool_missing(program))
        }
    }

    const KUBECONFIG_VIEW: &str = r#"{
        "current-context": "aks-prod",
        "contexts": [{"name": "aks-prod", "context": {"cluster": "aks-prod", "user": "clusterUser"}}]
    }"#;

    fn context(dir: &TempDir, runner: Arc<ScriptedRunner>) -> AppContext {
        AppContext::new(
            Arc::new(FileConfigRepository::new(dir.path().join("config"))),
            runner,
        )
        .with_aws_config(dir.path().join("aws-config"))
    }

    fn write_aws_config(dir: &Path) {
        std::fs::write(
            dir.join("aws-config"),
            "[profile dev]\nsso_session = jera\nsso_account_id = 1\nsso_role_name = Admin\nregion = eu-west-1\noutput = json\n",
        )
        .unwrap();
    }

    fn aws_runner() -> ScriptedRunner {
        ScriptedRunner::default()
            .on("aws --version", ProcessOutput::ok("aws-cli/2.15.0"))
            .on("aws configure list-profiles", ProcessOutput::ok("dev\n"))
            .on("aws sts get-caller-identity", ProcessOutput::ok("{}"))
            .on("aws eks update-kubeconfig", ProcessOutput::ok("Updated context"))
            .on("kubectl get nodes", ProcessOutput::ok("node-a Ready"))
            .on("kubectl config view", ProcessOutput::ok(KUBECONFIG_VIEW))
    }

    #[tokio::test]
    async fn test_init_with_cluster_and_profile() {
        let dir = TempDir::new().unwrap();
        write_aws_config(dir.path());
        let runner = Arc::new(aws_runner());
        let ctx = context(&dir, runner.clone());

        InitCommand {
            cluster: Some("eks-prod".to_string()),
            region: "eu-west-1".to_string(),
            profile: Some("dev".to_string()),
        }
        .execute(&ctx)
        .await
        .unwrap();

        let config = ctx.load_config().unwrap();
        let selected = config.current_cluster.clone().unwrap();
        assert_eq!(selected.name, "eks-prod");
        assert_eq!(selected.region, "eu-west-1");
        assert_eq!(selected.profile, "dev");
        assert_eq!(config.cloud_kind(), CloudKind::Aws);

        let calls = runner.calls();
        assert!(calls.contains(
            &"aws eks update-kubeconfig --name eks-prod --region eu-west-1 --profile dev"
                .to_string()
        ));
        // An explicit cluster name is not looked up.
        assert!(!calls.iter().any(|c| c.starts_with("aws eks list-clusters")));
    }

    #[tokio::test]
    async fn test_init_keeps_namespace() {
        let dir = TempDir::new().unwrap();
        write_aws_config(dir.path());
        let ctx = context(&dir, Arc::new(aws_runner()));
        ctx.config()
            .update(&mut |c| c.namespace = Some("prod".to_string()))
            .unwrap();

        InitCommand {
            cluster: Some("eks-prod".to_string()),
            region: "us-east-1".to_string(),
            profile: Some("dev".to_string()),
        }
        .execute(&ctx)
        .await
        .unwrap();

        assert_eq!(ctx.load_config().unwrap().namespace.as_deref(), Some("prod"));
    }

    #[tokio::test]
    async fn test_init_without_session_is_auth_failure() {
        // No AWS config file: no profile can hold a session.
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, Arc::new(aws_runner()));

        let err = InitCommand {
            cluster: Some("eks-prod".to_string()),
            region: "us-east-1".to_string(),
            profile: Some("dev".to_string()),
        }
        .execute(&ctx)
        .await
        .unwrap_err();

        assert_eq!(ExitKind::from_anyhow(&err), ExitKind::AuthFailure);
        assert!(ctx.load_config().unwrap().current_cluster.is_none());
    }

    #[tokio::test]
    async fn test_missing_aws_cli() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, Arc::new(ScriptedRunner::default()));

        let err = InitCommand {
            cluster: None,
            region: "us-east-1".to_string(),
            profile: None,
        }
        .execute(&ctx)
        .await
        .unwrap_err();
        assert_eq!(ExitKind::from_anyhow(&err).code(), 4);
    }

    #[tokio::test]
    async fn test_eks_cluster_missing_in_region() {
        let dir = TempDir::new().unwrap();
        write_aws_config(dir.path());
        let runner = aws_runner().on(
            "aws eks update-kubeconfig",
            ProcessOutput::failed(
                254,
                "An error occurred (ResourceNotFoundException) when calling the DescribeCluster operation: No cluster found",
            ),
        );
        let ctx = context(&dir, Arc::new(runner));

        let err = InitCommand {
            cluster: Some("ghost".to_string()),
            region: "us-east-1".to_string(),
            profile: Some("dev".to_string()),
        }
        .execute(&ctx)
        .await
        .unwrap_err();
        assert_eq!(ExitKind::from_anyhow(&err), ExitKind::NotFound);
    }

    fn azure_runner() -> ScriptedRunner {
        ScriptedRunner::default()
            .on("az --version", ProcessOutput::ok("azure-cli 2.60.0"))
            .on(
                "az account show",
                ProcessOutput::ok(r#"{"id": "1111", "name": "Production", "isDefault": true}"#),
            )
            .on("az account set", ProcessOutput::ok(""))
            .on("az aks get-credentials", ProcessOutput::ok("Merged \"aks-prod\""))
            .on("kubectl get nodes", ProcessOutput::failed(1, "Unable to connect"))
            .on("kubectl config view", ProcessOutput::ok(KUBECONFIG_VIEW))
    }

    #[tokio::test]
    async fn test_init_azure_saves_selection() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(azure_runner());
        let ctx = context(&dir, runner.clone());

        // The unreachable API server only produces a warning.
        InitAzureCommand {
            cluster: Some("aks-prod".to_string()),
            resource_group: Some("rg-prod".to_string()),
            subscription: None,
        }
        .execute(&ctx)
        .await
        .unwrap();

        let config = ctx.load_config().unwrap();
        assert_eq!(config.cloud_kind(), CloudKind::Azure);
        assert_eq!(config.azure_cluster.as_deref(), Some("aks-prod"));
        assert_eq!(config.azure_resource_group.as_deref(), Some("rg-prod"));
        assert_eq!(config.azure_subscription.as_deref(), Some("1111"));
        assert!(!runner.calls().iter().any(|c| c.starts_with("az account set")));
    }

    #[tokio::test]
    async fn test_use_cluster_switches_subscription() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(azure_runner());
        let ctx = context(&dir, runner.clone());

        UseClusterCommand {
            name: Some("aks-dev".to_string()),
            region: "us-east-1".to_string(),
            profile: None,
            azure: true,
            aws: false,
            switch: false,
            resource_group: Some("rg-dev".to_string()),
            subscription: Some("Sandbox".to_string()),
        }
        .execute(&ctx)
        .await
        .unwrap();

        let calls = runner.calls();
        assert!(calls.contains(&"az account set --subscription Sandbox".to_string()));
        assert!(calls.contains(
            &"az aks get-credentials --name aks-dev --resource-group rg-dev --overwrite-existing --subscription Sandbox"
                .to_string()
        ));
        assert_eq!(
            ctx.load_config().unwrap().azure_subscription.as_deref(),
            Some("Sandbox")
        );
    }

    #[tokio::test]
    async fn test_aks_cluster_needs_resource_group() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, Arc::new(azure_runner()));

        let err = InitAzureCommand {
            cluster: Some("aks-prod".to_string()),
            resource_group: None,
            subscription: None,
        }
        .execute(&ctx)
        .await
        .unwrap_err();

        assert_eq!(ExitKind::from_anyhow(&err), ExitKind::Failure);
        assert!(format!("{:#}", err).contains("-g <resource-group>"));
        assert!(ctx.load_config().unwrap().azure_cluster.is_none());
    }

    #[tokio::test]
    async fn test_azure_without_session() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::default()
            .on("az --version", ProcessOutput::ok("azure-cli 2.60.0"))
            .on(
                "az account show",
                ProcessOutput::failed(1, "Please run 'az login' to setup account."),
            );
        let ctx = context(&dir, Arc::new(runner));

        let err = InitAzureCommand {
            cluster: Some("aks-prod".to_string()),
            resource_group: Some("rg-prod".to_string()),
            subscription: None,
        }
        .execute(&ctx)
        .await
        .unwrap_err();
        assert_eq!(ExitKind::from_anyhow(&err).code(), 3);
    }
}
