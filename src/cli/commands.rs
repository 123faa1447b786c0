// CLI command definitions

use super::cluster::{
    ClustersCommand, InitAzureCommand, InitCommand, LoginAwsCommand, LoginAzureCommand,
    UseClusterCommand, UseCommand,
};
use super::context::AppContext;
use super::metrics::{AllMetricsCommand, NodeMetricsCommand, PodMetricsCommand};
use super::pods::{
    DeleteCommand, DescribeCommand, ExecCommand, LogsCommand, PodsByNodeCommand, PodsCommand,
};
use super::resources::{
    IngressCommand, NamespacesCommand, NodesCommand, PvcsCommand, PvsCommand, StorageCommand,
    UrlCommand,
};
use crate::domain::config::CONFIG_ENV;
use crate::infrastructure::constants::DEFAULT_KUBECTL;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "jera",
    version,
    about = "Kubernetes helper for EKS and AKS clusters",
    long_about = "Inspect pods, nodes, storage and resource usage of the current namespace, \
                  and switch kubectl between AWS EKS and Azure AKS clusters"
)]
pub struct CliArgs {
    /// State file (default: ~/.jera/config)
    #[arg(long, global = true, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Kubeconfig used for API access and kubectl
    #[arg(long, global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of the current one
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// kubectl binary
    #[arg(long, global = true, env = "JERA_KUBECTL", default_value = DEFAULT_KUBECTL)]
    pub kubectl: String,

    /// Kill external commands that run longer than this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub command_timeout: Option<u64>,

    /// Debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl CliArgs {
    /// Context for the parsed flags, wired to the real system.
    pub fn app_context(&self) -> AppContext {
        AppContext::system(
            self.config.clone(),
            self.command_timeout.map(Duration::from_secs),
        )
        .with_kubeconfig(self.kubeconfig.clone(), self.context.clone())
        .with_kubectl(self.kubectl.clone())
    }
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Configure kubectl for an AWS EKS cluster
    Init(InitCommand),

    /// Configure kubectl for an Azure AKS cluster
    #[command(name = "init-azure")]
    InitAzure(InitAzureCommand),

    /// Switch to another EKS or AKS cluster
    #[command(name = "use-cluster")]
    UseCluster(UseClusterCommand),

    /// List kubeconfig contexts
    Clusters(ClustersCommand),

    /// Log in to AWS SSO
    #[command(name = "login-aws", alias = "aws-login")]
    LoginAws(LoginAwsCommand),

    /// Log in to Azure and pick a subscription
    #[command(name = "login-azure", alias = "azure-login")]
    LoginAzure(LoginAzureCommand),

    /// Select the namespace used by pod commands
    Use(UseCommand),

    /// List namespaces
    Namespaces(NamespacesCommand),

    /// List pods of the current namespace
    Pods(PodsCommand),

    /// List pods grouped by node
    #[command(name = "pods-by-node")]
    PodsByNode(PodsByNodeCommand),

    /// List nodes with capacity and status
    Nodes(NodesCommand),

    /// Show pod resource usage against requests and limits
    #[command(name = "pod-metrics")]
    PodMetrics(PodMetricsCommand),

    /// Show resource usage of every namespace
    #[command(name = "all-metrics")]
    AllMetrics(AllMetricsCommand),

    /// Show allocation and usage per node
    #[command(name = "node-metrics")]
    NodeMetrics(NodeMetricsCommand),

    /// Show ingress URLs of a namespace
    Url(UrlCommand),

    /// Show ingress rules of a namespace
    Ingress(IngressCommand),

    /// Show pod logs
    Logs(LogsCommand),

    /// Open a shell in a pod
    Exec(ExecCommand),

    /// Delete a pod of the current namespace
    Delete(DeleteCommand),

    /// Show pod details and events
    Describe(DescribeCommand),

    /// List persistent volume claims
    Pvcs(PvcsCommand),

    /// List persistent volumes
    Pvs(PvsCommand),

    /// Show volumes and claims together
    Storage(StorageCommand),
}

impl Commands {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        match self {
            Commands::Init(cmd) => cmd.execute(ctx).await,
            Commands::InitAzure(cmd) => cmd.execute(ctx).await,
            Commands::UseCluster(cmd) => cmd.execute(ctx).await,
            Commands::Clusters(cmd) => cmd.execute(ctx).await,
            Commands::LoginAws(cmd) => cmd.execute(ctx).await,
            Commands::LoginAzure(cmd) => cmd.execute(ctx).await,
            Commands::Use(cmd) => cmd.execute(ctx).await,
            Commands::Namespaces(cmd) => cmd.execute(ctx).await,
            Commands::Pods(cmd) => cmd.execute(ctx).await,
            Commands::PodsByNode(cmd) => cmd.execute(ctx).await,
            Commands::Nodes(cmd) => cmd.execute(ctx).await,
            Commands::PodMetrics(cmd) => cmd.execute(ctx).await,
            Commands::AllMetrics(cmd) => cmd.execute(ctx).await,
            Commands::NodeMetrics(cmd) => cmd.execute(ctx).await,
            Commands::Url(cmd) => cmd.execute(ctx).await,
            Commands::Ingress(cmd) => cmd.execute(ctx).await,
            Commands::Logs(cmd) => cmd.execute(ctx).await,
            Commands::Exec(cmd) => cmd.execute(ctx).await,
            Commands::Delete(cmd) => cmd.execute(ctx).await,
            Commands::Describe(cmd) => cmd.execute(ctx).await,
            Commands::Pvcs(cmd) => cmd.execute(ctx).await,
            Commands::Pvs(cmd) => cmd.execute(ctx).await,
            Commands::Storage(cmd) => cmd.execute(ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_parse_aliases_and_flags() {
        let args = CliArgs::try_parse_from(["jera", "aws-login"]).unwrap();
        assert!(matches!(args.command, Commands::LoginAws(_)));

        let args =
            CliArgs::try_parse_from(["jera", "use-cluster", "prod", "--azure", "-g", "rg-prod"])
                .unwrap();
        match args.command {
            Commands::UseCluster(cmd) => {
                assert_eq!(cmd.name.as_deref(), Some("prod"));
                assert!(cmd.azure);
                assert_eq!(cmd.resource_group.as_deref(), Some("rg-prod"));
                assert_eq!(cmd.region, "us-east-1");
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let args = CliArgs::try_parse_from(["jera", "logs", "web-1", "-f", "--tail", "50"]).unwrap();
        match args.command {
            Commands::Logs(cmd) => {
                assert!(cmd.follow);
                assert_eq!(cmd.tail, Some(50));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_delete_requires_pod() {
        assert!(CliArgs::try_parse_from(["jera", "delete"]).is_err());
        let args = CliArgs::try_parse_from(["jera", "delete", "web-1", "-y", "--force"]).unwrap();
        assert!(matches!(
            args.command,
            Commands::Delete(DeleteCommand { yes: true, force: true, .. })
        ));
    }
}
