//! Cluster, credential and namespace selection commands

use super::context::AppContext;
use super::display::TableRenderer;
use super::prompt;
use super::resources::namespace_names;
use crate::domain::cluster::{aks_choice_label, mark_current, resolve_cloud_kind, strip_current_marker};
use crate::domain::config::{AwsClusterSelection, CloudKind};
use crate::infrastructure::cloud::{AwsCli, AzureCli, IdentityCli};
use crate::infrastructure::constants::DEFAULT_AWS_REGION;
use crate::shared::error::{JeraError, Result};
use anyhow::Context;
use clap::Parser;
use colored::Colorize;

/// Extra choice in the profile list that runs `aws configure sso`.
pub const ADD_PROFILE_CHOICE: &str = "+ Add new profile";

const KEEP_SUBSCRIPTION_CHOICE: &str = "Keep the current subscription";

/// How an AWS selection flow was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AwsFlow {
    /// `init`: offers to add a profile.
    Init,
    /// `use-cluster`: marks the saved selection and lists contexts at the end.
    Switch,
}

/// Target of an AWS selection, as given on the command line.
#[derive(Debug, Clone)]
pub struct AwsTarget {
    pub cluster: Option<String>,
    pub region: String,
    pub profile: Option<String>,
}

/// Target of an Azure selection, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct AzureTarget {
    pub cluster: Option<String>,
    pub resource_group: Option<String>,
    pub subscription: Option<String>,
}

/// Run `aws configure sso` and let the operator pick from the refreshed
/// profile list.
async fn add_aws_profile(aws: &AwsCli, before: &[String]) -> Result<String> {
    println!(
        "\n{}",
        "Starting interactive AWS SSO configuration...".bold().blue()
    );
    aws.configure_sso().await?;

    let profiles = aws.list_profiles().await?;
    let added: Vec<&String> = profiles.iter().filter(|p| !before.contains(p)).collect();
    if added.is_empty() {
        println!(
            "{} No new profile detected, select an existing one to continue",
            "⚠".yellow()
        );
    } else {
        let names: Vec<&str> = added.iter().map(|p| p.as_str()).collect();
        println!("{} Profile(s) configured: {}", "✓".green(), names.join(", "));
    }
    prompt::select("Select the AWS profile to use", profiles)
}

async fn choose_aws_profile(
    aws: &AwsCli,
    requested: Option<&str>,
    saved: Option<&str>,
    flow: AwsFlow,
) -> Result<String> {
    if let Some(profile) = requested {
        return Ok(profile.to_string());
    }

    let profiles = aws.list_profiles().await?;
    let mut choices = match flow {
        AwsFlow::Switch => mark_current(&profiles, saved),
        AwsFlow::Init => profiles.clone(),
    };
    if flow == AwsFlow::Init {
        choices.push(ADD_PROFILE_CHOICE.to_string());
    }

    let choice = prompt::select("Select the AWS profile to use", choices)?;
    if choice == ADD_PROFILE_CHOICE {
        add_aws_profile(aws, &profiles).await
    } else {
        Ok(strip_current_marker(&choice).to_string())
    }
}

fn manual_cluster_entry(reason: &str) -> Result<Option<String>> {
    println!("{} {}", "⚠".yellow(), reason);
    if prompt::confirm("Enter the cluster name manually?", false)? {
        let name = prompt::text("Cluster name", None)?;
        Ok((!name.is_empty()).then_some(name))
    } else {
        Ok(None)
    }
}

async fn choose_eks_cluster(
    aws: &AwsCli,
    target: &AwsTarget,
    profile: &str,
    saved: Option<&str>,
    flow: AwsFlow,
) -> Result<String> {
    let clusters = match aws.list_eks_clusters(&target.region, profile).await {
        Ok(clusters) => clusters,
        Err(err @ (JeraError::ToolMissing { .. } | JeraError::Cancelled)) => return Err(err),
        Err(err) => {
            return match manual_cluster_entry(&format!("Could not list EKS clusters: {}", err))? {
                Some(name) => Ok(name),
                None => Err(err),
            };
        }
    };

    if let Some(name) = target.cluster.as_deref() {
        if clusters.iter().any(|c| c == name) {
            return Ok(name.to_string());
        }
        println!(
            "{} Cluster '{}' is not in the list of clusters for profile '{}'",
            "⚠".yellow(),
            name,
            profile
        );
        if !prompt::confirm("Select one of the available clusters?", true)? {
            return Err(JeraError::not_found(
                "EKS cluster",
                name,
                format!("region {}", target.region),
            ));
        }
    }

    if clusters.is_empty() {
        return manual_cluster_entry(&format!(
            "No EKS clusters found in {} for profile '{}'",
            target.region, profile
        ))?
        .ok_or_else(|| JeraError::not_found("EKS cluster", "*", format!("region {}", target.region)));
    }

    let choices = match flow {
        AwsFlow::Switch => mark_current(&clusters, saved),
        AwsFlow::Init => clusters,
    };
    let choice = prompt::select("Select the EKS cluster", choices)?;
    Ok(strip_current_marker(&choice).to_string())
}

async fn report_connectivity(ctx: &AppContext) -> Result<()> {
    if ctx.kubectl().check_connectivity().await? {
        println!("{} Connected to the cluster", "✓".green());
    } else {
        println!(
            "{} The kubeconfig was updated but the cluster did not answer.",
            "⚠".yellow()
        );
        println!("  This is usually a network, VPN or permission problem.");
        println!("  Check with: {}", "kubectl get nodes".green());
    }
    Ok(())
}

async fn print_contexts(ctx: &AppContext) -> Result<()> {
    let contexts = ctx.kubectl().list_contexts().await?;
    println!("\n{}", TableRenderer::new().render_contexts(&contexts));
    Ok(())
}

async fn select_aws_cluster(ctx: &AppContext, target: &AwsTarget, flow: AwsFlow) -> Result<()> {
    let aws = ctx.aws();
    aws.ensure_installed().await?;
    if !aws.has_active_session().await? {
        return Err(JeraError::AuthFailure(
            "no active AWS SSO session. Run 'jera login-aws' first".to_string(),
        ));
    }

    let saved = ctx.load_config()?;
    let saved_cluster = saved.current_cluster.as_ref();
    let profile = choose_aws_profile(
        &aws,
        target.profile.as_deref(),
        saved_cluster.map(|c| c.profile.as_str()),
        flow,
    )
    .await?;

    if !aws.verify_profile(&profile, Some(&target.region)).await? {
        println!("Logging in with profile {}...", profile.green());
        aws.sso_login(&profile).await?;
    }

    let cluster = match (flow, target.cluster.as_deref()) {
        // `init` trusts an explicit name and goes straight to the kubeconfig.
        (AwsFlow::Init, Some(name)) => name.to_string(),
        _ => {
            println!("Listing EKS clusters for profile '{}'...", profile);
            choose_eks_cluster(
                &aws,
                target,
                &profile,
                saved_cluster.map(|c| c.name.as_str()),
                flow,
            )
            .await?
        }
    };

    println!(
        "Updating kubeconfig for cluster '{}' with profile '{}'...",
        cluster, profile
    );
    aws.update_kubeconfig(&cluster, &target.region, &profile)
        .await?;

    let selection = AwsClusterSelection {
        name: cluster.clone(),
        region: target.region.clone(),
        profile: profile.clone(),
    };
    ctx.config()
        .update(&mut |config| config.select_aws_cluster(selection.clone()))?;
    println!(
        "{} Current cluster: {} (profile {})",
        "✓".green(),
        cluster.green(),
        profile.green()
    );

    report_connectivity(ctx).await?;
    if flow == AwsFlow::Switch {
        print_contexts(ctx).await?;
    }
    Ok(())
}

async fn choose_aks_cluster(
    azure: &AzureCli,
    subscription: Option<&str>,
    saved: Option<(&str, &str)>,
) -> Result<(String, String)> {
    let clusters = azure.list_aks_clusters(subscription).await?;
    if clusters.is_empty() {
        return Err(JeraError::not_found(
            "AKS cluster",
            "*",
            format!("subscription {}", subscription.unwrap_or("<current>")),
        ));
    }

    let labels: Vec<String> = clusters
        .iter()
        .map(|c| aks_choice_label(&c.name, &c.resource_group))
        .collect();
    let current = saved.map(|(name, rg)| aks_choice_label(name, rg));
    let choice = prompt::select(
        "Select the AKS cluster",
        mark_current(&labels, current.as_deref()),
    )?;

    let label = strip_current_marker(&choice);
    clusters
        .into_iter()
        .find(|c| aks_choice_label(&c.name, &c.resource_group) == label)
        .map(|c| (c.name, c.resource_group))
        .ok_or_else(|| JeraError::malformed("AKS cluster selection", label.to_string()))
}

async fn select_azure_cluster(ctx: &AppContext, target: &AzureTarget) -> Result<()> {
    let azure = ctx.azure();
    azure.ensure_installed().await?;
    let Some(current) = azure.current_subscription().await? else {
        return Err(JeraError::AuthFailure(
            "no active Azure session. Run 'jera login-azure' first".to_string(),
        ));
    };

    let subscription = match target.subscription.as_deref() {
        Some(wanted) if wanted != current.id && wanted != current.name => {
            println!("Switching to subscription {}...", wanted.blue());
            azure.set_subscription(wanted).await?;
            wanted.to_string()
        }
        Some(wanted) => wanted.to_string(),
        None => current.id.clone(),
    };

    let saved = ctx.load_config()?;
    let (cluster, resource_group) = match (&target.cluster, &target.resource_group) {
        (Some(cluster), Some(rg)) => (cluster.clone(), rg.clone()),
        (Some(cluster), None) => {
            return Err(JeraError::config_error(format!(
                "AKS clusters need a resource group: jera use-cluster {} --azure -g <resource-group>",
                cluster
            )));
        }
        (None, _) => {
            println!("Listing AKS clusters in subscription {}...", subscription.blue());
            let saved_cluster = saved
                .azure_cluster
                .as_deref()
                .zip(saved.azure_resource_group.as_deref());
            choose_aks_cluster(&azure, Some(&subscription), saved_cluster).await?
        }
    };

    println!("Configuring kubectl for cluster {}...", cluster.green());
    azure
        .get_credentials(&cluster, &resource_group, Some(&subscription))
        .await?;

    ctx.config().update(&mut |config| {
        config.select_azure_cluster(
            cluster.clone(),
            resource_group.clone(),
            Some(subscription.clone()),
        )
    })?;
    println!("{} Current cluster: {} (Azure AKS)", "✓".green(), cluster.green());
    println!("  Resource group: {}", resource_group);
    println!("  Subscription:   {}", subscription);

    report_connectivity(ctx).await?;
    print_contexts(ctx).await
}

#[derive(Parser, Debug)]
pub struct InitCommand {
    /// EKS cluster name (listed interactively when omitted)
    #[arg(long, short = 'c')]
    pub cluster: Option<String>,

    /// AWS region of the cluster
    #[arg(long, short = 'r', default_value = DEFAULT_AWS_REGION)]
    pub region: String,

    /// AWS profile
    #[arg(long, short = 'p')]
    pub profile: Option<String>,
}

impl InitCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let target = AwsTarget {
            cluster: self.cluster.clone(),
            region: self.region.clone(),
            profile: self.profile.clone(),
        };
        select_aws_cluster(ctx, &target, AwsFlow::Init)
            .await
            .context("Failed to initialize the EKS cluster")
    }
}

#[derive(Parser, Debug)]
pub struct InitAzureCommand {
    /// AKS cluster name (listed interactively when omitted)
    #[arg(long, short = 'c')]
    pub cluster: Option<String>,

    /// Resource group of the cluster
    #[arg(long, short = 'g')]
    pub resource_group: Option<String>,

    /// Azure subscription name or id
    #[arg(long, short = 's')]
    pub subscription: Option<String>,
}

impl InitAzureCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let target = AzureTarget {
            cluster: self.cluster.clone(),
            resource_group: self.resource_group.clone(),
            subscription: self.subscription.clone(),
        };
        select_azure_cluster(ctx, &target)
            .await
            .context("Failed to initialize the AKS cluster")
    }
}

#[derive(Parser, Debug)]
pub struct UseClusterCommand {
    /// Cluster name (listed interactively when omitted)
    pub name: Option<String>,

    /// AWS region of the cluster
    #[arg(long, short = 'r', default_value = DEFAULT_AWS_REGION)]
    pub region: String,

    /// AWS profile
    #[arg(long, short = 'p')]
    pub profile: Option<String>,

    /// Target an Azure AKS cluster
    #[arg(long)]
    pub azure: bool,

    /// Target an AWS EKS cluster
    #[arg(long)]
    pub aws: bool,

    /// Switch between AWS and Azure, whichever is not current
    #[arg(long, short = 's')]
    pub switch: bool,

    /// Resource group of the AKS cluster
    #[arg(long, short = 'g')]
    pub resource_group: Option<String>,

    /// Azure subscription name or id
    #[arg(long, alias = "sub")]
    pub subscription: Option<String>,
}

impl UseClusterCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let saved = ctx.load_config()?;
        let kind = resolve_cloud_kind(saved.cloud_kind(), self.aws, self.azure, self.switch)?;
        if self.switch {
            println!("Switching to {}...", kind.to_string().to_uppercase().blue());
        }

        match kind {
            CloudKind::Aws => {
                let target = AwsTarget {
                    cluster: self.name.clone(),
                    region: self.region.clone(),
                    profile: self.profile.clone(),
                };
                select_aws_cluster(ctx, &target, AwsFlow::Switch)
                    .await
                    .context("Failed to switch to the EKS cluster")
            }
            CloudKind::Azure => {
                let target = AzureTarget {
                    cluster: self.name.clone(),
                    resource_group: self.resource_group.clone(),
                    subscription: self.subscription.clone(),
                };
                select_azure_cluster(ctx, &target)
                    .await
                    .context("Failed to switch to the AKS cluster")
            }
        }
    }
}

#[derive(Parser, Debug)]
pub struct ClustersCommand {}

impl ClustersCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        print_contexts(ctx).await?;
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct LoginAwsCommand {}

impl LoginAwsCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let aws = ctx.aws();
        aws.ensure_installed().await?;

        let profile = if aws.sso_configured() {
            let profiles = aws.list_profiles().await?;
            let mut choices = profiles.clone();
            choices.push(ADD_PROFILE_CHOICE.to_string());
            let choice = prompt::select("Select the profile to log in with", choices)?;
            if choice == ADD_PROFILE_CHOICE {
                add_aws_profile(&aws, &profiles).await?
            } else {
                choice
            }
        } else {
            println!("Configuring AWS SSO for the first time...");
            aws.configure_sso().await?;
            if !aws.sso_configured() {
                return Err(JeraError::AuthFailure(format!(
                    "AWS SSO configuration in {} is incomplete",
                    aws.config_path().display()
                ))
                .into());
            }
            println!("{} AWS SSO configured", "✓".green());
            let mut profiles = aws.list_profiles().await?;
            if profiles.len() == 1 {
                profiles.remove(0)
            } else {
                prompt::select("Select the profile to log in with", profiles)?
            }
        };

        println!("Logging in with profile {}...", profile.green());
        aws.sso_login(&profile)
            .await
            .with_context(|| format!("AWS SSO login with profile '{}' failed", profile))?;

        println!("{} Logged in", "✓".green());
        Ok(())
    }
}

/// Offer a subscription switch. Returns the name switched to, if any.
async fn offer_subscription_switch(azure: &AzureCli, keep_option: bool) -> Result<Option<String>> {
    let subscriptions = azure.list_subscriptions().await?;
    if !keep_option && subscriptions.len() <= 1 {
        return Ok(None);
    }
    let current = subscriptions
        .iter()
        .find(|s| s.is_default)
        .map(|s| s.name.clone());
    let names: Vec<String> = subscriptions.iter().map(|s| s.name.clone()).collect();

    let mut choices = Vec::new();
    if keep_option {
        choices.push(KEEP_SUBSCRIPTION_CHOICE.to_string());
    }
    choices.extend(mark_current(&names, current.as_deref()));

    let choice = prompt::select("Select the subscription to use", choices)?;
    let name = strip_current_marker(&choice);
    if choice == KEEP_SUBSCRIPTION_CHOICE || Some(name) == current.as_deref() {
        return Ok(None);
    }

    let Some(subscription) = subscriptions.iter().find(|s| s.name == name) else {
        return Ok(None);
    };
    azure.set_subscription(&subscription.id).await?;
    Ok(Some(subscription.name.clone()))
}

#[derive(Parser, Debug)]
pub struct LoginAzureCommand {}

impl LoginAzureCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let azure = ctx.azure();
        azure.ensure_installed().await?;

        if azure.has_active_session().await? {
            println!("{} Already logged in to Azure", "✓".green());
            if let Some(name) = offer_subscription_switch(&azure, true).await? {
                println!("{} Subscription changed to {}", "✓".green(), name.blue());
            }
            return Ok(());
        }

        println!("Starting Azure login...");
        azure.login().await?;
        println!("{} Logged in", "✓".green());
        if let Some(name) = offer_subscription_switch(&azure, false).await? {
            println!("{} Subscription changed to {}", "✓".green(), name.blue());
        }
        println!("Run 'jera init-azure' to configure an AKS cluster");
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct UseCommand {
    /// Namespace (asked interactively when omitted)
    pub namespace: Option<String>,
}

impl UseCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let provider = ctx.provider().await?;
        let namespace = select_namespace(
            namespace_names(provider.as_ref()).await?,
            self.namespace.as_deref(),
        )?;

        ctx.config()
            .update(&mut |config| config.namespace = Some(namespace.clone()))?;
        println!("{} Namespace set to {}", "✓".green(), namespace.green());
        Ok(())
    }
}

/// Validate the requested namespace, or ask for one when none was given.
pub fn select_namespace(available: Vec<String>, requested: Option<&str>) -> Result<String> {
    if available.is_empty() {
        return Err(JeraError::not_found("Namespace", "*", "the cluster"));
    }
    match requested {
        Some(ns) if available.iter().any(|a| a == ns) => Ok(ns.to_string()),
        Some(ns) => Err(JeraError::not_found("Namespace", ns, "the cluster")),
        None => prompt::select("Select the namespace to use", available),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_namespace_validates() {
        let available = vec!["default".to_string(), "prod".to_string()];
        assert_eq!(
            select_namespace(available.clone(), Some("prod")).unwrap(),
            "prod"
        );
        assert!(matches!(
            select_namespace(available, Some("staging")),
            Err(JeraError::NotFound { .. })
        ));
        assert!(matches!(
            select_namespace(Vec::new(), Some("prod")),
            Err(JeraError::NotFound { .. })
        ));
    }
}
