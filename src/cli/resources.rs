//! Read-only cluster resource commands

use super::context::AppContext;
use super::display::TableRenderer;
use super::prompt;
use crate::infrastructure::kubernetes::{ClusterResourceProvider, IngressRecord};
use crate::shared::error::{JeraError, Result};
use clap::Parser;
use colored::Colorize;

/// Choice that lists every namespace.
pub const ALL_NAMESPACES_CHOICE: &str = "* All namespaces";

/// Sorted namespace names.
pub async fn namespace_names(provider: &dyn ClusterResourceProvider) -> Result<Vec<String>> {
    let mut names: Vec<String> = provider
        .list_namespaces()
        .await?
        .into_iter()
        .map(|ns| ns.name)
        .collect();
    names.sort();
    Ok(names)
}

/// Use `namespace` when given, otherwise ask for one.
pub async fn choose_namespace(
    provider: &dyn ClusterResourceProvider,
    namespace: Option<&str>,
    message: &str,
) -> Result<String> {
    if let Some(ns) = namespace {
        return Ok(ns.to_string());
    }
    let names = namespace_names(provider).await?;
    if names.is_empty() {
        return Err(JeraError::not_found("namespace", "*", "cluster"));
    }
    prompt::select(message, names)
}

/// `-n` wins over `-s`; `-s` asks, offering every namespace as well.
async fn namespace_filter(
    provider: &dyn ClusterResourceProvider,
    namespace: Option<&str>,
    select: bool,
) -> Result<Option<String>> {
    if namespace.is_some() || !select {
        return Ok(namespace.map(str::to_string));
    }
    let mut choices = vec![ALL_NAMESPACES_CHOICE.to_string()];
    choices.extend(namespace_names(provider).await?);
    let choice = prompt::select("Select the namespace", choices)?;
    Ok((choice != ALL_NAMESPACES_CHOICE).then_some(choice))
}

/// Ingresses of a namespace, narrowed to `name` when given.
pub async fn find_ingresses(
    provider: &dyn ClusterResourceProvider,
    namespace: &str,
    name: Option<&str>,
) -> Result<Vec<IngressRecord>> {
    let ingresses = provider.list_ingresses(namespace).await?;
    match name {
        None => Ok(ingresses),
        Some(name) => {
            let matched: Vec<IngressRecord> =
                ingresses.into_iter().filter(|i| i.name == name).collect();
            if matched.is_empty() {
                Err(JeraError::not_found(
                    "Ingress",
                    name,
                    format!("namespace '{}'", namespace),
                ))
            } else {
                Ok(matched)
            }
        }
    }
}

#[derive(Parser, Debug)]
pub struct NamespacesCommand {}

impl NamespacesCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let provider = ctx.provider().await?;
        let mut namespaces = provider.list_namespaces().await?;
        namespaces.sort_by(|a, b| a.name.cmp(&b.name));

        println!("{}", TableRenderer::new().render_namespaces(&namespaces));
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct NodesCommand {}

impl NodesCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let provider = ctx.provider().await?;
        let nodes = provider.list_nodes().await?;

        println!("{}", TableRenderer::new().render_nodes(&nodes));
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct UrlCommand {
    /// Namespace (asked interactively when omitted)
    pub namespace: Option<String>,

    /// Only show this ingress
    pub ingress: Option<String>,
}

impl UrlCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let provider = ctx.provider().await?;
        let namespace =
            choose_namespace(provider.as_ref(), self.namespace.as_deref(), "Select the namespace")
                .await?;
        let ingresses =
            find_ingresses(provider.as_ref(), &namespace, self.ingress.as_deref()).await?;

        println!("{}", TableRenderer::new().render_urls(&namespace, &ingresses));
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct IngressCommand {
    /// Namespace (asked interactively when omitted)
    pub namespace: Option<String>,
}

impl IngressCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let provider = ctx.provider().await?;
        let namespace =
            choose_namespace(provider.as_ref(), self.namespace.as_deref(), "Select the namespace")
                .await?;
        let ingresses = provider.list_ingresses(&namespace).await?;

        if ingresses.is_empty() {
            println!("No ingresses found in namespace '{}'", namespace);
            return Ok(());
        }

        let renderer = TableRenderer::new();
        for ingress in &ingresses {
            println!("{}", renderer.render_ingress_rules(ingress));
        }
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct PvcsCommand {
    /// Only this namespace (default: all namespaces)
    #[arg(long, short = 'n')]
    pub namespace: Option<String>,

    /// Pick the namespace interactively
    #[arg(long, short = 's')]
    pub select: bool,
}

impl PvcsCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let provider = ctx.provider().await?;
        let namespace =
            namespace_filter(provider.as_ref(), self.namespace.as_deref(), self.select).await?;
        let pvcs = provider.list_pvcs(namespace.as_deref()).await?;

        println!(
            "{}",
            TableRenderer::new().render_pvcs(&pvcs, namespace.is_none())
        );
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct PvsCommand {
    /// Show claim and volume source columns
    #[arg(long, short = 'd')]
    pub detailed: bool,
}

impl PvsCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let provider = ctx.provider().await?;
        let pvs = provider.list_pvs().await?;

        println!("{}", TableRenderer::new().render_pvs(&pvs, self.detailed));
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct StorageCommand {
    /// Only claims of this namespace
    #[arg(long, short = 'n')]
    pub namespace: Option<String>,

    /// Pick the namespace interactively
    #[arg(long, short = 's')]
    pub select: bool,

    /// Show claim and volume source columns
    #[arg(long, short = 'd')]
    pub detailed: bool,
}

impl StorageCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let provider = ctx.provider().await?;
        let namespace =
            namespace_filter(provider.as_ref(), self.namespace.as_deref(), self.select).await?;
        let pvs = provider.list_pvs().await?;
        let pvcs = provider.list_pvcs(namespace.as_deref()).await?;

        let renderer = TableRenderer::new();
        println!("{}", renderer.render_pvs(&pvs, self.detailed));
        println!("{}", renderer.render_pvcs(&pvcs, namespace.is_none()));
        println!(
            "{}",
            format!(
                "{} volumes, {} claims{}",
                pvs.len(),
                pvcs.len(),
                namespace
                    .map(|ns| format!(" in {}", ns))
                    .unwrap_or_default()
            )
            .bright_black()
        );
        Ok(())
    }
}
