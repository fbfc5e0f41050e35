use crate::{core::ControllerClass, manifests, output::Report, routing, ClusterStore};
use anyhow::{bail, Result};
use clap::Parser;
use std::{fmt, path::PathBuf, str::FromStr};
use tracing::info;

#[derive(Debug, Parser)]
#[clap(
    name = "lb-gateway-controller",
    about = "Compiles a Gateway and its routes into load balancer rule tables"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "lb_gateway_controller=info,warn",
        env = "LB_GATEWAY_CONTROLLER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    /// The Gateway to compile, as `namespace/name`.
    #[clap(long, env = "LB_GATEWAY_CONTROLLER_GATEWAY")]
    gateway: GatewayRef,

    /// Either `alb` or `nlb`.
    #[clap(long, default_value = "alb", env = "LB_GATEWAY_CONTROLLER_CLASS")]
    controller_class: ControllerClass,

    /// Manifest files, or directories of manifests, to compile instead of
    /// querying the cluster.
    #[clap(long = "manifests")]
    manifests: Vec<PathBuf>,

    /// Pretty-prints the JSON report.
    #[clap(long)]
    pretty: bool,
}

/// Identifies a Gateway by namespace and name.
///
/// A bare name refers to the `default` namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayRef {
    pub namespace: String,
    pub name: String,
}

// === impl Args ===

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            client,
            gateway,
            controller_class,
            manifests,
            pretty,
        } = self;

        log_format.try_init(log_level)?;

        let compiled = if manifests.is_empty() {
            let client = client.try_client().await?;
            let store = ClusterStore::new(client);
            routing::compile(&store, &gateway.namespace, &gateway.name, controller_class).await?
        } else {
            let store = manifests::load(&manifests)?;
            info!(
                paths = manifests.len(),
                resources = store.len(),
                "Loaded manifests"
            );
            routing::compile(&store, &gateway.namespace, &gateway.name, controller_class).await?
        };

        let report = Report::new(&compiled);
        let json = if pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        println!("{json}");

        if !compiled.errors.is_empty() {
            bail!(
                "{} route(s) of {gateway} could not be loaded",
                compiled.errors.len()
            );
        }
        Ok(())
    }
}

// === impl GatewayRef ===

impl FromStr for GatewayRef {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (namespace, name) = match s.split_once('/') {
            Some((namespace, name)) => (namespace, name),
            None => ("default", s),
        };
        if namespace.is_empty() || name.is_empty() || name.contains('/') {
            bail!("invalid gateway reference {s:?}: expected <namespace>/<name>");
        }
        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for GatewayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
