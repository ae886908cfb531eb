//! Kubernetes API client construction.
//!
//! Two modes: in-cluster, using the service-account token, CA bundle and API
//! server address the kubelet injects into every pod; or out-of-cluster, from
//! a kubeconfig file and one of its contexts. Clients built here refresh
//! expiring exec/OIDC/token-file credentials on their own.

use std::path::{Path, PathBuf};

use k8s_openapi::api::core::v1::{ConfigMap, Event, Pod, Secret, Service};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client};

use crate::config::KubernetesConfig;
use crate::error::{HookError, HookResult};

/// Where client credentials come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KubeConfigSource {
    InCluster,
    File {
        /// `None` means `$KUBECONFIG` or `~/.kube/config`.
        path: Option<PathBuf>,
        /// `None` means the file's `current-context`.
        context: Option<String>,
    },
}

/// Decide how to load credentials. Explicit arguments win over `config`.
///
/// In-cluster mode ignores any context or file override.
pub fn plan_kube_config(
    in_cluster: Option<bool>,
    cluster_context: Option<&str>,
    config_file: Option<&Path>,
    config: &KubernetesConfig,
) -> KubeConfigSource {
    if in_cluster.unwrap_or(config.in_cluster) {
        if cluster_context.is_some() || config_file.is_some() {
            tracing::debug!("in-cluster mode: ignoring context/config file overrides");
        }
        return KubeConfigSource::InCluster;
    }

    KubeConfigSource::File {
        path: config_file
            .map(Path::to_path_buf)
            .or_else(|| config.config_file.clone()),
        context: cluster_context
            .map(str::to_string)
            .or_else(|| config.cluster_context.clone()),
    }
}

/// Pick the context to use: the explicit one, else the file's current context.
pub fn select_context(kubeconfig: &Kubeconfig, explicit: Option<&str>) -> HookResult<String> {
    explicit
        .map(str::to_string)
        .or_else(|| kubeconfig.current_context.clone())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            HookError::Config(
                "no cluster context given and the kubeconfig has no current-context".to_string(),
            )
        })
}

fn read_kubeconfig(path: Option<&Path>) -> HookResult<Kubeconfig> {
    let result = match path {
        Some(p) => Kubeconfig::read_from(p),
        None => Kubeconfig::read(),
    };
    result.map_err(|e| HookError::Kube(format!("failed to read kubeconfig: {}", e)))
}

/// Load a client configuration for `source`.
pub async fn load_kube_config(source: &KubeConfigSource) -> HookResult<kube::Config> {
    match source {
        KubeConfigSource::InCluster => kube::Config::incluster()
            .map_err(|e| HookError::Kube(format!("in-cluster configuration unavailable: {}", e))),
        KubeConfigSource::File { path, context } => {
            let kubeconfig = read_kubeconfig(path.as_deref())?;
            let context = select_context(&kubeconfig, context.as_deref())?;
            tracing::debug!(context = %context, "loading kubeconfig context");

            let options = KubeConfigOptions {
                context: Some(context.clone()),
                ..KubeConfigOptions::default()
            };
            kube::Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .map_err(|e| HookError::Kube(format!("context '{}': {}", context, e)))
        }
    }
}

/// A client bound to one cluster configuration and one namespace, exposing
/// the core/v1 resource APIs.
#[derive(Clone)]
pub struct CoreClient {
    client: Client,
    namespace: String,
}

impl CoreClient {
    pub fn new(config: kube::Config, namespace: Option<&str>) -> HookResult<Self> {
        let namespace = namespace
            .map(str::to_string)
            .unwrap_or_else(|| config.default_namespace.clone());
        let client = Client::try_from(config)
            .map_err(|e| HookError::Kube(format!("client construction failed: {}", e)))?;
        Ok(Self { client, namespace })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn pods(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    pub fn config_maps(&self) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    pub fn secrets(&self) -> Api<Secret> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    pub fn services(&self) -> Api<Service> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    pub fn events(&self) -> Api<Event> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    /// `git_version` reported by the API server.
    pub async fn server_version(&self) -> HookResult<String> {
        let info = self
            .client
            .apiserver_version()
            .await
            .map_err(|e| HookError::Kube(format!("version request failed: {}", e)))?;
        Ok(info.git_version)
    }
}

/// Build a namespaced core API client.
///
/// `None` arguments fall back to the `[kubernetes]` section of `config`,
/// read at call time.
pub async fn get_kube_client(
    in_cluster: Option<bool>,
    cluster_context: Option<&str>,
    config_file: Option<&Path>,
    config: &KubernetesConfig,
) -> HookResult<CoreClient> {
    let source = plan_kube_config(in_cluster, cluster_context, config_file, config);
    let kube_config = load_kube_config(&source).await?;
    let client = CoreClient::new(kube_config, config.namespace.as_deref())?;
    tracing::info!(
        mode = if source == KubeConfigSource::InCluster { "in-cluster" } else { "kubeconfig" },
        namespace = %client.namespace(),
        "Kubernetes client ready"
    );
    Ok(client)
}
