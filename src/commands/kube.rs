//! `taskhooks kube version`: build a client the way tasks do and ask the
//! API server for its version.

use clap::{Arg, ArgAction, ArgMatches, Command};

pub fn command() -> Command {
    Command::new("kube")
        .about("Kubernetes client checks")
        .subcommand_required(true)
        .subcommand(
            Command::new("version")
                .about("Connect and print the API server version")
                .arg(
                    Arg::new("in-cluster")
                        .long("in-cluster")
                        .action(ArgAction::SetTrue)
                        .conflicts_with_all(["context", "kubeconfig"])
                        .help("Use the pod's service account"),
                )
                .arg(
                    Arg::new("out-of-cluster")
                        .long("out-of-cluster")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("in-cluster")
                        .help("Use a kubeconfig even if [kubernetes] in_cluster is set"),
                )
                .arg(
                    Arg::new("context")
                        .long("context")
                        .value_name("NAME")
                        .help("kubeconfig context (default: current-context)"),
                )
                .arg(
                    Arg::new("kubeconfig")
                        .long("kubeconfig")
                        .value_name("PATH")
                        .help("kubeconfig file (default: $KUBECONFIG or ~/.kube/config)"),
                ),
        )
}

#[cfg(feature = "kubernetes")]
pub async fn run(root: &ArgMatches, matches: &ArgMatches) -> anyhow::Result<()> {
    use std::path::Path;

    use taskhooks_adapters::get_kube_client;

    use super::Session;

    let Some(("version", sub)) = matches.subcommand() else {
        anyhow::bail!("Unknown kube subcommand. Use --help for usage.");
    };

    let session = Session::load(root)?;
    let in_cluster = in_cluster_override(sub);
    let client = get_kube_client(
        in_cluster,
        sub.get_one::<String>("context").map(String::as_str),
        sub.get_one::<String>("kubeconfig").map(Path::new),
        &session.config.kubernetes,
    )
    .await?;

    let version = client.server_version().await?;
    println!("Server version: {}", version);
    println!("Namespace:      {}", client.namespace());
    Ok(())
}

/// `Some` when a flag forces the mode; `None` defers to configuration.
#[cfg_attr(not(feature = "kubernetes"), allow(dead_code))]
fn in_cluster_override(sub: &ArgMatches) -> Option<bool> {
    if sub.get_flag("in-cluster") {
        Some(true)
    } else if sub.get_flag("out-of-cluster") {
        Some(false)
    } else {
        None
    }
}

#[cfg(not(feature = "kubernetes"))]
pub async fn run(_root: &ArgMatches, _matches: &ArgMatches) -> anyhow::Result<()> {
    taskhooks_adapters::Capability::Kubernetes.require()?;
    Ok(())
}
