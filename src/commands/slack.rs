//! `taskhooks slack post-message|post-file|call`.

use clap::{Arg, ArgMatches, Command};

fn credential_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("token")
            .long("token")
            .value_name("TOKEN")
            .help("Slack API token (wins over --conn-id)"),
    )
    .arg(
        Arg::new("conn-id")
            .long("conn-id")
            .value_name("CONN_ID")
            .default_value("slack_default")
            .help("Connection whose password is the Slack token"),
    )
}

pub fn command() -> Command {
    Command::new("slack")
        .about("Call the Slack Web API")
        .subcommand_required(true)
        .subcommand(credential_args(
            Command::new("post-message")
                .about("Post a message to a channel")
                .arg(Arg::new("channel").long("channel").value_name("CHANNEL").required(true))
                .arg(Arg::new("text").long("text").value_name("TEXT"))
                .arg(
                    Arg::new("blocks")
                        .long("blocks")
                        .value_name("JSON")
                        .help("Block Kit blocks as a JSON array"),
                ),
        ))
        .subcommand(credential_args(
            Command::new("post-file")
                .about("Upload a local file to a channel")
                .arg(Arg::new("channel").long("channel").value_name("CHANNEL").required(true))
                .arg(Arg::new("file").long("file").value_name("PATH").required(true))
                .arg(Arg::new("title").long("title").value_name("TITLE"))
                .arg(Arg::new("comment").long("comment").value_name("TEXT")),
        ))
        .subcommand(credential_args(
            Command::new("call")
                .about("Call any Web API method")
                .arg(Arg::new("method").value_name("METHOD").required(true))
                .arg(
                    Arg::new("params")
                        .long("params")
                        .value_name("JSON")
                        .help("Method arguments as a JSON object"),
                ),
        ))
}

#[cfg(feature = "slack")]
pub async fn run(root: &ArgMatches, matches: &ArgMatches) -> anyhow::Result<()> {
    use std::path::Path;

    use anyhow::Context;
    use serde_json::{Map, Value};
    use taskhooks_adapters::SlackWebApiHook;

    use super::Session;

    let Some((name, sub)) = matches.subcommand() else {
        anyhow::bail!("Unknown slack subcommand. Use --help for usage.");
    };

    let session = Session::load(root)?;
    let hook = SlackWebApiHook::new(
        sub.get_one::<String>("token").map(String::as_str),
        sub.get_one::<String>("conn-id").map(String::as_str),
        session.store.as_ref(),
        &session.config.slack,
    )
    .await?
    .with_source(Some("cli".to_string()));

    let response = match name {
        "post-message" => {
            let channel = required(sub, "channel")?;
            let blocks = sub
                .get_one::<String>("blocks")
                .map(|raw| serde_json::from_str::<Value>(raw).context("--blocks is not valid JSON"))
                .transpose()?;
            hook.post_message(
                channel,
                sub.get_one::<String>("text").map(String::as_str),
                blocks.as_ref(),
            )
            .await?
        }
        "post-file" => {
            hook.post_file(
                Path::new(required(sub, "file")?),
                required(sub, "channel")?,
                sub.get_one::<String>("title").map(String::as_str),
                sub.get_one::<String>("comment").map(String::as_str),
            )
            .await?
        }
        "call" => {
            let params = match sub.get_one::<String>("params") {
                Some(raw) => serde_json::from_str::<Map<String, Value>>(raw)
                    .context("--params must be a JSON object")?,
                None => Map::new(),
            };
            hook.call(required(sub, "method")?, params).await?
        }
        other => anyhow::bail!("Unknown slack subcommand '{}'", other),
    };

    println!("{}", serde_json::to_string_pretty(&Value::Object(response.rest))?);
    Ok(())
}

#[cfg(not(feature = "slack"))]
pub async fn run(_root: &ArgMatches, _matches: &ArgMatches) -> anyhow::Result<()> {
    taskhooks_adapters::Capability::Slack.require()?;
    Ok(())
}

#[cfg(feature = "slack")]
fn required<'a>(matches: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("--{} is required", name))
}
