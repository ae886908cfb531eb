//! `taskhooks email send`.

use clap::{Arg, ArgAction, ArgMatches, Command};

pub fn command() -> Command {
    Command::new("email")
        .about("Send email through SparkPost")
        .subcommand_required(true)
        .subcommand(
            Command::new("send")
                .about("Send one HTML email")
                .arg(
                    Arg::new("to")
                        .long("to")
                        .value_name("ADDRESSES")
                        .required(true)
                        .help("Recipients, separated by ',' or ';'"),
                )
                .arg(Arg::new("subject").long("subject").value_name("SUBJECT").required(true))
                .arg(
                    Arg::new("html")
                        .long("html")
                        .value_name("HTML")
                        .conflicts_with("html-file")
                        .help("HTML body"),
                )
                .arg(
                    Arg::new("html-file")
                        .long("html-file")
                        .value_name("PATH")
                        .help("Read the HTML body from a file"),
                )
                .arg(
                    Arg::new("attach")
                        .short('a')
                        .long("attach")
                        .value_name("PATH")
                        .action(ArgAction::Append)
                        .help("Attach a file (repeatable)"),
                )
                .arg(Arg::new("cc").long("cc").value_name("ADDRESSES"))
                .arg(Arg::new("bcc").long("bcc").value_name("ADDRESSES"))
                .arg(Arg::new("from-email").long("from-email").value_name("EMAIL"))
                .arg(Arg::new("from-name").long("from-name").value_name("NAME")),
        )
}

#[cfg(feature = "sparkpost")]
pub async fn run(root: &ArgMatches, matches: &ArgMatches) -> anyhow::Result<()> {
    use anyhow::Context;
    use taskhooks_adapters::{EmailBackend, SparkPostHook};

    use super::Session;

    let Some(("send", sub)) = matches.subcommand() else {
        anyhow::bail!("Unknown email subcommand. Use --help for usage.");
    };

    let message = message_from_args(sub)?;
    let session = Session::load(root)?;
    let hook = SparkPostHook::from_config(&session.config.email, session.store.as_ref())
        .await
        .context("failed to set up SparkPost")?;

    match hook.send_email(&message).await? {
        Some(id) => println!("✓ Email sent (transmission {})", id),
        None => println!("⚠️  Email was not sent; see the warning above"),
    }
    Ok(())
}

#[cfg(not(feature = "sparkpost"))]
pub async fn run(_root: &ArgMatches, _matches: &ArgMatches) -> anyhow::Result<()> {
    taskhooks_adapters::Capability::Email.require()?;
    Ok(())
}

#[cfg_attr(not(feature = "sparkpost"), allow(dead_code))]
fn message_from_args(sub: &ArgMatches) -> anyhow::Result<taskhooks_adapters::EmailMessage> {
    use anyhow::Context;
    use taskhooks_adapters::{AddressList, EmailMessage};

    let get = |name: &str| sub.get_one::<String>(name).cloned();

    let html = match get("html-file") {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read HTML body from {}", path))?,
        None => get("html").unwrap_or_default(),
    };

    let mut message = EmailMessage::new(
        get("to").unwrap_or_default().as_str(),
        get("subject").unwrap_or_default().as_str(),
        &html,
    );
    message.cc = get("cc").map(AddressList::Delimited);
    message.bcc = get("bcc").map(AddressList::Delimited);
    message.from_email = get("from-email");
    message.from_name = get("from-name");
    message.files = sub
        .get_many::<String>("attach")
        .map(|paths| paths.map(Into::into).collect())
        .unwrap_or_default();
    Ok(message)
}
