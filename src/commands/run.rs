//! `taskhooks run <TASK_FILE>`: load, validate and execute one task.

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::ArgMatches;
use taskhooks_adapters::{build_operator, TaskContext, TaskSpec};

use super::{parse_key_value, Session};

pub async fn run(root: &ArgMatches, matches: &ArgMatches) -> anyhow::Result<()> {
    let Some(task_file) = matches.get_one::<String>("task") else {
        anyhow::bail!("a task file is required");
    };
    let spec = TaskSpec::from_file(Path::new(task_file))
        .with_context(|| format!("failed to load task file {}", task_file))?;
    spec.validate()?;

    if matches.get_flag("check") {
        println!(
            "✓ {} ({} task) is valid",
            spec.task_id,
            spec.operator.capability()
        );
        return Ok(());
    }

    let ctx = task_context(&spec.task_id, matches)?;
    let session = Session::load(root)?;
    let operator = build_operator(spec, &session.config, session.store.clone())?;

    tracing::info!(
        task_id = %operator.task_id(),
        run_id = %ctx.run_id,
        logical_date = %ctx.logical_date.to_rfc3339(),
        "Running task"
    );
    operator
        .execute(&ctx)
        .await
        .with_context(|| format!("task '{}' failed", operator.task_id()))?;
    println!("✓ Task {} succeeded", operator.task_id());
    Ok(())
}

fn task_context(task_id: &str, matches: &ArgMatches) -> anyhow::Result<TaskContext> {
    let logical_date = match matches.get_one::<String>("logical-date") {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("invalid --logical-date '{}'", raw))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    let run_id = matches
        .get_one::<String>("run-id")
        .cloned()
        .unwrap_or_else(|| format!("manual__{}", logical_date.to_rfc3339()));

    let mut ctx = TaskContext::new(task_id, &run_id).with_logical_date(logical_date);
    if let Some(params) = matches.get_many::<String>("param") {
        for raw in params {
            let (key, value) = parse_key_value(raw)?;
            ctx = ctx.with_param(&key, &value);
        }
    }
    Ok(ctx)
}
