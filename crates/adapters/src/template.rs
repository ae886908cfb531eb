//! `{{ name }}` substitution for operator fields.
//!
//! Available names: `task_id`, `run_id`, `ds` (logical date, `YYYY-MM-DD`),
//! `ts` (logical date, RFC 3339) and `params.<key>`.

use regex::{Captures, Regex};
use serde_json::Value;

use crate::error::{HookError, HookResult};
use crate::operators::TaskContext;

/// Any `{{ ... }}` span; names are checked by `lookup`.
const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([^}]*?)\s*\}\}";

fn placeholder() -> HookResult<Regex> {
    Regex::new(PLACEHOLDER_PATTERN).map_err(|e| HookError::Template(format!("placeholder pattern: {}", e)))
}

fn lookup(name: &str, ctx: &TaskContext) -> Option<String> {
    match name {
        "task_id" => Some(ctx.task_id.clone()),
        "run_id" => Some(ctx.run_id.clone()),
        "ds" => Some(ctx.logical_date.format("%Y-%m-%d").to_string()),
        "ts" => Some(ctx.logical_date.to_rfc3339()),
        _ => name
            .strip_prefix("params.")
            .and_then(|key| ctx.params.get(key).cloned()),
    }
}

/// Render one template string.
pub fn render(template: &str, ctx: &TaskContext) -> HookResult<String> {
    if !template.contains("{{") {
        return Ok(template.to_string());
    }
    let mut missing: Option<String> = None;
    let rendered = placeholder()?.replace_all(template, |caps: &Captures| {
        let name = &caps[1];
        match lookup(name, ctx) {
            Some(v) => v,
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(HookError::Template(format!(
            "undefined variable '{}' in template for task '{}'",
            name, ctx.task_id
        ))),
        None => Ok(rendered.into_owned()),
    }
}

pub fn render_opt(template: Option<&str>, ctx: &TaskContext) -> HookResult<Option<String>> {
    template.map(|t| render(t, ctx)).transpose()
}

/// Render every string inside a JSON value.
pub fn render_json(value: &Value, ctx: &TaskContext) -> HookResult<Value> {
    Ok(match value {
        Value::String(s) => Value::String(render(s, ctx)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| render_json(v, ctx))
                .collect::<HookResult<_>>()?,
        ),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), render_json(v, ctx)?);
            }
            Value::Object(out)
        }
        other => other.clone(),
    })
}
