/*!
params.rs - collect envelope arguments from the command line.

Sources (lowest to highest precedence):
  --args-file PATH      JSON or YAML object (by extension; .yaml/.yml -> YAML)
  --arg KEY=VALUE       string value, repeatable
  --arg-json KEY=JSON   typed JSON value, repeatable
  --name NAME           shorthand for --arg name=NAME

Any failure here is a serialization failure: nothing has touched the network yet.
*/

use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Map, Value};

use crate::error::ClientError;

/// Raw argument inputs as they come off the command line.
#[derive(Debug, Default)]
pub struct ArgSources<'a> {
    pub name: Option<&'a str>,
    pub pairs: &'a [String],
    pub json_pairs: &'a [String],
    pub file: Option<&'a str>,
}

/// Merge every source into one JSON object.
pub fn collect_args(sources: &ArgSources<'_>) -> Result<Map<String, Value>, ClientError> {
    merge(sources).map_err(|e| ClientError::Serialization(format!("{e:#}")))
}

fn merge(sources: &ArgSources<'_>) -> Result<Map<String, Value>> {
    let mut out = match sources.file {
        Some(path) => load_args_file(path)?,
        None => Map::new(),
    };

    for kv in sources.pairs {
        let (k, v) = split_kv(kv, "--arg")?;
        out.insert(k, Value::String(v.to_string()));
    }

    for kv in sources.json_pairs {
        let (k, raw) = split_kv(kv, "--arg-json")?;
        let value: Value = serde_json::from_str(raw)
            .with_context(|| format!("invalid JSON for --arg-json '{k}'"))?;
        out.insert(k, value);
    }

    if let Some(name) = sources.name {
        out.insert("name".to_string(), Value::String(name.to_string()));
    }

    Ok(out)
}

/// Split `KEY=VALUE`, trimming the key. The value keeps everything after the
/// first `=`, so JSON containing `=` survives.
fn split_kv<'s>(kv: &'s str, flag: &str) -> Result<(String, &'s str)> {
    let Some((k, v)) = kv.split_once('=') else {
        bail!("invalid {flag} (expected KEY=VALUE): {kv}");
    };
    let key = k.trim();
    if key.is_empty() {
        bail!("invalid {flag} (empty key): {kv}");
    }
    Ok((key.to_string(), v.trim()))
}

fn load_args_file(path: &str) -> Result<Map<String, Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read args file: {path}"))?;
    let lower = path.to_ascii_lowercase();

    let value: Value = if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        let yaml_v: serde_yaml::Value =
            serde_yaml::from_str(&raw).context("failed to parse YAML args file")?;
        serde_json::to_value(yaml_v).context("failed to convert YAML to JSON")?
    } else {
        serde_json::from_str(&raw).context("failed to parse JSON args file")?
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(anyhow!("args file root must be an object")),
    }
}
