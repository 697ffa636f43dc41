//! th-config
//!
//! Layered YAML configuration. Documents merge in order (later layers win,
//! mappings merge deeply), the result is canonicalised to JSON and hashed so
//! a running process can report exactly which configuration it uses.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;

mod app;
mod consumption;

pub use app::{
    AppConfig, DataSection, LogSection, ServerSection, DEFAULT_ADDR, DEFAULT_DATA_DIR, ENV_DAEMON_ADDR,
    ENV_DATA_DIR,
};
pub use consumption::{report_unused_keys, UnusedKeyPolicy, UnusedKeyReport, CONSUMED_POINTERS};

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

/// Reads each file in order and merges it over the previous ones.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let layers = paths
        .iter()
        .map(|path| fs::read_to_string(path).with_context(|| format!("read config layer {path}")))
        .collect::<Result<Vec<String>>>()?;
    load_layered_yaml_from_strings(&layers.iter().map(String::as_str).collect::<Vec<_>>())
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut config_json = Value::Object(Map::new());
    for (idx, doc) in yaml_docs.iter().enumerate() {
        // An empty document is an empty layer, not a null override.
        if doc.trim().is_empty() {
            continue;
        }
        let layer = parse_layer(doc).with_context(|| format!("config layer #{idx}"))?;
        merge_layer(&mut config_json, layer);
    }

    // serde_json keeps object keys sorted, so compact output is canonical.
    let canonical_json = serde_json::to_string(&config_json).context("serialize merged config")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json,
    })
}

fn parse_layer(doc: &str) -> Result<Value> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(doc).context("invalid yaml")?;
    serde_json::to_value(yaml).context("yaml layer is not representable as json")
}

/// Mappings merge key by key; any other value in `layer` replaces `base`.
fn merge_layer(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base_map), Value::Object(layer_map)) => {
            for (key, value) in layer_map {
                match base_map.get_mut(&key) {
                    Some(slot) => merge_layer(slot, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// JSON pointers (RFC 6901) of every scalar in `v`. A scalar root is `/`.
pub(crate) fn leaf_pointers(v: &Value) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack: Vec<(String, &Value)> = vec![(String::new(), v)];
    while let Some((pointer, node)) = stack.pop() {
        match node {
            Value::Object(map) => {
                for (key, child) in map {
                    let token = key.replace('~', "~0").replace('/', "~1");
                    stack.push((format!("{pointer}/{token}"), child));
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    stack.push((format!("{pointer}/{i}"), child));
                }
            }
            _ if pointer.is_empty() => out.push("/".to_string()),
            _ => out.push(pointer),
        }
    }
    out
}
