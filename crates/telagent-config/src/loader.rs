// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::{GatewayConfig, RegistryFile};

/// Ordered list of config file locations searched from lowest to highest
/// priority. Later files override earlier ones.
fn search_paths(app_dir: &str, file_stem: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from(format!("/etc/{app_dir}/{file_stem}.yaml")));
    paths.push(PathBuf::from(format!("/etc/{app_dir}/{file_stem}.yml")));

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(format!(".config/{app_dir}/{file_stem}.yaml")));
        paths.push(home.join(format!(".config/{app_dir}/{file_stem}.yml")));
    }
    if let Some(cfg) = dirs::config_dir() {
        paths.push(cfg.join(format!("{app_dir}/{file_stem}.yaml")));
        paths.push(cfg.join(format!("{app_dir}/{file_stem}.yml")));
    }

    paths.push(PathBuf::from(format!(".{app_dir}/{file_stem}.yaml")));
    paths.push(PathBuf::from(format!(".{app_dir}/{file_stem}.yml")));

    paths
}

fn load_merged(paths: Vec<PathBuf>, extra: Option<&Path>) -> anyhow::Result<serde_yaml::Value> {
    let mut merged = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());

    for path in paths {
        if path.is_file() {
            debug!(path = %path.display(), "loading config layer");
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let layer: serde_yaml::Value = serde_yaml::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?;
            merge_yaml(&mut merged, layer);
        }
    }

    if let Some(p) = extra {
        debug!(path = %p.display(), "loading explicit config");
        let text =
            std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
        let layer: serde_yaml::Value =
            serde_yaml::from_str(&text).with_context(|| format!("parsing {}", p.display()))?;
        merge_yaml(&mut merged, layer);
    }

    Ok(merged)
}

/// Load the gateway's own operational config, merging all discovered YAML
/// layers. The `extra` argument may provide an explicit `--config` path.
pub fn load_gateway_config(extra: Option<&Path>) -> anyhow::Result<GatewayConfig> {
    let merged = load_merged(search_paths("telagent", "gateway"), extra)?;

    let config: GatewayConfig =
        if matches!(merged, serde_yaml::Value::Mapping(ref m) if m.is_empty()) {
            GatewayConfig::default()
        } else {
            serde_yaml::from_value(merged).unwrap_or_default()
        };
    Ok(config)
}

/// Load the multi-tenant business registry, merging all discovered YAML
/// layers. The `extra` argument may provide an explicit `--registry` path.
pub fn load_registry(extra: Option<&Path>) -> anyhow::Result<RegistryFile> {
    let merged = load_merged(search_paths("telagent", "businesses"), extra)?;

    let registry: RegistryFile =
        if matches!(merged, serde_yaml::Value::Mapping(ref m) if m.is_empty()) {
            RegistryFile::default()
        } else {
            serde_yaml::from_value(merged)
                .with_context(|| "parsing merged business registry")?
        };
    Ok(registry)
}

/// Deep-merge `src` into `dst`; src wins on scalar conflicts.
fn merge_yaml(dst: &mut serde_yaml::Value, src: serde_yaml::Value) {
    match (dst, src) {
        (serde_yaml::Value::Mapping(d), serde_yaml::Value::Mapping(s)) => {
            for (k, v) in s {
                let entry = d
                    .entry(k)
                    .or_insert(serde_yaml::Value::Mapping(serde_yaml::Mapping::new()));
                merge_yaml(entry, v);
            }
        }
        (dst, src) => *dst = src,
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn val(s: &str) -> serde_yaml::Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn merge_scalar_src_wins() {
        let mut dst = val("x: 1");
        let src = val("x: 2");
        merge_yaml(&mut dst, src);
        assert_eq!(dst["x"].as_i64(), Some(2));
    }

    #[test]
    fn merge_nested_tables() {
        let mut dst = val("http:\n  bind: 0.0.0.0:1\n  public_media_url: a");
        let src = val("http:\n  bind: 0.0.0.0:2");
        merge_yaml(&mut dst, src);
        assert_eq!(dst["http"]["bind"].as_str(), Some("0.0.0.0:2"));
        assert_eq!(dst["http"]["public_media_url"].as_str(), Some("a"));
    }

    #[test]
    fn load_gateway_config_with_no_files_returns_defaults() {
        let cfg = load_gateway_config(None).unwrap();
        assert_eq!(cfg.http.bind, "127.0.0.1:8088");
    }

    #[test]
    fn load_gateway_config_explicit_file_overrides_defaults() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "http:\n  bind: 0.0.0.0:9999").unwrap();
        let cfg = load_gateway_config(Some(f.path())).unwrap();
        assert_eq!(cfg.http.bind, "0.0.0.0:9999");
    }

    #[test]
    fn load_registry_explicit_file_parses_businesses() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "businesses:\n  acme:\n    display_name: Acme\n    prompt: hi"
        )
        .unwrap();
        let reg = load_registry(Some(f.path())).unwrap();
        assert!(reg.businesses.contains_key("acme"));
    }

    #[test]
    fn load_registry_missing_explicit_path_errors() {
        let result = load_registry(Some(Path::new("/tmp/telagent_nonexistent_xyz.yaml")));
        assert!(result.is_err());
    }
}
