use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::{
    AppConfig, InlineStrategyConfig, ProcessStrategyConfig, RemoteStrategyConfig, StrategyConfig,
};

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// `config.toml` from the working directory when present, defaults otherwise,
/// then environment overrides.
pub fn load_default() -> Result<AppConfig, ConfigError> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    let cfg = if path.exists() {
        read_file(path)?
    } else {
        AppConfig::default()
    };
    finish(cfg)
}

/// Like [`load_default`] but the file must exist.
pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    finish(read_file(path)?)
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str::<AppConfig>(&s).map_err(|e| ConfigError::Parse(e.into()))
}

fn finish(mut cfg: AppConfig) -> Result<AppConfig, ConfigError> {
    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Blank values are ignored.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(kind) = get("MAPTOPOSTER_STRATEGY") {
        let kind = kind.trim().to_ascii_lowercase();
        if kind != cfg.strategy.kind() {
            cfg.strategy = match kind.as_str() {
                "process" => StrategyConfig::Process(ProcessStrategyConfig::default()),
                "remote" => StrategyConfig::Remote(RemoteStrategyConfig::default()),
                "inline" => StrategyConfig::Inline(InlineStrategyConfig::default()),
                other => {
                    return Err(ConfigError::EnvInvalid {
                        key: "MAPTOPOSTER_STRATEGY".into(),
                        source: anyhow::anyhow!(
                            "unknown strategy '{other}' (expected process, remote or inline)"
                        ),
                    })
                }
            };
        }
    }

    if let Some(v) = get("MAPTOPOSTER_WORKER_BIN") {
        if let StrategyConfig::Process(ref mut p) = cfg.strategy {
            p.program = v;
        }
    }

    if let Some(v) = get("MAPTOPOSTER_API_URL") {
        match cfg.strategy {
            StrategyConfig::Remote(ref mut r) => r.base_url = v,
            StrategyConfig::Inline(ref mut i) => i.base_url = v,
            StrategyConfig::Process(_) => {}
        }
    }

    if let Some(v) = get("MAPTOPOSTER_ARTIFACTS_DIR") {
        cfg.server.artifacts_dir = PathBuf::from(v);
    }

    if let Some(v) = get("MAPTOPOSTER_PORT") {
        cfg.server.port = v.trim().parse().map_err(|e| ConfigError::EnvInvalid {
            key: "MAPTOPOSTER_PORT".into(),
            source: anyhow::Error::new(e),
        })?;
    }

    Ok(())
}

pub fn validate(cfg: &AppConfig) -> Result<(), ConfigError> {
    if cfg.result.marker.trim().is_empty() {
        return Err(ConfigError::Validation("result.marker must not be empty".into()));
    }

    for (i, rule) in cfg.progress.rules.iter().enumerate() {
        if rule.trigger.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "progress.rules[{i}].trigger must not be empty"
            )));
        }
        if rule.percent > 100 {
            return Err(ConfigError::Validation(format!(
                "progress.rules[{i}].percent must be within 0..=100, got {}",
                rule.percent
            )));
        }
    }

    if cfg.errors.rewrites.iter().any(|r| r.contains.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "errors.rewrites entries need a non-empty 'contains'".into(),
        ));
    }

    match &cfg.strategy {
        StrategyConfig::Process(p) => {
            if p.program.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "strategy.program must not be empty".into(),
                ));
            }
        }
        StrategyConfig::Remote(r) => {
            require_url(&r.base_url)?;
            if r.poll_interval_ms == 0 {
                return Err(ConfigError::Validation(
                    "strategy.poll_interval_ms must be positive".into(),
                ));
            }
            if r.max_poll_attempts == 0 {
                return Err(ConfigError::Validation(
                    "strategy.max_poll_attempts must be positive".into(),
                ));
            }
        }
        StrategyConfig::Inline(i) => require_url(&i.base_url)?,
    }

    Ok(())
}

fn require_url(url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "strategy.base_url must be an http(s) URL, got '{url}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn parses_kind_tagged_strategy() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [strategy]
            kind = "remote"
            base_url = "http://render:8000"
            max_poll_attempts = 5

            [[progress.rules]]
            trigger = "tiles"
            percent = 40
            label = "Loading tiles..."
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.port, 9000);
        let StrategyConfig::Remote(r) = &cfg.strategy else {
            panic!("expected remote strategy, got {:?}", cfg.strategy);
        };
        assert_eq!(r.base_url, "http://render:8000");
        assert_eq!(r.max_poll_attempts, 5);
        assert_eq!(r.poll_interval_ms, 1_000);
        assert_eq!(cfg.progress.rules.len(), 1);
        assert!(!cfg.errors.rewrites.is_empty());
        validate(&cfg).unwrap();
    }

    #[test]
    fn env_switches_strategy_and_ignores_blank() {
        let mut cfg = AppConfig::default();
        apply_env_overrides(
            &mut cfg,
            env(&[
                ("MAPTOPOSTER_STRATEGY", "Inline"),
                ("MAPTOPOSTER_API_URL", "http://127.0.0.1:9999"),
                ("MAPTOPOSTER_WORKER_BIN", "   "),
                ("MAPTOPOSTER_PORT", "7000"),
            ]),
        )
        .unwrap();

        let StrategyConfig::Inline(i) = &cfg.strategy else {
            panic!("expected inline strategy");
        };
        assert_eq!(i.base_url, "http://127.0.0.1:9999");
        assert_eq!(cfg.server.port, 7000);
    }

    #[test]
    fn env_rejects_bad_values() {
        let mut cfg = AppConfig::default();
        let err = apply_env_overrides(&mut cfg, env(&[("MAPTOPOSTER_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvInvalid { ref key, .. } if key == "MAPTOPOSTER_PORT"));

        let err = apply_env_overrides(&mut cfg, env(&[("MAPTOPOSTER_STRATEGY", "carrier-pigeon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvInvalid { .. }));
    }

    #[test]
    fn validate_rejects_zero_poll_budget() {
        let mut cfg = AppConfig::default();
        cfg.strategy = StrategyConfig::Remote(RemoteStrategyConfig {
            max_poll_attempts: 0,
            ..RemoteStrategyConfig::default()
        });
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_from_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn load_from_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[strategy]\nkind = 3\n").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Parse(_))));
    }
}
