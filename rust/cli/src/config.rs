use serde::{Deserialize, Serialize};
use std::fs;
use tonk_ai::POLICIES;
use tonk_engine::rules::TableRules;

/// Settings for `tonk sim` and `tonk deal` when no flag overrides them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub seats: usize,
    pub stake: u64,
    pub seed: Option<u64>,
    pub policy: String,
    pub max_turns: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfigSources {
    pub seats: ValueSource,
    pub stake: ValueSource,
    pub seed: ValueSource,
    pub policy: ValueSource,
    pub max_turns: ValueSource,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            seats: ValueSource::Default,
            stake: ValueSource::Default,
            seed: ValueSource::Default,
            policy: ValueSource::Default,
            max_turns: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolved {
    pub config: Config,
    pub sources: ConfigSources,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seats: 2,
            stake: 10,
            seed: None,
            policy: "greedy".into(),
            max_turns: 500,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "cannot parse config file: {}", e),
            ConfigError::Invalid(msg) => f.write_str(msg),
        }
    }
}

pub fn load() -> Result<Config, ConfigError> {
    load_with_sources().map(|resolved| resolved.config)
}

/// Resolves defaults, then the TOML file named by `TONK_CONFIG`, then the
/// `TONK_*` environment variables, recording where each value came from.
pub fn load_with_sources() -> Result<ConfigResolved, ConfigError> {
    let mut cfg = Config::default();
    let mut sources = ConfigSources::default();

    if let Ok(path) = std::env::var("TONK_CONFIG")
        && !path.is_empty()
    {
        let s = fs::read_to_string(path)?;
        let f: FileConfig = toml::from_str(&s)?;
        if let Some(v) = f.seats {
            cfg.seats = v;
            sources.seats = ValueSource::File;
        }
        if let Some(v) = f.stake {
            cfg.stake = v;
            sources.stake = ValueSource::File;
        }
        if let Some(v) = f.seed {
            cfg.seed = Some(v);
            sources.seed = ValueSource::File;
        }
        if let Some(v) = f.policy {
            cfg.policy = v;
            sources.policy = ValueSource::File;
        }
        if let Some(v) = f.max_turns {
            cfg.max_turns = v;
            sources.max_turns = ValueSource::File;
        }
    }

    if let Ok(seed) = std::env::var("TONK_SEED")
        && !seed.is_empty()
    {
        cfg.seed = Some(
            seed.parse()
                .map_err(|_| ConfigError::Invalid("Invalid seed".into()))?,
        );
        sources.seed = ValueSource::Env;
    }
    if let Ok(seats) = std::env::var("TONK_SEATS")
        && !seats.is_empty()
    {
        cfg.seats = seats
            .parse()
            .map_err(|_| ConfigError::Invalid("Invalid seats".into()))?;
        sources.seats = ValueSource::Env;
    }
    if let Ok(stake) = std::env::var("TONK_STAKE")
        && !stake.is_empty()
    {
        cfg.stake = stake
            .parse()
            .map_err(|_| ConfigError::Invalid("Invalid stake".into()))?;
        sources.stake = ValueSource::Env;
    }
    if let Ok(policy) = std::env::var("TONK_POLICY")
        && !policy.is_empty()
    {
        cfg.policy = policy;
        sources.policy = ValueSource::Env;
    }

    validate(&cfg)?;
    Ok(ConfigResolved {
        config: cfg,
        sources,
    })
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    seats: Option<usize>,
    #[serde(default)]
    stake: Option<u64>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    policy: Option<String>,
    #[serde(default)]
    max_turns: Option<u32>,
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    check_seats(cfg.seats).map_err(ConfigError::Invalid)?;
    if cfg.stake == 0 {
        return Err(ConfigError::Invalid(
            "Invalid configuration: stake must be >0".into(),
        ));
    }
    if cfg.max_turns == 0 {
        return Err(ConfigError::Invalid(
            "Invalid configuration: max_turns must be >0".into(),
        ));
    }
    if !POLICIES.contains(&cfg.policy.as_str()) {
        return Err(ConfigError::Invalid(format!(
            "Invalid configuration: unknown policy '{}' (expected one of {})",
            cfg.policy,
            POLICIES.join(", ")
        )));
    }
    Ok(())
}

/// Seat counts the default table rules accept.
pub fn check_seats(seats: usize) -> Result<(), String> {
    let rules = TableRules::default();
    if (rules.min_seats..=rules.max_seats).contains(&seats) {
        Ok(())
    } else {
        Err(format!(
            "Invalid configuration: seats must be between {} and {}",
            rules.min_seats, rules.max_seats
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let bad = [
            Config {
                seats: 1,
                ..Config::default()
            },
            Config {
                seats: 5,
                ..Config::default()
            },
            Config {
                stake: 0,
                ..Config::default()
            },
            Config {
                max_turns: 0,
                ..Config::default()
            },
            Config {
                policy: "oracle".into(),
                ..Config::default()
            },
        ];
        for cfg in bad {
            assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))), "{cfg:?}");
        }
    }

    #[test]
    fn file_config_fields_are_optional() {
        let f: FileConfig = toml::from_str("seats = 3\n").unwrap();
        assert_eq!(f.seats, Some(3));
        assert!(f.policy.is_none());
    }
}
