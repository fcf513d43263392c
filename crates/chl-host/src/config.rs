//! Host configuration, read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chl_rules::RulesConfig;

/// Directory holding persisted state.
pub const DATA_DIR_ENV: &str = "CHALLENGES_DATA_DIR";
/// Base RNG seed.
pub const SEED_ENV: &str = "CHALLENGES_SEED";
/// Whether a running session keeps running after a restart.
pub const RESUME_ON_LOAD_ENV: &str = "CHALLENGES_RESUME_ON_LOAD";
/// Tick interval in milliseconds.
pub const TICK_MILLIS_ENV: &str = "CHALLENGES_TICK_MILLIS";

/// Configuration for the host service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Where the session and settings files live.
    pub data_dir: PathBuf,
    /// How often tick reports are published.
    pub tick_interval: Duration,
    /// Capacity of the command queue.
    pub queue_capacity: usize,
    /// Engine configuration.
    pub rules: RulesConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            tick_interval: Duration::from_secs(1),
            queue_capacity: 64,
            rules: RulesConfig::default(),
        }
    }
}

impl HostConfig {
    /// Defaults overlaid with the `CHALLENGES_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable.
    /// Unparsable values are logged and the default is kept.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|d| !d.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(seed) = parse(&lookup, SEED_ENV) {
            config.rules.seed = seed;
        }
        if let Some(resume) = parse(&lookup, RESUME_ON_LOAD_ENV) {
            config.rules.resume_on_load = resume;
        }
        match parse::<u64>(&lookup, TICK_MILLIS_ENV) {
            Some(0) => tracing::warn!(var = TICK_MILLIS_ENV, "tick interval must be positive; keeping default"),
            Some(millis) => config.tick_interval = Duration::from_millis(millis),
            None => {}
        }
        config
    }

    /// Set the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the tick interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the command queue capacity (at least 1).
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the engine configuration.
    pub fn with_rules(mut self, rules: RulesConfig) -> Self {
        self.rules = rules;
        self
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Option<T> {
    let raw = lookup(var)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var, value = %raw, "ignoring unparsable value; keeping default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        assert_eq!(HostConfig::from_lookup(lookup(&[])), HostConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = HostConfig::from_lookup(lookup(&[
            (DATA_DIR_ENV, "/srv/challenges"),
            (SEED_ENV, "7"),
            (RESUME_ON_LOAD_ENV, "true"),
            (TICK_MILLIS_ENV, "250"),
        ]));
        assert_eq!(config.data_dir, PathBuf::from("/srv/challenges"));
        assert_eq!(config.rules.seed, 7);
        assert!(config.rules.resume_on_load);
        assert_eq!(config.tick_interval, Duration::from_millis(250));
    }

    #[test]
    fn bad_values_keep_defaults() {
        let config = HostConfig::from_lookup(lookup(&[
            (SEED_ENV, "lots"),
            (RESUME_ON_LOAD_ENV, "maybe"),
            (TICK_MILLIS_ENV, "0"),
        ]));
        assert_eq!(config, HostConfig::default());
    }

    #[test]
    fn queue_capacity_is_at_least_one() {
        assert_eq!(HostConfig::default().with_queue_capacity(0).queue_capacity, 1);
    }
}
