use std::env;

use config::{Config, File};

/// Runtime-wide tunables, loaded once at `ActorSystem` construction and
/// handed by value to the scheduler and mailboxes that need them.
///
/// Mirrors `riker`'s `load_config` layering: built-in defaults, overridden
/// by an optional TOML file named through an environment variable.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub pool_size: usize,
    pub fairness_quantum: u32,
    pub msg_process_limit: u32,
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            pool_size: num_cpus::get(),
            fairness_quantum: 1000,
            msg_process_limit: 1000,
            log_level: "debug".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn load() -> Self {
        let mut cfg = Config::new();
        let defaults = RuntimeConfig::default();

        cfg.set_default("scheduler.pool_size", defaults.pool_size as i64).unwrap();
        cfg.set_default("scheduler.fairness_quantum", defaults.fairness_quantum as i64)
            .unwrap();
        cfg.set_default("mailbox.msg_process_limit", defaults.msg_process_limit as i64)
            .unwrap();
        cfg.set_default("log.level", defaults.log_level.as_str()).unwrap();

        let path = env::var("ACTOR_RT_CONF").unwrap_or_else(|_| "config/actor_rt.toml".into());
        cfg.merge(File::with_name(&path).required(false)).unwrap();

        RuntimeConfig::from(&cfg)
    }
}

impl From<&Config> for RuntimeConfig {
    fn from(cfg: &Config) -> Self {
        let defaults = RuntimeConfig::default();
        RuntimeConfig {
            pool_size: cfg
                .get_int("scheduler.pool_size")
                .map(|v| v as usize)
                .unwrap_or(defaults.pool_size),
            fairness_quantum: cfg
                .get_int("scheduler.fairness_quantum")
                .map(|v| v as u32)
                .unwrap_or(defaults.fairness_quantum),
            msg_process_limit: cfg
                .get_int("mailbox.msg_process_limit")
                .map(|v| v as u32)
                .unwrap_or(defaults.msg_process_limit),
            log_level: cfg
                .get_str("log.level")
                .unwrap_or(defaults.log_level),
        }
    }
}
