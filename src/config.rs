use std::fs::read_to_string;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use serde::Deserialize;

/// One simulated node, and the anycast services (if any) it serves.
#[derive(Debug, Clone, Deserialize)]
pub struct Node {
    pub address: u16,
    #[serde(default)]
    pub serves: Vec<u8>,
}

fn default_latency_ms() -> u64 {
    5
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_level(self) -> log::Level {
        match self {
            LogLevel::Trace => log::Level::Trace,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Demo host configuration: a handful of simulated nodes, a couple of
/// anycast sends to issue once they're all listening, and the simulated
/// network's per-hop latency.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub nodes: Vec<Node>,
    pub sends: Vec<Send>,
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    pub log: Log,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Send {
    pub from: u16,
    pub address: u8,
    pub payload: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            sends: Vec::new(),
            latency_ms: default_latency_ms(),
            log: Log::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let cli = Cli::parse();
        Ok(toml::from_str::<Self>(&read_to_string(&cli.config)?)?)
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

#[derive(Parser, Debug)]
#[command(about = "Simulated demo host for the anycast protocol layer", version)]
pub struct Cli {
    /// Path to a TOML config file describing the simulated nodes and sends.
    #[arg(long, short)]
    pub config: String,
}
