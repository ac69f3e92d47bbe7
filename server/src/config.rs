// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::store::LoadPolicy;

pub const DEFAULT_TASKS_FILE: &str = "tasks.json";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Runtime settings, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// `TASKS_FILE`: the JSON file holding every task.
    pub tasks_file: PathBuf,
    /// `TASKS_STATIC_DIR`: root of the front-end assets.
    pub static_dir: PathBuf,
    /// `TASKS_BIND_ADDR`
    pub bind_addr: SocketAddr,
    /// `TASKS_STRICT_LOAD`: refuse to start from an unreadable task file
    /// instead of treating it as empty.
    pub load_policy: LoadPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let tasks_file = lookup("TASKS_FILE").unwrap_or_else(|| DEFAULT_TASKS_FILE.to_string());
        let static_dir =
            lookup("TASKS_STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string());

        let bind_addr = lookup("TASKS_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid TASKS_BIND_ADDR: {bind_addr}"))?;

        let load_policy = match lookup("TASKS_STRICT_LOAD").as_deref() {
            Some("1") | Some("true") => LoadPolicy::Strict,
            _ => LoadPolicy::Lenient,
        };

        Ok(Self {
            tasks_file: PathBuf::from(tasks_file),
            static_dir: PathBuf::from(static_dir),
            bind_addr,
            load_policy,
        })
    }
}
