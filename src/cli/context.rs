//! Shared setup for every command: config, logging, session store.
//!
//! Path precedence:
//! 1. `--state` flag if provided
//! 2. `[state] path` from the config file
//! 3. `session.cbor` next to the config file (written into a fresh config)
//!
//! The config file itself comes from `--config` or defaults to
//! `~/.local/share/voting/config.toml`, and is generated if missing.
//!
//! Several `voting` processes may share one session file. Every command
//! holds the session's exclusive file lock from load until its result is
//! saved, so mutations from different processes apply one at a time.

use super::config::{default_config_path, default_state_path, VotingConfig};
use super::logging;
use serde::Serialize;
use std::fmt::Display;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;
use voting::persistence::{FileStore, SessionLock};
use voting::voting::{LogSink, VotingService};

/// Resolved command environment.
#[derive(Debug)]
pub struct Context {
    pub config_path: PathBuf,
    pub state_path: PathBuf,
    pub json: bool,
}

impl Context {
    /// Resolve paths, load (or create) the config and install logging.
    pub fn resolve(
        config_path: Option<PathBuf>,
        state_path: Option<PathBuf>,
        json: bool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = config_path.unwrap_or_else(default_config_path);
        let config =
            VotingConfig::load_or_create(&config_path, &default_state_path(&config_path))?;
        logging::init(&config.logging)?;

        let state_path = state_path.unwrap_or_else(|| config.state.path.clone());
        tracing::debug!(
            config = %config_path.display(),
            state = %state_path.display(),
            "paths resolved"
        );

        Ok(Self {
            config_path,
            state_path,
            json,
        })
    }

    pub fn store(&self) -> Arc<FileStore> {
        Arc::new(FileStore::new(self.state_path.clone()))
    }

    /// Lock and open the existing session, failing if `init` has not been run.
    pub async fn open_service(&self) -> Result<OpenSession, Box<dyn std::error::Error>> {
        let store = self.store();
        let lock = store.lock().await?;
        match VotingService::open(store, LogSink).await? {
            Some(service) => Ok(OpenSession {
                service,
                _lock: lock,
            }),
            None => Err(format!(
                "No voting session at '{}'. Run `voting init --owner <principal>` first.",
                self.state_path.display()
            )
            .into()),
        }
    }

    /// Print `value` as JSON with `--json`, otherwise `human`.
    pub fn report<T: Serialize>(
        &self,
        human: impl Display,
        value: &T,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", human);
        }
        Ok(())
    }
}

/// A loaded session together with the file lock that guards it.
pub struct OpenSession {
    service: VotingService<LogSink>,
    _lock: SessionLock,
}

impl Deref for OpenSession {
    type Target = VotingService<LogSink>;

    fn deref(&self) -> &Self::Target {
        &self.service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_creates_config_and_defaults_state_next_to_it() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");

        let ctx = Context::resolve(Some(config_path.clone()), None, false).unwrap();

        assert!(config_path.exists());
        assert_eq!(ctx.state_path, dir.path().join("session.cbor"));
        assert_eq!(
            VotingConfig::load(&config_path).unwrap().state.path,
            ctx.state_path
        );
    }

    #[test]
    fn test_state_flag_overrides_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        let state_path = dir.path().join("other").join("round.cbor");

        let ctx =
            Context::resolve(Some(config_path), Some(state_path.clone()), true).unwrap();

        assert_eq!(ctx.state_path, state_path);
        assert!(ctx.json);
    }

    #[tokio::test]
    async fn test_open_service_without_session_fails() {
        let dir = TempDir::new().unwrap();
        let ctx = Context::resolve(Some(dir.path().join("config.toml")), None, false).unwrap();

        let err = ctx.open_service().await.err().unwrap();
        assert!(err.to_string().contains("voting init"));
    }
}
