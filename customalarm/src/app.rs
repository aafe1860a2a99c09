//! Application state and initialization
//!
//! Composition root: picks the repository backend once at startup and
//! injects it into the view models. Nothing here is a global.

use crate::alarms::{AlarmsRepository, InMemoryAlarmsRepository};
use crate::config::{DATABASE_FILE_NAME, ENV_BACKEND, ENV_DATA_DIR};
use crate::database::{create_pool, LocalAlarmsRepository};
use crate::error::{AppError, Result};
use crate::services::{AlarmSetUpViewModel, AlarmsViewModel, Dispatcher};
use directories::ProjectDirs;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Which repository backend to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Process-local, lost on exit
    InMemory,
    /// SQLite file in the data directory
    Local,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Ok(BackendKind::InMemory),
            "local" | "sqlite" => Ok(BackendKind::Local),
            other => Err(format!(
                "Invalid backend '{}'. Use 'memory' or 'local'",
                other
            )),
        }
    }
}

/// Startup configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: BackendKind,
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn new(backend: BackendKind, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            data_dir: data_dir.into(),
        }
    }

    /// Reads `CUSTOMALARM_BACKEND` and `CUSTOMALARM_DATA_DIR`, falling back
    /// to the local backend in the platform data directory.
    pub fn from_env() -> Result<Self> {
        let backend = match std::env::var(ENV_BACKEND) {
            Ok(value) => value.parse().map_err(AppError::Generic)?,
            Err(_) => BackendKind::Local,
        };

        let data_dir = std::env::var_os(ENV_DATA_DIR)
            .map(PathBuf::from)
            .or_else(default_data_dir)
            .ok_or_else(|| AppError::Generic("Failed to get app data dir".to_string()))?;

        Ok(Self::new(backend, data_dir))
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }
}

fn default_data_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "android", "customalarm").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Central application state holding the chosen backend
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn AlarmsRepository>,
    pub dispatcher: Dispatcher,
    local: Option<LocalAlarmsRepository>,
}

impl AppState {
    /// Builds the configured backend. Must run inside a tokio runtime.
    ///
    /// Any failure to open persistent storage is reported as
    /// `BackendUnavailable`.
    pub async fn initialize(config: &AppConfig) -> Result<Self> {
        tracing::info!("Initializing application with {:?} backend", config.backend);

        let local = match config.backend {
            BackendKind::InMemory => None,
            BackendKind::Local => Some(open_local(config).await.map_err(|e| match e {
                AppError::BackendUnavailable(_) => e,
                other => AppError::BackendUnavailable(other.to_string()),
            })?),
        };

        let repository: Arc<dyn AlarmsRepository> = match &local {
            Some(local) => Arc::new(local.clone()),
            None => Arc::new(InMemoryAlarmsRepository::new()),
        };

        tracing::info!("Application initialized successfully");

        Ok(Self {
            repository,
            dispatcher: Dispatcher::new(),
            local,
        })
    }

    pub fn alarms_view_model(&self) -> AlarmsViewModel {
        AlarmsViewModel::new(Arc::clone(&self.repository), self.dispatcher.clone())
    }

    pub fn alarm_setup_view_model(&self) -> AlarmSetUpViewModel {
        AlarmSetUpViewModel::new(Arc::clone(&self.repository), self.dispatcher.clone())
    }

    /// Waits for queued commands, then closes persistent storage.
    pub async fn shutdown(&self) {
        self.dispatcher.idle().await;
        if let Some(local) = &self.local {
            local.store().close().await;
        }
        tracing::info!("Application shut down");
    }
}

async fn open_local(config: &AppConfig) -> Result<LocalAlarmsRepository> {
    let db_path = config.database_path();
    tracing::info!("App data directory: {:?}", config.data_dir);

    std::fs::create_dir_all(&config.data_dir)?;
    let pool = create_pool(&db_path).await?;
    LocalAlarmsRepository::open(pool).await
}
