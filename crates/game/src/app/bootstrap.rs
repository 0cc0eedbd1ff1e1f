use std::env::{self, VarError};
use std::path::Path;

use engine::{ConfigError, LoopConfig};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::arena::{Arena, BossKind};
use super::gameplay::script::ScriptedEncounter;
use super::gameplay::tuning::{load_tuning_file, TuningError, TuningTable};

const TUNING_ENV_VAR: &str = "BOSSRUSH_TUNING";

#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error("read {var}: {source}")]
    EnvVar {
        var: &'static str,
        source: VarError,
    },
    #[error(transparent)]
    Tuning(#[from] TuningError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) encounters: Vec<ScriptedEncounter>,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Boss Rush Startup ===");

    let tuning = resolve_tuning()?;
    let encounters = BossKind::ALL
        .into_iter()
        .map(|kind| Arena::try_new(&tuning, kind).map(ScriptedEncounter::new))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AppWiring {
        config: LoopConfig::default(),
        encounters,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn resolve_tuning() -> Result<TuningTable, StartupError> {
    match env::var(TUNING_ENV_VAR) {
        Ok(raw) => {
            let path = Path::new(raw.trim());
            let tuning = load_tuning_file(path)?;
            info!(path = %path.display(), "tuning_loaded");
            Ok(tuning)
        }
        Err(VarError::NotPresent) => {
            info!("tuning_defaults");
            let tuning = TuningTable::default();
            tuning.validate()?;
            Ok(tuning)
        }
        Err(source) => Err(StartupError::EnvVar {
            var: TUNING_ENV_VAR,
            source,
        }),
    }
}
