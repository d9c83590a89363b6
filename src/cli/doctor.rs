//! Doctor command: backend availability and effective settings.

use anyhow::Result;

use crate::backend::Backend;
use crate::config::ExportConfig;
use crate::log;

/// Execute doctor command
pub fn run_doctor(config: &ExportConfig) -> Result<()> {
    if config.config_path.as_os_str().is_empty() {
        log!("config"; "no {} found, using defaults", crate::config::CONFIG_FILE);
    } else {
        log!("config"; "{}", config.config_path.display());
    }

    let backend = Backend::from_config(&config.backend);
    match backend.check() {
        Ok(version) => log!("backend"; "{}: {}", backend.kind().name(), version),
        Err(e) => {
            log!("error"; "{:#}", e);
            std::process::exit(1);
        }
    }

    log!("export"; "temp dir {}", config.export.temp_dir().display());
    log!("export"; "timeout {}s, backend timeout {}s", config.export.timeout_secs, config.backend.timeout_secs);
    Ok(())
}
