//! `config`: print or initialise the configuration file

use std::path::Path;

use cadence_driver::DriverConfig;

use super::CommandResult;

pub fn config(path: &Path, current: &DriverConfig, write_default: bool) -> CommandResult {
    if write_default {
        DriverConfig::default().save(path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(current)?);
    Ok(())
}
