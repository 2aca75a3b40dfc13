use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$DAYBLOCK_HOME`, or `~/.dayblock`.
pub fn dayblock_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("DAYBLOCK_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".dayblock"))
}

pub fn ensure_dayblock_home() -> Result<PathBuf> {
    let dir = dayblock_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Default location for `plan --ics` when no path is given.
pub fn default_ics_path(day: chrono::NaiveDate) -> Result<PathBuf> {
    Ok(ensure_dayblock_home()?.join(format!("plan-{}.ics", day.format("%Y-%m-%d"))))
}
