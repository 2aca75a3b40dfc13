use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use dayblock_core::{parse_tz, BlockPolicy, ClassBlock, ScheduleWindow};
use dayblock_notion::{BlockingStore, NotionClient, PropertyNames, DEFAULT_CONCURRENCY};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::ensure_dayblock_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schedule: ScheduleSection,
    pub blocks: BlocksSection,
    pub notion: NotionSection,
    pub calendar: CalendarSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    pub timezone: String,
    pub start_hour: u32,
    pub cutoff_hour: u32,
    /// Earliest hour for "not started (later)" tasks.
    pub later_start_hour: u32,
    pub size_by_effort: bool,
    /// Create a "Schedule Day" task when a session starts.
    pub create_anchor_task: bool,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        let window = ScheduleWindow::default();
        Self {
            timezone: "America/New_York".to_string(),
            start_hour: window.start_hour,
            cutoff_hour: window.cutoff_hour,
            later_start_hour: 18,
            size_by_effort: false,
            create_anchor_task: true,
        }
    }
}

/// Block lengths in minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlocksSection {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
    pub must_be_done_today: u32,
    pub effort_low: u32,
    pub effort_medium: u32,
    pub effort_high: u32,
    pub default: u32,
}

impl Default for BlocksSection {
    fn default() -> Self {
        let p = BlockPolicy::default();
        Self {
            low: p.low,
            medium: p.medium,
            high: p.high,
            must_be_done_today: p.must_be_done_today,
            effort_low: p.effort_low,
            effort_medium: p.effort_medium,
            effort_high: p.effort_high,
            default: p.default,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionSection {
    /// Falls back to `$DATABASE_ID`.
    pub database_id: Option<String>,
    /// Name of the environment variable holding the integration token.
    pub token_env: String,
    /// Requests in flight during bulk updates.
    pub concurrency: usize,
    pub properties: PropertyNames,
}

impl Default for NotionSection {
    fn default() -> Self {
        Self {
            database_id: None,
            token_env: "NOTION_API_KEY".to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            properties: PropertyNames::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSection {
    pub token_env: String,
    pub calendar_ids: Vec<String>,
    pub class_blocks: Vec<ClassBlock>,
}

impl Default for CalendarSection {
    fn default() -> Self {
        Self {
            token_env: "GOOGLE_CALENDAR_TOKEN".to_string(),
            calendar_ids: vec!["primary".to_string()],
            class_blocks: vec![ClassBlock {
                event_label: "TEC Office Hours".to_string(),
                class: "TEC".to_string(),
            }],
        }
    }
}

impl Config {
    pub fn tz(&self) -> Result<Tz> {
        parse_tz(&self.schedule.timezone)
    }

    pub fn window(&self) -> Result<ScheduleWindow> {
        let s = &self.schedule;
        if s.start_hour >= s.cutoff_hour || s.cutoff_hour > 23 {
            bail!(
                "schedule window must satisfy start_hour < cutoff_hour <= 23 (got {}..{})",
                s.start_hour,
                s.cutoff_hour
            );
        }
        Ok(ScheduleWindow {
            start_hour: s.start_hour,
            cutoff_hour: s.cutoff_hour,
        })
    }

    pub fn policy(&self) -> BlockPolicy {
        let b = &self.blocks;
        BlockPolicy {
            low: b.low,
            medium: b.medium,
            high: b.high,
            must_be_done_today: b.must_be_done_today,
            effort_low: b.effort_low,
            effort_medium: b.effort_medium,
            effort_high: b.effort_high,
            default: b.default,
            size_by_effort: self.schedule.size_by_effort,
        }
    }

    pub fn notion_client(&self) -> Result<NotionClient> {
        let token = std::env::var(&self.notion.token_env)
            .with_context(|| format!("missing Notion token; set ${}", self.notion.token_env))?;
        let database_id = match &self.notion.database_id {
            Some(id) if !id.trim().is_empty() => id.clone(),
            _ => std::env::var("DATABASE_ID")
                .context("missing Notion database id; set notion.database_id or $DATABASE_ID")?,
        };
        Ok(NotionClient::new(token, database_id).with_names(self.notion.properties.clone()))
    }

    pub fn notion_store(&self) -> Result<BlockingStore> {
        Ok(BlockingStore::new(self.notion_client()?))
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_dayblock_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [schedule]
            timezone = "Europe/Berlin"
            size_by_effort = true

            [blocks]
            high = 45

            [notion.properties]
            priority = "Urgency"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.schedule.start_hour, 9);
        assert_eq!(cfg.schedule.cutoff_hour, 23);
        assert_eq!(cfg.tz().unwrap(), chrono_tz::Europe::Berlin);
        let policy = cfg.policy();
        assert_eq!(policy.high, 45);
        assert_eq!(policy.low, 15);
        assert!(policy.size_by_effort);
        assert_eq!(cfg.notion.properties.priority, "Urgency");
        assert_eq!(cfg.notion.properties.name, "Name");
        assert_eq!(cfg.notion.token_env, "NOTION_API_KEY");
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&s).unwrap();
        assert_eq!(back.policy(), BlockPolicy::default());
        assert_eq!(back.calendar.class_blocks.len(), 1);
    }

    #[test]
    fn inverted_window_is_rejected() {
        let mut cfg = Config::default();
        cfg.schedule.start_hour = 23;
        cfg.schedule.cutoff_hour = 9;
        assert!(cfg.window().is_err());
    }
}
