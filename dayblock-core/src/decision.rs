//! Operator port: proposals out, decisions in.

use std::collections::VecDeque;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, NaiveDate, NaiveTime};
use chrono_tz::Tz;

use crate::clock::{parse_clock, parse_day};
use crate::task::{Effort, Priority};

/// What the operator can answer to a proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Apply,
    /// Commit this one, then stop asking for the rest of the session.
    AcceptAll,
    DeferTomorrow,
    DeferWeek,
    DeferTo(NaiveDate),
    MarkDone,
    Deprecate,
    PromoteHigh,
    Rename(String),
    OverrideTime(NaiveTime),
}

impl Decision {
    /// Parse one operator reply. `today` anchors relative dates.
    pub fn parse(input: &str, today: NaiveDate) -> Result<Self> {
        let input = input.trim();
        if let Some(clock) = input.strip_prefix('@') {
            return Ok(Decision::OverrideTime(parse_clock(clock)?));
        }

        let (head, rest) = match input.split_once(char::is_whitespace) {
            Some((h, r)) => (h, r.trim()),
            None => (input, ""),
        };

        match (head.to_lowercase().as_str(), rest.is_empty()) {
            ("y" | "apply", true) => Ok(Decision::Apply),
            ("a" | "all", true) => Ok(Decision::AcceptAll),
            ("s" | "tomorrow", true) => Ok(Decision::DeferTomorrow),
            ("w" | "week", true) => Ok(Decision::DeferWeek),
            ("c" | "done", true) => Ok(Decision::MarkDone),
            ("x" | "deprecated", true) => Ok(Decision::Deprecate),
            ("h" | "high", true) => Ok(Decision::PromoteHigh),
            ("d" | "defer", false) => Ok(Decision::DeferTo(parse_day(rest, today)?)),
            ("r" | "rename", false) => Ok(Decision::Rename(rest.to_string())),
            ("t" | "time", false) => Ok(Decision::OverrideTime(parse_clock(rest)?)),
            ("", _) => bail!("empty reply"),
            _ => Err(anyhow!("unrecognized reply: {input:?}")),
        }
    }
}

/// Outcomes of the end-of-day dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutoffChoice {
    AllowLateNight,
    Tomorrow,
    IgnoreAvailability,
    Halt,
}

impl CutoffChoice {
    pub fn parse(input: &str) -> Result<Self> {
        match input.trim().to_lowercase().as_str() {
            "l" | "late" => Ok(CutoffChoice::AllowLateNight),
            "s" | "tomorrow" => Ok(CutoffChoice::Tomorrow),
            "i" | "ignore" => Ok(CutoffChoice::IgnoreAvailability),
            "q" | "halt" => Ok(CutoffChoice::Halt),
            other => Err(anyhow!("unrecognized reply: {other:?}")),
        }
    }
}

/// A candidate block as shown to the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub task_id: String,
    pub name: String,
    pub priority: Priority,
    pub effort: Option<Effort>,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub minutes: u32,
}

impl Proposal {
    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }
}

/// Synchronous decision port. The scheduler blocks on each call.
///
/// `None` means no further decisions are coming; the session halts exactly as
/// if the operator had chosen to.
pub trait Operator {
    fn decide(&mut self, proposal: &Proposal) -> Option<Decision>;
    fn at_cutoff(&mut self, proposal: &Proposal) -> Option<CutoffChoice>;
}

/// Canned replies for tests and non-interactive runs.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    decisions: VecDeque<Decision>,
    cutoffs: VecDeque<CutoffChoice>,
    seen: Vec<Proposal>,
    cutoff_prompts: usize,
}

impl ScriptedOperator {
    pub fn new(decisions: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            decisions: decisions.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_cutoffs(mut self, cutoffs: impl IntoIterator<Item = CutoffChoice>) -> Self {
        self.cutoffs = cutoffs.into_iter().collect();
        self
    }

    /// Every proposal presented through `decide`, in order.
    pub fn proposals(&self) -> &[Proposal] {
        &self.seen
    }

    pub fn cutoff_prompts(&self) -> usize {
        self.cutoff_prompts
    }

    pub fn remaining(&self) -> usize {
        self.decisions.len()
    }
}

impl Operator for ScriptedOperator {
    fn decide(&mut self, proposal: &Proposal) -> Option<Decision> {
        self.seen.push(proposal.clone());
        self.decisions.pop_front()
    }

    fn at_cutoff(&mut self, _proposal: &Proposal) -> Option<CutoffChoice> {
        self.cutoff_prompts += 1;
        self.cutoffs.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn single_letter_tokens() {
        assert_eq!(Decision::parse("y", today()).unwrap(), Decision::Apply);
        assert_eq!(Decision::parse(" A ", today()).unwrap(), Decision::AcceptAll);
        assert_eq!(Decision::parse("s", today()).unwrap(), Decision::DeferTomorrow);
        assert_eq!(Decision::parse("week", today()).unwrap(), Decision::DeferWeek);
        assert_eq!(Decision::parse("c", today()).unwrap(), Decision::MarkDone);
        assert_eq!(Decision::parse("x", today()).unwrap(), Decision::Deprecate);
        assert_eq!(Decision::parse("HIGH", today()).unwrap(), Decision::PromoteHigh);
    }

    #[test]
    fn tokens_with_arguments() {
        assert_eq!(
            Decision::parse("r Call the bank", today()).unwrap(),
            Decision::Rename("Call the bank".into())
        );
        assert_eq!(
            Decision::parse("@3:30pm", today()).unwrap(),
            Decision::OverrideTime(NaiveTime::from_hms_opt(15, 30, 0).unwrap())
        );
        assert_eq!(
            Decision::parse("t 1530", today()).unwrap(),
            Decision::OverrideTime(NaiveTime::from_hms_opt(15, 30, 0).unwrap())
        );
        assert_eq!(
            Decision::parse("d friday", today()).unwrap(),
            Decision::DeferTo(NaiveDate::from_ymd_opt(2026, 3, 6).unwrap())
        );
    }

    #[test]
    fn unknown_or_incomplete_replies_fail() {
        assert!(Decision::parse("maybe", today()).is_err());
        assert!(Decision::parse("", today()).is_err());
        assert!(Decision::parse("r", today()).is_err());
        assert!(Decision::parse("t whenever", today()).is_err());
        assert!(Decision::parse("y please", today()).is_err());
    }

    #[test]
    fn cutoff_tokens() {
        assert_eq!(CutoffChoice::parse("l").unwrap(), CutoffChoice::AllowLateNight);
        assert_eq!(CutoffChoice::parse("ignore").unwrap(), CutoffChoice::IgnoreAvailability);
        assert_eq!(CutoffChoice::parse("q").unwrap(), CutoffChoice::Halt);
        assert!(CutoffChoice::parse("later").is_err());
    }
}
