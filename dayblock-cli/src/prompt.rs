use anyhow::Result;
use chrono::NaiveDate;
use dayblock_core::{CutoffChoice, Decision, Operator, Proposal, Task, TriageChoice};
use std::io::{self, BufRead, Write};

/// Read one trimmed line; `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut s = String::new();
    if input.read_line(&mut s)? == 0 {
        return Ok(None);
    }
    Ok(Some(s.trim().to_string()))
}

pub fn prompt(label: &str) -> Result<Option<String>> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    read_line(&mut io::stdin().lock())
}

/// Yes/no question; anything but `y`/`yes` is a no.
pub fn confirm(label: &str) -> Result<bool> {
    let answer = prompt(&format!("{label} [y/N]"))?.unwrap_or_default();
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

/// Offer one unassigned task; invalid input leaves it unchanged.
pub fn triage_choice(task: &Task) -> Option<TriageChoice> {
    println!("\n{}", task.name);
    let answer = prompt("  [1] low  [m] medium  [2] high  [s] someday  [c] deprecated  [x] done")
        .ok()
        .flatten()?;
    let choice = TriageChoice::parse(&answer);
    if choice.is_none() {
        println!("  unrecognized, leaving as is");
    }
    choice
}

const DECISION_HELP: &str = "  [y] apply  [a] accept all  [s] tomorrow  [w] next week  [d <date>] defer to\n  \
                             [c] done  [x] deprecated  [h] high  [r <name>] rename  [t <time>|@<time>] set time";

const CUTOFF_HELP: &str = "  [l] allow late night  [s] move to tomorrow  [i] ignore availability  [q] stop";

/// Line-oriented operator. Unparseable answers re-prompt; end of input halts.
pub struct LineOperator<R, W> {
    input: R,
    output: W,
    today: NaiveDate,
}

impl LineOperator<io::StdinLock<'static>, io::Stdout> {
    pub fn stdin(today: NaiveDate) -> Self {
        Self::new(io::stdin().lock(), io::stdout(), today)
    }
}

impl<R: BufRead, W: Write> LineOperator<R, W> {
    pub fn new(input: R, output: W, today: NaiveDate) -> Self {
        Self { input, output, today }
    }

    fn ask<T>(&mut self, label: &str, parse: impl Fn(&str) -> Result<T>) -> Option<T> {
        loop {
            write!(self.output, "{label}> ").ok()?;
            self.output.flush().ok()?;
            let line = read_line(&mut self.input).ok().flatten()?;
            match parse(&line) {
                Ok(v) => return Some(v),
                Err(e) => {
                    writeln!(self.output, "  {e}").ok()?;
                }
            }
        }
    }
}

impl<R: BufRead, W: Write> Operator for LineOperator<R, W> {
    fn decide(&mut self, proposal: &Proposal) -> Option<Decision> {
        writeln!(
            self.output,
            "\n{} [{}] {} - {} ({} min)",
            proposal.name,
            proposal.priority,
            proposal.start.format("%a %b %-d %H:%M"),
            proposal.end.format("%H:%M"),
            proposal.minutes,
        )
        .ok()?;
        writeln!(self.output, "{DECISION_HELP}").ok()?;
        let today = self.today;
        self.ask("decision", |s| Decision::parse(s, today))
    }

    fn at_cutoff(&mut self, proposal: &Proposal) -> Option<CutoffChoice> {
        writeln!(
            self.output,
            "\n{} would start at {}, past the end of the day.",
            proposal.name,
            proposal.start.format("%H:%M"),
        )
        .ok()?;
        writeln!(self.output, "{CUTOFF_HELP}").ok()?;
        self.ask("cutoff", CutoffChoice::parse)
    }
}
