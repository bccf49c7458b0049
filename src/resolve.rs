//! Resolution Protocol: the interactive accept/reject walk over a pair of
//! collections.
//!
//! Strictly sequential and synchronous: records are visited in ascending id
//! order, and the only suspension point is the operator prompt. The prompt
//! is a trait so sessions can be driven by a console or by a script; the
//! protocol itself never touches stdin directly.
//!
//! Aborting (answering `0` to an indexed choice) stops the whole session,
//! but acceptances made before the abort stand and are still persisted.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use crate::collection::Collection;
use crate::config::MatchConfig;
use crate::ledger::Ledger;
use crate::matching::{best_rate, rank, MatchCandidate};
use crate::record::Record;

/// Operator interaction surface. `ask` blocks until an answer arrives;
/// there is no timeout.
pub trait Prompt {
    fn ask(&mut self, question: &str) -> Result<String>;
    fn notify(&mut self, message: &str);
}

/// Real console prompt: questions to stdout, answers from stdin.
pub struct ConsolePrompt;

impl Prompt for ConsolePrompt {
    fn ask(&mut self, question: &str) -> Result<String> {
        print!("{question}");
        io::stdout().flush().context("couldn't flush stdout")?;
        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .context("couldn't read operator input")?;
        Ok(answer.trim().to_string())
    }

    fn notify(&mut self, message: &str) {
        println!("{message}");
    }
}

/// Scripted prompt: canned answers, captured notices. Drives sessions in
/// tests and anywhere else console I/O is unwanted.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: std::collections::VecDeque<String>,
    pub notices: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            notices: Vec::new(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, _question: &str) -> Result<String> {
        self.answers
            .pop_front()
            .context("scripted prompt ran out of answers")
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

/// What one prompt round decided.
enum Decision {
    Accept(usize),
    Skip,
    AbortAll,
}

/// Result of a resolution session over one collection pair.
#[derive(Debug, Default)]
pub struct SessionOutcome {
    /// Accepted (source record, matched record) pairs, in acceptance order.
    pub accepted: Vec<(Record, Record)>,
    /// True when the operator aborted the session before the end.
    pub aborted: bool,
}

/// Yes/no confirmation of a single candidate. Empty input and `n` decline;
/// anything unparseable re-prompts.
fn confirm(
    prompt: &mut dyn Prompt,
    source: &Record,
    matched: &MatchCandidate<'_>,
) -> Result<Decision> {
    let question = format!(
        "\nFound match ({}%) between:\n\n   «{}»\n   «{}»\n\nAccept the match? [y/N]: ",
        (matched.similarity * 100.0).round(),
        source,
        matched.candidate,
    );
    loop {
        match prompt.ask(&question)?.to_uppercase().as_str() {
            "Y" => return Ok(Decision::Accept(0)),
            "N" | "" => return Ok(Decision::Skip),
            _ => continue,
        }
    }
}

/// Indexed choice among several candidates. `0` aborts the whole session,
/// empty input skips this record, anything else re-prompts.
fn choose(
    prompt: &mut dyn Prompt,
    source: &Record,
    matches: &[MatchCandidate<'_>],
) -> Result<Decision> {
    let listing: String = matches
        .iter()
        .enumerate()
        .map(|(n, m)| format!("{:4}) {}\n", n + 1, m.candidate))
        .collect();
    let question = format!(
        "\nFound matches for:\n\n   «{}»\n\n{}\nChoose the desired match (0 to abort) [0-{}]: ",
        source,
        listing,
        matches.len(),
    );
    loop {
        let answer = prompt.ask(&question)?;
        if answer.is_empty() {
            return Ok(Decision::Skip);
        }
        if let Ok(i) = answer.parse::<usize>() {
            if i == 0 {
                return Ok(Decision::AbortAll);
            }
            if i <= matches.len() {
                return Ok(Decision::Accept(i - 1));
            }
        }
    }
}

/// Walk `source` against `other`, presenting ranked candidates and
/// collecting accepted pairs.
///
/// Skipped without prompting:
/// - records whose id the ledger already resolved for this pair;
/// - records whose best candidate is an exact 1.0, or whose best candidate
///   itself matches some record of `source` at exactly 1.0 — the identity
///   derivation already proves those, no operator needed;
/// - records with no candidate at or above the threshold (a notice is
///   emitted, nothing persisted; they resurface next run).
pub fn run_session(
    source: &Collection,
    other: &Collection,
    ledger: &Ledger,
    columns: &[String],
    cfg: &MatchConfig,
    prompt: &mut dyn Prompt,
) -> Result<SessionOutcome> {
    let resolved = ledger.matched_ids(&source.name)?;
    let mut outcome = SessionOutcome::default();

    for record in source.sorted_by_id() {
        if resolved.contains(&record.id) {
            prompt.notify(&format!("«{record}» already has a match."));
            continue;
        }
        let matches = rank(record, &other.records, columns, cfg)?;
        if matches.is_empty() {
            prompt.notify(&format!("No matches for «{record}»."));
            continue;
        }
        if matches[0].similarity == 1.0
            || best_rate(matches[0].candidate, &source.records, columns, cfg.numeric_tolerance)?
                == 1.0
        {
            prompt.notify(&format!("«{record}» already has a match by id."));
            continue;
        }
        // A lone candidate is a yes/no question in either mode; the indexed
        // choice is only for genuinely competing candidates.
        let decision = if cfg.highest_match_only || matches.len() == 1 {
            confirm(prompt, record, &matches[0])?
        } else {
            choose(prompt, record, &matches)?
        };
        match decision {
            Decision::Accept(i) => {
                prompt.notify("Match accepted.");
                outcome
                    .accepted
                    .push((record.clone(), matches[i].candidate.clone()));
            }
            Decision::Skip => continue,
            Decision::AbortAll => {
                outcome.aborted = true;
                break;
            }
        }
    }
    Ok(outcome)
}
