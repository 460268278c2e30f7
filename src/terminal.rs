//! Console host and step, for playing tours in a terminal.
//!
//! The host keeps the set of targets that currently exist on screen; a step
//! whose target is missing fails to show and is passed over by the sequence.

use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};

use crate::config::StepsConfig;
use crate::sequence::{Host, Sequence, SequenceError, Step};

pub struct TerminalHost<W> {
    out: W,
    targets: BTreeSet<String>,
    finishing: bool,
}

impl<W: Write> TerminalHost<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            targets: BTreeSet::new(),
            finishing: false,
        }
    }

    /// Declare `target` as present, so steps pointing at it can show
    pub fn add_target(&mut self, target: impl Into<String>) {
        self.targets.insert(target.into());
    }

    pub fn has_target(&self, target: &str) -> bool {
        self.targets.contains(target)
    }

    /// Mark the host as being torn down
    pub fn finish(&mut self) {
        self.finishing = true;
    }

    pub fn writer(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W> Host for TerminalHost<W> {
    fn is_finishing(&self) -> bool {
        self.finishing
    }
}

/// One step rendered as a boxed card
#[derive(Debug, Clone)]
pub struct TerminalStep {
    target: Option<String>,
    title: String,
    content: String,
    dismiss_text: String,
    skip_text: String,
    width: usize,
    fired: bool,
    skipped: bool,
    observed: bool,
}

impl TerminalStep {
    /// A step using the shared defaults for its action labels and width
    pub fn new(content: impl Into<String>, defaults: &StepsConfig) -> Self {
        Self {
            target: None,
            title: String::new(),
            content: content.into(),
            dismiss_text: defaults.dismiss_text.clone(),
            skip_text: defaults.skip_text.clone(),
            width: defaults.width.max(MIN_WIDTH),
            fired: false,
            skipped: false,
            observed: false,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_dismiss_text(mut self, text: impl Into<String>) -> Self {
        self.dismiss_text = text.into();
        self
    }

    pub fn with_skip_text(mut self, text: impl Into<String>) -> Self {
        self.skip_text = text.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn dismiss_text(&self) -> &str {
        &self.dismiss_text
    }

    pub fn skip_text(&self) -> &str {
        &self.skip_text
    }

    /// Whether the step was shown or auto-fired
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Record that the user chose to skip the rest of the tour
    pub fn skip(&mut self) {
        self.skipped = true;
    }

    pub fn is_observed(&self) -> bool {
        self.observed
    }

    fn render(&self, out: &mut impl Write) -> io::Result<()> {
        let inner = self.width - 4;
        let heading = match (&self.title, &self.target) {
            (t, Some(target)) if !t.is_empty() => format!(" {t} ({target}) "),
            (t, None) if !t.is_empty() => format!(" {t} "),
            (_, Some(target)) => format!(" {target} "),
            (_, None) => String::new(),
        };
        let heading = truncate(&heading, self.width - 3);
        let fill = self.width - 3 - heading.chars().count();

        writeln!(out)?;
        writeln!(out, "┌─{heading}{}┐", "─".repeat(fill))?;
        for line in wrap(&self.content, inner) {
            writeln!(out, "│ {line:<inner$} │")?;
        }
        let actions = format!("[Enter] {}   [s] {}", self.dismiss_text, self.skip_text);
        let actions = truncate(&actions, inner);
        writeln!(out, "│ {:<inner$} │", "")?;
        writeln!(out, "│ {actions:>inner$} │")?;
        writeln!(out, "└{}┘", "─".repeat(self.width - 2))?;
        out.flush()
    }
}

const MIN_WIDTH: usize = 24;

impl<W: Write> Step<TerminalHost<W>> for TerminalStep {
    fn show(&mut self, host: &mut TerminalHost<W>) -> bool {
        if let Some(target) = &self.target {
            if !host.has_target(target) {
                tracing::debug!(step_target = %target, "target not on screen");
                return false;
            }
        }
        if let Err(err) = self.render(host.writer()) {
            tracing::warn!(error = %err, "failed to render step");
            return false;
        }
        self.fired = true;
        true
    }

    fn set_fired(&mut self) {
        self.fired = true;
    }

    fn is_skipped(&self) -> bool {
        self.skipped
    }

    fn set_detach_observed(&mut self, observed: bool) {
        self.observed = observed;
    }
}

/// Why a terminal tour stopped reading input
#[derive(Debug, thiserror::Error)]
pub enum PlayError {
    #[error("failed to read input: {0}")]
    Input(#[from] io::Error),

    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

/// Feed answers from `input` to a started sequence until no step is showing.
///
/// An empty line dismisses the step, `s` dismisses it and skips the rest, and
/// `q` or end of input tears the host down, leaving the tour resumable.
pub fn play<R: BufRead, W: Write>(
    sequence: &mut Sequence<TerminalHost<W>, TerminalStep>,
    mut input: R,
) -> Result<(), PlayError> {
    let mut line = String::new();
    while sequence.is_presenting() {
        line.clear();
        let read = input.read_line(&mut line)?;
        let answer = line.trim();

        if read == 0 || answer == "q" {
            sequence.host_mut().finish();
            sequence.on_detach(false)?;
            continue;
        }
        if answer == "s" {
            if let Some(step) = sequence.pending_step_mut() {
                step.skip();
            }
        }
        sequence.on_detach(true)?;
    }
    Ok(())
}

/// First `max` characters of `text`
fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Greedy word wrap; words longer than `width` are split
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                lines.push(word.drain(..width).collect());
            }
            let word: String = word.into_iter().collect();
            let needed = if line.is_empty() {
                word.chars().count()
            } else {
                line.chars().count() + 1 + word.chars().count()
            };
            if needed > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
