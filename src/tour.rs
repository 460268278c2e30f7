//! Tour definition files.
//!
//! A tour is a TOML document listing its steps in presentation order. When it
//! carries an `id` the tour is single-use: progress is saved under that id and
//! a finished tour never plays again.
//!
//! ```toml
//! id = "onboarding"
//!
//! [[steps]]
//! target = "toolbar"
//! title = "Toolbar"
//! content = "Save and share from here."
//!
//! [[steps]]
//! content = "Beta features live in the labs menu."
//! only_if_env = "TOURGUIDE_BETA"
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::config::StepsConfig;
use crate::progress::ProgressStore;
use crate::sequence::Sequence;
use crate::terminal::{TerminalHost, TerminalStep};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourDefinition {
    /// Durable identity; absent for tours that replay every time
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Element the step points at; the step is passed over when it is absent
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub dismiss_text: Option<String>,
    #[serde(default)]
    pub skip_text: Option<String>,
    /// Only show the step when this environment variable is set
    #[serde(default)]
    pub only_if_env: Option<String>,
}

impl StepDefinition {
    /// Build the step, filling unset labels from `defaults`
    pub fn build(&self, defaults: &StepsConfig) -> TerminalStep {
        let mut step = TerminalStep::new(self.content.clone(), defaults).with_title(&self.title);
        if let Some(target) = &self.target {
            step = step.with_target(target);
        }
        if let Some(text) = &self.dismiss_text {
            step = step.with_dismiss_text(text);
        }
        if let Some(text) = &self.skip_text {
            step = step.with_skip_text(text);
        }
        step
    }
}

impl TourDefinition {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tour file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid tour file {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let tour: TourDefinition = toml::from_str(contents).context("Failed to parse tour")?;
        tour.validate()?;
        Ok(tour)
    }

    fn validate(&self) -> Result<()> {
        if let Some(id) = &self.id {
            if id.trim().is_empty() {
                bail!("tour id must not be blank");
            }
        }
        for (i, step) in self.steps.iter().enumerate() {
            if step.content.trim().is_empty() {
                bail!("step {} has no content", i + 1);
            }
        }
        Ok(())
    }

    /// Build the sequence for this tour over `host`.
    ///
    /// `store` is only consulted when the tour has an id.
    pub fn into_sequence<W: Write>(
        self,
        host: TerminalHost<W>,
        defaults: &StepsConfig,
        store: impl ProgressStore + 'static,
    ) -> Sequence<TerminalHost<W>, TerminalStep> {
        let mut sequence = Sequence::new(host);
        if let Some(id) = self.id {
            sequence.single_use(id, store);
        }

        for definition in self.steps {
            let step = definition.build(defaults);
            match definition.only_if_env {
                Some(var) => {
                    sequence.add_step_when(step, move |_| std::env::var_os(&var).is_some());
                }
                None => {
                    sequence.add_step(step);
                }
            }
        }
        sequence
    }
}
