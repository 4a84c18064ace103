use dco_core::{TargetParameter, TaskError};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Outer targets at the corners and faces of a square centered at the origin
pub fn default_targets() -> Vec<TargetParameter> {
    vec![
        TargetParameter::at(1.0, 0.0, 0.0),
        TargetParameter::at(0.0, 1.0, 0.0),
        TargetParameter::at(1.0, 1.0, 0.0),
        TargetParameter::at(-1.0, 0.0, 0.0),
        TargetParameter::at(0.0, -1.0, 0.0),
        TargetParameter::at(-1.0, -1.0, 0.0),
        TargetParameter::at(1.0, -1.0, 0.0),
        TargetParameter::at(-1.0, 1.0, 0.0),
    ]
}

/// How the next trial's target is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Uniform over every index except the previous one
    #[default]
    NoImmediateRepeat,
    /// Every index once per cycle, in shuffled order
    Shuffled,
}

/// Candidate outer targets of a block
#[derive(Debug, Clone)]
pub struct TargetParameterSet {
    entries: Vec<TargetParameter>,
    policy: SelectionPolicy,
    deck: Vec<usize>,
}

impl TargetParameterSet {
    /// Validates `entries`, or falls back to [`default_targets`].
    pub fn load(entries: Option<Vec<TargetParameter>>) -> Result<Self, TaskError> {
        let entries = entries.unwrap_or_else(default_targets);
        if entries.is_empty() {
            return Err(TaskError::InvalidConfiguration(
                "target parameter set is empty".into(),
            ));
        }
        for entry in &entries {
            entry.validate()?;
        }
        Ok(Self {
            entries,
            policy: SelectionPolicy::default(),
            deck: Vec::new(),
        })
    }

    /// Parses a JSON array of target records
    pub fn from_json_str(json: &str) -> Result<Self, TaskError> {
        let entries: Vec<TargetParameter> = serde_json::from_str(json)
            .map_err(|e| TaskError::InvalidConfiguration(format!("target records: {e}")))?;
        Self::load(Some(entries))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TaskError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            TaskError::InvalidConfiguration(format!("reading {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self.deck.clear();
        self
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TargetParameter> {
        self.entries.get(index)
    }

    pub fn as_slice(&self) -> &[TargetParameter] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetParameter> {
        self.entries.iter()
    }

    /// Picks the index for the next trial.
    ///
    /// Never returns `previous` while the set holds more than one entry.
    pub fn select<R: Rng>(&mut self, previous: Option<usize>, rng: &mut R) -> usize {
        let n = self.entries.len();
        if n == 1 {
            return 0;
        }
        let previous = previous.filter(|&p| p < n);
        match self.policy {
            SelectionPolicy::NoImmediateRepeat => match previous {
                Some(p) => {
                    let k = rng.random_range(0..n - 1);
                    if k >= p { k + 1 } else { k }
                }
                None => rng.random_range(0..n),
            },
            SelectionPolicy::Shuffled => self.draw_from_deck(previous, rng),
        }
    }

    fn draw_from_deck<R: Rng>(&mut self, previous: Option<usize>, rng: &mut R) -> usize {
        loop {
            if self.deck.is_empty() {
                self.deck.extend(0..self.entries.len());
                self.deck.shuffle(rng);
            }
            let last = self.deck.len() - 1;
            if Some(self.deck[last]) != previous {
                return self.deck.pop().unwrap_or_default();
            }
            if last == 0 {
                // only the previous index is left in this cycle
                self.deck.clear();
            } else {
                self.deck.swap(0, last);
            }
        }
    }
}
