//! Configuration for a challenge engine.

use serde::{Deserialize, Serialize};

/// Configuration for a challenge engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Base RNG seed. Each randomizer derives its own stream from it.
    pub seed: u64,
    /// Whether a session persisted while RUNNING resumes by itself on load.
    /// When unset it comes back PAUSED and waits for an explicit resume.
    pub resume_on_load: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            resume_on_load: false,
        }
    }
}

impl RulesConfig {
    /// Set the base RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the resume-on-load policy.
    pub fn with_resume_on_load(mut self, resume: bool) -> Self {
        self.resume_on_load = resume;
        self
    }
}
