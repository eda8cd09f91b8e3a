//! Recorded scenario files.
//!
//! ```json
//! {
//!   "workflow": { "event_type": "no_sale" },
//!   "steps": [
//!     { "snapshot": { "sequence": 1, "event_type": "no_sale", "cash_drawer_state": "closed" } },
//!     { "input": { "drawer_key": "D-1" } }
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use till_core::TillWorkflow;
use till_session::SessionEvent;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub workflow: TillWorkflow,
    #[serde(default)]
    pub steps: Vec<SessionEvent>,
}

impl Scenario {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let scenario: Scenario = serde_json::from_str(&contents)
            .with_context(|| format!("parsing scenario {}", path.display()))?;
        scenario.check()?;
        Ok(scenario)
    }

    /// Every snapshot must belong to the scenario's workflow.
    fn check(&self) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            if let SessionEvent::Snapshot(snapshot) = step {
                if snapshot.workflow() != self.workflow {
                    bail!(
                        "step {index}: snapshot for {} does not match workflow {}",
                        snapshot.event_type,
                        self.workflow.event_type
                    );
                }
            }
        }
        Ok(())
    }
}
