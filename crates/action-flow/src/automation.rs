//! Compiled automations

use soulscript_core_types::{Automation as AutomationConfig, Task};
use tracing::debug;

use crate::binder::{bind, Action};
use crate::context::EvalContext;
use crate::errors::FlowError;
use crate::result::RunResult;
use cdp_adapter::Session;

/// Ordered actions compiled from a task list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Automation {
    name: Option<String>,
    actions: Vec<Action>,
}

impl Automation {
    /// Compile `tasks` in order.
    pub fn bind(tasks: &[Task]) -> Self {
        Self {
            name: None,
            actions: tasks.iter().map(bind).collect(),
        }
    }

    pub fn from_config(config: &AutomationConfig) -> Self {
        let mut automation = Self::bind(&config.tasks);
        automation.name = config.name.clone();
        automation
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Append another automation's actions after this one's.
    pub fn extend(&mut self, other: Automation) {
        self.actions.extend(other.actions);
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run every action in order, stopping at the first failure.
    pub async fn run(
        &self,
        session: &dyn Session,
        ctx: &mut EvalContext,
        result: &mut RunResult,
    ) -> Result<(), FlowError> {
        debug!(name = ?self.name, actions = self.actions.len(), "Running automation");
        for (index, action) in self.actions.iter().enumerate() {
            debug!(step = index + 1, action = %action, "Executing action");
            action.execute(session, ctx, result).await?;
        }
        Ok(())
    }
}

impl FromIterator<Action> for Automation {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self {
            name: None,
            actions: iter.into_iter().collect(),
        }
    }
}
