//! Resolution engine: walk the task graph and run actions in dependency order.
//!
//! Each [Task] goes through three states: not started, in progress (its
//! dependencies have been scheduled) and done. The walk uses an explicit stack
//! instead of recursion: a dependency found in progress while its dependent is
//! being scheduled necessarily lies on the current path, which reveals a cycle.
//!
//! Tasks for types without a rule are derived on first use, see [crate::auto].

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::task::{Initializer, Level, State, Task, TypeKey};
use crate::value::ValueStore;
use crate::ProvideError;

/// Content of the report returned when a cycle is detected
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CycleReport {
    /// Only the tasks forming the cycle
    #[default]
    Minimal,
    /// Every pending task on the walk stack, including unrelated sibling branches
    FullStack,
}

/// Provider settings
#[derive(Clone, Debug, Default)]
pub struct Options {
    pub cycle_report: CycleReport,
}

/// Task store, value store and the scheduling algorithm over them
#[derive(Default)]
pub(crate) struct Scheduler {
    tasks: HashMap<Task, State>,
    values: ValueStore,
    options: Options,
}

impl Scheduler {
    pub(crate) fn new(options: Options) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub(crate) fn values(&self) -> &ValueStore {
        &self.values
    }

    /// Register the tasks of an explicit rule.
    ///
    /// Fails if any level of this type is already known, either from another
    /// rule or from a previous automatic derivation.
    pub(crate) fn install(&mut self, init: Initializer) -> Result<(), ProvideError> {
        let partial = Task::partial(init.key);
        let complete = Task::complete(init.key);
        if self.tasks.contains_key(&partial) || self.tasks.contains_key(&complete) {
            return Err(ProvideError::Conflict(init.key.name()));
        }
        self.tasks.insert(partial, init.partial);
        self.tasks.insert(complete, init.complete);
        Ok(())
    }

    /// Fully initialize a value of the target type.
    ///
    /// Partial tasks completed along the way (circular fields) are then
    /// completed as well, so that no value is left half-initialized.
    pub(crate) fn complete(&mut self, key: TypeKey) -> Result<(), ProvideError> {
        let mut goals = vec![Task::complete(key)];
        let mut i = 0;
        while i < goals.len() {
            let newly_done = self.run(goals[i])?;
            goals.extend(
                newly_done
                    .into_iter()
                    .filter(|task| task.level == Level::Partial)
                    .map(|task| Task::complete(task.key)),
            );
            i += 1;
        }
        Ok(())
    }

    /// Complete a single task and its dependencies, returning the tasks completed by this call
    fn run(&mut self, goal: Task) -> Result<Vec<Task>, ProvideError> {
        let mut stack = vec![goal];
        let mut newly_done = Vec::with_capacity(2);

        while let Some(&task) = stack.last() {
            let state = self.state(task)?;
            if state.done {
                stack.pop();
                continue;
            }

            if !state.in_progress {
                // Schedule the dependencies first, the first declared on top
                let depends_on = state.depends_on.clone();
                let top = stack.len() - 1;
                let mut pending = Vec::with_capacity(depends_on.len());
                for dep in depends_on {
                    let dep_state = self.state(dep)?;
                    if dep_state.done {
                        continue;
                    }
                    if dep_state.in_progress {
                        return Err(self.cycle(&stack, top, dep));
                    }
                    pending.push(dep);
                }

                self.state(task)?.in_progress = true;
                if !pending.is_empty() {
                    stack.extend(pending.into_iter().rev());
                    continue;
                }
            }

            // All dependencies are done
            let action = self.state(task)?.action.clone();
            if let Some(action) = action {
                trace!(ty = task.key.name(), level = ?task.level, "running task");
                action(&mut self.values)?;
            }
            let state = self.state(task)?;
            state.done = true;
            state.depends_on = Vec::new();
            state.action = None;
            newly_done.push(task);
            stack.pop();
        }

        Ok(newly_done)
    }

    /// Lookup the state of a task, deriving the tasks of unknown types on the fly
    fn state(&mut self, task: Task) -> Result<&mut State, ProvideError> {
        if !self.tasks.contains_key(&task) {
            let init = task.key.derive()?;
            debug!(ty = init.key.name(), "derived automatic construction");
            self.tasks.insert(Task::partial(init.key), init.partial);
            self.tasks.insert(Task::complete(init.key), init.complete);
        }
        self.tasks
            .get_mut(&task)
            .ok_or(ProvideError::NotAutoProvidable(task.key.name()))
    }

    /// Report the cycle closed by `repeated`, a dependency of `stack[top]`.
    ///
    /// Consecutive tasks of the same type (its partial and complete levels)
    /// are reported once.
    fn cycle(&self, stack: &[Task], top: usize, repeated: Task) -> ProvideError {
        let start = stack[..=top]
            .iter()
            .rposition(|task| *task == repeated)
            .unwrap_or(0);
        let mut keys: Vec<TypeKey> = match self.options.cycle_report {
            CycleReport::Minimal => stack[start..=top]
                .iter()
                .enumerate()
                .filter(|(i, task)| {
                    start + i == top || self.tasks.get(*task).is_some_and(|s| s.in_progress)
                })
                .map(|(_, task)| task.key)
                .collect(),
            CycleReport::FullStack => stack[start..].iter().map(|task| task.key).collect(),
        };
        keys.dedup();
        let mut path: Vec<&'static str> = keys.iter().map(TypeKey::name).collect();
        path.push(repeated.key.name());
        ProvideError::Cycle { path }
    }
}
