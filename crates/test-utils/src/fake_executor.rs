use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use blogpipe::context::PipelineContext;
use blogpipe::dag::ScheduledStep;
use blogpipe::engine::StepOutcome;
use blogpipe::exec::StepExecutor;

/// A fake executor that:
/// - records which steps were "run", in order
/// - sleeps for `delay` per step (to make overlap observable)
/// - reports `Failed(code)` or an executor error for configured steps
/// - tracks the highest number of steps running at once
#[derive(Default)]
pub struct FakeExecutor {
    executed: Arc<Mutex<Vec<String>>>,
    failures: HashMap<String, i32>,
    errors: HashSet<String>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `name` exit with `code`.
    pub fn failing(mut self, name: &str, code: i32) -> Self {
        self.failures.insert(name.to_string(), code);
        self
    }

    /// Make `name` fail to start at all.
    pub fn erroring(mut self, name: &str) -> Self {
        self.errors.insert(name.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Names of executed steps, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn count_of(&self, name: &str) -> usize {
        self.executed().iter().filter(|n| *n == name).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl StepExecutor for FakeExecutor {
    fn execute<'a>(
        &'a self,
        step: &'a ScheduledStep,
        _ctx: &'a PipelineContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<StepOutcome>> + Send + 'a>> {
        Box::pin(async move {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            self.executed.lock().unwrap().push(step.name.clone());

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.errors.contains(&step.name) {
                return Err(anyhow!("fake spawn failure for '{}'", step.name));
            }
            Ok(match self.failures.get(&step.name) {
                Some(code) => StepOutcome::Failed(*code),
                None => StepOutcome::Success,
            })
        })
    }
}
