//! Effect driver
//!
//! Owns a [`Console`] together with the two backends and performs the
//! effects each dispatch returns. All in-flight remote calls live in one
//! `FuturesUnordered` polled from a single task, and each completion is fed
//! back through `dispatch` as an action.

use super::console::{Action, Console, Effect, Notice, NoticeLevel};
use crate::abstractions::{StepExecutor, TaskClassifier};
use crate::error::Result;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct Driver<C, E> {
    console: Console,
    classifier: Arc<C>,
    executor: Arc<E>,
    in_flight: FuturesUnordered<BoxFuture<'static, Action>>,
    notices: Vec<Notice>,
}

impl<C, E> Driver<C, E>
where
    C: TaskClassifier + 'static,
    E: StepExecutor + 'static,
{
    pub fn new(console: Console, classifier: Arc<C>, executor: Arc<E>) -> Self {
        Self {
            console,
            classifier,
            executor,
            in_flight: FuturesUnordered::new(),
            notices: Vec::new(),
        }
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Number of remote calls still outstanding
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Fetch the task catalog once and hand it to the console
    pub async fn load_tasks(&mut self) -> Result<usize> {
        let tasks = self.classifier.list_tasks().await?;
        info!(count = tasks.len(), "Loaded task catalog");
        let count = tasks.len();
        self.console.set_tasks(tasks);
        Ok(count)
    }

    /// Dispatch an operator action and start the effects it requests
    ///
    /// The action's own rejection is returned; nothing is started then.
    pub fn perform(&mut self, action: Action) -> Result<()> {
        let effects = self.console.dispatch(action)?;
        self.start(effects);
        Ok(())
    }

    /// Poll outstanding calls until none remain, dispatching each result
    pub async fn run_until_idle(&mut self) {
        while let Some(action) = self.in_flight.next().await {
            match self.console.dispatch(action) {
                Ok(effects) => self.start(effects),
                Err(e) => {
                    error!(error = %e, "Completion could not be applied");
                    self.notices.push(Notice::error(e.user_message()));
                }
            }
        }
        debug!("Driver idle");
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Banners raised since the last call
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn start(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Classify(request) => {
                    let classifier = Arc::clone(&self.classifier);
                    self.in_flight.push(
                        async move {
                            match classifier.classify(&request).await {
                                Ok(result) => Action::Classified { result },
                                Err(error) => Action::ClassificationFailed { error },
                            }
                        }
                        .boxed(),
                    );
                }
                Effect::Execute {
                    generation,
                    step_id,
                    request,
                    delay,
                } => {
                    let executor = Arc::clone(&self.executor);
                    self.in_flight.push(
                        async move {
                            if !delay.is_zero() {
                                tokio::time::sleep(delay).await;
                            }
                            let outcome = executor.execute(&request).await;
                            Action::StepFinished {
                                generation,
                                step_id,
                                outcome,
                            }
                        }
                        .boxed(),
                    );
                }
                Effect::Notify(notice) => {
                    match notice.level {
                        NoticeLevel::Error => warn!(notice = %notice, "Notice"),
                        _ => debug!(notice = %notice, "Notice"),
                    }
                    self.notices.push(notice);
                }
            }
        }
    }
}
