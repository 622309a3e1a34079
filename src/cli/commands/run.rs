//! Interactive console session
//!
//! Classifies a query, lets the seed cascade run, then offers the operator
//! every step action the gates allow until nothing is actionable or the
//! operator quits.

use crate::abstractions::{
    BackendClient, HttpClassifier, HttpStepExecutor, StepExecutor, TaskClassifier,
};
use crate::cli::render::{action_label, render_board, render_classification};
use crate::config::ConsoleConfig;
use crate::interaction::{DefaultUserInteraction, UserInteraction};
use crate::runbook::{Action, Console, Driver, NoticeLevel, Phase, SessionSettings, Summary};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

const NEW_QUERY: &str = "New query";
const QUIT: &str = "Quit";
const CANCEL: &str = "Cancel";

/// How the step menu was left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// No step can be run, approved or rejected
    Exhausted,
    NewQuery,
    Quit,
}

/// Run the interactive console against the configured backend
pub async fn run_console(config: ConsoleConfig, query: Option<String>) -> Result<()> {
    let client = BackendClient::new(&config)?;
    let driver = Driver::new(
        Console::new(SessionSettings::from_config(&config)),
        Arc::new(HttpClassifier::new(client.clone())),
        Arc::new(HttpStepExecutor::new(client)),
    );
    let mut session = ConsoleSession::new(driver, Arc::new(DefaultUserInteraction::new()));
    session.run(query).await?;
    Ok(())
}

pub struct ConsoleSession<C, E> {
    driver: Driver<C, E>,
    ui: Arc<dyn UserInteraction>,
}

impl<C, E> ConsoleSession<C, E>
where
    C: TaskClassifier + 'static,
    E: StepExecutor + 'static,
{
    pub fn new(driver: Driver<C, E>, ui: Arc<dyn UserInteraction>) -> Self {
        Self { driver, ui }
    }

    pub fn console(&self) -> &Console {
        self.driver.console()
    }

    /// Run the session loop and return the final step summary
    pub async fn run(&mut self, initial_query: Option<String>) -> Result<Summary> {
        match self.driver.load_tasks().await {
            Ok(count) => debug!(count, "Task catalog ready"),
            Err(e) => {
                warn!(error = %e, "Task catalog unavailable");
                self.ui
                    .display_warning(&format!("Task catalog unavailable: {}", e.user_message()));
            }
        }

        let mut next_query = initial_query;
        loop {
            let query = match next_query.take() {
                Some(query) => query,
                None => {
                    self.ui
                        .prompt_text("Describe the operation to perform", None)
                        .await?
                }
            };
            if let Err(e) = self.driver.perform(Action::SubmitQuery { query }) {
                self.ui.display_error(&e.user_message());
                continue;
            }
            self.settle().await;

            if !self.resolve_task().await? {
                continue;
            }
            self.show_classification();

            match self.step_menu().await? {
                SessionExit::NewQuery => continue,
                SessionExit::Exhausted | SessionExit::Quit => break,
            }
        }

        let summary = self.driver.console().summary();
        self.ui.display_info(&summary.to_string());
        Ok(summary)
    }

    /// Drive the unknown-task choice until a runbook is installed
    ///
    /// Returns false when the operator cancels or no runbook could be
    /// obtained, so a new query is asked for.
    async fn resolve_task(&mut self) -> Result<bool> {
        loop {
            match self.driver.console().phase() {
                Phase::Ready => return Ok(true),
                Phase::AwaitingTaskChoice => {}
                Phase::Idle | Phase::Classifying => return Ok(false),
            }

            let tasks = self.driver.console().tasks().to_vec();
            if tasks.is_empty() {
                self.ui
                    .display_error("No task catalog is available to choose from");
                return Ok(false);
            }
            let mut choices: Vec<String> = tasks.iter().map(|t| t.label()).collect();
            choices.push(CANCEL.to_string());

            let index = self
                .ui
                .prompt_choice("Which task did you mean?", &choices)
                .await?;
            let Some(task) = tasks.get(index) else {
                return Ok(false);
            };
            if let Err(e) = self.driver.perform(Action::SelectTask {
                task_id: task.task_id.clone(),
            }) {
                self.ui.display_error(&e.user_message());
                return Ok(false);
            }
            self.settle().await;
        }
    }

    async fn step_menu(&mut self) -> Result<SessionExit> {
        loop {
            for line in render_board(self.driver.console()) {
                self.ui.display_line(&line);
            }

            let actions = self.driver.console().available_actions();
            if actions.is_empty() {
                self.ui.display_info("No further steps can be taken");
                return Ok(SessionExit::Exhausted);
            }

            let mut choices: Vec<String> = actions
                .iter()
                .map(|(step_id, action)| action_label(self.driver.console(), step_id, *action))
                .collect();
            choices.push(NEW_QUERY.to_string());
            choices.push(QUIT.to_string());

            let index = self.ui.prompt_choice("Choose an action", &choices).await?;
            let Some((step_id, action)) = actions.get(index).cloned() else {
                return Ok(if index == actions.len() {
                    SessionExit::NewQuery
                } else {
                    SessionExit::Quit
                });
            };

            match self.driver.perform(action.into_action(step_id.clone())) {
                Ok(()) => self.settle().await,
                Err(e) if e.is_double_submission() => {
                    warn!(step_id = %step_id, "Ignoring double submission");
                }
                Err(e) => self.ui.display_error(&e.user_message()),
            }
        }
    }

    /// Wait for every outstanding call and show the notices they raised
    async fn settle(&mut self) {
        if self.driver.pending() > 0 {
            let mut spinner = self.ui.start_spinner("Waiting for the backend");
            self.driver.run_until_idle().await;
            let problems = self
                .driver
                .notices()
                .iter()
                .filter(|n| n.level != NoticeLevel::Info)
                .count();
            match problems {
                0 => spinner.success("Done"),
                1 => spinner.fail("Finished with 1 problem"),
                n => spinner.fail(&format!("Finished with {n} problems")),
            }
        }
        for notice in self.driver.take_notices() {
            match notice.level {
                NoticeLevel::Info => self.ui.display_info(&notice.message),
                NoticeLevel::Warning => self.ui.display_warning(&notice.message),
                NoticeLevel::Error => self.ui.display_error(&notice.message),
            }
        }
    }

    fn show_classification(&self) {
        if let Some(result) = self.driver.console().classification() {
            for line in render_classification(result) {
                self.ui.display_line(&line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstractions::{MockClassifier, MockStepExecutor};
    use crate::catalog::TaskSummary;
    use crate::interaction::mocks::MockUserInteraction;
    use crate::runbook::ExecutionOutcome;
    use crate::testing::{unknown_classification, RunbookBuilder};
    use std::time::Duration;

    struct Harness {
        classifier: Arc<MockClassifier>,
        executor: Arc<MockStepExecutor>,
        ui: Arc<MockUserInteraction>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                classifier: Arc::new(MockClassifier::new()),
                executor: Arc::new(MockStepExecutor::new()),
                ui: Arc::new(MockUserInteraction::new()),
            }
        }

        fn session(&self) -> ConsoleSession<MockClassifier, MockStepExecutor> {
            let settings = SessionSettings {
                user_id: "ops".into(),
                environment: "prod".into(),
                cascade_delay: Duration::from_millis(1),
            };
            let driver = Driver::new(
                Console::new(settings),
                Arc::clone(&self.classifier),
                Arc::clone(&self.executor),
            );
            ConsoleSession::new(driver, self.ui.clone())
        }
    }

    #[tokio::test]
    async fn test_session_ends_when_nothing_is_actionable() {
        let h = Harness::new();
        h.classifier
            .add_result(
                RunbookBuilder::new("check")
                    .precheck("a", true)
                    .precheck("b", true)
                    .build(),
            )
            .await;

        let summary = h.session().run(Some("check it".into())).await.unwrap();
        assert_eq!(summary.completed, 2);
        assert_eq!(h.executor.called_steps().await, vec![1, 2]);
        let messages = h.ui.get_messages();
        assert!(messages.contains(&"SPINNER DONE: Done".to_string()));
        assert!(messages.contains(&"INFO: No further steps can be taken".to_string()));
        assert!(messages.last().unwrap().starts_with("INFO: 2 steps: 2 completed"));
    }

    #[tokio::test]
    async fn test_approve_then_quit() {
        let h = Harness::new();
        h.classifier
            .add_result(
                RunbookBuilder::new("free_disk")
                    .precheck("check", true)
                    .procedure("delete logs", false)
                    .procedure("report", false)
                    .build(),
            )
            .await;
        // Menu 1 offers approve/reject for steps 2 and 3; after step 2 the
        // cascade parks step 3 and menu 2 is [Approve 3, Reject 3, New query, Quit].
        h.ui.add_choice_response(0);
        h.ui.add_choice_response(3);

        let summary = h.session().run(Some("free disk".into())).await.unwrap();
        assert_eq!(h.executor.called_steps().await, vec![1, 2]);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.approval_required, 1);
        assert!(h
            .ui
            .get_messages()
            .iter()
            .any(|m| m.starts_with("CHOICE: Choose an action [Approve step 2: delete logs")));
    }

    #[tokio::test]
    async fn test_reject_cancels_without_execution() {
        let h = Harness::new();
        h.classifier
            .add_result(RunbookBuilder::new("t").procedure("drop table", false).build())
            .await;
        h.ui.add_choice_response(1);

        let summary = h.session().run(Some("drop".into())).await.unwrap();
        assert!(h.executor.get_calls().await.is_empty());
        assert_eq!(summary.cancelled, 1);
        assert!(h
            .ui
            .get_messages()
            .contains(&"INFO: Step 1 cancelled: drop table".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_task_is_disambiguated() {
        let h = Harness::new();
        h.classifier
            .set_tasks(vec![
                TaskSummary {
                    task_id: "free_disk".into(),
                    task_name: "Free disk".into(),
                    description: None,
                },
                TaskSummary {
                    task_id: "restart_pod".into(),
                    task_name: "Restart pod".into(),
                    description: None,
                },
            ])
            .await;
        h.classifier.add_result(unknown_classification()).await;
        h.classifier
            .add_result(RunbookBuilder::new("restart_pod").precheck("ping", true).build())
            .await;
        h.ui.add_choice_response(1);

        h.session().run(Some("fix it".into())).await.unwrap();

        let requests = h.classifier.get_requests().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].task_id.as_deref(), Some("restart_pod"));
        assert_eq!(requests[1].query, "fix it");
        assert_eq!(h.executor.called_steps().await, vec![1]);
    }

    #[tokio::test]
    async fn test_failure_is_reported_and_blocks_downstream() {
        let h = Harness::new();
        h.classifier
            .add_result(
                RunbookBuilder::new("t")
                    .precheck("probe", true)
                    .procedure("act", true)
                    .build(),
            )
            .await;
        h.executor
            .add_outcome(1, ExecutionOutcome::failure("probe timed out"))
            .await;

        let summary = h.session().run(Some("go".into())).await.unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.blocked, 1);
        let messages = h.ui.get_messages();
        assert!(messages.contains(&"SPINNER FAILED: Finished with 1 problem".to_string()));
        assert!(messages.contains(&"WARN: Step 1 failed: probe timed out".to_string()));
        assert!(messages.iter().any(|m| m.contains("error: probe timed out")));
    }

    #[tokio::test]
    async fn test_blank_query_is_reported_and_reprompted() {
        let h = Harness::new();
        h.classifier
            .add_result(RunbookBuilder::new("t").precheck("a", true).build())
            .await;
        h.ui.add_text_response("ping the host");

        h.session().run(Some("   ".into())).await.unwrap();
        let messages = h.ui.get_messages();
        assert!(messages.iter().any(|m| m.starts_with("ERROR: ")));
        assert!(messages.contains(&"TEXT: Describe the operation to perform".to_string()));
        assert_eq!(h.classifier.get_requests().await[0].query, "ping the host");
    }
}
