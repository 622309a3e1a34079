//! Operator interaction
//!
//! Prompts and message display behind the [`UserInteraction`] trait, so the
//! console session loop can be driven by a scripted mock in tests.

pub mod display;
pub mod prompts;

pub use display::{ProgressDisplay, ProgressDisplayImpl};
pub use prompts::{UserPrompter, UserPrompterImpl};

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UserInteraction: Send + Sync {
    /// Prompt user for text input
    async fn prompt_text(&self, message: &str, default: Option<&str>) -> Result<String>;

    /// Prompt user to pick one of `choices`, returning its index
    async fn prompt_choice(&self, message: &str, choices: &[String]) -> Result<usize>;

    fn display_info(&self, message: &str);

    fn display_warning(&self, message: &str);

    fn display_error(&self, message: &str);

    /// Undecorated output line
    fn display_line(&self, message: &str);

    fn start_spinner(&self, message: &str) -> Box<dyn SpinnerHandle>;
}

/// Handle for controlling a spinner
pub trait SpinnerHandle: Send + Sync {
    fn success(&mut self, message: &str);

    fn fail(&mut self, message: &str);
}

/// Terminal-backed interaction
pub struct DefaultUserInteraction {
    prompter: UserPrompterImpl,
    display: ProgressDisplayImpl,
}

impl Default for DefaultUserInteraction {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultUserInteraction {
    pub fn new() -> Self {
        Self {
            prompter: UserPrompterImpl::new(),
            display: ProgressDisplayImpl::new(),
        }
    }
}

#[async_trait]
impl UserInteraction for DefaultUserInteraction {
    async fn prompt_text(&self, message: &str, default: Option<&str>) -> Result<String> {
        self.prompter.prompt_text(message, default).await
    }

    async fn prompt_choice(&self, message: &str, choices: &[String]) -> Result<usize> {
        self.prompter.prompt_choice(message, choices).await
    }

    fn display_info(&self, message: &str) {
        self.display.info(message);
    }

    fn display_warning(&self, message: &str) {
        self.display.warning(message);
    }

    fn display_error(&self, message: &str) {
        self.display.error(message);
    }

    fn display_line(&self, message: &str) {
        self.display.line(message);
    }

    fn start_spinner(&self, message: &str) -> Box<dyn SpinnerHandle> {
        self.display.start_spinner(message)
    }
}

pub mod mocks {
    //! Scripted interaction for session tests

    use super::*;
    use std::sync::{Arc, Mutex};

    /// Answers are consumed in the order they were added; every prompt and
    /// message is recorded with a kind prefix.
    pub struct MockUserInteraction {
        pub text_responses: Mutex<Vec<String>>,
        pub choice_responses: Mutex<Vec<usize>>,
        pub messages: Arc<Mutex<Vec<String>>>,
    }

    impl Default for MockUserInteraction {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockUserInteraction {
        pub fn new() -> Self {
            Self {
                text_responses: Mutex::new(Vec::new()),
                choice_responses: Mutex::new(Vec::new()),
                messages: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn add_text_response(&self, response: impl Into<String>) {
            self.text_responses.lock().unwrap().push(response.into());
        }

        pub fn add_choice_response(&self, index: usize) {
            self.choice_responses.lock().unwrap().push(index);
        }

        pub fn get_messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }

        fn record(&self, message: String) {
            self.messages.lock().unwrap().push(message);
        }

        fn next<T>(queue: &Mutex<Vec<T>>) -> Result<T> {
            let mut queue = queue.lock().unwrap();
            if queue.is_empty() {
                anyhow::bail!("No mock response configured");
            }
            Ok(queue.remove(0))
        }
    }

    #[async_trait]
    impl UserInteraction for MockUserInteraction {
        async fn prompt_text(&self, message: &str, _default: Option<&str>) -> Result<String> {
            self.record(format!("TEXT: {message}"));
            Self::next(&self.text_responses)
        }

        async fn prompt_choice(&self, message: &str, choices: &[String]) -> Result<usize> {
            self.record(format!("CHOICE: {message} [{}]", choices.join(" | ")));
            let index = Self::next(&self.choice_responses)?;
            if index >= choices.len() {
                anyhow::bail!("Mock choice {index} out of range");
            }
            Ok(index)
        }

        fn display_info(&self, message: &str) {
            self.record(format!("INFO: {message}"));
        }

        fn display_warning(&self, message: &str) {
            self.record(format!("WARN: {message}"));
        }

        fn display_error(&self, message: &str) {
            self.record(format!("ERROR: {message}"));
        }

        fn display_line(&self, message: &str) {
            self.record(format!("LINE: {message}"));
        }

        fn start_spinner(&self, message: &str) -> Box<dyn SpinnerHandle> {
            self.record(format!("SPINNER: {message}"));
            Box::new(MockSpinnerHandle {
                messages: Arc::clone(&self.messages),
            })
        }
    }

    /// Records how the spinner finished into the owning mock's messages
    pub struct MockSpinnerHandle {
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl SpinnerHandle for MockSpinnerHandle {
        fn success(&mut self, message: &str) {
            self.messages
                .lock()
                .unwrap()
                .push(format!("SPINNER DONE: {message}"));
        }

        fn fail(&mut self, message: &str) {
            self.messages
                .lock()
                .unwrap()
                .push(format!("SPINNER FAILED: {message}"));
        }
    }
}
