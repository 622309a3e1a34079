//! Message display

use super::SpinnerHandle;

/// Trait for displaying progress and messages
pub trait ProgressDisplay: Send + Sync {
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
    /// Plain line without decoration, used for the step board
    fn line(&self, message: &str);
    fn start_spinner(&self, message: &str) -> Box<dyn SpinnerHandle>;
}

/// Display writing to stdout and stderr
pub struct ProgressDisplayImpl;

impl Default for ProgressDisplayImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressDisplayImpl {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressDisplay for ProgressDisplayImpl {
    fn info(&self, message: &str) {
        println!("ℹ️  {message}");
    }

    fn warning(&self, message: &str) {
        eprintln!("⚠️  {message}");
    }

    fn error(&self, message: &str) {
        eprintln!("❌ {message}");
    }

    fn line(&self, message: &str) {
        println!("{message}");
    }

    fn start_spinner(&self, message: &str) -> Box<dyn SpinnerHandle> {
        println!("⏳ {message}");
        Box::new(SimpleSpinnerHandle { active: true })
    }
}

/// Spinner that prints its start and finish lines
struct SimpleSpinnerHandle {
    active: bool,
}

impl SpinnerHandle for SimpleSpinnerHandle {
    fn success(&mut self, message: &str) {
        if std::mem::take(&mut self.active) {
            println!("✅ {message}");
        }
    }

    fn fail(&mut self, message: &str) {
        if std::mem::take(&mut self.active) {
            println!("❌ {message}");
        }
    }
}
