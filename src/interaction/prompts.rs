//! Terminal prompting

use anyhow::Result;
use async_trait::async_trait;
use std::io::{self, Write};

#[async_trait]
pub trait UserPrompter: Send + Sync {
    /// Prompt for text input
    async fn prompt_text(&self, message: &str, default: Option<&str>) -> Result<String>;

    /// Prompt for a numbered choice, returning its zero-based index
    async fn prompt_choice(&self, message: &str, choices: &[String]) -> Result<usize>;
}

/// Prompter reading from stdin
pub struct UserPrompterImpl;

impl Default for UserPrompterImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl UserPrompterImpl {
    pub fn new() -> Self {
        Self
    }

    fn read_line() -> Result<String> {
        let mut input = String::new();
        let read = io::stdin().read_line(&mut input)?;
        if read == 0 {
            anyhow::bail!("Input closed");
        }
        Ok(input.trim().to_string())
    }

    /// Parse a 1-based choice; `None` when out of range or not a number
    pub fn validate_choice_input(input: &str, num_choices: usize) -> Option<usize> {
        if num_choices == 0 {
            return None;
        }
        input
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=num_choices).contains(n))
            .map(|n| n - 1)
    }

    pub fn format_choice_prompt(message: &str, choices: &[String]) -> String {
        let mut output = String::new();
        output.push_str(message);
        output.push('\n');
        for (i, choice) in choices.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", i + 1, choice));
        }
        output
    }

    pub fn format_choice_input_prompt(num_choices: usize) -> String {
        format!("Enter choice (1-{num_choices}): ")
    }

    pub fn format_invalid_choice_message(num_choices: usize) -> String {
        format!("Invalid choice. Please enter a number between 1 and {num_choices}: ")
    }
}

#[async_trait]
impl UserPrompter for UserPrompterImpl {
    async fn prompt_text(&self, message: &str, default: Option<&str>) -> Result<String> {
        match default {
            Some(d) => print!("{message} [{d}]: "),
            None => print!("{message}: "),
        }
        io::stdout().flush()?;

        let input = Self::read_line()?;
        match default {
            Some(d) if input.is_empty() => Ok(d.to_string()),
            _ => Ok(input),
        }
    }

    async fn prompt_choice(&self, message: &str, choices: &[String]) -> Result<usize> {
        if choices.is_empty() {
            anyhow::bail!("No choices provided");
        }

        print!("{}", Self::format_choice_prompt(message, choices));
        print!("{}", Self::format_choice_input_prompt(choices.len()));
        io::stdout().flush()?;

        loop {
            let input = Self::read_line()?;
            if let Some(index) = Self::validate_choice_input(&input, choices.len()) {
                return Ok(index);
            }
            print!("{}", Self::format_invalid_choice_message(choices.len()));
            io::stdout().flush()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_choice_input() {
        assert_eq!(UserPrompterImpl::validate_choice_input("1", 3), Some(0));
        assert_eq!(UserPrompterImpl::validate_choice_input(" 3 ", 3), Some(2));
        assert_eq!(UserPrompterImpl::validate_choice_input("0", 3), None);
        assert_eq!(UserPrompterImpl::validate_choice_input("4", 3), None);
        assert_eq!(UserPrompterImpl::validate_choice_input("two", 3), None);
        assert_eq!(UserPrompterImpl::validate_choice_input("1", 0), None);
    }

    #[test]
    fn test_format_choice_prompt() {
        let choices = vec!["Run step 1".to_string(), "Quit".to_string()];
        let prompt = UserPrompterImpl::format_choice_prompt("Next action", &choices);
        assert_eq!(prompt, "Next action\n  1. Run step 1\n  2. Quit\n");
        assert_eq!(
            UserPrompterImpl::format_choice_input_prompt(2),
            "Enter choice (1-2): "
        );
    }
}
