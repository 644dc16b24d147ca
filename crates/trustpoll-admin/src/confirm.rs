//! Operator confirmation for destructive or state-flipping commands.

use std::sync::Mutex;
use trustpoll_client::Subject;

/// Asks the operator to approve an action. Blocks until answered.
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Approves everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirmer for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Declines everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysDecline;

impl Confirmer for AlwaysDecline {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

/// Gives a fixed answer and remembers every prompt it was shown.
#[derive(Debug, Default)]
pub struct RecordingConfirmer {
    answer: bool,
    prompts: Mutex<Vec<String>>,
}

impl RecordingConfirmer {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Confirmer for RecordingConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(prompt.to_string());
        self.answer
    }
}

/// An action that needs approval, and how it is worded to the operator.
#[derive(Debug, Clone, Copy)]
pub enum ConfirmAction<'a> {
    DeleteCandidate { name: &'a str },
    PublishResults { publish: bool },
    BlockSubject { subject: &'a Subject, minutes: u32 },
}

impl ConfirmAction<'_> {
    pub fn prompt(&self) -> String {
        match self {
            ConfirmAction::DeleteCandidate { name } => {
                format!("Delete candidate \"{name}\"? This cannot be undone.")
            }
            ConfirmAction::PublishResults { publish } => format!(
                "Are you sure you want to {} the results?",
                if *publish { "publish" } else { "unpublish" }
            ),
            ConfirmAction::BlockSubject { subject, minutes } => {
                format!("Block {subject} for {minutes} minutes?")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts() {
        assert_eq!(
            ConfirmAction::DeleteCandidate { name: "Aria Shah" }.prompt(),
            "Delete candidate \"Aria Shah\"? This cannot be undone."
        );
        assert_eq!(
            ConfirmAction::PublishResults { publish: false }.prompt(),
            "Are you sure you want to unpublish the results?"
        );

        let subject = Subject::email("student@vit.edu");
        assert_eq!(
            ConfirmAction::BlockSubject {
                subject: &subject,
                minutes: 30
            }
            .prompt(),
            "Block student@vit.edu for 30 minutes?"
        );
    }

    #[test]
    fn test_recording_confirmer() {
        let confirmer = RecordingConfirmer::new(false);
        assert!(!confirmer.confirm("first?"));
        assert!(!confirmer.confirm("second?"));
        assert_eq!(confirmer.prompts(), vec!["first?", "second?"]);

        assert!(AlwaysConfirm.confirm("anything"));
        assert!(!AlwaysDecline.confirm("anything"));
    }
}
