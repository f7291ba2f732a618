//! Confirmation prompts shown to the operator.
//!
//! A prompt carries a message and one to three labelled actions. The
//! [`Confirmer`] answers with the index of the chosen action, or `None` when
//! the prompt was dismissed.

use async_trait::async_trait;
use finishline_engine::Bib;
use std::collections::VecDeque;
use std::sync::Mutex;

pub const MAX_ACTIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    title: String,
    message: String,
    actions: Vec<String>,
}

impl Prompt {
    /// `None` unless there are between one and three actions.
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        actions: Vec<String>,
    ) -> Option<Self> {
        if actions.is_empty() || actions.len() > MAX_ACTIONS {
            return None;
        }
        Some(Self {
            title: title.into(),
            message: message.into(),
            actions,
        })
    }

    // Fixed prompts below always have a valid action count.
    fn fixed(title: &str, message: String, actions: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            message,
            actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// First step of delete-all. Action 0 continues.
    pub fn delete_all() -> Self {
        Self::fixed(
            "Delete all results?",
            "Every bib and finish time for this event will be removed.".to_string(),
            &["Continue", "Cancel"],
        )
    }

    /// Second step of delete-all. Action 0 deletes.
    pub fn confirm_delete_all() -> Self {
        Self::fixed(
            "Confirm delete",
            "This cannot be undone.".to_string(),
            &["Delete", "Cancel"],
        )
    }

    /// Action 0 keeps cloud values, 1 keeps local values, 2 resolves one at
    /// a time.
    pub fn batch_resolution(conflicts: usize) -> Self {
        Self::fixed(
            "Resolve conflicts",
            format!("{conflicts} places have different bibs on this device and in the cloud."),
            &["Use cloud values", "Use local values", "Resolve individually"],
        )
    }

    /// Action 0 keeps `bib_num`, 1 keeps `checker_bib`.
    pub fn conflict_choice(place: usize, bib_num: &Bib, checker_bib: &Bib) -> Self {
        Self {
            title: format!("Place {place}"),
            message: "Which bib finished in this place?".to_string(),
            actions: vec![format!("Bib {bib_num}"), format!("Bib {checker_bib}")],
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }
}

#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Show `prompt` and wait for an answer.
    async fn confirm(&self, prompt: &Prompt) -> Option<usize>;
}

/// Answers prompts from a fixed script and remembers what it was shown.
///
/// Once the script runs out every prompt is dismissed.
#[derive(Debug, Default)]
pub struct ScriptedConfirmer {
    answers: Mutex<VecDeque<Option<usize>>>,
    shown: Mutex<Vec<Prompt>>,
}

impl ScriptedConfirmer {
    pub fn new(answers: impl IntoIterator<Item = Option<usize>>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            shown: Mutex::default(),
        }
    }

    pub fn shown(&self) -> Vec<Prompt> {
        self.shown
            .lock()
            .map(|shown| shown.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, prompt: &Prompt) -> Option<usize> {
        if let Ok(mut shown) = self.shown.lock() {
            shown.push(prompt.clone());
        }
        let answer = self
            .answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .flatten();
        answer.filter(|index| *index < prompt.actions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_count_is_bounded() {
        assert!(Prompt::new("t", "m", vec![]).is_none());
        assert!(Prompt::new("t", "m", vec!["a".into(); 4]).is_none());
        assert_eq!(
            Prompt::new("t", "m", vec!["a".into(), "b".into()])
                .unwrap()
                .actions()
                .len(),
            2
        );
    }

    #[test]
    fn conflict_choice_labels_both_bibs() {
        let prompt = Prompt::conflict_choice(3, &Bib::Number(101), &Bib::Number(205));
        assert_eq!(prompt.title(), "Place 3");
        assert_eq!(prompt.actions(), &["Bib 101".to_string(), "Bib 205".to_string()]);
    }

    #[tokio::test]
    async fn scripted_answers_then_dismiss() {
        let confirmer = ScriptedConfirmer::new([Some(1), Some(7)]);
        assert_eq!(confirmer.confirm(&Prompt::delete_all()).await, Some(1));
        // out of range for a two-action prompt
        assert_eq!(confirmer.confirm(&Prompt::delete_all()).await, None);
        assert_eq!(confirmer.confirm(&Prompt::delete_all()).await, None);
        assert_eq!(confirmer.shown().len(), 3);
    }
}
