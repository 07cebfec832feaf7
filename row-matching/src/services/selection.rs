//! Selection state machine for a single match dialog.
//!
//! Transitions are a pure function of the current state and an event.
//! Events that make no sense in the current state leave it untouched, which
//! is how disabled buttons behave.

use crate::models::CandidateOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Browsing,
    Confirming,
    Closed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browsing => "browsing",
            Self::Confirming => "confirming",
            Self::Closed => "closed",
        }
    }
}

/// The button offered next to Cancel while browsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryAction {
    /// Go to the confirmation form (pending candidate).
    Next,
    /// Link the row straight away (already settled candidate).
    Save,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    Select(CandidateOrder),
    Next,
    Back,
    SubmitStarted,
    SubmitSucceeded,
    SubmitFailed,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    stage: Stage,
    selected: Option<CandidateOrder>,
    is_submitting: bool,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionState {
    pub fn new() -> Self {
        Self {
            stage: Stage::Browsing,
            selected: None,
            is_submitting: false,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn selected(&self) -> Option<&CandidateOrder> {
        self.selected.as_ref()
    }

    pub fn is_confirming(&self) -> bool {
        self.stage == Stage::Confirming
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn is_closed(&self) -> bool {
        self.stage == Stage::Closed
    }

    /// `None` until something is selected.
    pub fn primary_action(&self) -> Option<PrimaryAction> {
        self.selected.as_ref().map(|order| {
            if order.requires_confirmation() {
                PrimaryAction::Next
            } else {
                PrimaryAction::Save
            }
        })
    }

    pub fn can_advance(&self) -> bool {
        self.stage == Stage::Browsing
            && !self.is_submitting
            && self.primary_action() == Some(PrimaryAction::Next)
    }

    pub fn can_save(&self) -> bool {
        self.stage == Stage::Browsing
            && !self.is_submitting
            && self.primary_action() == Some(PrimaryAction::Save)
    }

    fn can_start_submit(&self) -> bool {
        if self.is_submitting {
            return false;
        }
        match self.stage {
            Stage::Confirming => true,
            Stage::Browsing => self.primary_action() == Some(PrimaryAction::Save),
            Stage::Closed => false,
        }
    }

    pub fn apply(self, event: SelectionEvent) -> SelectionState {
        if self.stage == Stage::Closed {
            return self;
        }

        match event {
            SelectionEvent::Select(order) if self.stage == Stage::Browsing && !self.is_submitting => {
                SelectionState {
                    selected: Some(order),
                    ..self
                }
            }
            SelectionEvent::Next if self.can_advance() => SelectionState {
                stage: Stage::Confirming,
                ..self
            },
            SelectionEvent::Back if self.stage == Stage::Confirming && !self.is_submitting => {
                SelectionState {
                    stage: Stage::Browsing,
                    ..self
                }
            }
            SelectionEvent::SubmitStarted if self.can_start_submit() => SelectionState {
                is_submitting: true,
                ..self
            },
            SelectionEvent::SubmitSucceeded if self.is_submitting => SelectionState {
                stage: Stage::Closed,
                is_submitting: false,
                ..self
            },
            SelectionEvent::SubmitFailed if self.is_submitting => SelectionState {
                is_submitting: false,
                ..self
            },
            SelectionEvent::Cancel => SelectionState {
                stage: Stage::Closed,
                is_submitting: false,
                ..self
            },
            _ => self,
        }
    }
}
