//! Prompt dispatcher
//!
//! Maps the current step and the latest prompt to the single interactive
//! affordance a front end should mount, and defines what selecting one of
//! its choices dispatches. Everything here is pure; executing a `Dispatch`
//! is the controller's job.

use crate::labels;
use crate::service::{BookingField, BookingType, Choice, Prompt};
use crate::step::{Action, PromptType, Step};

/// Choice value that switches to the free text affordance instead of dispatching
pub const FREE_INPUT_VALUE: &str = "free_input";

/// Values of the diagnosing single-choice prompt that settle the diagnosis
const RESOLUTION_VALUES: &[&str] = &["yes", "no", "book"];

/// What a selection asks the controller to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Forward a named action; `label` becomes the optimistic user turn
    Action {
        action: Action,
        value: String,
        label: Option<String>,
    },
    /// Forward free text as if the operator had typed it
    Message(String),
    /// Move focus to the text affordance without dispatching
    FocusText,
}

/// How a choice-derived affordance turns a selection into a `Dispatch`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Plain `confirm` action
    Confirm,
    /// Diagnosing single choice: resolution values become `resolved`,
    /// anything else is an open answer sent as text
    Hybrid,
    /// Candidate grid: the label is sent as text
    Candidate,
    /// `reservation_choice` action
    Reservation,
    /// `booking_confirm` action
    BookingConfirm,
}

impl SelectionMode {
    /// Dispatch produced by selecting `choice`
    ///
    /// # Examples
    ///
    /// ```
    /// use diagchat::dispatcher::{Dispatch, SelectionMode};
    /// use diagchat::service::Choice;
    /// use diagchat::step::Action;
    ///
    /// let yes = SelectionMode::Hybrid.select(&Choice::new("yes", "はい、解決しました"));
    /// assert_eq!(
    ///     yes,
    ///     Dispatch::Action {
    ///         action: Action::Resolved,
    ///         value: "yes".to_string(),
    ///         label: Some("はい、解決しました".to_string()),
    ///     }
    /// );
    ///
    /// let open = SelectionMode::Hybrid.select(&Choice::new("音が鳴る", "音が鳴る"));
    /// assert_eq!(open, Dispatch::Message("音が鳴る".to_string()));
    /// ```
    pub fn select(&self, choice: &Choice) -> Dispatch {
        if choice.value == FREE_INPUT_VALUE {
            return Dispatch::FocusText;
        }

        match self {
            Self::Confirm => action(Action::Confirm, choice),
            Self::Reservation => action(Action::ReservationChoice, choice),
            Self::BookingConfirm => action(Action::BookingConfirm, choice),
            Self::Hybrid => {
                if RESOLUTION_VALUES.contains(&choice.value.as_str()) {
                    action(Action::Resolved, choice)
                } else {
                    Dispatch::Message(choice.label.clone())
                }
            }
            Self::Candidate => Dispatch::Message(choice.label.clone()),
        }
    }
}

fn action(action: Action, choice: &Choice) -> Dispatch {
    Dispatch::Action {
        action,
        value: choice.value.clone(),
        label: Some(choice.label.clone()),
    }
}

/// Interactive control for the active prompt
#[derive(Debug, Clone, PartialEq)]
pub enum Affordance {
    /// Nothing to interact with yet (no prompt, or a text prompt outside the
    /// steps that accept free text)
    Idle,
    /// Session finished; only a fresh start is offered
    NewSession,
    /// Suspicious input held back, waiting for "rewrite" or "send anyway"
    GuardConfirm { text: String },
    /// Vehicle lookup box
    VehicleSearch,
    /// Vehicle photo with confirmation choices
    PhotoConfirm {
        photo_url: Option<String>,
        choices: Vec<Choice>,
    },
    /// List of choices with the given selection semantics
    Choices {
        choices: Vec<Choice>,
        mode: SelectionMode,
    },
    /// Grid of candidate causes; always paired with a free input switch
    CandidateGrid { choices: Vec<Choice> },
    /// Booking details form, submitted as `submit_booking`
    BookingForm {
        fields: Vec<BookingField>,
        booking_type: BookingType,
    },
    /// Free text box
    TextInput,
}

impl Affordance {
    /// Choices shown by this affordance, empty for non-choice affordances
    pub fn choices(&self) -> &[Choice] {
        match self {
            Self::PhotoConfirm { choices, .. }
            | Self::Choices { choices, .. }
            | Self::CandidateGrid { choices } => choices,
            Self::Idle
            | Self::NewSession
            | Self::GuardConfirm { .. }
            | Self::VehicleSearch
            | Self::BookingForm { .. }
            | Self::TextInput => &[],
        }
    }

    /// Selection semantics of a choice-derived affordance
    pub fn selection_mode(&self) -> Option<SelectionMode> {
        match self {
            Self::PhotoConfirm { .. } => Some(SelectionMode::Confirm),
            Self::Choices { mode, .. } => Some(*mode),
            Self::CandidateGrid { .. } => Some(SelectionMode::Candidate),
            Self::Idle
            | Self::NewSession
            | Self::GuardConfirm { .. }
            | Self::VehicleSearch
            | Self::BookingForm { .. }
            | Self::TextInput => None,
        }
    }

    /// Dispatch for the choice at `index`, if this affordance has one there
    pub fn select(&self, index: usize) -> Option<Dispatch> {
        let mode = self.selection_mode()?;
        self.choices().get(index).map(|choice| mode.select(choice))
    }

    /// Whether a "switch to free input" trigger accompanies this affordance
    pub fn offers_free_input(&self) -> bool {
        matches!(self, Self::CandidateGrid { .. })
    }
}

/// Everything a front end needs to render the interactive area
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    /// The one live affordance
    pub affordance: Affordance,
    /// Whether the persistent text affordance is mounted
    pub text_input: bool,
    /// Whether dispatch-capable controls are disabled (an exchange is in flight)
    pub disabled: bool,
    /// One-line contextual tip for the shown choices
    pub hint: Option<&'static str>,
}

/// Inputs of the dispatcher decision table
#[derive(Debug, Clone, Copy)]
pub struct DispatchContext<'a> {
    pub step: Step,
    pub prompt: Option<&'a Prompt>,
    pub loading: bool,
    pub pending: Option<&'a str>,
}

/// Whether the persistent text affordance is mounted
///
/// Mounted for a text prompt during `free_text`, and always during
/// `diagnosing` so the operator can switch to free text mid-flow.
pub fn text_input_mounted(step: Step, prompt: Option<&Prompt>) -> bool {
    match step {
        Step::Diagnosing => true,
        Step::FreeText => prompt.map_or(false, |p| p.kind == PromptType::Text),
        Step::VehicleId
        | Step::PhotoConfirm
        | Step::SpecCheck
        | Step::UrgencyCheck
        | Step::Reservation
        | Step::BookingInfo
        | Step::BookingConfirm
        | Step::Done
        | Step::Expired => false,
    }
}

/// Compute the panel for the given context
///
/// # Examples
///
/// ```
/// use diagchat::dispatcher::{dispatch, Affordance, DispatchContext};
/// use diagchat::step::Step;
///
/// let panel = dispatch(DispatchContext {
///     step: Step::Done,
///     prompt: None,
///     loading: false,
///     pending: None,
/// });
/// assert_eq!(panel.affordance, Affordance::NewSession);
/// assert!(!panel.text_input);
/// ```
pub fn dispatch(ctx: DispatchContext<'_>) -> Panel {
    if ctx.step.is_done() {
        return Panel {
            affordance: Affordance::NewSession,
            text_input: false,
            disabled: ctx.loading,
            hint: None,
        };
    }

    let text_input = text_input_mounted(ctx.step, ctx.prompt);

    let affordance = match (ctx.pending, ctx.prompt) {
        (Some(text), _) => Affordance::GuardConfirm {
            text: text.to_string(),
        },
        (None, None) => Affordance::Idle,
        (None, Some(prompt)) => prompt_affordance(ctx.step, prompt, text_input),
    };

    let hint = match &affordance {
        Affordance::GuardConfirm { .. } => None,
        other => labels::get_hint(other.choices()),
    };

    Panel {
        affordance,
        text_input,
        disabled: ctx.loading,
        hint,
    }
}

fn prompt_affordance(step: Step, prompt: &Prompt, text_input: bool) -> Affordance {
    let choices = labels::presented_choices(prompt);
    let fallback = if text_input {
        Affordance::TextInput
    } else {
        Affordance::Idle
    };

    match prompt.kind {
        PromptType::Text => fallback,
        PromptType::VehicleSearch => Affordance::VehicleSearch,
        PromptType::BookingForm => match &prompt.booking_fields {
            Some(fields) if !fields.is_empty() => Affordance::BookingForm {
                fields: fields.clone(),
                booking_type: prompt.booking_type.unwrap_or_default(),
            },
            _ => fallback,
        },
        _ if choices.is_empty() => fallback,
        PromptType::PhotoConfirm => Affordance::PhotoConfirm {
            photo_url: prompt.photo_url.clone(),
            choices,
        },
        PromptType::SingleChoice => Affordance::Choices {
            choices,
            mode: single_choice_mode(step),
        },
        PromptType::DiagnosisCandidates => Affordance::CandidateGrid { choices },
        PromptType::ReservationChoice => Affordance::Choices {
            choices,
            mode: SelectionMode::Reservation,
        },
        PromptType::BookingConfirm => Affordance::Choices {
            choices,
            mode: SelectionMode::BookingConfirm,
        },
    }
}

fn single_choice_mode(step: Step) -> SelectionMode {
    match step {
        Step::Diagnosing => SelectionMode::Hybrid,
        Step::SpecCheck
        | Step::VehicleId
        | Step::PhotoConfirm
        | Step::FreeText
        | Step::UrgencyCheck
        | Step::Reservation
        | Step::BookingInfo
        | Step::BookingConfirm
        | Step::Done
        | Step::Expired => SelectionMode::Confirm,
    }
}
