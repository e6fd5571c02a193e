//! Step and prompt-type enums
//!
//! The remote diagnosis service drives the conversation through a fixed set
//! of steps and asks for input through a fixed set of prompt types. Both are
//! closed enums here so that every branch on them is checked exhaustively:
//! - `Step`: where the server-side flow currently is
//! - `PromptType`: which kind of input the latest prompt asks for

use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-declared conversation step
///
/// Expected forward order is `VehicleId → PhotoConfirm → FreeText →
/// (SpecCheck →) Diagnosing → UrgencyCheck → Reservation → BookingInfo →
/// BookingConfirm → Done`. The order is not enforced client-side; the
/// service is authoritative and may jump straight to `Reservation` or from
/// `Diagnosing` to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Vehicle identification (initial step)
    #[default]
    VehicleId,
    /// Confirm the identified vehicle from its photo
    PhotoConfirm,
    /// Free description of the symptom
    FreeText,
    /// The symptom may be normal behaviour described in the manual
    SpecCheck,
    /// Multi-turn diagnostic questioning
    Diagnosing,
    /// Urgency assessment
    UrgencyCheck,
    /// Offer to book a visit or dispatch
    Reservation,
    /// Collect booking details
    BookingInfo,
    /// Confirm booking details
    BookingConfirm,
    /// Conversation finished
    Done,
    /// Server-side session timed out
    Expired,
}

impl Step {
    /// Wire name of the step
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VehicleId => "vehicle_id",
            Self::PhotoConfirm => "photo_confirm",
            Self::FreeText => "free_text",
            Self::SpecCheck => "spec_check",
            Self::Diagnosing => "diagnosing",
            Self::UrgencyCheck => "urgency_check",
            Self::Reservation => "reservation",
            Self::BookingInfo => "booking_info",
            Self::BookingConfirm => "booking_confirm",
            Self::Done => "done",
            Self::Expired => "expired",
        }
    }

    /// Terminal steps only offer a "start new session" trigger
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done | Self::Expired)
    }

    /// Whether diagnostic turn numbers are meaningful at this step
    pub fn is_diagnosing(&self) -> bool {
        matches!(self, Self::Diagnosing)
    }

    /// Whether free text typed at this step goes through the input guard
    pub fn is_guarded(&self) -> bool {
        matches!(self, Self::Diagnosing | Self::FreeText)
    }

    /// Operator-facing label shown in the step indicator
    pub fn label(&self) -> &'static str {
        match self {
            Self::VehicleId => "車両選択",
            Self::PhotoConfirm => "車両確認",
            Self::FreeText => "症状入力",
            Self::SpecCheck => "仕様確認",
            Self::Diagnosing => "問診中",
            Self::UrgencyCheck => "緊急度判定",
            Self::Reservation => "予約確認",
            Self::BookingInfo => "予約情報入力",
            Self::BookingConfirm => "予約内容確認",
            Self::Done => "完了",
            Self::Expired => "期限切れ",
        }
    }

    /// Colored tag for the interactive prompt
    pub fn colored_tag(&self) -> String {
        let label = self.label();
        match self {
            Self::Diagnosing | Self::SpecCheck => format!("[{}]", label.cyan()),
            Self::UrgencyCheck | Self::Reservation => format!("[{}]", label.yellow()),
            Self::BookingInfo | Self::BookingConfirm => format!("[{}]", label.purple()),
            Self::Done => format!("[{}]", label.green()),
            Self::Expired => format!("[{}]", label.red()),
            Self::VehicleId | Self::PhotoConfirm | Self::FreeText => {
                format!("[{}]", label.blue())
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of input requested by the latest prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PromptType {
    /// Free text answer
    #[default]
    Text,
    /// Pick one of a short list of choices
    SingleChoice,
    /// Pick the closest cause from a grid of candidates
    DiagnosisCandidates,
    /// Search the vehicle catalogue
    VehicleSearch,
    /// Confirm the vehicle photo
    PhotoConfirm,
    /// Decide whether to book
    ReservationChoice,
    /// Fill in booking details
    BookingForm,
    /// Confirm booking details
    BookingConfirm,
}

impl PromptType {
    /// Wire name of the prompt type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::SingleChoice => "single_choice",
            Self::DiagnosisCandidates => "diagnosis_candidates",
            Self::VehicleSearch => "vehicle_search",
            Self::PhotoConfirm => "photo_confirm",
            Self::ReservationChoice => "reservation_choice",
            Self::BookingForm => "booking_form",
            Self::BookingConfirm => "booking_confirm",
        }
    }
}

impl fmt::Display for PromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Named action forwarded to the diagnosis service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Vehicle picked from search results
    SelectVehicle,
    /// Plain confirmation of a choice (photo, spec check, generic choices)
    Confirm,
    /// Whether a proposed answer resolved the problem
    Resolved,
    /// Whether to book a visit or dispatch
    ReservationChoice,
    /// Booking form values as a JSON object
    SubmitBooking,
    /// Final confirmation of booking details
    BookingConfirm,
}

impl Action {
    /// Wire name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelectVehicle => "select_vehicle",
            Self::Confirm => "confirm",
            Self::Resolved => "resolved",
            Self::ReservationChoice => "reservation_choice",
            Self::SubmitBooking => "submit_booking",
            Self::BookingConfirm => "booking_confirm",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
