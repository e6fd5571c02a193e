//! Base types and trait for the remote diagnosis service
//!
//! This module defines the wire model of one exchange with the diagnosis
//! service, the data carried in its responses, and the `DiagnosisService`
//! trait the conversation controller talks to.

use crate::error::Result;
use crate::step::{Action, PromptType, Step};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One selectable option of a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Value forwarded to the service
    pub value: String,
    /// Text shown to the operator
    pub label: String,
    /// Optional icon url
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Choice {
    /// Creates a choice without an icon
    ///
    /// # Examples
    ///
    /// ```
    /// use diagchat::service::Choice;
    ///
    /// let choice = Choice::new("yes", "はい、解決しました");
    /// assert_eq!(choice.value, "yes");
    /// assert!(choice.icon.is_none());
    /// ```
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            icon: None,
        }
    }
}

/// Booking flavour requested by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingType {
    /// Mechanic sent to the vehicle
    Dispatch,
    /// Operator visits the dealer
    #[default]
    Visit,
}

/// Descriptor of one booking form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingField {
    /// Key of the value in the submitted object
    pub name: String,
    /// Text shown to the operator
    pub label: String,
    /// Input kind ("text", "tel")
    #[serde(rename = "type", default = "default_field_kind")]
    pub kind: String,
    /// Whether a blank value is refused
    #[serde(default)]
    pub required: bool,
}

fn default_field_kind() -> String {
    "text".to_string()
}

/// Booking details echoed back for confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BookingSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_date: Option<String>,
}

/// Latest prompt issued by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Prompt {
    /// Kind of input requested
    #[serde(rename = "type", default)]
    pub kind: PromptType,
    /// Assistant message text
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
    #[serde(
        rename = "vehicle_photo_url",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_fields: Option<Vec<BookingField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_type: Option<BookingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_summary: Option<BookingSummary>,
}

impl Prompt {
    /// Creates a prompt of the given kind with a message and no extras
    pub fn new(kind: PromptType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            ..Default::default()
        }
    }

    /// Creates a prompt carrying choices
    pub fn with_choices(kind: PromptType, message: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self {
            kind,
            message: message.into(),
            choices: Some(choices),
            ..Default::default()
        }
    }

    /// Choices of the prompt, empty when none were sent
    pub fn choices(&self) -> &[Choice] {
        self.choices.as_deref().unwrap_or(&[])
    }
}

/// Urgency level assessed by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl UrgencyLevel {
    /// Short operator-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "低",
            Self::Medium => "中",
            Self::High => "高",
            Self::Critical => "緊急",
        }
    }
}

/// How soon the vehicle should be brought in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitUrgency {
    Immediate,
    Today,
    ThisWeek,
    WhenConvenient,
}

impl VisitUrgency {
    /// Operator-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Immediate => "今すぐ来店またはロードサービスを依頼してください",
            Self::Today => "本日中の来店をお勧めします",
            Self::ThisWeek => "今週中の来店をお勧めします",
            Self::WhenConvenient => "ご都合の良い時に来店してください",
        }
    }
}

/// Urgency block attached to a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UrgencyInfo {
    #[serde(default)]
    pub level: UrgencyLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_drive: Option<bool>,
    #[serde(default)]
    pub requires_visit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_urgency: Option<VisitUrgency>,
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// Manual passage cited by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Source {
    pub content: String,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub score: f64,
}

impl Source {
    /// Section name, or the page number when the section is unknown
    pub fn heading(&self) -> String {
        if self.section.is_empty() {
            format!("p.{}", self.page)
        } else {
            self.section.clone()
        }
    }
}

/// How well the owner's manual covers the reported symptom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coverage {
    #[serde(rename = "covered")]
    Full,
    #[serde(rename = "partially_covered")]
    Partial,
    #[serde(rename = "not_covered")]
    None,
}

/// Request body of one exchange
///
/// At most one of `message`, `action` and `rewind_to_turn` is set; none of
/// them set starts a new session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExchangeRequest {
    pub session_id: Option<String>,
    pub message: Option<String>,
    pub action: Option<Action>,
    pub action_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewind_to_turn: Option<u32>,
}

impl ExchangeRequest {
    /// Request that opens a new session
    pub fn start() -> Self {
        Self::default()
    }

    /// Free text message within a session
    pub fn message(session_id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            session_id,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Named action with its payload
    pub fn action(session_id: Option<String>, action: Action, value: impl Into<String>) -> Self {
        Self {
            session_id,
            action: Some(action),
            action_value: Some(value.into()),
            ..Default::default()
        }
    }

    /// Rewind to a diagnostic turn
    pub fn rewind(session_id: Option<String>, turn: u32) -> Self {
        Self {
            session_id,
            rewind_to_turn: Some(turn),
            ..Default::default()
        }
    }
}

/// Response body of one exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeResponse {
    pub session_id: String,
    pub current_step: Step,
    pub prompt: Prompt,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<UrgencyInfo>,
    #[serde(rename = "rag_sources", default)]
    pub citations: Vec<Source>,
    #[serde(
        rename = "manual_coverage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub coverage: Option<Coverage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic_turn: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewound_to_turn: Option<u32>,
}

impl ExchangeResponse {
    /// Minimal response with a prompt and nothing else
    pub fn new(session_id: impl Into<String>, current_step: Step, prompt: Prompt) -> Self {
        Self {
            session_id: session_id.into(),
            current_step,
            prompt,
            urgency: None,
            citations: Vec::new(),
            coverage: None,
            diagnostic_turn: None,
            rewound_to_turn: None,
        }
    }
}

/// Catalogue entry returned by vehicle lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub make: String,
    pub model: String,
    pub year: u32,
    #[serde(default)]
    pub trim: String,
    #[serde(default)]
    pub photo_url: String,
    #[serde(default)]
    pub manual_available: bool,
}

impl Vehicle {
    /// Label used for the optimistic user turn when the vehicle is picked
    ///
    /// # Examples
    ///
    /// ```
    /// use diagchat::service::Vehicle;
    ///
    /// let vehicle = Vehicle {
    ///     id: "prius-2021".to_string(),
    ///     make: "Toyota".to_string(),
    ///     model: "Prius".to_string(),
    ///     year: 2021,
    ///     trim: "S".to_string(),
    ///     photo_url: String::new(),
    ///     manual_available: true,
    /// };
    /// assert_eq!(vehicle.display_name(), "2021年 Toyota Prius S");
    /// ```
    pub fn display_name(&self) -> String {
        format!("{}年 {} {} {}", self.year, self.make, self.model, self.trim)
            .trim_end()
            .to_string()
    }
}

/// Ranked vehicle lookup result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleMatch {
    pub vehicle: Vehicle,
    pub score: f64,
}

/// Reasoning provider known to the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub display_name: String,
    pub is_configured: bool,
    pub is_active: bool,
}

/// Reasoning provider listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderList {
    pub providers: Vec<ProviderInfo>,
    pub active: String,
}

/// Remote diagnosis service
///
/// `exchange` is the only call the conversation controller needs; vehicle
/// lookup and reasoning-provider management are secondary collaborators with
/// default implementations reporting that they are unsupported.
///
/// # Examples
///
/// ```
/// use diagchat::error::Result;
/// use diagchat::service::{DiagnosisService, ExchangeRequest, ExchangeResponse, Prompt};
/// use diagchat::step::{PromptType, Step};
/// use async_trait::async_trait;
///
/// struct Canned;
///
/// #[async_trait]
/// impl DiagnosisService for Canned {
///     async fn exchange(&self, _request: &ExchangeRequest) -> Result<ExchangeResponse> {
///         Ok(ExchangeResponse::new(
///             "s-1",
///             Step::VehicleId,
///             Prompt::new(PromptType::VehicleSearch, "車両を検索してください"),
///         ))
///     }
/// }
/// ```
#[async_trait]
pub trait DiagnosisService: Send + Sync {
    /// Performs one request/response round trip
    ///
    /// # Errors
    ///
    /// Returns error if the transport fails, the service answers with a
    /// non-success status, or the body cannot be decoded
    async fn exchange(&self, request: &ExchangeRequest) -> Result<ExchangeResponse>;

    /// Looks up vehicles matching a free-form query, best match first
    async fn search_vehicles(&self, _query: &str, _limit: usize) -> Result<Vec<VehicleMatch>> {
        Err(crate::error::DiagchatError::Lookup(
            "Vehicle lookup is not supported by this service".to_string(),
        )
        .into())
    }

    /// Lists reasoning providers and the active one
    async fn list_providers(&self) -> Result<ProviderList> {
        Err(crate::error::DiagchatError::Lookup(
            "Provider listing is not supported by this service".to_string(),
        )
        .into())
    }

    /// Makes a reasoning provider the active one
    async fn set_active_provider(&self, _name: &str) -> Result<()> {
        Err(crate::error::DiagchatError::Lookup(
            "Provider activation is not supported by this service".to_string(),
        )
        .into())
    }
}
