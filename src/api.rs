//! Typed surface of the CyberGuard backend HTTP API.
//!
//! Field names follow the backend's wire format exactly; anything the
//! backend may omit carries a serde default so a partial payload never
//! sinks a whole response.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

use crate::{AppError, CaseId, ErrorKind, DEFAULT_BASE_URL};

/// Builds fully-qualified backend URLs. Path segments and query pairs are
/// percent-encoded by the `url` crate, which matters for task labels used
/// verbatim as path segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base: &str) -> Result<Self, AppError> {
        let base = Url::parse(base).map_err(|e| {
            AppError::new(ErrorKind::Validation, format!("invalid base URL: {e}"))
                .with_context("base_url", base)
        })?;
        if base.cannot_be_a_base() {
            return Err(AppError::new(
                ErrorKind::Validation,
                "base URL cannot carry path segments",
            ));
        }
        Ok(Self { base })
    }

    #[must_use]
    pub fn base(&self) -> &str {
        self.base.as_str()
    }

    fn at(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut parts) = url.path_segments_mut() {
            parts.pop_if_empty();
            for segment in segments {
                parts.push(segment);
            }
        }
        url
    }

    #[must_use]
    pub fn analyze_message(&self) -> String {
        self.at(&["analyze-message"]).into()
    }

    #[must_use]
    pub fn resolve_incident(&self) -> String {
        self.at(&["resolve-incident"]).into()
    }

    #[must_use]
    pub fn case_doubt(&self) -> String {
        self.at(&["case", "doubt"]).into()
    }

    #[must_use]
    pub fn case_form_assist(&self) -> String {
        self.at(&["case", "form-assist"]).into()
    }

    #[must_use]
    pub fn cases(&self) -> String {
        self.at(&["cases"]).into()
    }

    #[must_use]
    pub fn create_case(&self, title: &str, summary: &str) -> String {
        let mut url = self.at(&["cases"]);
        url.query_pairs_mut()
            .append_pair("title", title)
            .append_pair("summary", summary);
        url.into()
    }

    #[must_use]
    pub fn case(&self, id: &CaseId) -> String {
        self.at(&["cases", id.as_str()]).into()
    }

    #[must_use]
    pub fn case_chat(&self, id: &CaseId) -> String {
        self.at(&["cases", id.as_str(), "chat"]).into()
    }

    #[must_use]
    pub fn case_task(&self, id: &CaseId, label: &str, status: TaskStatus) -> String {
        let mut url = self.at(&["cases", id.as_str(), "tasks", label]);
        url.query_pairs_mut().append_pair("status", status.as_str());
        url.into()
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            base: Url::parse(DEFAULT_BASE_URL).expect("default base URL parses"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl TaskStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Blocked => "blocked",
        }
    }

    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Status a user toggle moves a task to: completed flips back to
    /// pending, everything else counts as done.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Completed => Self::Pending,
            _ => Self::Completed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Link,
    Call,
    Info,
}

/// A remediation task. `label` is the natural key; the backend assigns no
/// surrogate identifier the client can rely on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskItem {
    pub label: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub action_link: Option<String>,
    #[serde(default)]
    pub action_type: Option<ActionType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDetails {
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub incident_summary: Option<String>,
    #[serde(default)]
    pub attack_type: Option<String>,
    #[serde(default)]
    pub incident_logic: Option<String>,
    #[serde(default)]
    pub prevention_tips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub incident_summary: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub updated_at: String,
}

/// `GET /cases/{id}` response: the case, its transcript, and its tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSnapshot {
    pub case: CaseDetails,
    #[serde(default)]
    pub history: Vec<Message>,
    #[serde(default)]
    pub tasks: Vec<TaskItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCaseResponse {
    pub case_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

/// `POST /cases/{id}/chat` response. `tasks` and `case_details`, when
/// present, replace the client projections wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(default)]
    pub tasks: Option<Vec<TaskItem>>,
    #[serde(default)]
    pub case_details: Option<CaseDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoutReport {
    pub risk_score: u8,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default)]
    pub detected_patterns: Vec<String>,
    #[serde(default)]
    pub extracted_entities: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub scam_logic: Option<String>,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub consequences: Option<String>,
    pub recommendation: String,
}

impl ScoutReport {
    /// Older backend builds report the mechanism under `analysis` instead
    /// of `scam_logic`; either satisfies the contract.
    #[must_use]
    pub fn mechanism(&self) -> Option<&str> {
        self.scam_logic.as_deref().or(self.analysis.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub simple_explanation: String,
    #[serde(default)]
    pub trust_score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub blocking_instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScamAnalysisResult {
    pub scout_report: ScoutReport,
    #[serde(default)]
    pub explanation: Option<Explanation>,
    #[serde(default)]
    pub action_plan: Option<ActionPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRequest {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_context: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentDimensions {
    #[serde(default)]
    pub asset_affected: Vec<String>,
    pub attack_type: String,
    #[serde(default)]
    pub control_authority: Vec<String>,
    #[serde(default)]
    pub urgency: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub prevention_tips: Vec<String>,
    #[serde(default)]
    pub incident_logic: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionStep {
    #[serde(default)]
    pub step_id: String,
    #[serde(default)]
    pub phase: String,
    pub action: String,
    pub description: String,
    #[serde(default)]
    pub authority_involved: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionStrategy {
    #[serde(default)]
    pub lifecycle_plan: Vec<ResolutionStep>,
    #[serde(default)]
    pub estimated_timeline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorityContact {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub contact_info: BTreeMap<String, String>,
    #[serde(default)]
    pub required_documents: Vec<String>,
}

/// Server-owned state of one resolution session. The identity
/// (`incident_id`) is immutable once issued; the client never mutates the
/// plan, only reads it for guide display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseState {
    pub incident_id: String,
    pub dimensions: IncidentDimensions,
    pub strategy: ResolutionStrategy,
    #[serde(default)]
    pub authorities: Vec<AuthorityContact>,
    #[serde(default)]
    pub current_step_index: usize,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoubtRequest {
    pub incident_id: String,
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoubtResponse {
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormAssistRequest {
    pub incident_id: String,
    pub action_item: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormAssistResponse {
    pub guidance: String,
    #[serde(default)]
    pub checklist: Vec<String>,
}
