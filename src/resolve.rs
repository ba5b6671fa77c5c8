//! Incident resolution controller.
//!
//! A session is one incident: the first user message initializes it
//! through `/resolve-incident`, every later message is a follow-up
//! question through `/case/doubt`. The session identity never changes
//! once issued; starting over means a fresh model.

use crux_core::render::Render;
use serde::{Deserialize, Serialize};

use crate::api::{
    CaseState, DoubtRequest, DoubtResponse, Endpoints, FormAssistRequest, FormAssistResponse,
    IncidentRequest, ResolutionStep,
};
use crate::capabilities::{Auth, BearerToken, Http, HttpRequest, HttpResult, TokenResult};
use crate::{AppError, IncidentId, CONNECTION_ERROR_REPLY, RESOLVE_GREETING};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    User,
    Assistant,
    FormGuide,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub kind: EntryKind,
    pub content: String,
    /// Only populated on `FormGuide` entries.
    pub checklist: Vec<String>,
}

impl TranscriptEntry {
    fn user(content: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::User,
            content: content.into(),
            checklist: Vec::new(),
        }
    }

    fn assistant(content: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Assistant,
            content: content.into(),
            checklist: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Session {
    #[default]
    Uninitialized,
    Initialized(CaseState),
}

impl Session {
    fn incident_id(&self) -> Option<IncidentId> {
        match self {
            Self::Uninitialized => None,
            Self::Initialized(state) => Some(IncidentId::new(state.incident_id.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    Resolve { description: String },
    Doubt { incident_id: IncidentId, question: String },
    FormAssist { incident_id: IncidentId, action_item: String },
}

impl Intent {
    const fn name(&self) -> &'static str {
        match self {
            Self::Resolve { .. } => "resolve_incident",
            Self::Doubt { .. } => "solve_doubt",
            Self::FormAssist { .. } => "form_assist",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Started,
    DraftChanged(String),
    SendPressed,
    FormAssistRequested { action_item: String },

    TokenReady { intent: Intent, result: TokenResult },
    ResponseReceived { intent: Intent, result: Box<HttpResult> },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::DraftChanged(_) => "draft_changed",
            Self::SendPressed => "send_pressed",
            Self::FormAssistRequested { .. } => "form_assist_requested",
            Self::TokenReady { .. } => "token_ready",
            Self::ResponseReceived { .. } => "response_received",
        }
    }
}

#[derive(Default)]
pub struct Model {
    pub endpoints: Endpoints,
    pub session: Session,
    pub transcript: Vec<TranscriptEntry>,
    pub draft: String,
    pub busy: bool,
    /// "Current priority" panel text, set from the first lifecycle step.
    pub guide: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub initialized: bool,
    pub transcript: Vec<TranscriptEntry>,
    pub draft: String,
    pub busy: bool,
    pub can_send: bool,
    pub guide: Option<String>,
    pub attack_type: Option<String>,
    pub plan: Vec<ResolutionStep>,
    pub estimated_timeline: Option<String>,
}

#[derive(crux_core::macros::Effect)]
#[effect(app = "Resolve")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub auth: Auth<Event>,
}

#[derive(Default)]
pub struct Resolve;

impl crux_core::App for Resolve {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        tracing::debug!(event = event.name(), "resolve event");

        match event {
            Event::Started => {
                *model = Model::default();
                model.transcript.push(TranscriptEntry::assistant(RESOLVE_GREETING));
                caps.render.render();
            }

            Event::DraftChanged(draft) => {
                model.draft = draft;
                caps.render.render();
            }

            Event::SendPressed => {
                let question = model.draft.trim().to_owned();
                if question.is_empty() || model.busy {
                    return;
                }
                model.draft.clear();
                model.transcript.push(TranscriptEntry::user(question.clone()));
                model.busy = true;

                let intent = match model.session.incident_id() {
                    None => Intent::Resolve { description: question },
                    Some(incident_id) => Intent::Doubt { incident_id, question },
                };
                request_token(caps, intent);
                caps.render.render();
            }

            Event::FormAssistRequested { action_item } => {
                let Some(incident_id) = model.session.incident_id() else {
                    return;
                };
                if model.busy {
                    return;
                }
                model.busy = true;
                request_token(caps, Intent::FormAssist { incident_id, action_item });
                caps.render.render();
            }

            Event::TokenReady { intent, result } => match result {
                Ok(token) => {
                    let endpoints = model.endpoints.clone();
                    dispatch(caps, &endpoints, intent, &token, model);
                }
                Err(e) => {
                    self.fail(&intent, (&e).into(), model);
                    caps.render.render();
                }
            },

            Event::ResponseReceived { intent, result } => {
                self.handle_response(intent, *result, model);
                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        let (attack_type, plan, timeline) = match &model.session {
            Session::Uninitialized => (None, Vec::new(), None),
            Session::Initialized(state) => (
                Some(state.dimensions.attack_type.clone()),
                state.strategy.lifecycle_plan.clone(),
                Some(state.strategy.estimated_timeline.clone()),
            ),
        };

        ViewModel {
            initialized: matches!(model.session, Session::Initialized(_)),
            transcript: model.transcript.clone(),
            draft: model.draft.clone(),
            busy: model.busy,
            can_send: !model.draft.trim().is_empty() && !model.busy,
            guide: model.guide.clone(),
            attack_type,
            plan,
            estimated_timeline: timeline,
        }
    }
}

impl Resolve {
    fn handle_response(&self, intent: Intent, result: HttpResult, model: &mut Model) {
        model.busy = false;

        let response = match result {
            Ok(response) if response.is_success() => response,
            Ok(response) => return self.fail(&intent, response.as_error(), model),
            Err(transport) => return self.fail(&intent, (&transport).into(), model),
        };

        match intent {
            Intent::Resolve { .. } => match response.json::<CaseState>() {
                Ok(state) => {
                    let plan_len = state.strategy.lifecycle_plan.len();
                    model.transcript.push(TranscriptEntry::assistant(format!(
                        "I've analyzed your situation. It looks like a {} attack. \
                         I have generated a {plan_len}-step plan for you. \
                         Follow the guide on the right.",
                        state.dimensions.attack_type
                    )));
                    // First step stands in for the active one until the
                    // backend exposes step progression.
                    model.guide = state.strategy.lifecycle_plan.first().map(|step| {
                        format!("Step 1: {}\n{}", step.action, step.description)
                    });
                    model.session = Session::Initialized(state);
                }
                Err(e) => self.fail(&intent, e, model),
            },

            Intent::Doubt { .. } => match response.json::<DoubtResponse>() {
                Ok(doubt) => model.transcript.push(TranscriptEntry::assistant(doubt.answer)),
                Err(e) => self.fail(&intent, e, model),
            },

            Intent::FormAssist { .. } => match response.json::<FormAssistResponse>() {
                Ok(assist) => model.transcript.push(TranscriptEntry {
                    kind: EntryKind::FormGuide,
                    content: assist.guidance,
                    checklist: assist.checklist,
                }),
                Err(e) => self.fail(&intent, e, model),
            },
        }
    }

    fn fail(&self, intent: &Intent, error: AppError, model: &mut Model) {
        tracing::warn!(intent = intent.name(), error = %error, "resolve request failed");
        model.busy = false;
        model.transcript.push(TranscriptEntry::assistant(CONNECTION_ERROR_REPLY));
    }
}

fn request_token(caps: &Capabilities, intent: Intent) {
    caps.auth
        .get_token(move |result| Event::TokenReady { intent, result });
}

fn dispatch(
    caps: &Capabilities,
    endpoints: &Endpoints,
    intent: Intent,
    token: &BearerToken,
    model: &mut Model,
) {
    let built = match &intent {
        Intent::Resolve { description } => HttpRequest::post(endpoints.resolve_incident())
            .bearer(token)
            .json(&IncidentRequest {
                description: description.clone(),
                user_context: None,
            }),
        Intent::Doubt { incident_id, question } => HttpRequest::post(endpoints.case_doubt())
            .bearer(token)
            .json(&DoubtRequest {
                incident_id: incident_id.as_str().to_owned(),
                question: question.clone(),
            }),
        Intent::FormAssist { incident_id, action_item } => {
            HttpRequest::post(endpoints.case_form_assist())
                .bearer(token)
                .json(&FormAssistRequest {
                    incident_id: incident_id.as_str().to_owned(),
                    action_item: action_item.clone(),
                })
        }
    };

    match built {
        Ok(request) => {
            caps.http.send(request, move |result| Event::ResponseReceived {
                intent,
                result: Box::new(result),
            });
        }
        Err(e) => {
            Resolve.fail(&intent, e, model);
            caps.render.render();
        }
    }
}
