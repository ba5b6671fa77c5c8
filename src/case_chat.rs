//! Case workspace controller.
//!
//! Owns one open case: transcript, remediation tasks, case details, the
//! message draft and its staged image. Messages and task toggles are
//! applied optimistically and reconciled when the backend answers; a
//! failed reconciliation is surfaced on the affected row instead of being
//! rolled back.

use crux_core::render::Render;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{
    CaseDetails, CaseSnapshot, ChatReply, ChatRequest, Endpoints, Message, Sender, TaskItem,
    TaskStatus,
};
use crate::attachment::StagedImage;
use crate::capabilities::{Auth, BearerToken, Http, HttpRequest, HttpResult, TokenResult};
use crate::{client_timestamp, AppError, CaseId, ErrorView};

/// Delivery state of a transcript entry the user authored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delivery {
    Sending,
    Delivered,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: Sender,
    pub content: String,
    pub timestamp: String,
    pub delivery: Delivery,
}

impl ChatMessage {
    fn confirmed(message: Message) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: message.sender,
            content: message.content,
            timestamp: message.timestamp,
            delivery: Delivery::Delivered,
        }
    }

    fn agent(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: Sender::Agent,
            content: content.into(),
            timestamp: client_timestamp(),
            delivery: Delivery::Delivered,
        }
    }
}

/// Whether the server has acknowledged the task's displayed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskSync {
    Confirmed,
    AwaitingServer,
    Unconfirmed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    pub item: TaskItem,
    pub sync: TaskSync,
}

impl TaskRow {
    fn confirmed(item: TaskItem) -> Self {
        Self {
            item,
            sync: TaskSync::Confirmed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Loading,
    Ready,
}

/// What an in-flight token or response belongs to. Carried through the
/// capability closures so the model needs no request table; `generation`
/// pins the response to the mount that issued it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    LoadCase {
        case_id: CaseId,
        generation: u64,
    },
    SendChat {
        case_id: CaseId,
        request: ChatRequest,
        message_id: Uuid,
        generation: u64,
    },
    SetTaskStatus {
        case_id: CaseId,
        label: String,
        status: TaskStatus,
        generation: u64,
    },
}

impl Intent {
    const fn generation(&self) -> u64 {
        match self {
            Self::LoadCase { generation, .. }
            | Self::SendChat { generation, .. }
            | Self::SetTaskStatus { generation, .. } => *generation,
        }
    }

    const fn name(&self) -> &'static str {
        match self {
            Self::LoadCase { .. } => "load_case",
            Self::SendChat { .. } => "send_chat",
            Self::SetTaskStatus { .. } => "set_task_status",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    CaseOpened { case_id: CaseId },
    DraftChanged(String),
    ImageStaged { file_name: String, data: Vec<u8> },
    ImageCleared,
    SendPressed,
    TaskTogglePressed { label: String },
    ErrorDismissed,

    TokenReady { intent: Intent, result: TokenResult },
    ResponseReceived { intent: Intent, result: Box<HttpResult> },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CaseOpened { .. } => "case_opened",
            Self::DraftChanged(_) => "draft_changed",
            Self::ImageStaged { .. } => "image_staged",
            Self::ImageCleared => "image_cleared",
            Self::SendPressed => "send_pressed",
            Self::TaskTogglePressed { .. } => "task_toggle_pressed",
            Self::ErrorDismissed => "error_dismissed",
            Self::TokenReady { .. } => "token_ready",
            Self::ResponseReceived { .. } => "response_received",
        }
    }
}

#[derive(Default)]
pub struct Model {
    pub endpoints: Endpoints,
    pub case_id: Option<CaseId>,
    pub phase: Phase,
    /// Bumped on every `CaseOpened`; responses from older mounts are dropped.
    pub generation: u64,
    pub messages: Vec<ChatMessage>,
    pub tasks: Vec<TaskRow>,
    pub details: Option<CaseDetails>,
    pub draft: String,
    pub staged_image: Option<StagedImage>,
    pub pending_sends: usize,
    pub active_error: Option<AppError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    pub label: String,
    pub description: Option<String>,
    pub action_link: Option<String>,
    pub completed: bool,
    pub sync: TaskSync,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub phase: Phase,
    pub title: String,
    pub details: Option<CaseDetails>,
    pub messages: Vec<ChatMessage>,
    pub tasks: Vec<TaskView>,
    pub draft: String,
    pub staged_file_name: Option<String>,
    pub can_send: bool,
    pub sending: bool,
    pub error: Option<ErrorView>,
}

#[derive(crux_core::macros::Effect)]
#[effect(app = "CaseChat")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub auth: Auth<Event>,
}

#[derive(Default)]
pub struct CaseChat;

impl crux_core::App for CaseChat {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        tracing::debug!(event = event.name(), "case_chat event");

        match event {
            Event::CaseOpened { case_id } => {
                model.generation = model.generation.wrapping_add(1);
                model.case_id = Some(case_id.clone());
                model.phase = Phase::Loading;
                model.messages.clear();
                model.tasks.clear();
                model.details = None;
                model.draft.clear();
                model.staged_image = None;
                model.pending_sends = 0;
                model.active_error = None;

                request_token(
                    caps,
                    Intent::LoadCase {
                        case_id,
                        generation: model.generation,
                    },
                );
                caps.render.render();
            }

            Event::DraftChanged(draft) => {
                model.draft = draft;
                caps.render.render();
            }

            Event::ImageStaged { file_name, data } => {
                match StagedImage::from_file(file_name, data) {
                    Ok(staged) => {
                        model.staged_image = Some(staged);
                        model.active_error = None;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "rejected staged image");
                        model.active_error = Some(e.into());
                    }
                }
                caps.render.render();
            }

            Event::ImageCleared => {
                model.staged_image = None;
                caps.render.render();
            }

            Event::SendPressed => self.send_message(model, caps),

            Event::TaskTogglePressed { label } => self.toggle_task(&label, model, caps),

            Event::ErrorDismissed => {
                model.active_error = None;
                caps.render.render();
            }

            Event::TokenReady { intent, result } => {
                if intent.generation() != model.generation {
                    tracing::debug!(intent = intent.name(), "dropping stale token");
                    return;
                }
                match result {
                    Ok(token) => {
                        let endpoints = model.endpoints.clone();
                        dispatch(caps, &endpoints, intent, &token, model);
                    }
                    Err(e) => {
                        tracing::warn!(intent = intent.name(), "token request failed");
                        self.fail_intent(&intent, (&e).into(), model);
                        caps.render.render();
                    }
                }
            }

            Event::ResponseReceived { intent, result } => {
                if intent.generation() != model.generation {
                    tracing::debug!(intent = intent.name(), "dropping stale response");
                    return;
                }
                self.handle_response(intent, *result, model);
                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel {
            phase: model.phase,
            title: model
                .details
                .as_ref()
                .map_or_else(String::new, |d| d.title.clone()),
            details: model.details.clone(),
            messages: model.messages.clone(),
            tasks: model
                .tasks
                .iter()
                .map(|row| TaskView {
                    label: row.item.label.clone(),
                    description: row.item.description.clone(),
                    action_link: row.item.action_link.clone(),
                    completed: row.item.status.is_completed(),
                    sync: row.sync,
                })
                .collect(),
            draft: model.draft.clone(),
            staged_file_name: model.staged_image.as_ref().map(|s| s.file_name.clone()),
            can_send: !model.draft.trim().is_empty() || model.staged_image.is_some(),
            sending: model.pending_sends > 0,
            error: model.active_error.as_ref().map(ErrorView::from),
        }
    }
}

impl CaseChat {
    fn send_message(&self, model: &mut Model, caps: &Capabilities) {
        let text = model.draft.trim().to_owned();
        if text.is_empty() && model.staged_image.is_none() {
            // Strict no-op: not even a render.
            return;
        }
        let Some(case_id) = model.case_id.clone() else {
            return;
        };

        let staged = model.staged_image.take();
        model.draft.clear();

        let mut content = text.clone();
        if let Some(image) = &staged {
            content.push_str(&image.display_suffix());
        }

        let message_id = Uuid::new_v4();
        model.messages.push(ChatMessage {
            id: message_id,
            sender: Sender::User,
            content,
            timestamp: client_timestamp(),
            delivery: Delivery::Sending,
        });
        model.pending_sends += 1;

        let request = ChatRequest {
            message: text,
            image_base64: staged.map(|s| s.payload_base64()),
        };

        request_token(
            caps,
            Intent::SendChat {
                case_id,
                request,
                message_id,
                generation: model.generation,
            },
        );
        caps.render.render();
    }

    fn toggle_task(&self, label: &str, model: &mut Model, caps: &Capabilities) {
        let Some(current) = model
            .tasks
            .iter()
            .find(|row| row.item.label == label)
            .map(|row| row.item.status)
        else {
            return;
        };
        let Some(case_id) = model.case_id.clone() else {
            return;
        };

        // Labels are the natural key; duplicate labels flip together.
        let next = current.toggled();
        for row in model.tasks.iter_mut().filter(|r| r.item.label == label) {
            row.item.status = next;
            row.sync = TaskSync::AwaitingServer;
        }

        request_token(
            caps,
            Intent::SetTaskStatus {
                case_id,
                label: label.to_owned(),
                status: next,
                generation: model.generation,
            },
        );
        caps.render.render();
    }

    fn handle_response(&self, intent: Intent, result: HttpResult, model: &mut Model) {
        match result {
            Ok(response) if response.is_success() => match intent {
                Intent::LoadCase { .. } => match response.json::<CaseSnapshot>() {
                    Ok(snapshot) => {
                        model.phase = Phase::Ready;
                        model.details = Some(snapshot.case);
                        model.messages = snapshot
                            .history
                            .into_iter()
                            .map(ChatMessage::confirmed)
                            .collect();
                        model.tasks =
                            snapshot.tasks.into_iter().map(TaskRow::confirmed).collect();
                    }
                    Err(e) => self.fail_intent(&intent, e, model),
                },

                Intent::SendChat { message_id, .. } => {
                    model.pending_sends = model.pending_sends.saturating_sub(1);
                    match response.json::<ChatReply>() {
                        Ok(reply) => {
                            mark_delivery(model, message_id, Delivery::Delivered);
                            model.messages.push(ChatMessage::agent(reply.reply));
                            // Server projections replace ours wholesale.
                            if let Some(tasks) = reply.tasks {
                                model.tasks =
                                    tasks.into_iter().map(TaskRow::confirmed).collect();
                            }
                            if let Some(details) = reply.case_details {
                                model.details = Some(details);
                            }
                        }
                        Err(e) => self.fail_intent(&intent, e, model),
                    }
                }

                Intent::SetTaskStatus { ref label, .. } => {
                    for row in model.tasks.iter_mut().filter(|r| &r.item.label == label) {
                        row.sync = TaskSync::Confirmed;
                    }
                }
            },

            Ok(response) => self.fail_intent(&intent, response.as_error(), model),
            Err(transport) => self.fail_intent(&intent, (&transport).into(), model),
        }
    }

    fn fail_intent(&self, intent: &Intent, error: AppError, model: &mut Model) {
        tracing::warn!(intent = intent.name(), error = %error, "case_chat request failed");

        match intent {
            Intent::LoadCase { .. } => {
                model.active_error = Some(error);
            }
            Intent::SendChat { message_id, .. } => {
                model.pending_sends = model.pending_sends.saturating_sub(1);
                // The bubble stays, flagged, with no agent reply appended.
                mark_delivery(model, *message_id, Delivery::Failed);
                model.active_error = Some(error);
            }
            Intent::SetTaskStatus { label, .. } => {
                // Optimistic value stays; the row shows it is unconfirmed.
                for row in model.tasks.iter_mut().filter(|r| &r.item.label == label) {
                    row.sync = TaskSync::Unconfirmed;
                }
            }
        }
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
        Intent::LoadCase { case_id, .. } => {
            Ok(HttpRequest::get(endpoints.case(case_id)).bearer(token))
        }
        Intent::SendChat {
            case_id, request, ..
        } => HttpRequest::post(endpoints.case_chat(case_id))
            .bearer(token)
            .json(request),
        Intent::SetTaskStatus {
            case_id,
            label,
            status,
            ..
        } => Ok(HttpRequest::put(endpoints.case_task(case_id, label, *status)).bearer(token)),
    };

    match built {
        Ok(request) => {
            caps.http.send(request, move |result| Event::ResponseReceived {
                intent,
                result: Box::new(result),
            });
        }
        Err(e) => {
            CaseChat.fail_intent(&intent, e, model);
            caps.render.render();
        }
    }
}

fn mark_delivery(model: &mut Model, message_id: Uuid, delivery: Delivery) {
    if let Some(message) = model.messages.iter_mut().find(|m| m.id == message_id) {
        message.delivery = delivery;
    }
}
