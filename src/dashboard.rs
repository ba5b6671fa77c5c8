//! Case dashboard controller: list existing cases, open a new one.

use crux_core::render::Render;
use serde::{Deserialize, Serialize};

use crate::api::{CaseSummary, CreateCaseResponse, Endpoints};
use crate::capabilities::{Auth, BearerToken, Http, HttpRequest, HttpResult, TokenResult};
use crate::{AppError, CaseId, ErrorView, DEFAULT_CASE_SUMMARY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    ListCases,
    CreateCase { title: String, summary: String },
}

impl Intent {
    const fn name(&self) -> &'static str {
        match self {
            Self::ListCases => "list_cases",
            Self::CreateCase { .. } => "create_case",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Started,
    TitleChanged(String),
    CreatePressed,
    /// Shell acknowledges it routed to the newly created case.
    NavigationConsumed,

    TokenReady { intent: Intent, result: TokenResult },
    ResponseReceived { intent: Intent, result: Box<HttpResult> },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::TitleChanged(_) => "title_changed",
            Self::CreatePressed => "create_pressed",
            Self::NavigationConsumed => "navigation_consumed",
            Self::TokenReady { .. } => "token_ready",
            Self::ResponseReceived { .. } => "response_received",
        }
    }
}

#[derive(Default)]
pub struct Model {
    pub endpoints: Endpoints,
    pub loading: bool,
    pub cases: Vec<CaseSummary>,
    pub new_title: String,
    pub creating: bool,
    pub navigate_to: Option<CaseId>,
    pub active_error: Option<AppError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub loading: bool,
    pub cases: Vec<CaseSummary>,
    pub new_title: String,
    pub creating: bool,
    pub can_create: bool,
    pub navigate_to: Option<CaseId>,
    pub error: Option<ErrorView>,
}

#[derive(crux_core::macros::Effect)]
#[effect(app = "Dashboard")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub auth: Auth<Event>,
}

#[derive(Default)]
pub struct Dashboard;

impl crux_core::App for Dashboard {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        tracing::debug!(event = event.name(), "dashboard event");

        match event {
            Event::Started => {
                model.loading = true;
                model.active_error = None;
                request_token(caps, Intent::ListCases);
                caps.render.render();
            }

            Event::TitleChanged(title) => {
                model.new_title = title;
                caps.render.render();
            }

            Event::CreatePressed => {
                let title = model.new_title.trim().to_owned();
                if title.is_empty() || model.creating {
                    return;
                }
                model.creating = true;
                request_token(
                    caps,
                    Intent::CreateCase {
                        title,
                        summary: DEFAULT_CASE_SUMMARY.to_owned(),
                    },
                );
                caps.render.render();
            }

            Event::NavigationConsumed => {
                model.navigate_to = None;
                caps.render.render();
            }

            Event::TokenReady { intent, result } => match result {
                Ok(token) => dispatch(caps, &model.endpoints, intent, &token),
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
        ViewModel {
            loading: model.loading,
            cases: model.cases.clone(),
            new_title: model.new_title.clone(),
            creating: model.creating,
            can_create: !model.new_title.trim().is_empty() && !model.creating,
            navigate_to: model.navigate_to.clone(),
            error: model.active_error.as_ref().map(ErrorView::from),
        }
    }
}

impl Dashboard {
    fn handle_response(&self, intent: Intent, result: HttpResult, model: &mut Model) {
        let response = match result {
            Ok(response) if response.is_success() => response,
            Ok(response) => return self.fail(&intent, response.as_error(), model),
            Err(transport) => return self.fail(&intent, (&transport).into(), model),
        };

        match intent {
            Intent::ListCases => match response.json::<Vec<CaseSummary>>() {
                Ok(cases) => {
                    model.loading = false;
                    model.cases = cases;
                }
                Err(e) => self.fail(&intent, e, model),
            },
            Intent::CreateCase { .. } => match response.json::<CreateCaseResponse>() {
                Ok(created) => {
                    model.creating = false;
                    model.new_title.clear();
                    model.navigate_to = Some(CaseId::new(created.case_id));
                }
                Err(e) => self.fail(&intent, e, model),
            },
        }
    }

    fn fail(&self, intent: &Intent, error: AppError, model: &mut Model) {
        tracing::warn!(intent = intent.name(), error = %error, "dashboard request failed");
        match intent {
            Intent::ListCases => model.loading = false,
            Intent::CreateCase { .. } => model.creating = false,
        }
        model.active_error = Some(error);
    }
}

fn request_token(caps: &Capabilities, intent: Intent) {
    caps.auth
        .get_token(move |result| Event::TokenReady { intent, result });
}

fn dispatch(caps: &Capabilities, endpoints: &Endpoints, intent: Intent, token: &BearerToken) {
    let request = match &intent {
        Intent::ListCases => HttpRequest::get(endpoints.cases()).bearer(token),
        Intent::CreateCase { title, summary } => {
            HttpRequest::post(endpoints.create_case(title, summary)).bearer(token)
        }
    };

    caps.http.send(request, move |result| Event::ResponseReceived {
        intent,
        result: Box::new(result),
    });
}
