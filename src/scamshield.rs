//! Scam analysis controller.
//!
//! Stateless between runs: each analysis replaces the previous report
//! wholesale. Risk banding is presentation only, the verdict text and
//! score come from the backend untouched.

use crux_core::render::Render;
use serde::{Deserialize, Serialize};

use crate::api::{AnalysisRequest, Endpoints, ScamAnalysisResult};
use crate::attachment::StagedImage;
use crate::capabilities::{Auth, Http, HttpRequest, HttpResult, TokenResult};
use crate::{AppError, ErrorView, DEFAULT_CONSEQUENCES, RISK_HIGH_THRESHOLD, RISK_LOW_THRESHOLD};

/// Accent band for a risk score: red above 70, amber from 40 to 70,
/// green below 40.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    High,
    Medium,
    Low,
}

impl RiskBand {
    #[must_use]
    pub const fn for_score(score: u8) -> Self {
        if score > RISK_HIGH_THRESHOLD {
            Self::High
        } else if score >= RISK_LOW_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    InputChanged(String),
    ImageStaged { file_name: String, data: Vec<u8> },
    ImageCleared,
    AnalyzePressed,
    ErrorDismissed,

    TokenReady { request: AnalysisRequest, result: TokenResult },
    ResponseReceived { result: Box<HttpResult> },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InputChanged(_) => "input_changed",
            Self::ImageStaged { .. } => "image_staged",
            Self::ImageCleared => "image_cleared",
            Self::AnalyzePressed => "analyze_pressed",
            Self::ErrorDismissed => "error_dismissed",
            Self::TokenReady { .. } => "token_ready",
            Self::ResponseReceived { .. } => "response_received",
        }
    }
}

#[derive(Default)]
pub struct Model {
    pub endpoints: Endpoints,
    pub input: String,
    pub staged_image: Option<StagedImage>,
    pub busy: bool,
    pub report: Option<ScamAnalysisResult>,
    pub active_error: Option<AppError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportView {
    pub risk_score: u8,
    pub band: RiskBand,
    pub verdict: Option<String>,
    pub severity: Option<String>,
    pub detected_patterns: Vec<String>,
    pub mechanism: Option<String>,
    pub consequences: String,
    pub recommendation: String,
}

impl From<&ScamAnalysisResult> for ReportView {
    fn from(result: &ScamAnalysisResult) -> Self {
        let report = &result.scout_report;
        Self {
            risk_score: report.risk_score,
            band: RiskBand::for_score(report.risk_score),
            verdict: report.verdict.clone(),
            severity: report.severity.clone(),
            detected_patterns: report.detected_patterns.clone(),
            mechanism: report.mechanism().map(str::to_owned),
            consequences: report
                .consequences
                .clone()
                .unwrap_or_else(|| DEFAULT_CONSEQUENCES.to_owned()),
            recommendation: report.recommendation.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub input: String,
    pub staged_file_name: Option<String>,
    pub busy: bool,
    pub can_analyze: bool,
    pub report: Option<ReportView>,
    pub error: Option<ErrorView>,
}

#[derive(crux_core::macros::Effect)]
#[effect(app = "ScamShield")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub auth: Auth<Event>,
}

#[derive(Default)]
pub struct ScamShield;

impl crux_core::App for ScamShield {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        tracing::debug!(event = event.name(), "scamshield event");

        match event {
            Event::InputChanged(input) => {
                model.input = input;
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

            Event::AnalyzePressed => {
                let text = model.input.trim().to_owned();
                if (text.is_empty() && model.staged_image.is_none()) || model.busy {
                    return;
                }
                model.busy = true;
                model.report = None;
                model.active_error = None;

                let request = AnalysisRequest {
                    message: (!text.is_empty()).then_some(text),
                    image_base64: model.staged_image.as_ref().map(StagedImage::payload_base64),
                    source: Some("user_input".to_owned()),
                };
                caps.auth
                    .get_token(move |result| Event::TokenReady { request, result });
                caps.render.render();
            }

            Event::ErrorDismissed => {
                model.active_error = None;
                caps.render.render();
            }

            Event::TokenReady { request, result } => match result {
                Ok(token) => {
                    let built = HttpRequest::post(model.endpoints.analyze_message())
                        .bearer(&token)
                        .json(&request);
                    match built {
                        Ok(http_request) => {
                            caps.http.send(http_request, |result| Event::ResponseReceived {
                                result: Box::new(result),
                            });
                        }
                        Err(e) => {
                            self.fail(e, model);
                            caps.render.render();
                        }
                    }
                }
                Err(e) => {
                    self.fail((&e).into(), model);
                    caps.render.render();
                }
            },

            Event::ResponseReceived { result } => {
                self.handle_response(*result, model);
                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel {
            input: model.input.clone(),
            staged_file_name: model.staged_image.as_ref().map(|s| s.file_name.clone()),
            busy: model.busy,
            can_analyze: !model.busy
                && (!model.input.trim().is_empty() || model.staged_image.is_some()),
            report: model.report.as_ref().map(ReportView::from),
            error: model.active_error.as_ref().map(ErrorView::from),
        }
    }
}

impl ScamShield {
    fn handle_response(&self, result: HttpResult, model: &mut Model) {
        model.busy = false;

        let response = match result {
            Ok(response) if response.is_success() => response,
            Ok(response) => return self.fail(response.as_error(), model),
            Err(transport) => return self.fail((&transport).into(), model),
        };

        match response.json::<ScamAnalysisResult>() {
            Ok(report) => model.report = Some(report),
            Err(e) => self.fail(e, model),
        }
    }

    fn fail(&self, error: AppError, model: &mut Model) {
        tracing::warn!(error = %error, "analysis request failed");
        model.busy = false;
        model.active_error = Some(error);
    }
}
