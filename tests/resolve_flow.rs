use crux_core::testing::AppTester;

use shared::api::{
    CaseState, DoubtResponse, IncidentDimensions, ResolutionStep, ResolutionStrategy,
};
use shared::capabilities::{BearerToken, HttpResponse};
use shared::resolve::{Effect, EntryKind, Event, Model, Resolve};
use shared::{CONNECTION_ERROR_REPLY, RESOLVE_GREETING};

fn hacked_instagram_state() -> CaseState {
    CaseState {
        incident_id: "inc-42".into(),
        dimensions: IncidentDimensions {
            asset_affected: vec!["instagram account".into()],
            attack_type: "account_takeover".into(),
            control_authority: vec!["platform".into()],
            urgency: "high".into(),
            summary: "Instagram account compromised".into(),
            prevention_tips: vec!["Enable 2FA".into()],
            incident_logic: "Credential theft via phishing".into(),
        },
        strategy: ResolutionStrategy {
            lifecycle_plan: vec![
                ResolutionStep {
                    step_id: "s1".into(),
                    phase: "contain".into(),
                    action: "Secure your email".into(),
                    description: "Change the password on the linked mailbox.".into(),
                    authority_involved: None,
                    is_completed: false,
                },
                ResolutionStep {
                    step_id: "s2".into(),
                    phase: "recover".into(),
                    action: "Use Instagram recovery".into(),
                    description: "Start the hacked-account flow.".into(),
                    authority_involved: Some("Instagram".into()),
                    is_completed: false,
                },
                ResolutionStep {
                    step_id: "s3".into(),
                    phase: "report".into(),
                    action: "Report the incident".into(),
                    description: "File a cybercrime report.".into(),
                    authority_involved: Some("Cyber cell".into()),
                    is_completed: false,
                },
            ],
            estimated_timeline: "72 hours".into(),
        },
        authorities: vec![],
        current_step_index: 0,
        status: "active".into(),
    }
}

fn send(
    app: &AppTester<Resolve, Effect>,
    model: &mut Model,
    text: &str,
) -> crux_core::Request<shared::capabilities::HttpRequest> {
    app.update(Event::DraftChanged(text.into()), model);
    let update = app.update(Event::SendPressed, model);

    let mut token_request = update
        .effects
        .into_iter()
        .find_map(|e| match e {
            Effect::Auth(request) => Some(request),
            _ => None,
        })
        .expect("an auth effect");
    let update = app
        .resolve(&mut token_request, Ok(BearerToken::new("tok")))
        .expect("token resolves");

    let mut raised = Vec::new();
    for event in update.events {
        raised.extend(app.update(event, model).effects);
    }
    raised
        .into_iter()
        .find_map(|e| match e {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .expect("an http effect")
}

fn feed(app: &AppTester<Resolve, Effect>, model: &mut Model, update: crux_core::testing::Update<Effect, Event>) {
    for event in update.events {
        app.update(event, model);
    }
}

#[test]
fn session_starts_with_the_greeting() {
    let app = AppTester::<Resolve, Effect>::default();
    let mut model = Model::default();

    app.update(Event::Started, &mut model);

    assert_eq!(model.transcript.len(), 1);
    assert_eq!(model.transcript[0].kind, EntryKind::Assistant);
    assert_eq!(model.transcript[0].content, RESOLVE_GREETING);
    let view = app.view(&model);
    assert!(!view.initialized);
}

#[test]
fn first_send_initializes_later_sends_ask_doubts() {
    let app = AppTester::<Resolve, Effect>::default();
    let mut model = Model::default();
    app.update(Event::Started, &mut model);

    // First message goes to incident resolution.
    let mut http_request = send(&app, &mut model, "My Instagram was hacked");
    assert_eq!(
        http_request.operation.url,
        "http://localhost:8000/resolve-incident"
    );

    let body = serde_json::to_vec(&hacked_instagram_state()).unwrap();
    let update = app
        .resolve(&mut http_request, Ok(HttpResponse { status: 200, body }))
        .expect("response resolves");
    feed(&app, &mut model, update);

    let view = app.view(&model);
    assert!(view.initialized);
    assert_eq!(view.plan.len(), 3);
    assert_eq!(
        view.guide.as_deref(),
        Some("Step 1: Secure your email\nChange the password on the linked mailbox.")
    );
    let analysis = model.transcript.last().unwrap();
    assert!(analysis.content.contains("account_takeover"));
    assert!(analysis.content.contains("3-step plan"));

    // Second message goes to doubt solving with the stored incident id.
    let mut http_request = send(&app, &mut model, "Should I tell my contacts?");
    assert_eq!(http_request.operation.url, "http://localhost:8000/case/doubt");
    let sent: serde_json::Value =
        serde_json::from_slice(http_request.operation.body.as_deref().unwrap()).unwrap();
    assert_eq!(sent["incident_id"], "inc-42");
    assert_eq!(sent["question"], "Should I tell my contacts?");

    let body = serde_json::to_vec(&DoubtResponse {
        answer: "Yes, warn them about impersonation messages.".into(),
    })
    .unwrap();
    let update = app
        .resolve(&mut http_request, Ok(HttpResponse { status: 200, body }))
        .expect("response resolves");
    feed(&app, &mut model, update);

    assert_eq!(
        model.transcript.last().unwrap().content,
        "Yes, warn them about impersonation messages."
    );
}

#[test]
fn sends_while_busy_are_ignored() {
    let app = AppTester::<Resolve, Effect>::default();
    let mut model = Model::default();
    app.update(Event::Started, &mut model);

    let _pending = send(&app, &mut model, "My UPI pin leaked");
    assert!(model.busy);

    app.update(Event::DraftChanged("hello again".into()), &mut model);
    let update = app.update(Event::SendPressed, &mut model);
    assert!(update.effects.is_empty());
    // Only greeting and the first user message so far.
    assert_eq!(model.transcript.len(), 2);
}

#[test]
fn failure_appends_the_connection_error_reply() {
    let app = AppTester::<Resolve, Effect>::default();
    let mut model = Model::default();
    app.update(Event::Started, &mut model);

    let mut http_request = send(&app, &mut model, "My Instagram was hacked");
    let update = app
        .resolve(
            &mut http_request,
            Ok(HttpResponse { status: 500, body: vec![] }),
        )
        .expect("response resolves");
    feed(&app, &mut model, update);

    assert!(!model.busy);
    assert!(!app.view(&model).initialized);
    assert_eq!(model.transcript.last().unwrap().content, CONNECTION_ERROR_REPLY);
}
