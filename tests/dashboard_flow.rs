use crux_core::testing::AppTester;

use shared::api::CaseSummary;
use shared::capabilities::{BearerToken, HttpMethod, HttpResponse};
use shared::dashboard::{Dashboard, Effect, Event, Model};
use shared::CaseId;

fn run_token_leg(
    app: &AppTester<Dashboard, Effect>,
    effects: Vec<Effect>,
    model: &mut Model,
) -> crux_core::Request<shared::capabilities::HttpRequest> {
    let mut token_request = effects
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

#[test]
fn startup_lists_cases() {
    let app = AppTester::<Dashboard, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::Started, &mut model);
    assert!(model.loading);

    let mut http_request = run_token_leg(&app, update.effects, &mut model);
    assert_eq!(http_request.operation.method, HttpMethod::Get);
    assert_eq!(http_request.operation.url, "http://localhost:8000/cases");

    let cases = vec![CaseSummary {
        id: "c1".into(),
        title: "UPI fraud".into(),
        incident_summary: Some("Unauthorized transaction".into()),
        status: "active".into(),
        updated_at: "2024-01-01T00:00:00".into(),
    }];
    let body = serde_json::to_vec(&cases).unwrap();
    let update = app
        .resolve(&mut http_request, Ok(HttpResponse { status: 200, body }))
        .expect("response resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    let view = app.view(&model);
    assert!(!view.loading);
    assert_eq!(view.cases.len(), 1);
    assert_eq!(view.cases[0].title, "UPI fraud");
}

#[test]
fn empty_title_does_not_create() {
    let app = AppTester::<Dashboard, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::CreatePressed, &mut model);
    assert!(update.effects.is_empty());
    assert!(!model.creating);
}

#[test]
fn creating_a_case_yields_a_navigation_target() {
    let app = AppTester::<Dashboard, Effect>::default();
    let mut model = Model::default();

    app.update(Event::TitleChanged("Unauthorized UPI Transaction".into()), &mut model);
    let update = app.update(Event::CreatePressed, &mut model);
    assert!(model.creating);

    let mut http_request = run_token_leg(&app, update.effects, &mut model);
    assert_eq!(http_request.operation.method, HttpMethod::Post);
    assert_eq!(
        http_request.operation.url,
        "http://localhost:8000/cases?title=Unauthorized+UPI+Transaction&summary=Pending+analysis..."
    );

    let body = br#"{"case_id": "new-1"}"#.to_vec();
    let update = app
        .resolve(&mut http_request, Ok(HttpResponse { status: 200, body }))
        .expect("response resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    let view = app.view(&model);
    assert_eq!(view.navigate_to, Some(CaseId::new("new-1")));

    app.update(Event::NavigationConsumed, &mut model);
    assert!(app.view(&model).navigate_to.is_none());
}
