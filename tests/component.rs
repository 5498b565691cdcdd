use leptos::prelude::*;
use leptos_ssr_fetch::{
    component::{expect_fetch_data, SsrFetchData},
    FetchComponent, PropMap, PropValue, RouteParams, ServerPayload,
};

#[cfg(feature = "ssr")]
mod ssr {
    pub use futures::StreamExt;
}
#[cfg(feature = "ssr")]
use ssr::*;

// Server render pass coverage for the lifecycle wrapper: the client
// half (payload probing, re-fetching, loader transitions) is driven by
// browser-only effects and is covered by the state machine unit tests
// instead.

fn title(props: &PropMap) -> String {
    props
        .get("title")
        .and_then(PropValue::as_value)
        .and_then(|value| value.as_str())
        .map(String::from)
        .unwrap_or_default()
}

#[component]
fn Status() -> impl IntoView {
    let state = expect_fetch_data();
    let props = state.props();
    let loading = state.loading();
    view! {
        <p>
            "loading: " {move || loading.get().to_string()}
            ", title: " {move || title(&props.get())}
        </p>
    }
}

fn article() -> FetchComponent {
    FetchComponent::new("Article")
        .with_default_props(PropMap::from_iter([("title", "untitled")]))
}

#[component]
fn App(#[prop(optional, into)] payload: Option<ServerPayload>) -> impl IntoView {
    if let Some(payload) = payload {
        payload.provide();
    }
    view! {
        <SsrFetchData component=article() params=RwSignal::new(RouteParams::new())>
            <Status/>
        </SsrFetchData>
    }
}

#[cfg(feature = "ssr")]
#[tokio::test]
async fn embedded_payload_renders_without_loading() {
    let _owner = init_renderer();

    let payload = ServerPayload::new();
    payload.insert("Article", PropMap::from_iter([("title", "from the server")]));

    let app = view! { <App payload=payload.clone()/> };
    let html = app.to_html_stream_in_order().collect::<String>().await;

    assert!(html.contains("loading: <!>false"));
    assert!(html.contains("title: <!>from the server"));
    // the render pass reads without consuming; the same payload still
    // has to be serialized for the client
    assert!(!payload.is_empty());
}

#[cfg(feature = "ssr")]
#[tokio::test]
async fn missing_payload_renders_defaults_without_loading() {
    let _owner = init_renderer();

    let app = view! { <App/> };
    let html = app.to_html_stream_in_order().collect::<String>().await;

    // the server never shows a loader, even with nothing resolved
    assert!(html.contains("loading: <!>false"));
    assert!(html.contains("title: <!>untitled"));
}

#[cfg(feature = "ssr")]
#[tokio::test]
async fn payload_for_other_components_is_ignored() {
    let _owner = init_renderer();

    let payload = ServerPayload::new();
    payload.insert("Sidebar", PropMap::from_iter([("title", "elsewhere")]));

    let app = view! { <App payload=payload/> };
    let html = app.to_html_stream_in_order().collect::<String>().await;

    assert!(html.contains("title: <!>untitled"));
    assert!(!html.contains("elsewhere"));
}

#[cfg(feature = "ssr")]
fn init_renderer() -> Owner {
    let _ = any_spawner::Executor::init_tokio();
    let owner = Owner::new();
    owner.set();
    owner
}
