//! This crate provides a small helper pattern for the Leptos web
//! framework that lets components declare a *fetch capability*: a
//! function producing the data the component needs before it can
//! render meaningfully.  Declared capabilities are resolved up front
//! during the server render pass and embedded into the delivered page;
//! when the embedded payload does not reach the client (or a component
//! was never covered by it), the same capability is re-resolved after
//! hydration, with a `loading` flag exposed to the wrapped subtree in
//! the meantime.
//!
//! ## Use case
//!
//! A page component frequently cannot render meaningfully until some
//! remote data is available, and neither can the child components it
//! composes.  Rather than wiring a resource into every one of them,
//! each component describes itself with a [`FetchComponent`]
//! descriptor: a display name, its default props, an optional
//! [`Fetcher`], and the ordered children it waits for.  The resolver
//! half of this crate ([`execute_fetch_data`] and the dependency-tree
//! variant [`fetch_data`]) turns such a descriptor into prop maps,
//! tolerating individual fetch failures so rendering can proceed with
//! partial data instead of blocking indefinitely.  The lifecycle half
//! (the [`SsrFetchData`](component::SsrFetchData) component) decides
//! *when* that resolution runs on the client and what the subtree gets
//! to see while it is pending.
//!
//! # Example
//!
//! ```
//! use leptos::prelude::*;
//! use leptos_ssr_fetch::{
//!     component::{expect_fetch_data, SsrFetchData},
//!     FetchComponent, FetchContext, FetchResult, PropMap, RouteParams, ServerPayload,
//! };
//!
//! // The descriptor is built once and cloned freely; resolution never
//! // mutates it.
//! fn article_descriptor() -> FetchComponent {
//!     FetchComponent::new("Article")
//!         .with_default_props(PropMap::from_iter([("title", "untitled")]))
//!         .with_fetcher(|_ctx: &FetchContext| {
//!             FetchResult::single(async {
//!                 // any awaitable producing props; transport is the
//!                 // caller's concern
//!                 Ok::<_, String>(PropMap::from_iter([("title", "A practical guide to...")]))
//!             })
//!         })
//! }
//!
//! #[component]
//! fn Article() -> impl IntoView {
//!     let state = expect_fetch_data();
//!     let props = state.props();
//!     let loading = state.loading();
//!     view! {
//!         <h1>{move || if loading.get() {
//!             "Loading...".to_string()
//!         } else {
//!             props.get().get("title").map(|v| v.to_string()).unwrap_or_default()
//!         }}</h1>
//!     }
//! }
//!
//! #[component]
//! fn App() -> impl IntoView {
//!     // typically derived from the router's matched params
//!     let params = RwSignal::new(RouteParams::new());
//!     view! {
//!         <SsrFetchData component=article_descriptor() params=params>
//!             <Article/>
//!         </SsrFetchData>
//!     }
//! }
//!
//! // At the hydration entry point, hand the embedded payload to the
//! // wrappers before mounting; without it they re-fetch client-side.
//! fn hydrate_with(embedded_json: &str) {
//!     if let Ok(payload) = ServerPayload::from_json(embedded_json) {
//!         payload.provide();
//!     }
//! }
//! ```
//!
//! On the server (with the `ssr` feature), the rendering entry point
//! resolves the whole tree first and serializes the outcome for the
//! page:
//!
//! ```ignore
//! let payload = resolve_to_payload(&descriptor, &ctx, &FetchOptions::default()).await;
//! payload.clone().provide();          // for the render pass itself
//! let embedded = payload.to_json()?;  // for the delivered page
//! ```
//!
//! # Feature Flags
#![cfg_attr(
    feature = "document-features",
    cfg_attr(doc, doc = ::document_features::document_features!())
)]

pub mod component;
pub mod fetch;
pub mod payload;
pub mod props;


#[cfg(feature = "ssr")]
pub use fetch::resolve_to_payload;
pub use fetch::{
    execute_fetch_data, fetch_data, FetchComponent, FetchContext, FetchDataError, FetchOptions,
    FetchResult, Fetcher, NamedFetch, RequestParts, ResolveFuture, ResponseParts, RouteParams,
};
pub use payload::{PayloadHandle, ServerPayload};
pub use props::{PropMap, PropValue, ERROR_PROP};
