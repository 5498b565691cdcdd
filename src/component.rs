//! The lifecycle wrapper: a component that adapts a wrapped subtree so
//! it lazily resolves its own fetch data outside of server rendering,
//! exposing a `loading` flag while doing so.

#[cfg(not(feature = "ssr"))]
mod csr {
    pub use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    pub use leptos::{logging, task::spawn_local};

    pub use crate::fetch::{execute_fetch_data, FetchContext, FetchOptions, RequestParts};
}

#[cfg(not(feature = "ssr"))]
use csr::*;

use leptos::{
    children::Children,
    component,
    context::{use_context, Provider},
    prelude::*,
    IntoView,
};

use crate::fetch::{FetchComponent, RouteParams};
use crate::payload::ServerPayload;
use crate::props::PropMap;

/// The wrapper's state machine.
///
/// `fetched` tracks whether a resolution pass has completed for the
/// current params identity; `params` is the last identity seen;
/// `recall_fetch_data` records that no embedded payload was found and
/// the resolver must be invoked; `loader_required` whether a loading
/// indicator should be shown meanwhile.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Lifecycle {
    fetched: bool,
    params: RouteParams,
    recall_fetch_data: bool,
    loader_required: bool,
}

#[cfg_attr(feature = "ssr", allow(dead_code))]
impl Lifecycle {
    pub(crate) fn new(params: RouteParams) -> Self {
        Self {
            fetched: false,
            params,
            recall_fetch_data: false,
            loader_required: false,
        }
    }

    /// Record the latest params.  Moving away from previously recorded
    /// non-empty params invalidates a completed fetch; returns whether
    /// that reset happened.
    pub(crate) fn sync_params(&mut self, next: &RouteParams) -> bool {
        if !self.params.is_empty() && self.params != *next {
            self.params = next.clone();
            self.fetched = false;
            true
        } else {
            if self.params.is_empty() {
                self.params = next.clone();
            }
            false
        }
    }

    /// An embedded payload covered this instance: done, no loader.
    pub(crate) fn embedded_payload(&mut self) {
        self.fetched = true;
        self.recall_fetch_data = false;
        self.loader_required = false;
    }

    /// Nothing was embedded: the resolver must be (re)invoked and a
    /// loader shown until it completes.
    pub(crate) fn missing_payload(&mut self) {
        self.recall_fetch_data = true;
        self.loader_required = true;
    }

    /// A resolution pass finished, successfully or tolerably not.
    pub(crate) fn fetch_complete(&mut self) {
        self.fetched = true;
    }

    pub(crate) fn is_fetched(&self) -> bool {
        self.fetched
    }

    pub(crate) fn must_recall(&self) -> bool {
        self.recall_fetch_data
    }

    pub(crate) fn loading(&self, disabled: bool) -> bool {
        !self.fetched && self.loader_required && !disabled
    }
}

/// What [`SsrFetchData`] exposes to the subtree it wraps: the resolved
/// props for the wrapped descriptor and the loading flag.
#[derive(Clone)]
pub struct FetchState {
    props: ArcReadSignal<PropMap>,
    loading: Signal<bool>,
}

impl FetchState {
    /// The instance's resolved props: the descriptor's defaults,
    /// enriched by the embedded payload or a client-side fetch as they
    /// arrive.
    pub fn props(&self) -> ArcReadSignal<PropMap> {
        self.props.clone()
    }

    /// Whether a client-side fetch is in flight with nothing to show
    /// for it yet.  Always `false` during the server render pass.
    pub fn loading(&self) -> Signal<bool> {
        self.loading
    }
}

/// The [`FetchState`] provided by the nearest enclosing
/// [`SsrFetchData`], if any.
pub fn use_fetch_data() -> Option<FetchState> {
    use_context::<FetchState>()
}

/// As [`use_fetch_data`], panicking when no [`SsrFetchData`] encloses
/// the caller.
pub fn expect_fetch_data() -> FetchState {
    expect_context::<FetchState>()
}

/// Wraps a subtree so its fetch data resolves across SSR and
/// hydration.
///
/// On the server the data is expected to have been resolved up front
/// into a provided [`ServerPayload`]; the matching entry is merged
/// into the instance props and no loader is ever shown.  On the
/// client, the first render pass after hydration consumes the payload
/// entry for the descriptor's name; when none was embedded, the
/// resolver is invoked with a stubbed request context and the subtree
/// sees `loading == true` until it settles.  A change of the params
/// identity invalidates a completed fetch and runs the pass again.
///
/// The wrapped subtree reads the outcome through [`use_fetch_data`];
/// the descriptor itself is also provided as context so the wrapper
/// stays transparent to further composition.
#[component]
pub fn SsrFetchData(
    /// Descriptor for the wrapped subtree.
    component: FetchComponent,
    /// Route-match parameters that define the fetch identity.
    #[prop(into)]
    params: Signal<RouteParams>,
    /// Disables payload probing and fetching for this render.
    #[prop(optional)]
    disable_fetch_data: bool,
    children: Children,
) -> impl IntoView {
    let props = ArcRwSignal::new(component.default_props().clone());
    let lifecycle = ArcRwSignal::new(Lifecycle::new(params.get_untracked()));

    #[cfg(feature = "ssr")]
    {
        // The server resolves data before producing markup; merge
        // whatever the entry point embedded without consuming it, as
        // the payload still has to reach the client intact.
        if let Some(embedded) = ServerPayload::handle().get(component.name()) {
            props.update(|map| map.merge(embedded));
        }
    }

    #[cfg(not(feature = "ssr"))]
    {
        let generation = Arc::new(AtomicUsize::new(0));
        on_cleanup({
            let generation = generation.clone();
            move || {
                // anything still in flight is stale once the instance
                // is gone
                generation.fetch_add(1, Ordering::Relaxed);
            }
        });

        let handle = ServerPayload::handle();
        Effect::new({
            let component = component.clone();
            let props = props.clone();
            let lifecycle = lifecycle.clone();
            move |_| {
                let next = params.get();
                if disable_fetch_data {
                    return;
                }
                lifecycle.update(|lc| {
                    lc.sync_params(&next);
                });
                if lifecycle.with_untracked(Lifecycle::is_fetched) {
                    return;
                }

                if let Some(embedded) = handle.take(component.name()) {
                    props.update(|map| map.merge(embedded));
                    lifecycle.update(Lifecycle::embedded_payload);
                } else {
                    lifecycle.update(Lifecycle::missing_payload);
                }
                if !lifecycle.with_untracked(Lifecycle::must_recall) {
                    return;
                }

                let attempt = generation.fetch_add(1, Ordering::Relaxed) + 1;
                let ctx = FetchContext::new(next).with_request(RequestParts::stub());
                let component = component.clone();
                let props = props.clone();
                let lifecycle = lifecycle.clone();
                let generation = generation.clone();
                spawn_local(async move {
                    let resolved =
                        execute_fetch_data(&component, ctx, &FetchOptions::default()).await;
                    if generation.load(Ordering::Relaxed) != attempt {
                        // the instance re-parameterized or unmounted
                        // while this was in flight; discard rather
                        // than apply
                        return;
                    }
                    match resolved {
                        Ok(fetched) => props.update(|map| map.merge(fetched)),
                        Err(err) => logging::warn!(
                            "failed to fetch props for {}; rendering anyway: {err}",
                            component.name(),
                        ),
                    }
                    lifecycle.update(Lifecycle::fetch_complete);
                });
            }
        });
    }

    let state = FetchState {
        props: props.read_only(),
        loading: Signal::derive({
            let lifecycle = lifecycle.clone();
            move || lifecycle.with(|lc| lc.loading(disable_fetch_data))
        }),
    };

    view! {
        <Provider value=state>
            <Provider value=component>
                {children()}
            </Provider>
        </Provider>
    }
}
