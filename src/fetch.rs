//! The fetch resolver: component descriptors carrying a fetch
//! capability, and the functions that resolve one descriptor or a whole
//! dependency tree of them into prop maps.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use indexmap::IndexMap;
use leptos::logging;
use serde::{Deserialize, Serialize};

use crate::props::{PropMap, PropValue, ERROR_PROP};

#[cfg(feature = "ssr")]
use crate::payload::ServerPayload;

/// Route-match parameters, as an insertion-ordered string map.
///
/// Equality of this value is the "params identity" that decides whether
/// a previously completed fetch is still valid; the lifecycle wrapper
/// re-fetches when it changes.  The map is threaded in explicitly by
/// the caller (typically derived from the router's matched params)
/// rather than looked up ambiently.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteParams(IndexMap<String, String>);

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }
}

impl Deref for RouteParams {
    type Target = IndexMap<String, String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for RouteParams {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<K, V> FromIterator<(K, V)> for RouteParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// The slice of an incoming request that fetchers may want to inspect.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestParts {
    pub uri: String,
    pub headers: Vec<(String, String)>,
}

impl RequestParts {
    /// An empty stand-in for the request context that a real server
    /// render pass would supply.  The lifecycle wrapper passes this
    /// when it triggers a fetch from the client itself; it is not a
    /// faithful request, merely a placeholder so fetchers written
    /// against the server signature keep working.
    pub fn stub() -> Self {
        Self::default()
    }
}

/// The slice of the outgoing response that fetchers may want to touch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResponseParts {
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
}

/// Everything handed to a [`Fetcher`] for one resolution pass.
#[derive(Clone, Debug, Default)]
pub struct FetchContext {
    pub params: RouteParams,
    pub request: Option<RequestParts>,
    pub response: Option<ResponseParts>,
}

impl FetchContext {
    pub fn new(params: RouteParams) -> Self {
        Self {
            params,
            request: None,
            response: None,
        }
    }

    pub fn with_request(mut self, request: RequestParts) -> Self {
        self.request = Some(request);
        self
    }

    pub fn with_response(mut self, response: ResponseParts) -> Self {
        self.response = Some(response);
        self
    }
}

/// Future yielded by the single form of a fetch result.
pub type SingleFuture = BoxFuture<'static, Result<PropMap, String>>;
/// Future yielded by each entry of the named form of a fetch result.
pub type NamedFuture = BoxFuture<'static, Result<PropValue, String>>;
/// One pending resolution in a dependency tree, tagged with the
/// component name it belongs to.
pub type ResolveFuture = BoxFuture<'static, Result<(String, PropMap), FetchDataError>>;

/// What a fetch capability returns, decided by the component author.
///
/// The two shapes resolve differently:
///
/// - `Single` is awaited directly; on success every key of the
///   returned map becomes a prop, on rejection the [`ERROR_PROP`]
///   marker is recorded instead and resolution still succeeds.
/// - `Named` waits for **all** entries to settle, never short-circuiting
///   on the first rejection.  A fulfilled entry stores its value, a
///   rejected entry stores its reason as [`PropValue::Error`].  Prop
///   order follows entry order.
pub enum FetchResult {
    Single(SingleFuture),
    Named(Vec<(String, NamedFuture)>),
}

impl FetchResult {
    pub fn single<F>(fut: F) -> Self
    where
        F: Future<Output = Result<PropMap, String>> + Send + 'static,
    {
        FetchResult::Single(Box::pin(fut))
    }
}

/// Builder for the named form of [`FetchResult`].
#[derive(Default)]
pub struct NamedFetch {
    entries: Vec<(String, NamedFuture)>,
}

impl NamedFetch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one named future; entry order is prop order.
    pub fn entry<F>(mut self, key: impl Into<String>, fut: F) -> Self
    where
        F: Future<Output = Result<PropValue, String>> + Send + 'static,
    {
        self.entries.push((key.into(), Box::pin(fut)));
        self
    }
}

impl From<NamedFetch> for FetchResult {
    fn from(named: NamedFetch) -> Self {
        FetchResult::Named(named.entries)
    }
}

/// The fetch capability of a component: produces the data the
/// component needs before it can render meaningfully.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, ctx: &FetchContext) -> FetchResult;
}

impl<F> Fetcher for F
where
    F: Fn(&FetchContext) -> FetchResult + Send + Sync,
{
    fn fetch(&self, ctx: &FetchContext) -> FetchResult {
        self(ctx)
    }
}

/// Options applied across a resolution pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchOptions {
    /// Log a diagnostic for every rejected entry of a named fetch.
    pub debug: bool,
}

/// Error produced by [`execute_fetch_data`].
#[derive(Debug, thiserror::Error)]
pub enum FetchDataError {
    /// The descriptor carries no fetch capability; asking it to resolve
    /// one is a contract violation on the caller's part, not a failed
    /// fetch.
    #[error("fetch data not defined for component `{0}`")]
    NotFetchable(String),
}

/// A renderable unit's descriptor as far as data fetching is
/// concerned: a display name, its default props, an optional fetch
/// capability and the ordered child descriptors whose own capabilities
/// must also resolve before this one is considered fully loaded.
///
/// Descriptors are cheap `Arc` clones; the chainable constructors copy
/// on write, so build the descriptor up front and clone it freely
/// afterwards.  Default props are never mutated by a resolution pass;
/// each pass yields a fresh [`PropMap`] with the defaults already
/// merged in.
#[derive(Clone)]
pub struct FetchComponent {
    inner: Arc<FetchComponentInner>,
}

#[derive(Clone)]
struct FetchComponentInner {
    name: Cow<'static, str>,
    default_props: PropMap,
    fetcher: Option<Arc<dyn Fetcher>>,
    waits_for: Vec<FetchComponent>,
    wrapped: Option<FetchComponent>,
}

impl FetchComponent {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            inner: Arc::new(FetchComponentInner {
                name: name.into(),
                default_props: PropMap::new(),
                fetcher: None,
                waits_for: Vec::new(),
                wrapped: None,
            }),
        }
    }

    /// A descriptor standing in front of another, as a wrapping
    /// component does.  Name, capability, children and defaults all
    /// pass through to the wrapped descriptor, keeping the wrapper
    /// transparent to further composition.
    pub fn wrapping(component: FetchComponent) -> Self {
        Self {
            inner: Arc::new(FetchComponentInner {
                name: component.inner.name.clone(),
                default_props: PropMap::new(),
                fetcher: None,
                waits_for: Vec::new(),
                wrapped: Some(component),
            }),
        }
    }

    pub fn with_default_props(mut self, props: PropMap) -> Self {
        Arc::make_mut(&mut self.inner).default_props = props;
        self
    }

    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        Arc::make_mut(&mut self.inner).fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Declare a child whose fetch capability must resolve alongside
    /// this component's own.  Declaration order is resolution order.
    pub fn waits_for(mut self, child: FetchComponent) -> Self {
        Arc::make_mut(&mut self.inner).waits_for.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn default_props(&self) -> &PropMap {
        if self.inner.default_props.is_empty() {
            if let Some(wrapped) = &self.inner.wrapped {
                return wrapped.default_props();
            }
        }
        &self.inner.default_props
    }

    pub fn fetcher(&self) -> Option<Arc<dyn Fetcher>> {
        self.inner
            .fetcher
            .clone()
            .or_else(|| self.inner.wrapped.as_ref().and_then(FetchComponent::fetcher))
    }

    pub fn is_fetchable(&self) -> bool {
        self.fetcher().is_some()
    }

    pub fn children(&self) -> &[FetchComponent] {
        if self.inner.waits_for.is_empty() {
            if let Some(wrapped) = &self.inner.wrapped {
                return wrapped.children();
            }
        }
        &self.inner.waits_for
    }

    /// Follow the wrapping indirection down to the innermost
    /// descriptor.
    pub fn unwrapped(&self) -> &FetchComponent {
        let mut node = self;
        while let Some(wrapped) = node.inner.wrapped.as_ref() {
            node = wrapped;
        }
        node
    }
}

impl fmt::Debug for FetchComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchComponent")
            .field("name", &self.inner.name)
            .field("fetchable", &self.is_fetchable())
            .field("default_props", &self.inner.default_props)
            .field("waits_for", &self.inner.waits_for)
            .field("wrapped", &self.inner.wrapped)
            .finish()
    }
}

/// Resolve a single component's fetch capability into a prop map.
///
/// The returned map starts from the component's default props and is
/// enriched by whatever the capability produced, later keys winning.
/// A missing capability is the only hard error; a rejecting fetch is
/// tolerated and recorded as data (see [`FetchResult`]), so the
/// component can still render with partial or absent data.
pub async fn execute_fetch_data(
    component: &FetchComponent,
    ctx: FetchContext,
    options: &FetchOptions,
) -> Result<PropMap, FetchDataError> {
    let Some(fetcher) = component.fetcher() else {
        return Err(FetchDataError::NotFetchable(component.name().to_string()));
    };

    let mut props = component.default_props().clone();

    match fetcher.fetch(&ctx) {
        FetchResult::Single(fut) => match fut.await {
            Ok(fetched) => props.merge(fetched),
            Err(reason) => {
                logging::warn!("fetch failed for {}", component.name());
                props.insert(ERROR_PROP, PropValue::error(reason));
            }
        },
        FetchResult::Named(entries) => {
            let (keys, futures): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
            // every entry settles before any prop is recorded
            let settled = join_all(futures).await;
            for (index, (key, outcome)) in keys.into_iter().zip(settled).enumerate() {
                match outcome {
                    Ok(value) => {
                        props.insert(key, value);
                    }
                    Err(reason) => {
                        if options.debug {
                            logging::warn!(
                                "fetch #{} in {} returned: {}",
                                index + 1,
                                component.name(),
                                reason,
                            );
                        }
                        props.insert(key, PropValue::error(reason));
                    }
                }
            }
        }
    }

    Ok(props)
}

/// Build the list of pending resolutions for a whole dependency tree.
///
/// Walks the descriptor and every descendant declared through
/// [`waits_for`](FetchComponent::waits_for), unwrapping any wrapping
/// indirection, and produces exactly one future per descendant that
/// carries a fetch capability, in declaration order.  The caller waits
/// on them collectively.
pub fn fetch_data(
    component: &FetchComponent,
    ctx: &FetchContext,
    options: &FetchOptions,
) -> Vec<ResolveFuture> {
    let mut futures = Vec::new();
    collect(component, ctx, options, &mut futures);
    futures
}

fn collect(
    node: &FetchComponent,
    ctx: &FetchContext,
    options: &FetchOptions,
    futures: &mut Vec<ResolveFuture>,
) {
    let target = node.unwrapped();

    if target.is_fetchable() {
        let component = target.clone();
        let ctx = ctx.clone();
        let options = *options;
        futures.push(Box::pin(async move {
            let props = execute_fetch_data(&component, ctx, &options).await?;
            Ok((component.name().to_string(), props))
        }));
    }

    for child in target.children() {
        collect(child, ctx, options, futures);
    }
}

/// Resolve a dependency tree and collect the outcome into a
/// [`ServerPayload`] keyed by component name, ready for the server
/// rendering entry point to embed into the page.
#[cfg(feature = "ssr")]
pub async fn resolve_to_payload(
    component: &FetchComponent,
    ctx: &FetchContext,
    options: &FetchOptions,
) -> ServerPayload {
    let payload = ServerPayload::new();
    for outcome in join_all(fetch_data(component, ctx, options)).await {
        match outcome {
            Ok((name, props)) => payload.insert(name, props),
            Err(err) => logging::warn!("skipping unresolvable component: {err}"),
        }
    }
    payload
}
