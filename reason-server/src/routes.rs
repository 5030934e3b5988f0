//! Capability dispatch: resource handlers to axum routes.
//!
//! [`Server::add`] asks a handler for its [`Capabilities`] once and
//! registers one route per filled slot:
//!
//! | Method   | Path          | Slot                  | Success |
//! |----------|---------------|-----------------------|---------|
//! | `GET`    | `/{path}/{id}`| getter                | 200     |
//! | `GET`    | `/{path}`     | lister                | 200     |
//! | `POST`   | `/{path}`     | creator               | 201     |
//! | `PUT`    | `/{path}`     | creator               | 201     |
//! | `POST`   | `/{path}/{id}`| updater (fetch first) | 200     |
//! | `DELETE` | `/{path}/{id}`| deleter (fetch first) | 200     |
//!
//! Everything else, including a known path with an unregistered method,
//! answers `404`. `GET` routes do not answer `HEAD`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{FromRequest, Path, Request},
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put, MethodRouter},
    Router,
};
use indexmap::IndexMap;
use reason_core::{
    decode, Creator, Deleter, FieldCache, FormValues, Getter, Lister, ResourceHandler, Schema,
    Updater,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::ServerConfig,
    error::ServerError,
    redirect::{not_found_or_redirect, RouteTable},
    writer::{write_empty, write_resource},
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// ── Form extraction ───────────────────────────────────────────────────────────

/// Form values of a request: urlencoded body pairs first, then query pairs.
///
/// The body is only read when the content type is
/// `application/x-www-form-urlencoded`; other bodies are ignored.
#[derive(Debug, Clone, Default)]
pub struct RequestForm(pub FormValues);

impl<S: Send + Sync> FromRequest<S> for RequestForm {
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query = req.uri().query().map(str::to_owned);
        let mut values = FormValues::new();

        if is_form_encoded(&req) {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            values.extend_urlencoded(&body);
        }
        if let Some(query) = query {
            values.extend_urlencoded(query.as_bytes());
        }
        Ok(Self(values))
    }
}

fn is_form_encoded(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

// ── Server ────────────────────────────────────────────────────────────────────

/// Builder that collects resource routes before serving.
///
/// Registration happens up front; [`Server::into_router`] freezes the routes
/// into an immutable [`Router`].
pub struct Server {
    config: ServerConfig,
    cache: Arc<FieldCache>,
    routes: IndexMap<String, MethodRouter>,
    table: RouteTable,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    /// Create a server with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    #[must_use]
    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            config,
            cache: Arc::new(FieldCache::new()),
            routes: IndexMap::new(),
            table: RouteTable::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Schema field cache shared by every decoding route.
    #[must_use]
    pub fn field_cache(&self) -> &Arc<FieldCache> {
        &self.cache
    }

    /// Registered `(method, pattern)` pairs, in registration order.
    #[must_use]
    pub fn route_table(&self) -> &RouteTable {
        &self.table
    }

    /// Register a resource handler under `/{handler.path()}`.
    ///
    /// # Panics
    /// Panics if the same method and pattern are registered twice.
    pub fn add<H: ResourceHandler>(&mut self, handler: H) -> &mut Self {
        self.add_shared(Arc::new(handler))
    }

    /// Like [`Server::add`], for a handler the caller keeps a reference to.
    ///
    /// # Panics
    /// Panics if the same method and pattern are registered twice.
    pub fn add_shared<H: ResourceHandler>(&mut self, handler: Arc<H>) -> &mut Self {
        let segment = handler.path().trim_matches('/').to_owned();
        let collection = format!("/{segment}");
        let item = format!("{}/{{id}}", collection.trim_end_matches('/'));
        let capabilities = handler.capabilities();

        if capabilities.is_empty() {
            tracing::warn!(path = %collection, "resource handler exposes no capabilities");
        }

        if let Some(getter) = capabilities.getter() {
            let getter = Arc::clone(getter);
            self.register(
                Method::GET,
                &item,
                get(move |Path(id): Path<String>| {
                    let getter = Arc::clone(&getter);
                    async move { get_request(getter.as_ref(), &id).await }
                }),
            );
        }

        if let Some(lister) = capabilities.lister() {
            let lister = Arc::clone(lister);
            self.register(
                Method::GET,
                &collection,
                get(move || {
                    let lister = Arc::clone(&lister);
                    async move { list_request(lister.as_ref()).await }
                }),
            );
        }

        if let Some(creator) = capabilities.creator() {
            let creator = Arc::clone(creator);
            let cache = Arc::clone(&self.cache);
            let create = move |RequestForm(form): RequestForm| {
                let creator = Arc::clone(&creator);
                let cache = Arc::clone(&cache);
                async move { create_request(creator.as_ref(), &cache, &form).await }
            };
            self.register(Method::POST, &collection, post(create.clone()));
            self.register(Method::PUT, &collection, put(create));
        }

        if let Some(updater) = capabilities.updater() {
            let updater = Arc::clone(updater);
            let cache = Arc::clone(&self.cache);
            self.register(
                Method::POST,
                &item,
                post(move |Path(id): Path<String>, RequestForm(form): RequestForm| {
                    let updater = Arc::clone(&updater);
                    let cache = Arc::clone(&cache);
                    async move { update_request(updater.as_ref(), &cache, &id, &form).await }
                }),
            );
        }

        if let Some(deleter) = capabilities.deleter() {
            let deleter = Arc::clone(deleter);
            self.register(
                Method::DELETE,
                &item,
                delete(move |Path(id): Path<String>| {
                    let deleter = Arc::clone(&deleter);
                    async move { delete_request(deleter.as_ref(), &id).await }
                }),
            );
        }

        self
    }

    fn register(&mut self, method: Method, pattern: &str, route: MethodRouter) {
        tracing::debug!(%method, path = %pattern, "registered route");
        self.table.insert(method, pattern);
        let route = match self.routes.shift_remove(pattern) {
            Some(existing) => existing.merge(route),
            None => route,
        };
        self.routes.insert(pattern.to_owned(), route);
    }

    /// Freeze the registered routes into a router ready to serve.
    pub fn into_router(self) -> Router {
        let table = self.config.redirect_trailing_slash.then(|| Arc::new(self.table));

        // axum answers HEAD with the GET handler unless HEAD has its own.
        let mut router = Router::new();
        for (pattern, route) in self.routes {
            router = router.route(&pattern, route.head(not_found).fallback(not_found));
        }

        let router = router
            .fallback(move |method: Method, uri: Uri| {
                let table = table.clone();
                async move { not_found_or_redirect(table.as_deref(), &method, &uri) }
            })
            .layer(TraceLayer::new_for_http());

        if self.config.permissive_cors {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }
}

async fn not_found() -> Response {
    write_empty(StatusCode::NOT_FOUND)
}

// ── Request pipelines ─────────────────────────────────────────────────────────

async fn get_request<R: Serialize>(
    getter: &dyn Getter<R>,
    id: &str,
) -> Result<Response, ServerError> {
    let resource = getter.get_resource(id).await?;
    write_resource(StatusCode::OK, &resource)
}

async fn list_request<R: Serialize>(lister: &dyn Lister<R>) -> Result<Response, ServerError> {
    let list = lister.list_resource().await?;
    write_resource(StatusCode::OK, &list)
}

async fn create_request<R: Serialize, S: Schema>(
    creator: &dyn Creator<R, S>,
    cache: &FieldCache,
    form: &FormValues,
) -> Result<Response, ServerError> {
    let input = decode::<S>(cache, form)?;
    let created = creator.create_resource(input).await?;
    write_resource(StatusCode::CREATED, &created)
}

/// Fetch, decode, update. An unknown id answers `404` before the form is
/// looked at and before the updater runs.
async fn update_request<R: Serialize, S: Schema>(
    updater: &dyn Updater<R, S>,
    cache: &FieldCache,
    id: &str,
    form: &FormValues,
) -> Result<Response, ServerError> {
    let existing = updater.get_resource(id).await?;
    let input = decode::<S>(cache, form)?;
    let updated = updater.update_resource(existing, input).await?;
    write_resource(StatusCode::OK, &updated)
}

async fn delete_request<R>(deleter: &dyn Deleter<R>, id: &str) -> Result<Response, ServerError> {
    let existing = deleter.get_resource(id).await?;
    deleter.delete_resource(existing).await?;
    Ok(write_empty(StatusCode::OK))
}
