//! Resource handler capabilities.
//!
//! A handler exposes any subset of five operations. Each operation is its
//! own trait; the handler lists the ones it implements by filling the
//! matching slots of a [`Capabilities`] record, and the server registers a
//! route per filled slot.
//!
//! `R` is the resource type returned to clients, `S` the schema type decoded
//! from form input.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;

use crate::{error::ResourceError, schema::Schema};

/// Fetch a single resource by id. Exposed as `GET /{path}/{id}`.
#[async_trait]
pub trait Getter<R>: Send + Sync {
    /// # Errors
    /// Returns [`ResourceError::NotFound`] for an unknown id.
    async fn get_resource(&self, id: &str) -> Result<R, ResourceError>;
}

/// List every resource. Exposed as `GET /{path}`.
#[async_trait]
pub trait Lister<R>: Send + Sync {
    async fn list_resource(&self) -> Result<Vec<R>, ResourceError>;
}

/// Create a resource from decoded form input. Exposed as `POST /{path}` and
/// `PUT /{path}`.
#[async_trait]
pub trait Creator<R, S>: Send + Sync {
    async fn create_resource(&self, input: S) -> Result<R, ResourceError>;
}

/// Update an existing resource. Exposed as `POST /{path}/{id}`.
///
/// The server fetches the resource through [`Getter`] first; this method is
/// only called for ids that exist.
#[async_trait]
pub trait Updater<R, S>: Getter<R> {
    async fn update_resource(&self, existing: R, input: S) -> Result<R, ResourceError>;
}

/// Delete an existing resource. Exposed as `DELETE /{path}/{id}`.
///
/// Like [`Updater`], only called after a successful fetch.
#[async_trait]
pub trait Deleter<R>: Getter<R> {
    async fn delete_resource(&self, existing: R) -> Result<(), ResourceError>;
}

/// A resource family served under a single path segment.
pub trait ResourceHandler: Send + Sync + 'static {
    /// Type written to clients as JSON.
    type Resource: Serialize + Send + 'static;
    /// Type decoded from form input on create and update.
    type Schema: Schema;

    /// Path segment, without slashes, e.g. `"widgets"`.
    fn path(&self) -> &str;

    /// Capabilities this handler implements. The default exposes nothing.
    fn capabilities(self: Arc<Self>) -> Capabilities<Self::Resource, Self::Schema> {
        Capabilities::none()
    }
}

/// Fixed record of optional operation slots.
pub struct Capabilities<R, S> {
    getter: Option<Arc<dyn Getter<R>>>,
    lister: Option<Arc<dyn Lister<R>>>,
    creator: Option<Arc<dyn Creator<R, S>>>,
    updater: Option<Arc<dyn Updater<R, S>>>,
    deleter: Option<Arc<dyn Deleter<R>>>,
}

impl<R: 'static, S: 'static> Capabilities<R, S> {
    /// An empty record: no routes will be registered.
    #[must_use]
    pub fn none() -> Self {
        Self { getter: None, lister: None, creator: None, updater: None, deleter: None }
    }

    /// Fill all five slots with one handler.
    #[must_use]
    pub fn all<H>(handler: Arc<H>) -> Self
    where
        H: Lister<R> + Creator<R, S> + Updater<R, S> + Deleter<R> + 'static,
    {
        Self::none()
            .with_getter(Arc::clone(&handler))
            .with_lister(Arc::clone(&handler))
            .with_creator(Arc::clone(&handler))
            .with_updater(Arc::clone(&handler))
            .with_deleter(handler)
    }

    #[must_use]
    pub fn with_getter<G: Getter<R> + 'static>(mut self, getter: Arc<G>) -> Self {
        self.getter = Some(getter as Arc<dyn Getter<R>>);
        self
    }

    #[must_use]
    pub fn with_lister<L: Lister<R> + 'static>(mut self, lister: Arc<L>) -> Self {
        self.lister = Some(lister as Arc<dyn Lister<R>>);
        self
    }

    #[must_use]
    pub fn with_creator<C: Creator<R, S> + 'static>(mut self, creator: Arc<C>) -> Self {
        self.creator = Some(creator as Arc<dyn Creator<R, S>>);
        self
    }

    #[must_use]
    pub fn with_updater<U: Updater<R, S> + 'static>(mut self, updater: Arc<U>) -> Self {
        self.updater = Some(updater as Arc<dyn Updater<R, S>>);
        self
    }

    #[must_use]
    pub fn with_deleter<D: Deleter<R> + 'static>(mut self, deleter: Arc<D>) -> Self {
        self.deleter = Some(deleter as Arc<dyn Deleter<R>>);
        self
    }
}

impl<R, S> Capabilities<R, S> {
    #[must_use]
    pub fn getter(&self) -> Option<&Arc<dyn Getter<R>>> {
        self.getter.as_ref()
    }

    #[must_use]
    pub fn lister(&self) -> Option<&Arc<dyn Lister<R>>> {
        self.lister.as_ref()
    }

    #[must_use]
    pub fn creator(&self) -> Option<&Arc<dyn Creator<R, S>>> {
        self.creator.as_ref()
    }

    #[must_use]
    pub fn updater(&self) -> Option<&Arc<dyn Updater<R, S>>> {
        self.updater.as_ref()
    }

    #[must_use]
    pub fn deleter(&self) -> Option<&Arc<dyn Deleter<R>>> {
        self.deleter.as_ref()
    }

    /// Returns `true` if no slot is filled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.getter.is_none()
            && self.lister.is_none()
            && self.creator.is_none()
            && self.updater.is_none()
            && self.deleter.is_none()
    }
}

impl<R, S> fmt::Debug for Capabilities<R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("getter", &self.getter.is_some())
            .field("lister", &self.lister.is_some())
            .field("creator", &self.creator.is_some())
            .field("updater", &self.updater.is_some())
            .field("deleter", &self.deleter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReadOnly;

    #[async_trait]
    impl Getter<u32> for ReadOnly {
        async fn get_resource(&self, id: &str) -> Result<u32, ResourceError> {
            id.parse().map_err(|_| ResourceError::NotFound)
        }
    }

    struct Full;

    #[async_trait]
    impl Getter<u32> for Full {
        async fn get_resource(&self, _id: &str) -> Result<u32, ResourceError> {
            Ok(1)
        }
    }

    #[async_trait]
    impl Lister<u32> for Full {
        async fn list_resource(&self) -> Result<Vec<u32>, ResourceError> {
            Ok(vec![1, 2])
        }
    }

    #[async_trait]
    impl Creator<u32, String> for Full {
        async fn create_resource(&self, input: String) -> Result<u32, ResourceError> {
            Ok(u32::try_from(input.len()).unwrap_or(u32::MAX))
        }
    }

    #[async_trait]
    impl Updater<u32, String> for Full {
        async fn update_resource(&self, existing: u32, _input: String) -> Result<u32, ResourceError> {
            Ok(existing + 1)
        }
    }

    #[async_trait]
    impl Deleter<u32> for Full {
        async fn delete_resource(&self, _existing: u32) -> Result<(), ResourceError> {
            Ok(())
        }
    }

    #[test]
    fn capabilities_none_is_empty() {
        let caps: Capabilities<u32, String> = Capabilities::none();
        assert!(caps.is_empty());
        assert!(caps.getter().is_none());
    }

    #[test]
    fn capabilities_fill_only_requested_slots() {
        let caps: Capabilities<u32, String> = Capabilities::none().with_getter(Arc::new(ReadOnly));
        assert!(!caps.is_empty());
        assert!(caps.getter().is_some());
        assert!(caps.lister().is_none());
        assert!(caps.creator().is_none());
        assert!(caps.updater().is_none());
        assert!(caps.deleter().is_none());
        assert_eq!(
            format!("{caps:?}"),
            "Capabilities { getter: true, lister: false, creator: false, updater: false, deleter: false }"
        );
    }

    #[tokio::test]
    async fn capabilities_all_dispatches_to_handler() {
        let caps: Capabilities<u32, String> = Capabilities::all(Arc::new(Full));
        let Some(updater) = caps.updater() else { panic!("updater slot must be filled") };
        let existing = match updater.get_resource("x").await {
            Ok(v) => v,
            Err(e) => panic!("get failed: {e}"),
        };
        match updater.update_resource(existing, "input".to_owned()).await {
            Ok(v) => assert_eq!(v, 2),
            Err(e) => panic!("update failed: {e}"),
        }
        let Some(lister) = caps.lister() else { panic!("lister slot must be filled") };
        assert!(matches!(lister.list_resource().await, Ok(list) if list == vec![1, 2]));
    }

    #[tokio::test]
    async fn getter_reports_not_found() {
        let result = ReadOnly.get_resource("nope").await;
        assert!(matches!(result, Err(ResourceError::NotFound)));
    }
}
