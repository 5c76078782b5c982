//! Serves a component class as an HTTP view.

use std::sync::Arc;

use crate::component::{Component, ComponentClass, ComponentEnv, ComponentHooks};
use crate::core::RenderError;

use super::{Request, Response};

/// Dispatches requests to the method handlers of a component's hooks.
///
/// Every request gets a fresh [`Component`] instance, so one view can serve concurrent
/// requests. Created with [`ComponentClass::as_view`].
#[derive(Clone)]
pub struct ComponentView {
    class: Arc<ComponentClass>,
    env: ComponentEnv,
}

impl std::fmt::Debug for ComponentView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentView").field("component", &self.class.name()).finish()
    }
}

impl ComponentView {
    /// View over `class` rendering with `env`.
    pub fn new(class: Arc<ComponentClass>, env: ComponentEnv) -> Self {
        Self { class, env }
    }

    /// The served component class.
    pub fn class(&self) -> &Arc<ComponentClass> {
        &self.class
    }

    /// Handle a request.
    ///
    /// `GET`, `POST`, `PUT`, `PATCH` and `DELETE` go to the matching hook. A hook that
    /// returns `None`, or any other method, yields `405`.
    ///
    /// # Errors
    ///
    /// Errors raised by the handler, wrapped as a [`RenderError`] naming the component.
    pub fn handle(&self, request: &Request) -> Result<Response, RenderError> {
        let component = Component::new(Arc::clone(&self.class), self.env.clone());
        let hooks = self.class.hooks();

        let handled =
            dispatch(hooks, &component, request).map_err(|e| RenderError::wrap(component.name(), e))?;
        match handled {
            Some(response) => Ok(response),
            None => {
                tracing::debug!("{} does not handle {} requests", self.class.name(), request.method);
                Ok(Response::empty(405))
            }
        }
    }
}

fn dispatch(
    hooks: &dyn ComponentHooks,
    component: &Component,
    request: &Request,
) -> anyhow::Result<Option<Response>> {
    match request.method.as_str() {
        "GET" => hooks.get(component, request),
        "POST" => hooks.post(component, request),
        "PUT" => hooks.put(component, request),
        "PATCH" => hooks.patch(component, request),
        "DELETE" => hooks.delete(component, request),
        _ => Ok(None),
    }
}
