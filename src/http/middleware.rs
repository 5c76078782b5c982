//! Response hook that runs dependency aggregation once per HTML response.

use crate::component::ComponentEnv;
use crate::core::ComponentError;
use crate::dependencies::{RenderType, render_dependencies};

use super::{Request, Response};

/// Applies [`render_dependencies`] to outgoing `text/html` responses.
#[derive(Clone)]
pub struct DependencyMiddleware {
    env: ComponentEnv,
}

impl DependencyMiddleware {
    /// Create the middleware.
    pub fn new(env: ComponentEnv) -> Self {
        Self { env }
    }

    /// `Fragment` when the request carries the configured partial-request header set to
    /// `true`, `Document` otherwise.
    pub fn render_type_for(&self, request: &Request) -> RenderType {
        let header = &self.env.config().fragment_header;
        match request.header(header) {
            Some(value) if value.trim().eq_ignore_ascii_case("true") => RenderType::Fragment,
            _ => RenderType::Document,
        }
    }

    /// Rewrite the response body. Non-HTML responses pass through untouched.
    pub fn process_response(
        &self,
        request: &Request,
        mut response: Response,
    ) -> Result<Response, ComponentError> {
        if !response.is_html() {
            return Ok(response);
        }

        let render_type = self.render_type_for(request);
        tracing::debug!("Processing dependencies for {} as {}", request.path, render_type);
        response.body = render_dependencies(&self.env, response.body, render_type)?;
        Ok(response)
    }
}
