//! Serves cached component JS/CSS by class hash.

use crate::component::ComponentEnv;
use crate::dependencies::ScriptKind;
use crate::dependencies::cache::get_cached;

use super::{Request, Response};

/// Handler for `GET {cache_url_prefix}/{class_hash}.{kind}`.
#[derive(Clone)]
pub struct CacheEndpoint {
    env: ComponentEnv,
}

impl CacheEndpoint {
    /// Create the endpoint over the environment's cache.
    pub fn new(env: ComponentEnv) -> Self {
        Self { env }
    }

    /// Whether `path` is under the endpoint's prefix.
    pub fn matches(&self, path: &str) -> bool {
        self.parse_path(path).is_some()
    }

    fn parse_path<'a>(&self, path: &'a str) -> Option<&'a str> {
        let prefix = self.env.config().cache_prefix();
        path.strip_prefix(prefix)?.strip_prefix('/').filter(|rest| !rest.contains('/'))
    }

    /// Handle a request.
    ///
    /// - non-`GET`: `405` with `Allow: GET`
    /// - unknown path, unknown kind or cache miss: `404`
    /// - otherwise `200` with the cached content
    pub fn handle(&self, request: &Request) -> Response {
        if request.method != "GET" {
            return Response::empty(405).with_header("Allow", "GET");
        }

        let Some(file) = self.parse_path(&request.path) else {
            return Response::empty(404);
        };
        let Some((class_hash, ext)) = file.rsplit_once('.') else {
            return Response::empty(404);
        };
        let Some(kind) = ScriptKind::from_extension(ext) else {
            return Response::empty(404);
        };

        match get_cached(self.env.cache().as_ref(), class_hash, kind) {
            Some(content) => {
                tracing::debug!("Serving cached {} for {}", kind, class_hash);
                Response::new(200, kind.content_type(), content)
            }
            None => Response::empty(404),
        }
    }
}
