//! Shared constants for markers, placeholders and cache keys.

/// Format of the marker comment embedded before every rendered component.
///
/// The data part is `{class_hash},{component_id}`.
pub const COMPONENT_DEPS_COMMENT_PREFIX: &str = "<!-- _RENDERED ";

/// Closing part of the marker comment.
pub const COMPONENT_DEPS_COMMENT_SUFFIX: &str = " -->";

/// Placeholder replaced by the aggregated CSS.
pub const CSS_DEPENDENCY_PLACEHOLDER: &str = r#"<link name="CSS_PLACEHOLDER">"#;

/// Placeholder replaced by the aggregated JS.
pub const JS_DEPENDENCY_PLACEHOLDER: &str = r#"<script name="JS_PLACEHOLDER"></script>"#;

/// Prefix of every asset cache key: `__components:{class_hash}:{kind}`.
pub const CACHE_KEY_PREFIX: &str = "__components";

/// Number of hex digits of the import-path digest kept in a class hash.
pub const CLASS_HASH_DIGEST_LEN: usize = 6;

/// Context key under which `provide` publishes values for `inject`.
pub const INJECT_CONTEXT_KEY_PREFIX: &str = "_DJC_INJECT__";

/// Private context key holding the outer (root) context snapshot.
pub const ROOT_CTX_CONTEXT_KEY: &str = "_DJC_ROOT_CTX";

/// Private context key holding the name of the component being rendered.
pub const COMPONENT_NAME_CONTEXT_KEY: &str = "_DJC_COMPONENT_NAME";

/// Render-state key marking renders that happen inside an `{% extends %}` block.
pub const BLOCK_CONTEXT_KEY: &str = "block_context";

/// Public template variable with per-render component state.
pub const COMPONENT_VARS_KEY: &str = "component_vars";

/// Public template variable with the rendered slot fills.
pub const SLOTS_KEY: &str = "slots";

/// Default location of the components configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "components.toml";

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "TCOMP_CONFIG_PATH";
