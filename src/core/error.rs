//! Error handling for tera-components
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`ComponentError`]) at library boundaries, so callers can
//!    match on configuration, validation and aggregation failures precisely.
//! 2. **Breadcrumbed render errors** ([`RenderError`]) for anything that escapes a
//!    component render, so a failure deep in a component tree reports the full path
//!    from the outermost to the innermost component.
//!
//! User-supplied hooks (context builders, slot functions, render hooks) return
//! [`anyhow::Result`]. The render engine intercepts those errors once per nesting level
//! and prepends the component's name to the breadcrumb.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tera_components::core::{ComponentError, user_friendly_error};
//!
//! let error = ComponentError::UnknownComponentHash {
//!     hash: "Table_ab12cd".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for component rendering and dependency aggregation.
///
/// All variants are deterministic given the same inputs. Nothing here is retried:
/// configuration and validation problems are programmer errors that should surface
/// during development.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// A component class is configured in a way that cannot be rendered,
    /// e.g. zero or several template sources.
    #[error("{message}")]
    ImproperlyConfigured {
        /// Full description of the misconfiguration
        message: String,
    },

    /// Inputs or context data did not match the component's declared schema.
    #[error("Component '{component}' received an invalid {category}: {message}")]
    Validation {
        /// Name of the component being rendered
        component: String,
        /// Input category (`positional argument`, `keyword argument`, `slot`, `data`)
        category: String,
        /// The specific violation
        message: String,
    },

    /// `input`, `is_filled` or `inject` was used while the component was not rendering.
    #[error("{component}: Tried to access Component's `{accessor}` while outside of rendering execution")]
    OutsideRender {
        /// Name of the component
        component: String,
        /// The accessor that was misused
        accessor: String,
    },

    /// `is_filled` was read before the slot fills of the current frame were resolved.
    #[error("{component}: Tried to access Component's `is_filled` attribute before slots were resolved")]
    SlotsNotResolved {
        /// Name of the component
        component: String,
    },

    /// A dependency marker matched the comment pattern but carried bad data.
    #[error("Malformed dependencies data: '{data}'")]
    MalformedMarker {
        /// The raw marker payload
        data: String,
    },

    /// A marker referenced a class hash that is not (or no longer) registered.
    #[error("Unknown component class hash '{hash}'")]
    UnknownComponentHash {
        /// The unresolvable class hash
        hash: String,
    },

    /// A media tag lacks the attribute that carries its URL.
    #[error(
        "One of entries for `Component.Media.{kind}` media is missing a value for attribute '{attribute}'. \
         If there is content inlined inside the `<{tag_name}>` tags, you must move the content to a `.{kind}` \
         file and reference it via '{attribute}'.\nGot:\n{tag}"
    )]
    MissingMediaUrl {
        /// Asset kind (`js` or `css`)
        kind: String,
        /// Expected attribute (`src` or `href`)
        attribute: String,
        /// Name of the offending tag
        tag_name: String,
        /// The full tag
        tag: String,
    },

    /// Inlined JS/CSS contains a closing tag that would terminate its own wrapper.
    #[error(
        "Content of `Component.{kind}` for component '{component}' contains '</{tag}>' end tag. \
         This is not allowed, as it would break the HTML."
    )]
    ClosingTagInContent {
        /// Component short name
        component: String,
        /// Asset kind (`js` or `css`)
        kind: String,
        /// Wrapper tag name (`script` or `style`)
        tag: String,
    },

    /// Render type string was neither `document` nor `fragment`.
    #[error("Invalid type '{value}'")]
    InvalidRenderType {
        /// The rejected value
        value: String,
    },

    /// A named template does not exist in the template engine.
    #[error("Template '{name}' not found")]
    TemplateNotFound {
        /// Requested template name
        name: String,
    },

    /// The host template engine failed to compile or render a template.
    #[error("Template error: {message}")]
    TemplateError {
        /// Cleaned-up engine message
        message: String,
    },

    /// Content handed to the aggregator could not be converted back to its original type.
    #[error("Content is not valid UTF-8: {message}")]
    InvalidContent {
        /// Decoder message
        message: String,
    },

    /// Configuration file or value problem
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },
}

/// An error raised while rendering a component tree.
///
/// Carries the component names from outermost to innermost and the original error.
/// The display form rewrites the message with a breadcrumb prefix exactly once, no
/// matter how many levels the error travelled through:
///
/// ```text
/// An error occured while rendering components Outer > Inner:
/// KeyError: 'x'
/// ```
#[derive(Debug)]
pub struct RenderError {
    components: Vec<String>,
    source: anyhow::Error,
}

impl RenderError {
    /// Attach `component` to an error escaping its render.
    ///
    /// If the error already is a [`RenderError`] from a nested component, the name is
    /// prepended to the existing breadcrumb instead of wrapping it a second time.
    pub fn wrap(component: &str, error: anyhow::Error) -> Self {
        match error.downcast::<RenderError>() {
            Ok(mut nested) => {
                nested.components.insert(0, component.to_string());
                nested
            }
            Err(other) => Self {
                components: vec![component.to_string()],
                source: other,
            },
        }
    }

    /// Component names, outermost first.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// The error originally raised inside the innermost component.
    pub fn original(&self) -> &anyhow::Error {
        &self.source
    }

    /// Downcast the original error.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.source.downcast_ref::<E>()
    }

    /// Consume the breadcrumb and return the original error.
    pub fn into_inner(self) -> anyhow::Error {
        self.source
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "An error occured while rendering components {}:\n{}",
            self.components.join(" > "),
            self.source
        )
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Error wrapper with a suggestion and details for terminal display.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error message
    pub error: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error context to stderr with terminal colors.
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with actionable suggestions.
///
/// Recognizes [`RenderError`] (by looking at the original error it carries),
/// [`ComponentError`], [`std::io::Error`] and [`toml::de::Error`]. Anything else is
/// displayed with its full context chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(render_error) = error.downcast_ref::<RenderError>() {
        let ctx = ErrorContext::new(render_error.to_string());
        return match render_error.downcast_ref::<ComponentError>() {
            Some(inner) => with_component_hints(ctx, inner),
            None => ctx,
        };
    }

    if let Some(component_error) = error.downcast_ref::<ComponentError>() {
        return with_component_hints(ErrorContext::new(component_error.to_string()), component_error);
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        if io_error.kind() == std::io::ErrorKind::NotFound {
            return ErrorContext::new(format!("{error:#}"))
                .with_suggestion("Check that the file exists and the path is correct");
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(format!("{error:#}"))
            .with_details(toml_error.to_string())
            .with_suggestion("Check the TOML syntax. Verify quotes, brackets, and table names");
    }

    ErrorContext::new(format!("{error:#}"))
}

fn with_component_hints(ctx: ErrorContext, error: &ComponentError) -> ErrorContext {
    match error {
        ComponentError::ImproperlyConfigured { .. } => ctx.with_suggestion(
            "Set exactly one of 'template_name', 'get_template_name', 'template' or 'get_template'",
        ),
        ComponentError::UnknownComponentHash { .. } => ctx
            .with_details("Markers can only be resolved for component classes rendered or registered in this process")
            .with_suggestion("Pass the component manifest with --manifest so its classes are registered"),
        ComponentError::MissingMediaUrl { .. } => {
            ctx.with_suggestion("Move inline content into a separate file and reference it by URL")
        }
        ComponentError::TemplateNotFound { .. } => {
            ctx.with_suggestion("Check 'template_dirs' in components.toml and the template name")
        }
        ComponentError::ConfigError { .. } => {
            ctx.with_suggestion("Check components.toml or the TCOMP_CONFIG_PATH environment variable")
        }
        _ => ctx,
    }
}
