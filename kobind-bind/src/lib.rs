//! Server-side rendering of `data-bind` templates.
//!
//! A template is parsed into a [`Document`], its `<!-- ko -->` blocks are
//! normalized into elements, loops are expanded against a stack of data
//! scopes, and the remaining directives are applied in place. Directives
//! that cannot be resolved stay in the markup for the client-side library.
//!
//! ```
//! use serde_json::json;
//!
//! let html = kobind_bind::render(
//!     r#"<span data-bind="text: firstName"></span>"#,
//!     Some(&json!({"FirstName": "Earth"})),
//! )
//! .unwrap();
//! assert_eq!(html, "<span>Earth</span>");
//! ```

pub mod directive;
pub mod dispatch;
pub mod error;
pub mod grid;
pub mod normalize;
pub mod options;
pub mod scope;
pub mod style;
pub mod traverse;

use kobind_dom::Document;
use kobind_expr::{Evaluator, ExprEvaluator};
use log::debug;
use serde_json::Value;

pub use directive::{Directive, DirectiveError};
pub use error::RenderError;
pub use normalize::NormalizeError;
pub use options::{MemberCase, RenderOptions, UnresolvedPolicy};
pub use scope::{ScopeError, ScopeStack};

/// Renders templates with a fixed configuration. Holds no per-render state,
/// so one instance can serve any number of renders, from any thread.
pub struct Renderer {
    options: RenderOptions,
    evaluator: Box<dyn Evaluator + Send + Sync>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self::with_evaluator(options, ExprEvaluator)
    }

    pub fn with_evaluator(
        options: RenderOptions,
        evaluator: impl Evaluator + Send + Sync + 'static,
    ) -> Self {
        Renderer {
            options,
            evaluator: Box::new(evaluator),
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render `template` against `data`. Without data the template is only
    /// normalized and comes back with its directives untouched.
    pub fn render(&self, template: &str, data: Option<&Value>) -> Result<String, RenderError> {
        Ok(self.render_document(template, data)?.to_html())
    }

    pub fn render_document(
        &self,
        template: &str,
        data: Option<&Value>,
    ) -> Result<Document, RenderError> {
        debug!(
            "rendering {} byte template {} data",
            template.len(),
            if data.is_some() { "with" } else { "without" }
        );
        let mut doc = Document::parse(template)?;
        let root = doc.root();
        traverse::bind_document(
            &mut doc,
            root,
            data.cloned(),
            &self.options,
            self.evaluator.as_ref(),
        )?;
        Ok(doc)
    }

    /// Parse and normalize `template` and parse every directive attribute
    /// without evaluating anything. Returns the number of directives.
    pub fn check(&self, template: &str) -> Result<usize, RenderError> {
        let mut doc = Document::parse(template)?;
        let root = doc.root();
        normalize::normalize(&mut doc, root, &self.options)?;
        let mut count = 0;
        for id in doc.descendants_with_attr(root, &self.options.attribute) {
            if let Some(raw) = doc.attr(id, &self.options.attribute) {
                count += directive::parse_directives(&raw)?.len();
            }
        }
        Ok(count)
    }
}

/// Render with the default configuration.
pub fn render(template: &str, data: Option<&Value>) -> Result<String, RenderError> {
    Renderer::default().render(template, data)
}
