use serde::Deserialize;

pub use kobind_expr::MemberCase;

/// What to do with a directive whose expression cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Leave it in the output for the client-side library.
    #[default]
    Preserve,
    /// Fail the render.
    Error,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Attribute carrying the binding directives.
    pub attribute: String,
    /// Marker word of `<!-- ko ... -->` blocks and tag of their synthetic
    /// elements.
    pub virtual_tag: String,
    pub member_case: MemberCase,
    pub unresolved: UnresolvedPolicy,
    /// Keys that are never evaluated and always kept.
    pub client_only: Vec<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            attribute: "data-bind".to_string(),
            virtual_tag: "ko".to_string(),
            member_case: MemberCase::default(),
            unresolved: UnresolvedPolicy::default(),
            client_only: ["click", "submit", "valueUpdate"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl RenderOptions {
    pub fn strict(mut self) -> Self {
        self.unresolved = UnresolvedPolicy::Error;
        self
    }

    pub fn is_client_only(&self, key: &str) -> bool {
        self.client_only.iter().any(|k| k.eq_ignore_ascii_case(key))
    }
}
