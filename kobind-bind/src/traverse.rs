use std::collections::HashSet;

use kobind_dom::{Document, NodeId};
use kobind_expr::{Bindings, EvalError, Evaluator, Translated, Utilities, translate};
use log::{debug, trace, warn};
use serde_json::Value;

use crate::directive::{Directive, format_directives, parse_directives};
use crate::dispatch::{self, Applied};
use crate::error::RenderError;
use crate::grid;
use crate::normalize::{self, is_synthetic};
use crate::options::{RenderOptions, UnresolvedPolicy};
use crate::scope::ScopeStack;
use crate::style::PendingStyleSet;

/// Keys that expand their node's children instead of binding the node.
const LOOP_KEYS: &[&str] = &["foreach", "simpleGrid"];

pub fn is_loop_key(key: &str) -> bool {
    LOOP_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

enum Expansion {
    Items(Vec<Value>),
    Grid(Value),
}

/// Per-render binding state.
pub struct Binder<'r> {
    options: &'r RenderOptions,
    evaluator: &'r dyn Evaluator,
    utilities: Utilities,
    failed_loops: HashSet<NodeId>,
    /// Loop output already bound in its own scope.
    expanded: HashSet<NodeId>,
    styles: PendingStyleSet,
}

impl<'r> Binder<'r> {
    pub fn new(options: &'r RenderOptions, evaluator: &'r dyn Evaluator) -> Self {
        Binder {
            options,
            evaluator,
            utilities: Utilities::new(),
            failed_loops: HashSet::new(),
            expanded: HashSet::new(),
            styles: PendingStyleSet::new(),
        }
    }

    /// Bind everything below `node` against the current top of `scope`.
    ///
    /// Loops are expanded first, outermost in document order, each one
    /// recursing into its clones with the item pushed. Once no loop is left
    /// (or one fails) the remaining directives are applied in a single
    /// pre-order pass that skips the expanded output.
    pub fn bind(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        scope: &mut ScopeStack,
    ) -> Result<(), RenderError> {
        while let Some(target) = self.next_loop(doc, node)? {
            if !self.expand(doc, target, scope)? {
                self.abandon_loops(doc, node)?;
                break;
            }
        }
        self.simple_bind(doc, node, scope)
    }

    fn directives(&self, doc: &Document, id: NodeId) -> Result<Vec<Directive>, RenderError> {
        match doc.attr(id, &self.options.attribute) {
            Some(raw) => Ok(parse_directives(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn write_directives(&self, doc: &mut Document, id: NodeId, directives: &[Directive]) {
        if directives.is_empty() {
            doc.remove_attr(id, &self.options.attribute);
        } else {
            doc.set_attr(id, &self.options.attribute, &format_directives(directives));
        }
    }

    fn next_loop(&self, doc: &Document, node: NodeId) -> Result<Option<NodeId>, RenderError> {
        for id in doc.descendants_with_attr(node, &self.options.attribute) {
            if self.failed_loops.contains(&id) {
                continue;
            }
            if self.directives(doc, id)?.iter().any(|d| is_loop_key(&d.key)) {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Leave every loop still pending below `node` for the client.
    fn abandon_loops(&mut self, doc: &Document, node: NodeId) -> Result<(), RenderError> {
        while let Some(id) = self.next_loop(doc, node)? {
            self.failed_loops.insert(id);
        }
        Ok(())
    }

    /// Expand the first loop directive on `target`. Returns `false` when its
    /// expression could not be resolved.
    fn expand(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        scope: &mut ScopeStack,
    ) -> Result<bool, RenderError> {
        let mut directives = self.directives(doc, target)?;
        let Some(pos) = directives.iter().position(|d| is_loop_key(&d.key)) else {
            return Ok(true);
        };
        let directive = directives.remove(pos);

        let expansion = self.resolve(&directive, scope)?.and_then(|v| {
            if directive.is_key("simpleGrid") {
                grid::view_model(&v).map(Expansion::Grid)
            } else {
                match v {
                    Value::Array(items) => Ok(Expansion::Items(items)),
                    other => Err(EvalError::Type(format!(
                        "`{}` expects an array, got {}",
                        directive.key,
                        kobind_expr::value::kind_name(&other)
                    ))),
                }
            }
        });
        let expansion = match expansion {
            Ok(expansion) => expansion,
            Err(e) => {
                self.unresolved(&directive, e)?;
                self.failed_loops.insert(target);
                return Ok(false);
            }
        };
        self.write_directives(doc, target, &directives);

        match expansion {
            Expansion::Grid(model) => {
                debug!("rendering grid into {target:?}");
                grid::render_into(doc, target, model, self.options, self.evaluator)?;
            }
            Expansion::Items(items) => {
                let template = trimmed_children(doc, target);
                let mut output = Vec::new();
                let count = items.len();
                for item in items {
                    let holder = doc.create_element("template");
                    for &t in &template {
                        let copy = doc.deep_clone(t);
                        doc.append_child(holder, copy);
                    }
                    let mut inner = scope.enter(item);
                    self.bind(doc, holder, &mut inner)?;
                    drop(inner);
                    output.extend(doc.take_children(holder));
                }
                debug!(
                    "expanded `{}: {}` into {count} item(s) at depth {}",
                    directive.key,
                    directive.expression,
                    scope.depth()
                );
                doc.replace_children(target, output);
            }
        }
        self.expanded.extend(doc.children(target).iter().copied());
        normalize::simplify(doc, target, self.options);
        Ok(true)
    }

    fn simple_bind(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        scope: &ScopeStack,
    ) -> Result<(), RenderError> {
        let mut stack: Vec<NodeId> = doc.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.expanded.contains(&id) {
                continue;
            }
            let bound = doc
                .element(id)
                .is_some_and(|e| e.has_attr(&self.options.attribute));
            let descend = if bound {
                self.bind_node(doc, id, scope)?
            } else {
                true
            };
            if descend {
                stack.extend(doc.children(id).iter().rev().copied());
            }
            normalize::simplify(doc, id, self.options);
        }
        Ok(())
    }

    /// Apply the directives of one node. Returns whether its children still
    /// need binding.
    fn bind_node(
        &mut self,
        doc: &mut Document,
        id: NodeId,
        scope: &ScopeStack,
    ) -> Result<bool, RenderError> {
        let directives = self.directives(doc, id)?;
        let mut kept = Vec::new();
        let mut descend = true;

        for d in &directives {
            if is_loop_key(&d.key) {
                // a loop that failed or was abandoned keeps its template
                descend = false;
                kept.push(d.clone());
                continue;
            }
            if self.options.is_client_only(&d.key) {
                kept.push(d.clone());
                continue;
            }
            let outcome = self
                .resolve(d, scope)?
                .and_then(|v| dispatch::apply(doc, id, &d.key, &v, &mut self.styles));
            match outcome {
                Ok(Applied::Content) => descend = false,
                Ok(Applied::Attributes) => {}
                Err(e) => {
                    self.unresolved(d, e)?;
                    kept.push(d.clone());
                }
            }
        }

        if kept.len() != directives.len() {
            self.write_directives(doc, id, &kept);
        }
        self.styles.flush(doc, id);
        Ok(descend)
    }

    /// Translate and evaluate one directive. The outer error is fatal, the
    /// inner one is left to the caller's [`UnresolvedPolicy`].
    fn resolve(
        &self,
        directive: &Directive,
        scope: &ScopeStack,
    ) -> Result<Result<Value, EvalError>, RenderError> {
        let translated = match translate(&directive.expression, self.options.member_case) {
            Ok(t) => t,
            Err(e) => return Ok(Err(e)),
        };
        let ancestors = translated
            .ancestors()
            .iter()
            .map(|&k| scope.at(k).map(|v| (Translated::ancestor_var(k), v)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut bindings = Bindings::new();
        bindings
            .bind("$data", scope.peek())
            .bind("$root", scope.root())
            .with_utilities(&self.utilities);
        for (name, value) in &ancestors {
            bindings.bind(name.as_str(), *value);
        }
        trace!(
            "{}: `{}` as `{}`",
            directive.key,
            directive.expression,
            translated.as_str()
        );
        Ok(self.evaluator.evaluate(translated.as_str(), &bindings))
    }

    fn unresolved(&self, directive: &Directive, error: EvalError) -> Result<(), RenderError> {
        match self.options.unresolved {
            UnresolvedPolicy::Error => Err(RenderError::Unresolved {
                key: directive.key.clone(),
                expression: directive.expression.clone(),
                source: error,
            }),
            UnresolvedPolicy::Preserve => {
                warn!(
                    "keeping `{}: {}` for the client: {error}",
                    directive.key, directive.expression
                );
                Ok(())
            }
        }
    }
}

/// Detach the children of `id`, dropping whitespace-only text at both ends.
fn trimmed_children(doc: &mut Document, id: NodeId) -> Vec<NodeId> {
    let mut children = doc.take_children(id);
    while children.first().is_some_and(|c| doc.is_whitespace_text(*c)) {
        children.remove(0);
    }
    while children.last().is_some_and(|c| doc.is_whitespace_text(*c)) {
        children.pop();
    }
    children
}

/// Turn any synthetic element still in the tree back into markers.
pub fn restore_virtual_blocks(doc: &mut Document, root: NodeId, options: &RenderOptions) {
    let synthetic: Vec<NodeId> = doc
        .descendants(root)
        .filter(|id| is_synthetic(doc, *id, options))
        .collect();
    for id in synthetic {
        normalize::simplify(doc, id, options);
    }
}

/// Normalize, bind and restore the tree below `root`.
pub fn bind_document(
    doc: &mut Document,
    root: NodeId,
    data: Option<Value>,
    options: &RenderOptions,
    evaluator: &dyn Evaluator,
) -> Result<(), RenderError> {
    normalize::normalize(doc, root, options)?;
    if let Some(data) = data {
        let mut scope = ScopeStack::new(data);
        Binder::new(options, evaluator).bind(doc, root, &mut scope)?;
    }
    restore_virtual_blocks(doc, root, options);
    Ok(())
}
