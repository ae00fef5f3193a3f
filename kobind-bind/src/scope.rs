use std::ops::{Deref, DerefMut};

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("template reaches {hops} scope(s) up but only {available} exist")]
    OutOfRange { hops: usize, available: usize },
}

/// Data frames of the loops currently being expanded. The bottom frame is
/// the root data value and is never popped.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    frames: Vec<Value>,
}

impl ScopeStack {
    pub fn new(root: Value) -> Self {
        ScopeStack { frames: vec![root] }
    }

    pub fn push(&mut self, value: Value) {
        self.frames.push(value);
    }

    pub fn pop(&mut self) -> Option<Value> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Push `value` for the lifetime of the returned guard.
    pub fn enter(&mut self, value: Value) -> ScopeGuard<'_> {
        self.push(value);
        ScopeGuard { stack: self }
    }

    pub fn peek(&self) -> &Value {
        &self.frames[self.frames.len() - 1]
    }

    pub fn root(&self) -> &Value {
        &self.frames[0]
    }

    /// The frame `hops` levels above the current one; `at(0)` is `peek()`.
    pub fn at(&self, hops: usize) -> Result<&Value, ScopeError> {
        let top = self.frames.len() - 1;
        top.checked_sub(hops)
            .map(|i| &self.frames[i])
            .ok_or(ScopeError::OutOfRange {
                hops,
                available: top,
            })
    }

    /// Number of frames above the root.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }
}

pub struct ScopeGuard<'s> {
    stack: &'s mut ScopeStack,
}

impl Deref for ScopeGuard<'_> {
    type Target = ScopeStack;

    fn deref(&self) -> &ScopeStack {
        self.stack
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut ScopeStack {
        self.stack
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.stack.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn guard_pops_on_drop() {
        let mut scope = ScopeStack::new(json!({"root": true}));
        {
            let mut inner = scope.enter(json!(1));
            let inner2 = inner.enter(json!(2));
            assert_eq!(inner2.depth(), 2);
            assert_eq!(inner2.at(1).expect("parent"), &json!(1));
            assert_eq!(inner2.at(2).expect("root"), &json!({"root": true}));
        }
        assert_eq!(scope.depth(), 0);
        assert_eq!(scope.peek(), scope.root());
    }

    #[test]
    fn over_indexing_is_an_error() {
        let mut scope = ScopeStack::new(json!(null));
        let inner = scope.enter(json!(1));
        assert_eq!(
            inner.at(2),
            Err(ScopeError::OutOfRange {
                hops: 2,
                available: 1
            })
        );
    }

    #[test]
    fn root_is_never_popped() {
        let mut scope = ScopeStack::new(json!(0));
        assert_eq!(scope.pop(), None);
        assert_eq!(scope.depth(), 0);
    }
}
