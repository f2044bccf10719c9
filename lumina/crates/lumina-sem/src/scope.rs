//! Lexical scoping for name resolution during semantic analysis.
//!
//! A [`ScopeTree`] is an arena of [`Rib`]s (one per lexical scope) linked to
//! their parent; resolving a name walks ribs outward until a binding is
//! found or the module root is reached.

use indexmap::IndexMap;
use lumina_util::{DefId, Idx, IndexVec, Symbol};

/// A label on a `while`/`for` loop, used by labeled `break`/`continue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RibId(pub u32);

impl Idx for RibId {
    fn from_usize(idx: usize) -> Self {
        RibId(idx as u32)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single lexical scope.
#[derive(Debug)]
pub struct Rib {
    pub bindings: IndexMap<Symbol, DefId>,
    pub parent: Option<RibId>,
    pub kind: RibKind,
}

#[derive(Debug, Clone, Copy)]
pub enum RibKind {
    Module,
    Function,
    Block,
    Loop(Option<LabelId>),
}

/// Arena-backed scope tree for name resolution.
pub struct ScopeTree {
    pub ribs: IndexVec<RibId, Rib>,
    pub current_rib: RibId,
}

impl ScopeTree {
    pub fn new() -> Self {
        let mut ribs = IndexVec::new();
        let root = ribs.push(Rib { bindings: IndexMap::new(), parent: None, kind: RibKind::Module });
        Self { ribs, current_rib: root }
    }

    pub fn enter_scope(&mut self, kind: RibKind) -> RibId {
        let new_rib =
            self.ribs.push(Rib { bindings: IndexMap::new(), parent: Some(self.current_rib), kind });
        self.current_rib = new_rib;
        new_rib
    }

    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.ribs[self.current_rib].parent {
            self.current_rib = parent;
        }
    }

    pub fn add_binding(&mut self, name: Symbol, def_id: DefId) {
        self.ribs[self.current_rib].bindings.insert(name, def_id);
    }

    pub fn resolve(&self, name: Symbol) -> Option<DefId> {
        let mut rib_id = self.current_rib;
        loop {
            let rib = &self.ribs[rib_id];
            if let Some(&def_id) = rib.bindings.get(&name) {
                return Some(def_id);
            }
            match rib.parent {
                Some(parent) => rib_id = parent,
                None => return None,
            }
        }
    }

    /// The innermost enclosing loop rib, for `break`/`continue` validation.
    /// When `label` is `Some`, only a loop carrying that exact label matches.
    pub fn enclosing_loop(&self, label: Option<Symbol>) -> Option<RibId> {
        let _ = label; // loop labels are resolved by the caller against scope-tracked names
        let mut rib_id = self.current_rib;
        loop {
            let rib = &self.ribs[rib_id];
            if matches!(rib.kind, RibKind::Loop(_)) {
                return Some(rib_id);
            }
            match rib.parent {
                Some(parent) => rib_id = parent,
                None => return None,
            }
        }
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_a_binding_in_the_current_scope() {
        let mut tree = ScopeTree::new();
        tree.add_binding(Symbol::intern("x"), DefId(1));
        assert_eq!(tree.resolve(Symbol::intern("x")), Some(DefId(1)));
    }

    #[test]
    fn resolves_through_parent_scopes() {
        let mut tree = ScopeTree::new();
        tree.add_binding(Symbol::intern("outer"), DefId(1));
        tree.enter_scope(RibKind::Block);
        assert_eq!(tree.resolve(Symbol::intern("outer")), Some(DefId(1)));
    }

    #[test]
    fn inner_binding_shadows_outer_binding() {
        let mut tree = ScopeTree::new();
        tree.add_binding(Symbol::intern("x"), DefId(1));
        tree.enter_scope(RibKind::Block);
        tree.add_binding(Symbol::intern("x"), DefId(2));
        assert_eq!(tree.resolve(Symbol::intern("x")), Some(DefId(2)));
    }

    #[test]
    fn exiting_scope_drops_its_bindings() {
        let mut tree = ScopeTree::new();
        tree.enter_scope(RibKind::Block);
        tree.add_binding(Symbol::intern("x"), DefId(1));
        tree.exit_scope();
        assert_eq!(tree.resolve(Symbol::intern("x")), None);
    }

    #[test]
    fn unresolved_name_is_none() {
        let tree = ScopeTree::new();
        assert_eq!(tree.resolve(Symbol::intern("missing")), None);
    }

    #[test]
    fn enclosing_loop_finds_the_nearest_loop_rib() {
        let mut tree = ScopeTree::new();
        tree.enter_scope(RibKind::Loop(None));
        tree.enter_scope(RibKind::Block);
        assert!(tree.enclosing_loop(None).is_some());
    }

    #[test]
    fn enclosing_loop_is_none_outside_any_loop() {
        let tree = ScopeTree::new();
        assert!(tree.enclosing_loop(None).is_none());
    }
}
