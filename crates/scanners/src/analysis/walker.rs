//! Generic pre-order traversal over [`SyntaxNode`] trees.
//!
//! The walker never looks at node kinds to find children: it asks every node
//! for its child fields and visits them in source order. Traversal uses an
//! explicit stack, so nesting depth costs heap, not call frames, and is
//! bounded by `max_depth`.

use crate::core::{EngineError, EngineResult};
use crate::representations::{SyntaxNode, MAX_TREE_DEPTH};

/// Lazy pre-order iterator over a tree, root included.
///
/// Yields each node once, parent before children, children in source order.
/// When a node sits deeper than the bound the iterator yields a single
/// structural error and then ends. Cloning a fresh walk restarts it.
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    stack: Vec<(&'a SyntaxNode, usize)>,
    max_depth: usize,
    failed: bool,
}

impl<'a> Walk<'a> {
    pub fn new(root: &'a SyntaxNode, max_depth: usize) -> Self {
        Self {
            stack: vec![(root, 0)],
            max_depth,
            failed: false,
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = EngineResult<&'a SyntaxNode>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let (node, depth) = self.stack.pop()?;
        if depth > self.max_depth {
            self.failed = true;
            self.stack.clear();
            return Some(Err(EngineError::structural(format!(
                "tree nesting exceeds {} levels at {} ({})",
                self.max_depth,
                node.kind(),
                node.src()
            ))));
        }

        for child in node.child_nodes().into_iter().rev() {
            self.stack.push((child, depth + 1));
        }

        Some(Ok(node))
    }
}

/// Nodes of one kind, filtered from a [`Walk`]. Errors pass through.
#[derive(Debug, Clone)]
pub struct FindAll<'a, 'k> {
    walk: Walk<'a>,
    kind: &'k str,
}

impl<'a, 'k> Iterator for FindAll<'a, 'k> {
    type Item = EngineResult<&'a SyntaxNode>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.walk.next()? {
                Ok(node) if node.is(self.kind) => return Some(Ok(node)),
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

pub fn walk(root: &SyntaxNode) -> Walk<'_> {
    Walk::new(root, MAX_TREE_DEPTH)
}

pub fn find_all<'a, 'k>(kind: &'k str, root: &'a SyntaxNode) -> FindAll<'a, 'k> {
    find_all_bounded(kind, root, MAX_TREE_DEPTH)
}

pub fn find_all_bounded<'a, 'k>(kind: &'k str, root: &'a SyntaxNode, max_depth: usize) -> FindAll<'a, 'k> {
    FindAll {
        walk: Walk::new(root, max_depth),
        kind,
    }
}

/// Eager form of [`find_all`]: every match, or the first structural error.
pub fn collect_all<'a>(kind: &str, root: &'a SyntaxNode) -> EngineResult<Vec<&'a SyntaxNode>> {
    find_all(kind, root).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::representations::SourceRange;

    fn node(kind: &str, offset: usize, length: usize) -> SyntaxNode {
        SyntaxNode::new(kind, SourceRange::new(offset, length, Some(0)))
    }

    // SourceUnit
    // └─ ContractDefinition
    //    ├─ VariableDeclaration (state)
    //    └─ FunctionDefinition
    //       └─ Block
    //          ├─ ExpressionStatement
    //          │  └─ FunctionCall
    //          │     ├─ Identifier
    //          │     └─ [FunctionCall [Identifier]]
    //          └─ VariableDeclarationStatement [null, VariableDeclaration]
    fn fixture() -> SyntaxNode {
        let inner_call = node("FunctionCall", 70, 8)
            .with_child("expression", node("Identifier", 70, 3))
            .with_sequence("arguments", vec![]);
        let outer_call = node("FunctionCall", 60, 20)
            .with_child("expression", node("Identifier", 60, 6))
            .with_sequence("arguments", vec![inner_call]);
        let statement = node("ExpressionStatement", 60, 21).with_child("expression", outer_call);
        let declaration_statement = node("VariableDeclarationStatement", 90, 15).with_field(
            "declarations",
            crate::representations::Field::Sequence(vec![None, Some(node("VariableDeclaration", 95, 5))]),
        );
        let body = node("Block", 55, 60).with_sequence("statements", vec![statement, declaration_statement]);
        let function = node("FunctionDefinition", 40, 80)
            .with_child("body", body)
            .with_attr("name", "f");
        let contract = node("ContractDefinition", 0, 130)
            .with_sequence(
                "nodes",
                vec![function, node("VariableDeclaration", 15, 20).with_attr("stateVariable", true)],
            )
            .with_attr("name", "C");
        node("SourceUnit", 0, 140).with_sequence("nodes", vec![contract])
    }

    #[test]
    fn test_walk_is_pre_order_in_source_order() {
        let tree = fixture();
        let kinds: Vec<&str> = walk(&tree).map(|n| n.unwrap().kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "SourceUnit",
                "ContractDefinition",
                "VariableDeclaration",
                "FunctionDefinition",
                "Block",
                "ExpressionStatement",
                "FunctionCall",
                "Identifier",
                "FunctionCall",
                "Identifier",
                "VariableDeclarationStatement",
                "VariableDeclaration",
            ]
        );
    }

    #[test]
    fn test_find_all_is_complete_and_exact() {
        let tree = fixture();

        let calls = collect_all("FunctionCall", &tree).unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|n| n.is("FunctionCall")));
        assert_eq!(calls[0].src().offset, 60);
        assert_eq!(calls[1].src().offset, 70);

        let declarations = collect_all("VariableDeclaration", &tree).unwrap();
        let offsets: Vec<usize> = declarations.iter().map(|n| n.src().offset).collect();
        assert_eq!(offsets, vec![15, 95]);

        assert_eq!(collect_all("SourceUnit", &tree).unwrap().len(), 1);
        assert!(collect_all("WhileStatement", &tree).unwrap().is_empty());
    }

    #[test]
    fn test_find_all_is_restartable() {
        let tree = fixture();
        let search = find_all("Identifier", &tree);
        let first: Vec<usize> = search.clone().map(|n| n.unwrap().src().offset).collect();
        let second: Vec<usize> = search.map(|n| n.unwrap().src().offset).collect();
        assert_eq!(first, vec![60, 70]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_depth_bound_yields_structural_error_once() {
        let mut tree = node("Leaf", 0, 1);
        for i in 0..50 {
            tree = node("Wrap", 0, 1 + i).with_child("inner", tree);
        }

        assert_eq!(walk(&tree).count(), 51);

        let results: Vec<_> = find_all_bounded("Leaf", &tree, 10).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(EngineError::Structural(_))));
    }
}
