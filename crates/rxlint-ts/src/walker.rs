//! Syntax-tree traversal with per-kind visitor hooks.
//!
//! Tree-sitter trees have no typed visitor, so rules implement
//! [`SyntaxVisitor`] and [`walk`] drives a full pre-order traversal,
//! dispatching on node kind.

use tree_sitter::Node;

use crate::syntax::SourceFile;

/// Hooks called by [`walk`]. All default to no-ops.
///
/// Every node is visited exactly once, parents before children, in source
/// order. Hooks never control descent: the walk always covers the whole tree.
pub trait SyntaxVisitor<'tree> {
    /// Called for every `import_statement`, including nested ones in
    /// `declare module` blocks.
    fn visit_import_statement(&mut self, _node: Node<'tree>) {}

    /// Called for every `call_expression`.
    fn visit_call_expression(&mut self, _node: Node<'tree>) {}

    /// Called once after the last node has been visited.
    fn on_source_file_end(&mut self) {}
}

/// Walks the whole tree of `file`, then calls
/// [`SyntaxVisitor::on_source_file_end`].
pub fn walk<'tree, V>(file: &'tree SourceFile, visitor: &mut V)
where
    V: SyntaxVisitor<'tree> + ?Sized,
{
    let mut cursor = file.root().walk();
    loop {
        dispatch(visitor, cursor.node());

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                visitor.on_source_file_end();
                return;
            }
        }
    }
}

fn dispatch<'tree, V>(visitor: &mut V, node: Node<'tree>)
where
    V: SyntaxVisitor<'tree> + ?Sized,
{
    match node.kind() {
        "import_statement" => visitor.visit_import_statement(node),
        "call_expression" => visitor.visit_call_expression(node),
        _ => {}
    }
}
