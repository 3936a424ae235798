use crate::ast::ast::{Ast, NodeId};

/// Records every node's parent. Runs once per compilation, before the
/// first phase; the map is not touched afterwards.
pub fn build_hierarchy(ast: &mut Ast) {
    ast.clear_parents();

    let edges: Vec<(NodeId, NodeId)> = ast
        .ids()
        .flat_map(|parent| {
            ast.node(parent)
                .children()
                .into_iter()
                .map(move |child| (child, parent))
        })
        .collect();

    for (child, parent) in edges {
        ast.set_parent(child, parent);
    }
}

/// Depth-first post-order over everything reachable from `roots`:
/// children come before their parent, siblings in source order.
pub fn traversal_order(ast: &Ast, roots: &[NodeId]) -> Vec<NodeId> {
    let mut order = Vec::with_capacity(ast.len());
    let mut stack: Vec<(NodeId, bool)> = roots
        .iter()
        .rev()
        .map(|root| (*root, false))
        .collect();

    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            order.push(id);
            continue;
        }

        stack.push((id, true));
        for child in ast.node(id).children().into_iter().rev() {
            stack.push((child, false));
        }
    }

    order
}
