use crate::error::TreeError;
use crate::model::TreeNode;

/// Computes total statistics bottom-up for a tree whose nodes only carry
/// own statistics.
///
/// Every node is visited once, children before their parent. Subtrees that
/// are already aggregated are folded in as they are. A node that was already
/// aggregated, or any pending node whose totals were built up with
/// `add_file`/`add_dir`, is rejected before anything is touched, since a
/// second pass would double its totals.
pub fn accumulate(node: &mut TreeNode) -> Result<(), TreeError> {
    if node.is_aggregated() {
        return Err(TreeError::AlreadyAggregated(node.name.clone()));
    }
    check_pending(node)?;
    accumulate_pending(node);
    Ok(())
}

fn check_pending(node: &TreeNode) -> Result<(), TreeError> {
    if node.is_live() {
        return Err(TreeError::TotalsAlreadyFolded(node.name.clone()));
    }
    node.children
        .values()
        .filter(|child| !child.is_aggregated())
        .try_for_each(check_pending)
}

fn accumulate_pending(node: &mut TreeNode) {
    let mut children = std::mem::take(&mut node.children);
    for child in children.values_mut() {
        if !child.is_aggregated() {
            accumulate_pending(child);
        }
        node.absorb(child);
    }
    node.children = children;
    node.mark_aggregated();
}
