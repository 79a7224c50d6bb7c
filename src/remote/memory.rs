use super::{BlockKind, NewBlock, NodeId, Placement, RemoteError, RemoteNode, RemoteTree};
use crate::models::Color;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryNode {
    pub kind: Option<BlockKind>,
    pub title: Option<String>,
    pub color: Color,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A `RemoteTree` held in memory, with a call counter and optional failure.
#[derive(Debug)]
pub struct MemoryTree {
    root: NodeId,
    nodes: RefCell<HashMap<NodeId, MemoryNode>>,
    next_id: Cell<u64>,
    creates: Cell<usize>,
    fail_on_create: Cell<Option<usize>>,
}

impl MemoryTree {
    pub fn new() -> Self {
        let root = NodeId("root".to_string());
        let mut nodes = HashMap::new();
        nodes.insert(
            root.clone(),
            MemoryNode {
                kind: None,
                title: Some("Highlights".to_string()),
                color: Color::Default,
                parent: None,
                children: Vec::new(),
            },
        );

        MemoryTree {
            root,
            nodes: RefCell::new(nodes),
            next_id: Cell::new(1),
            creates: Cell::new(0),
            fail_on_create: Cell::new(None),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root.clone()
    }

    pub fn node(&self, id: &NodeId) -> MemoryNode {
        self.nodes.borrow()[id].clone()
    }

    pub fn child_ids(&self, id: &NodeId) -> Vec<NodeId> {
        self.node(id).children
    }

    pub fn child_titles(&self, id: &NodeId) -> Vec<Option<String>> {
        self.child_ids(id)
            .iter()
            .map(|child| self.node(child).title)
            .collect()
    }

    pub fn create_count(&self) -> usize {
        self.creates.get()
    }

    /// Makes the `n`th call to `create_child` (1-based) fail.
    pub fn fail_on_create(&self, n: usize) {
        self.fail_on_create.set(Some(n));
    }

    fn attach_last(&self, nodes: &mut HashMap<NodeId, MemoryNode>, node: &NodeId, parent: &NodeId) {
        if let Some(parent_node) = nodes.get_mut(parent) {
            parent_node.children.push(node.clone());
        }
        if let Some(n) = nodes.get_mut(node) {
            n.parent = Some(parent.clone());
        }
    }

    fn detach(&self, nodes: &mut HashMap<NodeId, MemoryNode>, node: &NodeId) {
        let parent = nodes.get(node).and_then(|n| n.parent.clone());
        if let Some(parent_node) = parent.and_then(|p| nodes.get_mut(&p)) {
            parent_node.children.retain(|c| c != node);
        }
    }
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteTree for MemoryTree {
    fn children(&self, parent: &NodeId) -> Result<Vec<RemoteNode>, RemoteError> {
        let nodes = self.nodes.borrow();
        let node = nodes
            .get(parent)
            .ok_or_else(|| RemoteError::NotFound(parent.clone()))?;

        Ok(node
            .children
            .iter()
            .map(|id| RemoteNode {
                id: id.clone(),
                title: nodes[id].title.clone(),
            })
            .collect())
    }

    fn create_child(&self, parent: &NodeId, block: NewBlock<'_>) -> Result<NodeId, RemoteError> {
        let call = self.creates.get() + 1;
        self.creates.set(call);
        if self.fail_on_create.get() == Some(call) {
            return Err(RemoteError::Status {
                endpoint: "createChild".to_string(),
                status: 500,
            });
        }

        let mut nodes = self.nodes.borrow_mut();
        if !nodes.contains_key(parent) {
            return Err(RemoteError::NotFound(parent.clone()));
        }

        let id = NodeId(format!("node-{}", self.next_id.get()));
        self.next_id.set(self.next_id.get() + 1);
        nodes.insert(
            id.clone(),
            MemoryNode {
                kind: Some(block.kind),
                title: block.title.map(String::from),
                color: block.color,
                parent: None,
                children: Vec::new(),
            },
        );
        self.attach_last(&mut nodes, &id, parent);

        Ok(id)
    }

    fn move_node(&self, node: &NodeId, placement: Placement<'_>) -> Result<(), RemoteError> {
        let mut nodes = self.nodes.borrow_mut();
        if !nodes.contains_key(node) {
            return Err(RemoteError::NotFound(node.clone()));
        }

        match placement {
            Placement::LastChildOf(parent) => {
                if !nodes.contains_key(parent) {
                    return Err(RemoteError::NotFound(parent.clone()));
                }
                self.detach(&mut nodes, node);
                self.attach_last(&mut nodes, node, parent);
            }
            Placement::After(sibling) => {
                let parent = nodes
                    .get(sibling)
                    .and_then(|s| s.parent.clone())
                    .ok_or_else(|| RemoteError::NotFound(sibling.clone()))?;
                self.detach(&mut nodes, node);
                if let Some(parent_node) = nodes.get_mut(&parent) {
                    let index = parent_node
                        .children
                        .iter()
                        .position(|c| c == sibling)
                        .map_or(parent_node.children.len(), |i| i + 1);
                    parent_node.children.insert(index, node.clone());
                }
                if let Some(n) = nodes.get_mut(node) {
                    n.parent = Some(parent);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlockType;

    #[test]
    fn test_create_appends_in_order() {
        let tree = MemoryTree::new();
        let root = tree.root();

        tree.create_child(&root, NewBlock::styled(BlockType::TextBlock, "a", Color::Default))
            .unwrap();
        tree.create_child(&root, NewBlock::divider()).unwrap();
        tree.create_child(&root, NewBlock::styled(BlockType::TextBlock, "b", Color::Red))
            .unwrap();

        assert_eq!(
            tree.child_titles(&root),
            vec![Some("a".to_string()), None, Some("b".to_string())]
        );
    }

    #[test]
    fn test_move_after_sibling() {
        let tree = MemoryTree::new();
        let root = tree.root();
        let a = tree
            .create_child(&root, NewBlock::styled(BlockType::TextBlock, "a", Color::Default))
            .unwrap();
        let b = tree
            .create_child(&root, NewBlock::styled(BlockType::TextBlock, "b", Color::Default))
            .unwrap();
        let c = tree
            .create_child(&root, NewBlock::styled(BlockType::TextBlock, "c", Color::Default))
            .unwrap();

        tree.move_node(&c, Placement::After(&a)).unwrap();

        assert_eq!(tree.child_ids(&root), vec![a, c, b]);
    }

    #[test]
    fn test_move_last_child_reparents() {
        let tree = MemoryTree::new();
        let root = tree.root();
        let page = tree
            .create_child(&root, NewBlock::styled(BlockType::PageBlock, "p", Color::Default))
            .unwrap();
        let text = tree
            .create_child(&root, NewBlock::styled(BlockType::TextBlock, "t", Color::Default))
            .unwrap();

        tree.move_node(&text, Placement::LastChildOf(&page)).unwrap();

        assert_eq!(tree.child_ids(&root), vec![page.clone()]);
        assert_eq!(tree.child_ids(&page), vec![text.clone()]);
        assert_eq!(tree.node(&text).parent, Some(page));
    }

    #[test]
    fn test_failure_injection() {
        let tree = MemoryTree::new();
        let root = tree.root();
        tree.fail_on_create(2);

        assert!(tree.create_child(&root, NewBlock::divider()).is_ok());
        assert!(tree.create_child(&root, NewBlock::divider()).is_err());
        assert_eq!(tree.child_ids(&root).len(), 1);
    }
}
