use super::{NodeId, RbTree};
use std::fmt::Debug;

impl<T: Debug> Debug for RbTree<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RbTree(")?;
        write!(f, "len: {}, ", self.len)?;
        match self.root {
            Some(root) => self.format(f, root)?,
            None => write!(f, "[]")?,
        }
        write!(f, ")")
    }
}

impl<T: Debug> RbTree<T> {
    fn format(&self, f: &mut std::fmt::Formatter<'_>, id: NodeId) -> std::fmt::Result {
        let node = self.node(id);
        write!(f, "[")?;
        if let Some(left) = node.left {
            self.format(f, left)?;
            write!(f, " ")?;
        }
        write!(f, "{}{:?}", if node.red { "r" } else { "b" }, node.value)?;
        if let Some(right) = node.right {
            write!(f, " ")?;
            self.format(f, right)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
impl<T> RbTree<T> {
    /// Panics if any red-black or linkage invariant does not hold. Returns the black height.
    pub(crate) fn check_invariants(&self) -> usize {
        let Some(root) = self.root else {
            assert_eq!(self.len, 0);
            return 0;
        };

        assert!(self.node(root).parent.is_none(), "root has a parent");
        assert!(!self.node(root).red, "root is red");

        let mut count = 0;
        let height = self.check_node(root, &mut count);
        assert_eq!(count, self.len, "len is out of sync");

        // the successor links must visit the nodes in the same order as an in-order walk.
        let mut in_order = Vec::new();
        self.collect(root, &mut in_order);
        let linked = self.iter().map(|(id, _)| id).collect::<Vec<_>>();
        assert_eq!(in_order, linked, "successor links disagree with the tree");

        let mut back = Vec::new();
        let mut node = self.last();
        while let Some(id) = node {
            back.push(id);
            node = self.prev(id);
        }
        back.reverse();
        assert_eq!(in_order, back, "predecessor links disagree with the tree");

        height
    }

    fn check_node(&self, id: NodeId, count: &mut usize) -> usize {
        *count += 1;
        let node = self.node(id);
        assert!(node.attached, "detached node reachable from the root");

        let mut heights = [0; 2];
        for (i, child) in [node.left, node.right].into_iter().enumerate() {
            if let Some(child) = child {
                assert_eq!(self.node(child).parent, Some(id), "broken parent link");
                if node.red {
                    assert!(!self.node(child).red, "red node with a red child");
                }
                heights[i] = self.check_node(child, count);
            }
        }
        assert_eq!(heights[0], heights[1], "unbalanced black height");

        heights[0] + !node.red as usize
    }

    fn collect(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let node = self.node(id);
        if let Some(left) = node.left {
            self.collect(left, out);
        }
        out.push(id);
        if let Some(right) = node.right {
            self.collect(right, out);
        }
    }
}
