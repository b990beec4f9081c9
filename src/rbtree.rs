use std::ops::{Index, IndexMut};

mod debug;


/// Index of a node in the arena of a [`RbTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(u32);

struct Node<T> {
    value: T,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    /// The in-order predecessor.
    prev: Option<NodeId>,
    /// The in-order successor.
    next: Option<NodeId>,
    red: bool,
    /// False once the node was removed from the tree.
    attached: bool,
}

/// A red-black tree ordered by position instead of by key.
///
/// Values are placed relative to an existing node with [`RbTree::insert_successor`], so the
/// tree is a sequence with logarithmic insertion and removal. Every node keeps links to its
/// in-order neighbors, making predecessor and successor queries O(1).
///
/// Nodes live in an arena and are addressed by [`NodeId`]. Removed nodes are never reused: their
/// value stays readable until [`RbTree::clear`] is called.
pub struct RbTree<T> {
    nodes: Vec<Node<T>>,
    root: Option<NodeId>,
    len: usize,
}
impl<T> Default for RbTree<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T> RbTree<T> {
    pub fn new() -> Self {
        RbTree {
            nodes: Vec::new(),
            root: None,
            len: 0,
        }
    }

    /// Drop every node, attached or not, keeping the allocation.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    /// Number of nodes currently in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn first(&self) -> Option<NodeId> {
        self.root.map(|root| self.first_in(root))
    }

    pub fn last(&self) -> Option<NodeId> {
        let mut node = self.root?;
        while let Some(right) = self.node(node).right {
            node = right;
        }
        Some(node)
    }

    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next
    }

    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).left
    }

    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).right
    }

    /// Returns false if the node was removed.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.node(id).attached
    }

    pub fn get(&self, id: NodeId) -> &T {
        &self.node(id).value
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.node_mut(id).value
    }

    /// Iterate over the values in order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            tree: self,
            next: self.first(),
        }
    }

    /// Insert `value` immediately after the node `after`, or as the first node if `after` is
    /// `None`. Returns the id of the new node.
    pub fn insert_successor(&mut self, after: Option<NodeId>, value: T) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            value,
            parent: None,
            left: None,
            right: None,
            prev: None,
            next: None,
            red: true,
            attached: true,
        });

        let parent = match after {
            Some(node) => {
                test_assert!(self.node(node).attached, "inserting after a removed node");
                let next = self.node(node).next;
                self.node_mut(id).prev = Some(node);
                self.node_mut(id).next = next;
                if let Some(next) = next {
                    self.node_mut(next).prev = Some(id);
                }
                self.node_mut(node).next = Some(id);

                // the successor of `node` is either its right child, or the leftmost node of its
                // right subtree.
                match self.node(node).right {
                    Some(right) => {
                        let first = self.first_in(right);
                        self.node_mut(first).left = Some(id);
                        Some(first)
                    }
                    None => {
                        self.node_mut(node).right = Some(id);
                        Some(node)
                    }
                }
            }
            None => match self.root {
                Some(root) => {
                    let first = self.first_in(root);
                    self.node_mut(id).next = Some(first);
                    self.node_mut(first).prev = Some(id);
                    self.node_mut(first).left = Some(id);
                    Some(first)
                }
                None => {
                    self.root = Some(id);
                    None
                }
            },
        };

        self.node_mut(id).parent = parent;
        self.len += 1;
        self.insert_fixup(id);

        id
    }

    fn insert_fixup(&mut self, mut node: NodeId) {
        let mut parent = self.node(node).parent;
        while let Some(mut p) = parent.filter(|&p| self.node(p).red) {
            // a red node is never the root, so it has a parent.
            let Some(grandpa) = self.node(p).parent else {
                break;
            };

            if Some(p) == self.node(grandpa).left {
                match self.node(grandpa).right.filter(|&u| self.node(u).red) {
                    Some(uncle) => {
                        self.node_mut(p).red = false;
                        self.node_mut(uncle).red = false;
                        self.node_mut(grandpa).red = true;
                        node = grandpa;
                    }
                    None => {
                        if Some(node) == self.node(p).right {
                            self.rotate_left(p);
                            // after the rotation `node` is the parent of `p`.
                            std::mem::swap(&mut node, &mut p);
                        }
                        self.node_mut(p).red = false;
                        self.node_mut(grandpa).red = true;
                        self.rotate_right(grandpa);
                    }
                }
            } else {
                match self.node(grandpa).left.filter(|&u| self.node(u).red) {
                    Some(uncle) => {
                        self.node_mut(p).red = false;
                        self.node_mut(uncle).red = false;
                        self.node_mut(grandpa).red = true;
                        node = grandpa;
                    }
                    None => {
                        if Some(node) == self.node(p).left {
                            self.rotate_right(p);
                            std::mem::swap(&mut node, &mut p);
                        }
                        self.node_mut(p).red = false;
                        self.node_mut(grandpa).red = true;
                        self.rotate_left(grandpa);
                    }
                }
            }
            parent = self.node(node).parent;
        }

        if let Some(root) = self.root {
            self.node_mut(root).red = false;
        }
    }

    /// Remove the node from the tree. Its value stays accessible through its id.
    pub fn remove(&mut self, node: NodeId) {
        test_assert!(self.node(node).attached, "removing a node twice");
        if !self.node(node).attached {
            return;
        }

        let prev = self.node(node).prev;
        let succ = self.node(node).next;
        if let Some(succ) = succ {
            self.node_mut(succ).prev = prev;
        }
        if let Some(prev) = prev {
            self.node_mut(prev).next = succ;
        }
        self.len -= 1;

        let mut parent = self.node(node).parent;
        let left = self.node(node).left;
        let right = self.node(node).right;

        // the node that takes the place of `node`.
        let next = match (left, right) {
            (None, right) => right,
            (left, None) => left,
            (Some(_), Some(right)) => Some(self.first_in(right)),
        };
        self.replace_child(parent, node, next);

        let is_red;
        let mut child;
        match (left, right, next) {
            (Some(left), Some(right), Some(next)) => {
                is_red = self.node(next).red;
                let node_red = self.node(node).red;
                self.node_mut(next).red = node_red;
                self.node_mut(next).left = Some(left);
                self.node_mut(left).parent = Some(next);
                if next != right {
                    let next_parent = self.node(next).parent;
                    self.node_mut(next).parent = parent;
                    child = self.node(next).right;
                    if let Some(next_parent) = next_parent {
                        self.node_mut(next_parent).left = child;
                    }
                    parent = next_parent;
                    self.node_mut(next).right = Some(right);
                    self.node_mut(right).parent = Some(next);
                } else {
                    self.node_mut(next).parent = parent;
                    parent = Some(next);
                    child = self.node(next).right;
                }
            }
            _ => {
                is_red = self.node(node).red;
                child = next;
            }
        }
        if let Some(child) = child {
            self.node_mut(child).parent = parent;
        }

        {
            let n = self.node_mut(node);
            n.prev = None;
            n.next = None;
            n.parent = None;
            n.left = None;
            n.right = None;
            n.attached = false;
        }

        if is_red {
            return;
        }
        if let Some(c) = child.filter(|&c| self.node(c).red) {
            self.node_mut(c).red = false;
            return;
        }

        loop {
            if child == self.root {
                break;
            }
            let Some(p) = parent else {
                break;
            };

            if child == self.node(p).left {
                // a black-height deficit on this side implies a sibling.
                let Some(mut sibling) = self.node(p).right else {
                    break;
                };
                if self.node(sibling).red {
                    self.node_mut(sibling).red = false;
                    self.node_mut(p).red = true;
                    self.rotate_left(p);
                    let Some(s) = self.node(p).right else {
                        break;
                    };
                    sibling = s;
                }
                if self.is_red(self.node(sibling).left) || self.is_red(self.node(sibling).right) {
                    if !self.is_red(self.node(sibling).right) {
                        if let Some(l) = self.node(sibling).left {
                            self.node_mut(l).red = false;
                        }
                        self.node_mut(sibling).red = true;
                        self.rotate_right(sibling);
                        let Some(s) = self.node(p).right else {
                            break;
                        };
                        sibling = s;
                    }
                    let p_red = self.node(p).red;
                    self.node_mut(sibling).red = p_red;
                    self.node_mut(p).red = false;
                    if let Some(r) = self.node(sibling).right {
                        self.node_mut(r).red = false;
                    }
                    self.rotate_left(p);
                    child = self.root;
                    break;
                }
                self.node_mut(sibling).red = true;
            } else {
                let Some(mut sibling) = self.node(p).left else {
                    break;
                };
                if self.node(sibling).red {
                    self.node_mut(sibling).red = false;
                    self.node_mut(p).red = true;
                    self.rotate_right(p);
                    let Some(s) = self.node(p).left else {
                        break;
                    };
                    sibling = s;
                }
                if self.is_red(self.node(sibling).left) || self.is_red(self.node(sibling).right) {
                    if !self.is_red(self.node(sibling).left) {
                        if let Some(r) = self.node(sibling).right {
                            self.node_mut(r).red = false;
                        }
                        self.node_mut(sibling).red = true;
                        self.rotate_left(sibling);
                        let Some(s) = self.node(p).left else {
                            break;
                        };
                        sibling = s;
                    }
                    let p_red = self.node(p).red;
                    self.node_mut(sibling).red = p_red;
                    self.node_mut(p).red = false;
                    if let Some(l) = self.node(sibling).left {
                        self.node_mut(l).red = false;
                    }
                    self.rotate_right(p);
                    child = self.root;
                    break;
                }
                self.node_mut(sibling).red = true;
            }

            child = Some(p);
            parent = self.node(p).parent;
            if self.node(p).red {
                break;
            }
        }

        if let Some(child) = child {
            self.node_mut(child).red = false;
        }
    }

    fn rotate_left(&mut self, p: NodeId) {
        let Some(q) = self.node(p).right else {
            test_assert!(false, "rotate_left without right child");
            return;
        };
        let parent = self.node(p).parent;
        self.replace_child(parent, p, Some(q));
        self.node_mut(q).parent = parent;
        self.node_mut(p).parent = Some(q);
        let inner = self.node(q).left;
        self.node_mut(p).right = inner;
        if let Some(inner) = inner {
            self.node_mut(inner).parent = Some(p);
        }
        self.node_mut(q).left = Some(p);
    }

    fn rotate_right(&mut self, p: NodeId) {
        let Some(q) = self.node(p).left else {
            test_assert!(false, "rotate_right without left child");
            return;
        };
        let parent = self.node(p).parent;
        self.replace_child(parent, p, Some(q));
        self.node_mut(q).parent = parent;
        self.node_mut(p).parent = Some(q);
        let inner = self.node(q).right;
        self.node_mut(p).left = inner;
        if let Some(inner) = inner {
            self.node_mut(inner).parent = Some(p);
        }
        self.node_mut(q).right = Some(p);
    }

    /// Make `new` take the place of `old` as a child of `parent` (or as the root).
    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            Some(parent) => {
                if self.node(parent).left == Some(old) {
                    self.node_mut(parent).left = new;
                } else {
                    self.node_mut(parent).right = new;
                }
            }
            None => self.root = new,
        }
    }

    fn first_in(&self, mut node: NodeId) -> NodeId {
        while let Some(left) = self.node(node).left {
            node = left;
        }
        node
    }

    fn is_red(&self, node: Option<NodeId>) -> bool {
        node.is_some_and(|n| self.node(n).red)
    }

    fn node(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        &mut self.nodes[id.0 as usize]
    }
}

impl<T> Index<NodeId> for RbTree<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        self.get(id)
    }
}
impl<T> IndexMut<NodeId> for RbTree<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        self.get_mut(id)
    }
}

/// In-order iterator over the values of a [`RbTree`], following the successor links.
pub struct Iter<'a, T> {
    tree: &'a RbTree<T>,
    next: Option<NodeId>,
}
impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (NodeId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.next(id);
        Some((id, self.tree.get(id)))
    }
}
