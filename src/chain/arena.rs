use crate::Item;

/// Index of a node slot in a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) struct Node {
    pub value: Item,
    pub next: Option<NodeId>,
}

/// Growable node table owned by a single chain.
///
/// Released slots go on a free list and are handed out again by `alloc`.
/// A `NodeId` is only meaningful while its node is linked into the chain;
/// reading a released slot returns whatever it last held.
#[derive(Debug, Default)]
pub(super) struct NodeArena {
    slots: Vec<Node>,
    free: Vec<NodeId>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, value: Item) -> NodeId {
        let node = Node { value, next: None };
        match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = node;
                id
            }
            None => {
                let id = NodeId(
                    u32::try_from(self.slots.len()).expect("node arena is full at u32::MAX slots"),
                );
                self.slots.push(node);
                id
            }
        }
    }

    /// Returns the node's contents and puts its slot on the free list.
    pub fn release(&mut self, id: NodeId) -> Node {
        let node = self.slots[id.index()];
        self.free.push(id);
        node
    }

    #[inline]
    pub fn value(&self, id: NodeId) -> Item {
        self.slots[id.index()].value
    }

    #[inline]
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.slots[id.index()].next
    }

    #[inline]
    pub fn set_next(&mut self, id: NodeId, next: Option<NodeId>) {
        self.slots[id.index()].next = next;
    }

    /// Slots currently handed out.
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Total slots ever allocated, live or free.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
