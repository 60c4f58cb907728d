use rustc_hash::FxHashMap;

use crate::key::Key;

/// Stores memoized results keyed by argument tuples, one tuple position per
/// level.
///
/// A tuple usually ends in a leaf. When tuples of different lengths share a
/// prefix (variadic functions), the shorter one ends at a branch instead and
/// its result is kept in the branch's terminal slot.
pub struct Trie<R> {
    root: Branch<R>,
}

/// A node in the trie.
enum Node<R> {
    /// Further tuple positions.
    Branch(Branch<R>),
    /// The result for one complete tuple, if computed.
    Leaf(Option<R>),
}

struct Branch<R> {
    /// Maps from the key at this level to the next node.
    children: FxHashMap<Key, Node<R>>,
    /// The result for the tuple that ends exactly here.
    terminal: Option<R>,
}

impl<R> Trie<R> {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self { root: Branch::new() }
    }

    /// Look up the result stored for `keys`.
    ///
    /// Materializes the path to `keys` as a side effect, leaving an empty leaf
    /// at its end if nothing was stored yet.
    pub fn lookup(&mut self, keys: &[Key]) -> Option<R>
    where
        R: Clone,
    {
        self.slot(keys).clone()
    }

    /// Store the result for `keys`, replacing any previous one.
    pub fn store(&mut self, keys: &[Key], result: R) {
        *self.slot(keys) = Some(result);
    }

    /// Drop all stored results.
    pub fn clear(&mut self) {
        self.root = Branch::new();
    }

    /// Invalidate every tuple that starts with `prefix`.
    ///
    /// Does nothing if the prefix was never seen, is empty, or is longer than
    /// the tuples stored along its path. The node addressed by the prefix stays
    /// in place, only its contents are dropped.
    pub fn remove(&mut self, prefix: &[Key]) {
        let Some((last, init)) = prefix.split_last() else { return };

        let mut branch = &mut self.root;
        for key in init {
            match branch.children.get_mut(key) {
                Some(Node::Branch(next)) => branch = next,
                Some(Node::Leaf(_)) | None => return,
            }
        }

        match branch.children.get_mut(last) {
            Some(Node::Branch(target)) => {
                target.children.clear();
                target.terminal = None;
            }
            Some(Node::Leaf(slot)) => *slot = None,
            None => {}
        }
    }

    /// The number of stored results.
    pub fn len(&self) -> usize {
        self.root.len()
    }

    /// Whether no result is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The result slot for `keys`, creating the path as needed.
    fn slot(&mut self, keys: &[Key]) -> &mut Option<R> {
        let Some((last, init)) = keys.split_last() else {
            return &mut self.root.terminal;
        };

        let mut branch = &mut self.root;
        for key in init {
            branch = branch.descend(key);
        }

        match branch.children.entry(last.clone()).or_insert(Node::Leaf(None)) {
            Node::Leaf(slot) => slot,
            Node::Branch(next) => &mut next.terminal,
        }
    }
}

impl<R> Branch<R> {
    fn new() -> Self {
        Self { children: FxHashMap::default(), terminal: None }
    }

    /// The child branch for `key`. A missing child is created and a leaf is
    /// turned into a branch that keeps the leaf's result as its terminal.
    fn descend(&mut self, key: &Key) -> &mut Branch<R> {
        let node = self
            .children
            .entry(key.clone())
            .or_insert_with(|| Node::Branch(Branch::new()));

        if let Node::Leaf(slot) = node {
            let terminal = slot.take();
            *node = Node::Branch(Branch { children: FxHashMap::default(), terminal });
        }

        match node {
            Node::Branch(branch) => branch,
            Node::Leaf(_) => unreachable!("leaf was replaced by a branch"),
        }
    }

    fn len(&self) -> usize {
        let own = usize::from(self.terminal.is_some());
        own + self
            .children
            .values()
            .map(|node| match node {
                Node::Branch(branch) => branch.len(),
                Node::Leaf(slot) => usize::from(slot.is_some()),
            })
            .sum::<usize>()
    }
}

impl<R> Default for Trie<R> {
    fn default() -> Self {
        Self::new()
    }
}
