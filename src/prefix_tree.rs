//! A small character trie used by the exclusion index.
//!
//! Queries take any `char` iterator, so a caller can walk a line backward
//! (`line[..start].chars().rev()`) or forward without building substrings.

/// A set of strings stored as a character trie.
///
/// Nodes live in a flat arena; each node keeps its children sorted by
/// character so lookups are a binary search.
#[derive(Debug, Clone)]
pub struct PrefixTree {
    nodes: Vec<Node>,
    len: usize,
    max_depth: usize,
}

#[derive(Debug, Clone, Default)]
struct Node {
    children: Vec<(char, usize)>,
    terminal: bool,
}

impl Default for PrefixTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefixTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            len: 0,
            max_depth: 0,
        }
    }

    /// Inserts a key, returning `true` if it was not already present.
    ///
    /// Inserting the empty key marks the root as terminal, after which every
    /// query has a zero-length match.
    pub fn insert<I>(&mut self, key: I) -> bool
    where
        I: IntoIterator<Item = char>,
    {
        let mut current = 0;
        let mut depth = 0;
        for c in key {
            current = match self.child(current, c) {
                Ok(next) => next,
                Err(slot) => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[current].children.insert(slot, (c, next));
                    next
                }
            };
            depth += 1;
        }

        if self.nodes[current].terminal {
            return false;
        }
        self.nodes[current].terminal = true;
        self.len += 1;
        self.max_depth = self.max_depth.max(depth);
        true
    }

    /// Returns `true` if exactly this key was inserted.
    pub fn contains<I>(&self, key: I) -> bool
    where
        I: IntoIterator<Item = char>,
    {
        let mut current = 0;
        for c in key {
            match self.child(current, c) {
                Ok(next) => current = next,
                Err(_) => return false,
            }
        }
        self.nodes[current].terminal
    }

    /// Walks `query` down the tree and returns the length (in chars) of the
    /// shortest stored key that is a prefix of it.
    ///
    /// The walk stops at the first terminal node, or as soon as the query
    /// leaves the tree, so it never reads more than `max_depth` characters.
    pub fn shortest_match<I>(&self, query: I) -> Option<usize>
    where
        I: IntoIterator<Item = char>,
    {
        let mut current = 0;
        if self.nodes[current].terminal {
            return Some(0);
        }
        for (depth, c) in query.into_iter().enumerate() {
            current = self.child(current, c).ok()?;
            if self.nodes[current].terminal {
                return Some(depth + 1);
            }
        }
        None
    }

    /// Length in chars of the longest stored key.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn child(&self, node: usize, c: char) -> std::result::Result<usize, usize> {
        let children = &self.nodes[node].children;
        children
            .binary_search_by_key(&c, |&(ch, _)| ch)
            .map(|i| children[i].1)
    }
}
