/// Union-find over a fixed range of elements, with a live count of disjoint
/// sets.
///
/// Used where only a connectivity count is needed and the full region
/// adjacency graph would be overkill, e.g. "how many regions does this grid
/// have right now".
#[derive(Clone, Debug)]
pub struct DisjointSet {
    parent: Vec<usize>,
    count: usize,
}

impl DisjointSet {
    /// A partition of `0..n` into `n` singleton sets.
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            count: n,
        }
    }

    /// The root of the set containing `x`, with path compression.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // second pass: point everything on the way directly at the root
        let mut cursor = x;
        while self.parent[cursor] != root {
            let next = self.parent[cursor];
            self.parent[cursor] = root;
            cursor = next;
        }
        root
    }

    /// Merge the sets containing `p` and `q`. No-op if already merged.
    pub fn union(&mut self, p: usize, q: usize) {
        let root_p = self.find(p);
        let root_q = self.find(q);
        if root_p != root_q {
            self.parent[root_p] = root_q;
            self.count -= 1;
        }
    }

    /// Whether `p` and `q` are in the same set.
    pub fn connected(&mut self, p: usize, q: usize) -> bool {
        self.find(p) == self.find(q)
    }

    /// The current number of disjoint sets.
    pub fn count(&self) -> usize {
        self.count
    }
}
