use std::cmp::Ordering;
use std::collections::HashMap;

/// Disjoint-set forest with path compression and union by rank.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            let next = self.parent[x];
            self.parent[x] = self.parent[next];
            x = next;
        }
        x
    }

    /// Merge the sets containing `x` and `y`. Returns false if they were already joined.
    pub fn union(&mut self, x: usize, y: usize) -> bool {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x == root_y {
            return false;
        }

        match self.rank[root_x].cmp(&self.rank[root_y]) {
            Ordering::Less => self.parent[root_x] = root_y,
            Ordering::Greater => self.parent[root_y] = root_x,
            Ordering::Equal => {
                self.parent[root_y] = root_x;
                self.rank[root_x] += 1;
            }
        }
        true
    }

    /// Dense component ids, numbered 0.. in order of first appearance by element index.
    pub fn component_ids(&mut self) -> Vec<usize> {
        let n = self.parent.len();
        let mut ids = HashMap::new();
        let mut result = Vec::with_capacity(n);

        for x in 0..n {
            let root = self.find(x);
            let next_id = ids.len();
            result.push(*ids.entry(root).or_insert(next_id));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_find_components() {
        let mut uf = UnionFind::new(6);
        assert!(uf.union(4, 5));
        assert!(uf.union(0, 2));
        assert!(!uf.union(2, 0));

        let ids = uf.component_ids();
        assert_eq!(ids, vec![0, 1, 0, 2, 3, 3]);
    }

    #[test]
    fn test_union_find_chain() {
        let mut uf = UnionFind::new(4);
        uf.union(0, 1);
        uf.union(1, 2);
        uf.union(2, 3);
        assert_eq!(uf.find(3), uf.find(0));
        assert_eq!(uf.component_ids(), vec![0, 0, 0, 0]);
    }
}
