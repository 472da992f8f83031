//! Listing grouping via union-find.

use super::similarity::similarity;

/// Disjoint-set forest with path compression and union by size.
struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
    }
}

/// Groups normalized names whose pairwise similarity reaches the
/// threshold, transitively. Returns one cluster id per input, with ids
/// densely numbered in order of first appearance so the mapping is a
/// pure function of the input sequence.
pub fn cluster(names: &[&str], threshold: f64) -> Vec<usize> {
    let mut forest = UnionFind::new(names.len());
    for i in 0..names.len() {
        for j in (i + 1)..names.len() {
            if similarity(names[i], names[j]) >= threshold {
                forest.union(i, j);
            }
        }
    }

    let mut dense: Vec<Option<usize>> = vec![None; names.len()];
    let mut next = 0usize;
    (0..names.len())
        .map(|i| {
            let root = forest.find(i);
            *dense[root].get_or_insert_with(|| {
                let id = next;
                next += 1;
                id
            })
        })
        .collect()
}
