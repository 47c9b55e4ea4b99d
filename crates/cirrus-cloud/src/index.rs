use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

use glam::DVec3;

/// One result of a proximity query: the insertion index of the matched point
/// and its Euclidean distance to the query position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index of the matched point, as passed to [`SpatialIndex::insert`].
    pub index: usize,
    /// Distance between the matched point and the query position.
    pub distance: f64,
}

/// A queryable container of point positions.
///
/// Implementations must agree on the query contract so that they can
/// substitute each other without changing callers: [`SpatialIndex::nearest`]
/// and [`SpatialIndex::within_radius`] return neighbors sorted by ascending
/// distance, and equal distances resolve by ascending insertion index.
pub trait SpatialIndex: fmt::Debug + Send + Sync {
    /// Insert a position under the caller-assigned index.
    fn insert(&mut self, index: usize, position: DVec3);

    /// Number of positions held by the index.
    fn len(&self) -> usize;

    /// Check whether the index holds no positions.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `k` held positions closest to `query`, ascending by distance.
    fn nearest(&self, query: DVec3, k: usize) -> Vec<Neighbor>;

    /// All held positions within `radius` of `query`, ascending by distance.
    fn within_radius(&self, query: DVec3, radius: f64) -> Vec<Neighbor>;

    /// Remove all held positions.
    fn clear(&mut self);

    /// Clone the index behind an object-safe interface.
    fn clone_box(&self) -> Box<dyn SpatialIndex>;
}

impl Clone for Box<dyn SpatialIndex> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

// Max-heap candidate: the worst match sits on top and is popped first.
// Distance ties order by insertion index, so the earliest inserted point
// survives heap replacement.
struct Candidate {
    neighbor: Neighbor,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.neighbor
            .distance
            .total_cmp(&other.neighbor.distance)
            .then(self.neighbor.index.cmp(&other.neighbor.index))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn offer(heap: &mut BinaryHeap<Candidate>, k: usize, neighbor: Neighbor) {
    if k == 0 {
        return;
    }
    let candidate = Candidate { neighbor };
    if heap.len() < k {
        heap.push(candidate);
    } else if let Some(top) = heap.peek() {
        if candidate.cmp(top) == Ordering::Less {
            heap.pop();
            heap.push(candidate);
        }
    }
}

fn collect_sorted(heap: BinaryHeap<Candidate>) -> Vec<Neighbor> {
    heap.into_sorted_vec()
        .into_iter()
        .map(|candidate| candidate.neighbor)
        .collect()
}

fn sort_neighbors(neighbors: &mut [Neighbor]) {
    neighbors.sort_unstable_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then(a.index.cmp(&b.index))
    });
}

/// Linear-scan reference index: O(1) insertion, O(n) per query.
///
/// This is the correctness baseline other [`SpatialIndex`] implementations
/// are validated against.
#[derive(Debug, Clone, Default)]
pub struct BruteForceIndex {
    entries: Vec<(usize, DVec3)>,
}

impl BruteForceIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpatialIndex for BruteForceIndex {
    fn insert(&mut self, index: usize, position: DVec3) {
        self.entries.push((index, position));
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn nearest(&self, query: DVec3, k: usize) -> Vec<Neighbor> {
        let mut heap = BinaryHeap::with_capacity(k);
        for (index, position) in &self.entries {
            let neighbor = Neighbor {
                index: *index,
                distance: position.distance(query),
            };
            offer(&mut heap, k, neighbor);
        }
        collect_sorted(heap)
    }

    fn within_radius(&self, query: DVec3, radius: f64) -> Vec<Neighbor> {
        let mut neighbors: Vec<Neighbor> = self
            .entries
            .iter()
            .map(|(index, position)| Neighbor {
                index: *index,
                distance: position.distance(query),
            })
            .filter(|neighbor| neighbor.distance <= radius)
            .collect();
        sort_neighbors(&mut neighbors);
        neighbors
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn clone_box(&self) -> Box<dyn SpatialIndex> {
        Box::new(self.clone())
    }
}

#[derive(Debug, Clone)]
struct KdNode {
    index: usize,
    position: DVec3,
    split_dimension: usize,
    left: Option<Box<KdNode>>,
    right: Option<Box<KdNode>>,
}

impl KdNode {
    fn new(index: usize, position: DVec3, split_dimension: usize) -> Self {
        Self {
            index,
            position,
            split_dimension,
            left: None,
            right: None,
        }
    }

    fn insert(&mut self, index: usize, position: DVec3) {
        let child = if position[self.split_dimension] < self.position[self.split_dimension] {
            &mut self.left
        } else {
            &mut self.right
        };
        match child {
            Some(node) => node.insert(index, position),
            None => {
                let split_dimension = (self.split_dimension + 1) % 3;
                *child = Some(Box::new(KdNode::new(index, position, split_dimension)));
            }
        }
    }

    fn knn_search(&self, query: DVec3, k: usize, heap: &mut BinaryHeap<Candidate>) {
        let neighbor = Neighbor {
            index: self.index,
            distance: self.position.distance(query),
        };
        offer(heap, k, neighbor);

        let split_distance = query[self.split_dimension] - self.position[self.split_dimension];
        let (nearer, further) = if split_distance < 0.0 {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };

        if let Some(node) = nearer {
            node.knn_search(query, k, heap);
        }

        // the further subtree only matters while the candidate set is not
        // full, or when the split plane is at most as far as the current
        // worst candidate (equality included, so boundary ties stay visible)
        let worst = if heap.len() < k {
            f64::INFINITY
        } else {
            heap.peek().map_or(f64::INFINITY, |c| c.neighbor.distance)
        };
        if split_distance.abs() <= worst {
            if let Some(node) = further {
                node.knn_search(query, k, heap);
            }
        }
    }

    fn radius_search(&self, query: DVec3, radius: f64, out: &mut Vec<Neighbor>) {
        let distance = self.position.distance(query);
        if distance <= radius {
            out.push(Neighbor {
                index: self.index,
                distance,
            });
        }

        let split_distance = query[self.split_dimension] - self.position[self.split_dimension];
        let (nearer, further) = if split_distance < 0.0 {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };

        if let Some(node) = nearer {
            node.radius_search(query, radius, out);
        }
        if split_distance.abs() <= radius {
            if let Some(node) = further {
                node.radius_search(query, radius, out);
            }
        }
    }
}

/// Axis-cycling kd-tree index with incremental insertion.
///
/// Queries prune whole subtrees against the current candidate set, so they
/// stay sublinear on well-spread clouds. Returns the same neighbor sets as
/// [`BruteForceIndex`], insertion-order ties included.
#[derive(Debug, Clone, Default)]
pub struct KdTreeIndex {
    root: Option<Box<KdNode>>,
    len: usize,
}

impl KdTreeIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpatialIndex for KdTreeIndex {
    fn insert(&mut self, index: usize, position: DVec3) {
        match &mut self.root {
            Some(root) => root.insert(index, position),
            None => self.root = Some(Box::new(KdNode::new(index, position, 0))),
        }
        self.len += 1;
    }

    fn len(&self) -> usize {
        self.len
    }

    fn nearest(&self, query: DVec3, k: usize) -> Vec<Neighbor> {
        let mut heap = BinaryHeap::with_capacity(k);
        if let Some(root) = &self.root {
            root.knn_search(query, k, &mut heap);
        }
        collect_sorted(heap)
    }

    fn within_radius(&self, query: DVec3, radius: f64) -> Vec<Neighbor> {
        let mut neighbors = Vec::new();
        if let Some(root) = &self.root {
            root.radius_search(query, radius, &mut neighbors);
        }
        sort_neighbors(&mut neighbors);
        neighbors
    }

    fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    fn clone_box(&self) -> Box<dyn SpatialIndex> {
        Box::new(self.clone())
    }
}
