//! 2D k-d tree for fixed-radius neighbor queries
//!
//! Backs the distance-band weights builder: one O(log n + m) radius query per
//! feature instead of an O(n) distance scan against every other centroid.

/// A centroid site stored in the tree. `id` is the feature's position in the
/// source collection.
#[derive(Debug, Clone, Copy)]
pub struct Site {
    pub x: f64,
    pub y: f64,
    pub id: usize,
}

#[derive(Debug)]
struct KdNode {
    /// Index into `sites`
    site: usize,
    /// Split dimension: 0 = x, 1 = y
    split_dim: u8,
    left: Option<usize>,
    right: Option<usize>,
}

/// A 2D k-d tree over centroid sites.
#[derive(Debug)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    sites: Vec<Site>,
}

impl KdTree {
    /// Build a tree from `(x, y)` coordinates; site ids follow input order.
    ///
    /// Construction is O(n log n) via median partitioning.
    pub fn build(points: &[(f64, f64)]) -> Self {
        let sites: Vec<Site> = points
            .iter()
            .enumerate()
            .map(|(id, &(x, y))| Site { x, y, id })
            .collect();

        if sites.is_empty() {
            return Self {
                nodes: Vec::new(),
                sites,
            };
        }

        let mut order: Vec<usize> = (0..sites.len()).collect();
        let mut nodes = Vec::with_capacity(sites.len());
        build_recursive(&sites, &mut order, 0, &mut nodes);

        Self { nodes, sites }
    }

    /// Number of sites in the tree.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Ids of all sites within `radius` of `(qx, qy)`, inclusive.
    ///
    /// Results are in no particular order; the query point's own site is
    /// included when it lies within the radius.
    pub fn within_radius(&self, qx: f64, qy: f64, radius: f64) -> Vec<usize> {
        let mut found = Vec::new();
        if self.nodes.is_empty() || radius < 0.0 {
            return found;
        }
        self.radius_recursive(0, qx, qy, radius * radius, &mut found);
        found
    }

    fn radius_recursive(
        &self,
        node_idx: usize,
        qx: f64,
        qy: f64,
        radius_sq: f64,
        found: &mut Vec<usize>,
    ) {
        let node = &self.nodes[node_idx];
        let site = &self.sites[node.site];

        let dx = qx - site.x;
        let dy = qy - site.y;
        if dx * dx + dy * dy <= radius_sq {
            found.push(site.id);
        }

        // Signed distance to the splitting plane decides which subtrees can
        // still hold matches.
        let diff = if node.split_dim == 0 { dx } else { dy };

        if let Some(left) = node.left {
            if diff < 0.0 || diff * diff <= radius_sq {
                self.radius_recursive(left, qx, qy, radius_sq, found);
            }
        }
        if let Some(right) = node.right {
            if diff > 0.0 || diff * diff <= radius_sq {
                self.radius_recursive(right, qx, qy, radius_sq, found);
            }
        }
    }
}

fn build_recursive(
    sites: &[Site],
    order: &mut [usize],
    depth: usize,
    nodes: &mut Vec<KdNode>,
) -> usize {
    let split_dim = (depth % 2) as u8;
    let axis = |idx: usize| {
        if split_dim == 0 {
            sites[idx].x
        } else {
            sites[idx].y
        }
    };

    let median = order.len() / 2;
    order.select_nth_unstable_by(median, |&a, &b| axis(a).total_cmp(&axis(b)));

    let node_idx = nodes.len();
    nodes.push(KdNode {
        site: order[median],
        split_dim,
        left: None,
        right: None,
    });

    if median > 0 {
        let (lower, _) = order.split_at_mut(median);
        let left = build_recursive(sites, lower, depth + 1, nodes);
        nodes[node_idx].left = Some(left);
    }
    if median + 1 < order.len() {
        let upper = &mut order[median + 1..];
        let right = build_recursive(sites, upper, depth + 1, nodes);
        nodes[node_idx].right = Some(right);
    }

    node_idx
}
