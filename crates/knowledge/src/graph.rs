//! In-memory HNSW graph over document vectors.
//!
//! Wraps `hnsw_rs` with one variant per distance metric. Node ids are dense
//! positions assigned by the owning index.

use crate::schema::{DistanceMetric, HnswParams};
use anndists::dist::distances::{DistCosine, DistL2, Distance};
use hnsw_rs::filter::FilterT;
use hnsw_rs::hnsw::Hnsw;

const MAX_LAYER: usize = 16;

/// Inner-product distance `1 - a·b`, unclamped.
#[derive(Debug, Default, Clone, Copy)]
pub struct DistInnerProduct;

impl Distance<f32> for DistInnerProduct {
    fn eval(&self, va: &[f32], vb: &[f32]) -> f32 {
        1.0 - va.iter().zip(vb).map(|(a, b)| a * b).sum::<f32>()
    }
}

pub(crate) enum HnswGraph {
    Cosine(Hnsw<'static, f32, DistCosine>),
    L2(Hnsw<'static, f32, DistL2>),
    Ip(Hnsw<'static, f32, DistInnerProduct>),
}

impl HnswGraph {
    pub fn new(metric: DistanceMetric, params: &HnswParams, capacity: usize) -> Self {
        let max_elements = capacity.max(params.initial_cap).max(1);

        match metric {
            DistanceMetric::Cosine => HnswGraph::Cosine(Hnsw::new(
                params.m,
                max_elements,
                MAX_LAYER,
                params.ef_construction,
                DistCosine {},
            )),
            DistanceMetric::L2 => HnswGraph::L2(Hnsw::new(
                params.m,
                max_elements,
                MAX_LAYER,
                params.ef_construction,
                DistL2 {},
            )),
            DistanceMetric::Ip => HnswGraph::Ip(Hnsw::new(
                params.m,
                max_elements,
                MAX_LAYER,
                params.ef_construction,
                DistInnerProduct,
            )),
        }
    }

    pub fn insert(&self, vector: &[f32], node: usize) {
        match self {
            HnswGraph::Cosine(hnsw) => hnsw.insert((vector, node)),
            HnswGraph::L2(hnsw) => hnsw.insert((vector, node)),
            HnswGraph::Ip(hnsw) => hnsw.insert((vector, node)),
        }
    }

    /// Approximate `k` nearest among `allowed` (sorted node ids).
    ///
    /// Returns `(node, distance)` pairs in traversal order.
    pub fn search(&self, query: &[f32], k: usize, ef: usize, allowed: &[usize]) -> Vec<(usize, f32)> {
        if k == 0 || allowed.is_empty() {
            return Vec::new();
        }

        let allowed_ids: Vec<usize> = allowed.to_vec();
        let filter = Some(&allowed_ids as &dyn FilterT);

        let neighbours = match self {
            HnswGraph::Cosine(hnsw) => hnsw.search_filter(query, k, ef, filter),
            HnswGraph::L2(hnsw) => hnsw.search_filter(query, k, ef, filter),
            HnswGraph::Ip(hnsw) => hnsw.search_filter(query, k, ef, filter),
        };

        neighbours
            .into_iter()
            .map(|n| (n.d_id, n.distance))
            .collect()
    }

    /// Exact distance under the graph's metric.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            HnswGraph::Cosine(_) => DistCosine {}.eval(a, b),
            HnswGraph::L2(_) => DistL2 {}.eval(a, b),
            HnswGraph::Ip(_) => DistInnerProduct.eval(a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(dim: usize, axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[axis] = 1.0;
        v
    }

    #[test]
    fn test_search_respects_allowed_nodes() {
        let graph = HnswGraph::new(DistanceMetric::Cosine, &HnswParams::default(), 8);
        for node in 0..4 {
            graph.insert(&unit(4, node), node);
        }

        let all = graph.search(&unit(4, 2), 1, 10, &[0, 1, 2, 3]);
        assert_eq!(all[0].0, 2);
        assert!(all[0].1.abs() < 1e-5);

        let filtered = graph.search(&unit(4, 2), 4, 10, &[0, 3]);
        assert!(filtered.iter().all(|(node, _)| *node == 0 || *node == 3));
        assert!(graph.search(&unit(4, 2), 4, 10, &[]).is_empty());
    }

    #[test]
    fn test_exact_distances() {
        let graph = HnswGraph::new(DistanceMetric::Ip, &HnswParams::default(), 1);
        assert!((graph.distance(&[1.0, 0.0], &[1.0, 0.0])).abs() < 1e-6);
        assert!((graph.distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);

        let graph = HnswGraph::new(DistanceMetric::L2, &HnswParams::default(), 1);
        assert!(graph.distance(&[3.0, 4.0], &[3.0, 4.0]).abs() < 1e-6);
        assert!(graph.distance(&[0.0, 0.0], &[3.0, 4.0]) > graph.distance(&[0.0, 0.0], &[1.0, 0.0]));
    }
}
