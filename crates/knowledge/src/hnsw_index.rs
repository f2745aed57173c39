//! HNSW vector index over the embedded document store.
//!
//! Documents live in the [`DocumentStore`]; the search structure is an
//! in-memory HNSW graph rebuilt from the stored hashes whenever the index is
//! opened or created. Superseded graph nodes are tombstoned and never
//! returned.

use crate::codec::bytes_to_embedding;
use crate::graph::HnswGraph;
use crate::query::KnnQuery;
use crate::schema::{
    DistanceMetric, HnswParams, IndexSchema, VectorField, FIELD_CATEGORY, FIELD_EMBEDDING,
    FIELD_SOURCE,
};
use crate::store::{DocumentStore, Hash};
use crate::types::{DocumentFields, IndexInfo, SearchHit, StoredDocument};
use crate::vector_index::VectorIndex;
use docrag_core::{AppError, AppResult};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// Approximate per-link bookkeeping cost used for the size estimate.
const LINK_BYTES: usize = 8;

struct Node {
    key: String,
    source: String,
    category: String,
    vector: Vec<f32>,
    live: bool,
}

impl Node {
    fn tag(&self, field: &str) -> Option<&str> {
        match field {
            FIELD_SOURCE => Some(&self.source),
            FIELD_CATEGORY => Some(&self.category),
            _ => None,
        }
    }
}

struct IndexState {
    schema: IndexSchema,
    vector_name: String,
    vector: VectorField,
    graph: HnswGraph,
    nodes: Vec<Node>,
    key_to_node: HashMap<String, usize>,
    live: usize,
    indexing_failures: usize,
}

impl IndexState {
    fn build(schema: IndexSchema, docs: Vec<(String, Hash)>) -> AppResult<Self> {
        let (vector_name, vector) = schema
            .vector_field()
            .map(|(name, v)| (name.to_string(), v.clone()))
            .ok_or_else(|| {
                AppError::Schema(format!("Index '{}' has no vector attribute", schema.name))
            })?;

        let graph = HnswGraph::new(vector.metric, &vector.hnsw, docs.len());
        let mut state = Self {
            schema,
            vector_name,
            vector,
            graph,
            nodes: Vec::with_capacity(docs.len()),
            key_to_node: HashMap::new(),
            live: 0,
            indexing_failures: 0,
        };

        for (key, hash) in docs {
            let decoded = hash
                .get(FIELD_EMBEDDING)
                .ok_or_else(|| AppError::Schema("missing embedding field".to_string()))
                .and_then(|bytes| decode_vector(bytes, state.vector.dim));

            match decoded {
                Ok(vector) => state.insert(key, &DocumentFields::from_hash(&hash), vector),
                Err(e) => {
                    state.indexing_failures += 1;
                    tracing::warn!("Not indexing {}: {}", key, e);
                }
            }
        }

        Ok(state)
    }

    fn insert(&mut self, key: String, fields: &DocumentFields, vector: Vec<f32>) {
        if let Some(old) = self.key_to_node.get(&key).copied() {
            if let Some(node) = self.nodes.get_mut(old) {
                if node.live {
                    node.live = false;
                    self.live -= 1;
                }
            }
        }

        let id = self.nodes.len();
        self.graph.insert(&vector, id);
        self.nodes.push(Node {
            key: key.clone(),
            source: fields.source.clone(),
            category: fields.category.clone(),
            vector,
            live: true,
        });
        self.key_to_node.insert(key, id);
        self.live += 1;

        if self.nodes.len() - self.live > self.live {
            self.compact();
        }
    }

    /// Rebuild the graph from live nodes only, renumbering them densely.
    fn compact(&mut self) {
        let dead = self.nodes.len() - self.live;
        let live_nodes: Vec<Node> = std::mem::take(&mut self.nodes)
            .into_iter()
            .filter(|node| node.live)
            .collect();

        self.graph = HnswGraph::new(self.vector.metric, &self.vector.hnsw, live_nodes.len());
        self.key_to_node.clear();
        for (id, node) in live_nodes.iter().enumerate() {
            self.graph.insert(&node.vector, id);
            self.key_to_node.insert(node.key.clone(), id);
        }
        self.nodes = live_nodes;

        tracing::debug!(
            "Compacted index graph: dropped {} superseded nodes, {} live",
            dead,
            self.live
        );
    }

    fn reset(&mut self) {
        self.graph = HnswGraph::new(self.vector.metric, &self.vector.hnsw, 0);
        self.nodes.clear();
        self.key_to_node.clear();
        self.live = 0;
        self.indexing_failures = 0;
    }

    fn exact_search(&self, query: &[f32], allowed: &[usize]) -> Vec<(usize, f32)> {
        allowed
            .iter()
            .filter_map(|&id| {
                self.nodes
                    .get(id)
                    .map(|node| (id, self.graph.distance(query, &node.vector)))
            })
            .collect()
    }
}

/// Decode and validate a packed embedding against the schema dimension.
fn decode_vector(bytes: &[u8], dim: usize) -> AppResult<Vec<f32>> {
    if bytes.len() != dim * 4 {
        return Err(AppError::Schema(format!(
            "Embedding is {} bytes, expected {} ({} x f32)",
            bytes.len(),
            dim * 4,
            dim
        )));
    }

    let vector = bytes_to_embedding(bytes)?;
    if vector.iter().any(|x| !x.is_finite()) {
        return Err(AppError::Schema(
            "Embedding contains NaN or infinite values".to_string(),
        ));
    }

    Ok(vector)
}

/// HNSW-backed [`VectorIndex`] bound to one index name.
pub struct HnswVectorIndex {
    name: String,
    store: Arc<DocumentStore>,
    state: Option<IndexState>,
}

impl HnswVectorIndex {
    /// Bind to `name` in `store`, rebuilding the graph if the index exists.
    pub fn open(store: Arc<DocumentStore>, name: &str) -> AppResult<Self> {
        if name.trim().is_empty() || name.contains(':') {
            return Err(AppError::Schema(format!("Invalid index name '{}'", name)));
        }

        let state = match store.load_index_definition(name)? {
            Some(schema) => {
                let docs = store.load_prefix(&schema.prefix)?;
                let state = IndexState::build(schema, docs)?;
                tracing::debug!(
                    "Opened index '{}' with {} documents ({} indexing failures)",
                    name,
                    state.live,
                    state.indexing_failures
                );
                Some(state)
            }
            None => None,
        };

        Ok(Self {
            name: name.to_string(),
            store,
            state,
        })
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Names of every index in `store` that has a vector attribute.
    pub fn list_vector_indexes(store: &DocumentStore) -> AppResult<Vec<String>> {
        Ok(store
            .list_index_definitions()?
            .into_iter()
            .filter(|schema| schema.vector_field().is_some())
            .map(|schema| schema.name)
            .collect())
    }

    fn state(&self) -> AppResult<&IndexState> {
        self.state
            .as_ref()
            .ok_or_else(|| AppError::IndexNotFound(self.name.clone()))
    }
}

impl VectorIndex for HnswVectorIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn create(&mut self, dim: usize, metric: DistanceMetric, params: HnswParams) -> AppResult<()> {
        // Validate before touching the existing definition
        let schema = IndexSchema::documents(&self.name, dim, metric, params)?;

        if self.drop_index()? {
            tracing::debug!("Replaced existing index '{}'", self.name);
        }

        self.store.save_index_definition(&schema)?;
        let docs = self.store.load_prefix(&schema.prefix)?;
        let state = IndexState::build(schema, docs)?;

        tracing::info!(
            index = %self.name,
            dim,
            metric = %metric,
            m = params.m,
            ef_construction = params.ef_construction,
            docs = state.live,
            "Created index"
        );
        if state.indexing_failures > 0 {
            tracing::warn!(
                "{} stored documents could not be indexed",
                state.indexing_failures
            );
        }

        self.state = Some(state);
        Ok(())
    }

    fn drop_index(&mut self) -> AppResult<bool> {
        let removed = self.store.remove_index_definition(&self.name)?;
        let had_state = self.state.take().is_some();

        if removed || had_state {
            tracing::info!("Dropped index '{}' (documents kept)", self.name);
        }
        Ok(removed || had_state)
    }

    fn exists(&self) -> bool {
        self.state.is_some()
    }

    fn schema(&self) -> Option<&IndexSchema> {
        self.state.as_ref().map(|s| &s.schema)
    }

    fn upsert(&mut self, doc_id: &str, fields: &DocumentFields, embedding: &[u8]) -> AppResult<()> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| AppError::IndexNotFound(self.name.clone()))?;

        if doc_id.is_empty() {
            return Err(AppError::Schema("Document id must not be empty".to_string()));
        }

        let vector = decode_vector(embedding, state.vector.dim)?;
        let key = state.schema.key_for(doc_id);

        self.store.put_hash(&key, &fields.to_hash(embedding))?;
        tracing::debug!("Upserted {}", key);
        state.insert(key, fields, vector);

        Ok(())
    }

    fn delete_all(&mut self) -> AppResult<usize> {
        let prefix = IndexSchema::prefix_for(&self.name);
        let removed = self.store.delete_prefix(&prefix)?;

        if let Some(state) = self.state.as_mut() {
            state.reset();
        }

        tracing::info!("Deleted {} documents under '{}'", removed, prefix);
        Ok(removed)
    }

    fn knn_search(&self, query: &KnnQuery, vector: &[f32]) -> AppResult<Vec<SearchHit>> {
        let state = self.state()?;

        if query.vector_field != state.vector_name {
            return Err(AppError::Query(format!(
                "Unknown vector field '@{}' (index '{}' uses '@{}')",
                query.vector_field, self.name, state.vector_name
            )));
        }
        if vector.len() != state.vector.dim {
            return Err(AppError::Query(format!(
                "Query vector has {} dimensions, index '{}' expects {}",
                vector.len(),
                self.name,
                state.vector.dim
            )));
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(AppError::Query(
                "Query vector contains NaN or infinite values".to_string(),
            ));
        }
        if let Some(ref filter) = query.filter {
            if !state.schema.is_tag_field(&filter.field) {
                return Err(AppError::Query(format!(
                    "'{}' is not a TAG field of index '{}'",
                    filter.field, self.name
                )));
            }
        }

        if query.k == 0 {
            return Ok(Vec::new());
        }

        let allowed: Vec<usize> = state
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.live)
            .filter(|(_, node)| match query.filter {
                Some(ref f) => f.matches(node.tag(&f.field)),
                None => true,
            })
            .map(|(id, _)| id)
            .collect();

        if allowed.is_empty() {
            return Ok(Vec::new());
        }

        // hnsw_rs sizes its buffers from k and ef
        let k = query.k.min(allowed.len());
        let ef = state.vector.hnsw.ef_runtime.max(k);
        let mut ranked = state.graph.search(vector, k, ef, &allowed);

        // A selective filter can starve the graph walk
        if ranked.len() < k {
            tracing::debug!(
                "Graph search returned {}/{} candidates, scanning {} filtered documents",
                ranked.len(),
                k,
                allowed.len()
            );
            ranked = state.exact_search(vector, &allowed);
        }

        ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        ranked.truncate(k);

        let mut hits = Vec::with_capacity(ranked.len());
        for (id, distance) in ranked {
            let Some(node) = state.nodes.get(id) else {
                continue;
            };
            let Some(hash) = self.store.get_hash(&node.key)? else {
                tracing::warn!("Indexed key {} is missing from the store", node.key);
                continue;
            };

            hits.push(SearchHit {
                id: state.schema.doc_id(&node.key).unwrap_or(&node.key).to_string(),
                key: node.key.clone(),
                fields: DocumentFields::from_hash(&hash),
                score: distance,
            });
        }

        tracing::debug!(
            "KNN '{}' on '{}' returned {} hits",
            query,
            self.name,
            hits.len()
        );

        Ok(hits)
    }

    fn info(&self) -> AppResult<IndexInfo> {
        let state = self.state()?;
        let nodes = state.live;
        let vector_bytes = nodes * state.vector.dim * 4;
        let link_bytes = nodes * state.vector.hnsw.m * 2 * LINK_BYTES;

        Ok(IndexInfo {
            name: self.name.clone(),
            prefix: state.schema.prefix.clone(),
            num_docs: state.live,
            indexing_failures: state.indexing_failures,
            vector_index_sz_mb: (vector_bytes + link_bytes) as f64 / (1024.0 * 1024.0),
            stored_bytes: self.store.prefix_size_bytes(&state.schema.prefix)?,
            dim: state.vector.dim,
            metric: state.vector.metric,
            hnsw: state.vector.hnsw,
            attributes: state.schema.fields.clone(),
            created_at: state.schema.created_at,
        })
    }

    fn documents(&self) -> AppResult<Vec<StoredDocument>> {
        let state = self.state()?;
        let docs = self.store.load_prefix(&state.schema.prefix)?;

        Ok(docs
            .into_iter()
            .map(|(key, hash)| StoredDocument {
                id: state.schema.doc_id(&key).unwrap_or(&key).to_string(),
                embedding_bytes: hash.get(FIELD_EMBEDDING).map_or(0, Vec::len),
                fields: DocumentFields::from_hash(&hash),
                key,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::embedding_to_bytes;

    fn fields(title: &str, category: &str) -> DocumentFields {
        DocumentFields {
            content: format!("{} body", title),
            title: title.to_string(),
            source: "md".to_string(),
            category: category.to_string(),
            full_path: format!("/kb/{}/{}.md", category, title),
        }
    }

    fn axis(dim: usize, i: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[i % dim] = 1.0;
        v
    }

    fn created(dim: usize) -> HnswVectorIndex {
        let store = Arc::new(DocumentStore::open_in_memory().unwrap());
        let mut index = HnswVectorIndex::open(store, "docs").unwrap();
        index
            .create(dim, DistanceMetric::Cosine, HnswParams::default())
            .unwrap();
        index
    }

    fn put(index: &mut HnswVectorIndex, id: &str, f: DocumentFields, v: &[f32]) {
        index.upsert(id, &f, &embedding_to_bytes(v)).unwrap();
    }

    #[test]
    fn test_self_query_is_exact_match() {
        let mut index = created(8);
        put(&mut index, "a", fields("alpha", "x"), &axis(8, 0));
        put(&mut index, "b", fields("beta", "x"), &axis(8, 1));

        let hits = index.knn_search(&KnnQuery::new(2), &axis(8, 1)).unwrap();
        assert_eq!(hits[0].id, "b");
        assert_eq!(hits[0].key, "docs:b");
        assert!((hits[0].similarity() - 1.0).abs() < 1e-5);
        assert_eq!(hits[0].fields.title, "beta");
    }

    #[test]
    fn test_upsert_replaces_record() {
        let mut index = created(4);
        put(&mut index, "a", fields("first", "x"), &axis(4, 0));
        put(&mut index, "a", fields("second", "y"), &axis(4, 1));

        assert_eq!(index.info().unwrap().num_docs, 1);
        assert_eq!(index.documents().unwrap().len(), 1);

        let hits = index.knn_search(&KnnQuery::new(5), &axis(4, 0)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].fields.title, "second");
        // The old vector no longer answers for the document
        assert!(hits[0].similarity() < 0.5);

        let old_category = KnnQuery::new(5).with_category("x");
        assert!(index.knn_search(&old_category, &axis(4, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_top_k_bounds() {
        let mut index = created(4);
        for i in 0..3 {
            put(&mut index, &i.to_string(), fields(&format!("d{}", i), "x"), &axis(4, i));
        }

        assert_eq!(index.knn_search(&KnnQuery::new(2), &axis(4, 0)).unwrap().len(), 2);
        assert_eq!(index.knn_search(&KnnQuery::new(10), &axis(4, 0)).unwrap().len(), 3);
        assert!(index.knn_search(&KnnQuery::new(0), &axis(4, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_results_sorted_by_distance() {
        let mut index = created(4);
        put(&mut index, "far", fields("far", "x"), &[0.0, 0.0, 1.0, 0.0]);
        put(&mut index, "near", fields("near", "x"), &[0.9, 0.1, 0.0, 0.0]);
        put(&mut index, "mid", fields("mid", "x"), &[0.5, 0.5, 0.0, 0.0]);

        let hits = index.knn_search(&KnnQuery::new(3), &[1.0, 0.0, 0.0, 0.0]).unwrap();
        let titles: Vec<&str> = hits.iter().map(|h| h.fields.title.as_str()).collect();
        assert_eq!(titles, vec!["near", "mid", "far"]);
        assert!(hits.windows(2).all(|w| w[0].score <= w[1].score));
    }

    #[test]
    fn test_category_filter_is_exact() {
        let mut index = created(4);
        put(&mut index, "1", fields("one", "ops"), &axis(4, 0));
        put(&mut index, "2", fields("two", "dev"), &axis(4, 0));
        put(&mut index, "3", fields("three", "ops-archive"), &axis(4, 0));
        put(&mut index, "4", fields("four", "ops"), &axis(4, 1));

        let hits = index
            .knn_search(&KnnQuery::new(10).with_category("ops"), &axis(4, 0))
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.fields.category == "ops"));
        assert_eq!(hits[0].fields.title, "one");

        let none = KnnQuery::new(10).with_category("missing");
        assert!(index.knn_search(&none, &axis(4, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_query_validation() {
        let mut index = created(4);
        put(&mut index, "a", fields("a", "x"), &axis(4, 0));

        assert!(matches!(
            index.knn_search(&KnnQuery::new(1), &[1.0, 0.0]),
            Err(AppError::Query(_))
        ));
        assert!(matches!(
            index.knn_search(&KnnQuery::new(1), &[f32::NAN, 0.0, 0.0, 0.0]),
            Err(AppError::Query(_))
        ));

        let by_title = KnnQuery::new(1).with_filter(crate::query::TagFilter::new("title", "a"));
        assert!(matches!(
            index.knn_search(&by_title, &axis(4, 0)),
            Err(AppError::Query(_))
        ));

        let mut other_field = KnnQuery::new(1);
        other_field.vector_field = "vector".to_string();
        assert!(matches!(
            index.knn_search(&other_field, &axis(4, 0)),
            Err(AppError::Query(_))
        ));
    }

    #[test]
    fn test_missing_index() {
        let store = Arc::new(DocumentStore::open_in_memory().unwrap());
        let mut index = HnswVectorIndex::open(store, "docs").unwrap();

        assert!(!index.exists());
        assert!(matches!(
            index.knn_search(&KnnQuery::new(1), &axis(4, 0)),
            Err(AppError::IndexNotFound(_))
        ));
        assert!(matches!(
            index.upsert("a", &fields("a", "x"), &embedding_to_bytes(&axis(4, 0))),
            Err(AppError::IndexNotFound(_))
        ));
        assert!(matches!(index.info(), Err(AppError::IndexNotFound(_))));
        // Deleting under the prefix works without an index
        assert_eq!(index.delete_all().unwrap(), 0);
    }

    #[test]
    fn test_create_rejects_bad_schema() {
        let store = Arc::new(DocumentStore::open_in_memory().unwrap());
        let mut index = HnswVectorIndex::open(store, "docs").unwrap();

        assert!(matches!(
            index.create(0, DistanceMetric::Cosine, HnswParams::default()),
            Err(AppError::Schema(_))
        ));
        assert!(!index.exists());
        assert!(HnswVectorIndex::open(Arc::new(DocumentStore::open_in_memory().unwrap()), "").is_err());
    }

    #[test]
    fn test_upsert_rejects_bad_embedding() {
        let mut index = created(4);

        let short = embedding_to_bytes(&[1.0, 0.0]);
        assert!(matches!(
            index.upsert("a", &fields("a", "x"), &short),
            Err(AppError::Schema(_))
        ));
        let nan = embedding_to_bytes(&[f32::NAN, 0.0, 0.0, 0.0]);
        assert!(matches!(
            index.upsert("a", &fields("a", "x"), &nan),
            Err(AppError::Schema(_))
        ));

        // Nothing was written
        assert!(index.documents().unwrap().is_empty());
    }

    #[test]
    fn test_delete_all_then_query_is_empty() {
        let mut index = created(4);
        put(&mut index, "a", fields("a", "x"), &axis(4, 0));
        put(&mut index, "b", fields("b", "x"), &axis(4, 1));

        assert_eq!(index.delete_all().unwrap(), 2);
        assert!(index.exists());
        assert!(index.knn_search(&KnnQuery::new(3), &axis(4, 0)).unwrap().is_empty());
        assert_eq!(index.info().unwrap().num_docs, 0);
    }

    #[test]
    fn test_drop_keeps_documents_and_recreate_reindexes() {
        let mut index = created(4);
        put(&mut index, "a", fields("a", "x"), &axis(4, 0));

        assert!(index.drop_index().unwrap());
        assert!(!index.exists());
        assert!(!index.drop_index().unwrap());
        assert_eq!(index.store().count_prefix("docs:").unwrap(), 1);

        index
            .create(4, DistanceMetric::Cosine, HnswParams::default())
            .unwrap();
        let hits = index.knn_search(&KnnQuery::new(1), &axis(4, 0)).unwrap();
        assert_eq!(hits[0].id, "a");
    }

    #[test]
    fn test_create_counts_unindexable_documents() {
        let mut index = created(4);
        put(&mut index, "a", fields("a", "x"), &axis(4, 0));

        // Recreating with another dimension leaves the old blob unindexable
        index
            .create(8, DistanceMetric::Cosine, HnswParams::default())
            .unwrap();
        let info = index.info().unwrap();
        assert_eq!(info.num_docs, 0);
        assert_eq!(info.indexing_failures, 1);
        assert_eq!(info.dim, 8);
    }

    #[test]
    fn test_reopen_rebuilds_graph() {
        let store = Arc::new(DocumentStore::open_in_memory().unwrap());
        {
            let mut index = HnswVectorIndex::open(Arc::clone(&store), "docs").unwrap();
            index
                .create(4, DistanceMetric::L2, HnswParams::default())
                .unwrap();
            put(&mut index, "a", fields("a", "x"), &axis(4, 2));
        }

        let index = HnswVectorIndex::open(store, "docs").unwrap();
        assert!(index.exists());
        let hits = index.knn_search(&KnnQuery::new(1), &axis(4, 2)).unwrap();
        assert_eq!(hits[0].id, "a");
        assert!(hits[0].score.abs() < 1e-5);
    }

    #[test]
    fn test_info_and_listing() {
        let mut index = created(4);
        put(&mut index, "a", fields("a", "x"), &axis(4, 0));

        let info = index.info().unwrap();
        assert_eq!(info.name, "docs");
        assert_eq!(info.prefix, "docs:");
        assert_eq!(info.num_docs, 1);
        assert_eq!(info.metric, DistanceMetric::Cosine);
        assert_eq!(info.attributes.len(), 6);
        assert!(info.stored_bytes >= 16);
        assert!(info.vector_index_sz_mb > 0.0);

        let docs = index.documents().unwrap();
        assert_eq!(docs[0].id, "a");
        assert_eq!(docs[0].embedding_bytes, 16);

        let mut other = HnswVectorIndex::open(Arc::clone(index.store()), "notes").unwrap();
        other
            .create(2, DistanceMetric::Ip, HnswParams::default())
            .unwrap();
        assert_eq!(
            HnswVectorIndex::list_vector_indexes(index.store()).unwrap(),
            vec!["docs".to_string(), "notes".to_string()]
        );
    }

    #[test]
    fn test_oversized_k_returns_every_document() {
        let mut index = created(4);
        put(&mut index, "a", fields("a", "x"), &axis(4, 0));
        put(&mut index, "b", fields("b", "y"), &axis(4, 1));

        let hits = index
            .knn_search(&KnnQuery::new(usize::MAX), &[1.0, 0.0, 0.0, 0.0])
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");

        let hits = index
            .knn_search(&KnnQuery::new(1 << 40).with_category("y"), &axis(4, 0))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");
    }

    #[test]
    fn test_repeated_upserts_keep_graph_bounded() {
        let mut index = created(4);
        put(&mut index, "b", fields("b", "x"), &axis(4, 1));
        for i in 0..500 {
            put(&mut index, "a", fields("a", "x"), &axis(4, i));
        }

        let state = index.state.as_ref().unwrap();
        assert_eq!(state.live, 2);
        assert!(state.nodes.len() <= 2 * state.live + 1);
        assert_eq!(state.key_to_node.len(), 2);

        let info = index.info().unwrap();
        assert_eq!(info.num_docs, 2);
        let expected = (2 * (4 * 4 + HnswParams::default().m * 2 * LINK_BYTES)) as f64
            / (1024.0 * 1024.0);
        assert!((info.vector_index_sz_mb - expected).abs() < 1e-12);

        // Both documents still answer after compaction; 499 % 4 == 3
        let hits = index.knn_search(&KnnQuery::new(5), &axis(4, 3)).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert!((hits[0].similarity() - 1.0).abs() < 1e-5);
        let hits = index.knn_search(&KnnQuery::new(1), &axis(4, 1)).unwrap();
        assert_eq!(hits[0].id, "b");
    }
}
