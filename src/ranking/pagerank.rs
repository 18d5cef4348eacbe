//! PageRank (spec §4.G): global and personalised link-graph scoring over a dense-array,
//! interned-id adjacency, with dangling mass handled as a scalar correction term so a
//! power-iteration step never materialises an `n x n` matrix.

use std::collections::HashMap;
use std::sync::RwLock;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::error::{CoreError, CoreResult};

const BLOB_VERSION: u32 = 1;
const DEFAULT_DAMPING: f64 = 0.85;
const DEFAULT_MAX_ITERATIONS: usize = 50;
const DEFAULT_TOLERANCE: f64 = 1e-6;
const PERSONALIZED_ALPHA: f64 = 0.15;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Graph {
    url_to_id: HashMap<String, u32>,
    id_to_url: Vec<String>,
    out_edges: Vec<Vec<u32>>,
    in_edges: Vec<Vec<u32>>,
}

impl Graph {
    fn intern(&mut self, url: &str) -> u32 {
        if let Some(&id) = self.url_to_id.get(url) {
            return id;
        }
        let id = self.id_to_url.len() as u32;
        self.url_to_id.insert(url.to_string(), id);
        self.id_to_url.push(url.to_string());
        self.out_edges.push(Vec::new());
        self.in_edges.push(Vec::new());
        id
    }

    fn node_count(&self) -> usize {
        self.id_to_url.len()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Scores(HashMap<String, f64>);

/// Link graph plus its PageRank scores. Graph mutation (`add_link`) and score computation
/// (`recompute`) share a `std::sync::RwLock`: a writer during a run blocks until the run
/// completes (spec §5 "this implementation blocks").
pub struct PageRank {
    graph: RwLock<Graph>,
    scores: RwLock<Scores>,
    damping: f64,
    max_iterations: usize,
    tolerance: f64,
}

impl Default for PageRank {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRank {
    pub fn new() -> Self {
        Self {
            graph: RwLock::new(Graph::default()),
            scores: RwLock::new(Scores::default()),
            damping: DEFAULT_DAMPING,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Adds a directed edge. Self-loops are discarded (spec §4.G "Link graph" invariant).
    pub fn add_link(&self, source_url: &str, target_url: &str) {
        let mut graph = self.graph.write().expect("pagerank graph lock poisoned");
        let source = graph.intern(source_url);
        let target = graph.intern(target_url);
        if source == target {
            return;
        }
        if !graph.out_edges[source as usize].contains(&target) {
            graph.out_edges[source as usize].push(target);
            graph.in_edges[target as usize].push(source);
        }
    }

    /// Runs global power iteration to convergence or `max_iterations`, storing the result.
    pub fn recompute(&self) {
        let graph = self.graph.read().expect("pagerank graph lock poisoned");
        let n = graph.node_count();
        if n == 0 {
            return;
        }
        let uniform = vec![1.0 / n as f64; n];
        let scores = self.power_iterate(&graph, uniform.clone(), &uniform, self.damping, 1.0 - self.damping);
        self.store_scores(&graph, scores);
    }

    /// Personalised PageRank over seed URLs (spec §4.G). URLs outside the graph are
    /// dropped; an empty resulting seed set yields an empty result.
    pub fn personalized(&self, seed_urls: &[String]) -> HashMap<String, f64> {
        let graph = self.graph.read().expect("pagerank graph lock poisoned");
        let n = graph.node_count();
        let seed_ids: Vec<u32> = seed_urls
            .iter()
            .filter_map(|u| graph.url_to_id.get(u).copied())
            .collect();
        if n == 0 || seed_ids.is_empty() {
            return HashMap::new();
        }

        let mut personalization = vec![0.0; n];
        let share = 1.0 / seed_ids.len() as f64;
        for id in &seed_ids {
            personalization[*id as usize] = share;
        }

        let scores = self.power_iterate(
            &graph,
            personalization.clone(),
            &personalization,
            1.0 - PERSONALIZED_ALPHA,
            PERSONALIZED_ALPHA,
        );
        graph
            .id_to_url
            .iter()
            .zip(scores)
            .map(|(url, score)| (url.clone(), score))
            .collect()
    }

    /// Runs matrix-free power iteration to convergence. `jump_scale` multiplies the
    /// teleport vector each step: `(1 - damping)` for global PageRank's uniform jump,
    /// `alpha_p` for personalised PageRank's seed-weighted jump.
    fn power_iterate(
        &self,
        graph: &Graph,
        mut scores: Vec<f64>,
        teleport: &[f64],
        alpha_scale: f64,
        jump_scale: f64,
    ) -> Vec<f64> {
        let n = graph.node_count();
        for _ in 0..self.max_iterations {
            let dangling_mass: f64 = (0..n)
                .filter(|&i| graph.out_edges[i].is_empty())
                .map(|i| scores[i])
                .sum();

            let mut next = vec![0.0; n];
            for source in 0..n {
                let out = &graph.out_edges[source];
                if out.is_empty() {
                    continue;
                }
                let share = scores[source] / out.len() as f64;
                for &target in out {
                    next[target as usize] += share;
                }
            }

            let dangling_correction = alpha_scale * dangling_mass / n as f64;
            #[cfg(feature = "parallel")]
            {
                next.par_iter_mut().zip(teleport.par_iter()).for_each(|(v, t)| {
                    *v = alpha_scale * *v + dangling_correction + jump_scale * t;
                });
            }
            #[cfg(not(feature = "parallel"))]
            {
                for i in 0..n {
                    next[i] = alpha_scale * next[i] + dangling_correction + jump_scale * teleport[i];
                }
            }

            let diff: f64 = next.iter().zip(&scores).map(|(a, b)| (a - b).abs()).sum();
            scores = next;
            if diff < self.tolerance {
                break;
            }
        }
        scores
    }

    fn store_scores(&self, graph: &Graph, scores: Vec<f64>) {
        let mut map = HashMap::with_capacity(scores.len());
        for (url, score) in graph.id_to_url.iter().zip(scores) {
            map.insert(url.clone(), score);
        }
        *self.scores.write().expect("pagerank scores lock poisoned") = Scores(map);
    }

    pub fn score(&self, url: &str) -> f64 {
        self.scores
            .read()
            .expect("pagerank scores lock poisoned")
            .0
            .get(url)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn top(&self, n: usize) -> Vec<(String, f64)> {
        let scores = self.scores.read().expect("pagerank scores lock poisoned");
        let mut ranked: Vec<(String, f64)> = scores.0.iter().map(|(u, s)| (u.clone(), *s)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(n);
        ranked
    }

    pub fn stats(&self) -> PageRankStats {
        let graph = self.graph.read().expect("pagerank graph lock poisoned");
        let n = graph.node_count();
        let total_edges: usize = graph.out_edges.iter().map(Vec::len).sum();
        let dangling_nodes = graph.out_edges.iter().filter(|e| e.is_empty()).count();
        let sink_free_nodes = graph.in_edges.iter().filter(|e| e.is_empty()).count();
        PageRankStats {
            total_nodes: n,
            total_edges,
            average_out_degree: if n > 0 { total_edges as f64 / n as f64 } else { 0.0 },
            dangling_nodes,
            sink_free_nodes,
            density: if n > 0 { total_edges as f64 / (n * n) as f64 } else { 0.0 },
        }
    }

    pub fn serialize(&self) -> CoreResult<Vec<u8>> {
        let graph = self.graph.read().expect("pagerank graph lock poisoned");
        let scores = self.scores.read().expect("pagerank scores lock poisoned");
        let body = bincode::serialize(&(&*graph, &*scores)).map_err(|e| CoreError::Serialisation(e.to_string()))?;
        let mut blob = BLOB_VERSION.to_le_bytes().to_vec();
        blob.extend(body);
        Ok(blob)
    }

    pub fn deserialize(blob: &[u8]) -> CoreResult<Self> {
        if blob.len() < 4 {
            return Err(CoreError::Serialisation("blob too short for version header".into()));
        }
        let version = u32::from_le_bytes(blob[0..4].try_into().expect("checked length"));
        if version != BLOB_VERSION {
            return Err(CoreError::Serialisation(format!(
                "unsupported pagerank blob version {version}, expected {BLOB_VERSION}"
            )));
        }
        let (graph, scores): (Graph, Scores) =
            bincode::deserialize(&blob[4..]).map_err(|e| CoreError::Serialisation(e.to_string()))?;
        Ok(Self {
            graph: RwLock::new(graph),
            scores: RwLock::new(scores),
            damping: DEFAULT_DAMPING,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageRankStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub average_out_degree: f64,
    pub dangling_nodes: usize,
    pub sink_free_nodes: usize,
    pub density: f64,
}
