//! Ranking strategies for safe candidates.
//!
//! A ranker only reorders what the safety filter already admitted. Two
//! strategies exist and one is picked per request:
//! - [`VectorRanker`] asks a [`VectorIndex`] for nearest neighbours of the
//!   diner's taste or mood vector.
//! - [`DeterministicFallbackRanker`] is used when there is no taste signal or
//!   the index fails. Its output is labelled [`RankingBasis::Arbitrary`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::core::distance::euclidean_distance;
use crate::core::error::CollaboratorError;
use crate::core::traits::{Neighbor, VectorIndex};
use crate::models::{RankedCandidate, RankingBasis, SafeCandidate, TasteVector};

/// Strategy that orders safe candidates best-first
#[async_trait]
pub trait Ranker: Send + Sync {
    /// Returns the name of this ranker (for logging/debugging)
    fn name(&self) -> &str;

    /// Order `candidates` best-first and keep at most `limit` of them
    async fn rank(
        &self,
        candidates: &[SafeCandidate],
        limit: usize,
    ) -> Result<Vec<RankedCandidate>, CollaboratorError>;
}

/// Relevance ranking through a nearest-neighbour collaborator
pub struct VectorRanker {
    index: Arc<dyn VectorIndex>,
    query: TasteVector,
    timeout: Duration,
}

impl VectorRanker {
    pub fn new(index: Arc<dyn VectorIndex>, query: TasteVector, timeout: Duration) -> Self {
        Self {
            index,
            query,
            timeout,
        }
    }

    fn has_comparable_vector(&self, candidate: &SafeCandidate) -> bool {
        candidate
            .dish()
            .taste_vector
            .as_ref()
            .is_some_and(|v| v.dimension() == self.query.dimension())
    }
}

#[async_trait]
impl Ranker for VectorRanker {
    fn name(&self) -> &str {
        "VectorRanker"
    }

    /// Candidates the index orders come first; candidates without a
    /// comparable vector follow in input order.
    async fn rank(
        &self,
        candidates: &[SafeCandidate],
        limit: usize,
    ) -> Result<Vec<RankedCandidate>, CollaboratorError> {
        if limit == 0 || candidates.is_empty() {
            return Ok(Vec::new());
        }

        let searchable: Vec<SafeCandidate> = candidates
            .iter()
            .filter(|c| self.has_comparable_vector(c))
            .cloned()
            .collect();

        let neighbors = if searchable.is_empty() {
            Vec::new()
        } else {
            tokio::time::timeout(
                self.timeout,
                self.index.nearest(&self.query, &searchable, limit),
            )
            .await
            .map_err(|_| CollaboratorError::timeout(self.index.name(), self.timeout))??
        };

        let by_id: HashMap<&str, &SafeCandidate> =
            candidates.iter().map(|c| (c.id(), c)).collect();
        let mut placed: HashSet<String> = HashSet::new();
        let mut ranked = Vec::with_capacity(limit.min(candidates.len()));

        for Neighbor { dish_id, distance } in neighbors {
            let candidate = by_id.get(dish_id.as_str()).ok_or_else(|| {
                CollaboratorError::invalid(
                    self.index.name(),
                    format!("dish {} is outside the candidate set", dish_id),
                )
            })?;

            if ranked.len() == limit {
                break;
            }
            if !placed.insert(dish_id) {
                continue;
            }

            ranked.push(RankedCandidate {
                candidate: (*candidate).clone(),
                rank: ranked.len(),
                score: Some(distance),
                basis: RankingBasis::Taste,
            });
        }

        for candidate in candidates {
            if ranked.len() == limit {
                break;
            }
            if placed.contains(candidate.id()) {
                continue;
            }
            placed.insert(candidate.id().to_string());

            ranked.push(RankedCandidate {
                candidate: candidate.clone(),
                rank: ranked.len(),
                score: None,
                basis: RankingBasis::Arbitrary,
            });
        }

        Ok(ranked)
    }
}

/// Ordering used when no taste signal is available
///
/// With a seed: a reproducible shuffle. Without: stable order by dish id.
/// Never pretends to be relevance.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicFallbackRanker {
    seed: Option<u64>,
}

impl DeterministicFallbackRanker {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    pub fn order(&self, candidates: &[SafeCandidate], limit: usize) -> Vec<RankedCandidate> {
        let mut ordered = candidates.to_vec();

        match self.seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed);
                ordered.shuffle(&mut rng);
            }
            None => ordered.sort_by(|a, b| a.id().cmp(b.id())),
        }

        ordered
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(rank, candidate)| RankedCandidate {
                candidate,
                rank,
                score: None,
                basis: RankingBasis::Arbitrary,
            })
            .collect()
    }
}

#[async_trait]
impl Ranker for DeterministicFallbackRanker {
    fn name(&self) -> &str {
        "DeterministicFallbackRanker"
    }

    async fn rank(
        &self,
        candidates: &[SafeCandidate],
        limit: usize,
    ) -> Result<Vec<RankedCandidate>, CollaboratorError> {
        Ok(self.order(candidates, limit))
    }
}

/// Brute-force in-process L2 index over the candidates' own vectors
///
/// Fine for single-restaurant menus; also used when no database index is
/// configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanIndex;

#[async_trait]
impl VectorIndex for EuclideanIndex {
    fn name(&self) -> &str {
        "EuclideanIndex"
    }

    async fn nearest(
        &self,
        query: &TasteVector,
        candidates: &[SafeCandidate],
        limit: usize,
    ) -> Result<Vec<Neighbor>, CollaboratorError> {
        let mut neighbors: Vec<Neighbor> = candidates
            .iter()
            .filter_map(|c| {
                let vector = c.dish().taste_vector.as_ref()?;
                euclidean_distance(query, vector).map(|distance| Neighbor {
                    dish_id: c.id().to_string(),
                    distance,
                })
            })
            .collect();

        // Stable sort keeps input order among equal distances
        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(limit);

        Ok(neighbors)
    }
}
