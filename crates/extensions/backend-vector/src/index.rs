//! Brute-force collection index.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use ragbench_protocols::{BackendError, Embedding, VectorFilter, VectorHit, VectorRecord};

/// Distance metric. Lower is closer for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorMetric {
    /// `1 - cosine_similarity`, so `1 - distance` recovers the similarity.
    #[default]
    Cosine,
    L2,
}

impl VectorMetric {
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => {
                let a = Embedding::new(a.to_vec());
                let b = Embedding::new(b.to_vec());
                1.0 - a.cosine_similarity(&b)
            }
            Self::L2 => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }
}

impl FromStr for VectorMetric {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "l2" => Ok(Self::L2),
            other => Err(BackendError::OperationFailed(format!("unknown metric '{}'", other))),
        }
    }
}

impl fmt::Display for VectorMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cosine => write!(f, "cosine"),
            Self::L2 => write!(f, "l2"),
        }
    }
}

/// One collection: fixed dimension, records keyed by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionIndex {
    pub name: String,
    pub dimension: usize,
    pub metric: VectorMetric,
    #[serde(default)]
    records: BTreeMap<String, VectorRecord>,
}

impl CollectionIndex {
    pub fn new(name: impl Into<String>, dimension: usize, metric: VectorMetric) -> Self {
        Self {
            name: name.into(),
            dimension,
            metric,
            records: BTreeMap::new(),
        }
    }

    fn check_dimension(&self, len: usize) -> Result<(), BackendError> {
        if len == self.dimension {
            Ok(())
        } else {
            Err(BackendError::OperationFailed(format!(
                "collection {} expects dimension {}, got {}",
                self.name, self.dimension, len
            )))
        }
    }

    /// Insert or replace records. All records are checked before any is written.
    pub fn upsert(&mut self, records: Vec<VectorRecord>) -> Result<usize, BackendError> {
        for record in &records {
            self.check_dimension(record.vector.len())?;
        }
        let count = records.len();
        for record in records {
            self.records.insert(record.id.clone(), record);
        }
        Ok(count)
    }

    pub fn get(&self, id: &str) -> Option<&VectorRecord> {
        self.records.get(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<VectorRecord> {
        self.records.remove(id)
    }

    /// Closest records first; ties broken by id.
    pub fn search(
        &self,
        query: &[f32],
        top_k: usize,
        filter: Option<&VectorFilter>,
    ) -> Result<Vec<VectorHit>, BackendError> {
        self.check_dimension(query.len())?;

        let mut hits: Vec<VectorHit> = self
            .records
            .values()
            .filter(|r| filter.is_none_or(|f| f.matches(&r.fields)))
            .map(|r| VectorHit {
                id: r.id.clone(),
                distance: self.metric.distance(query, &r.vector),
                fields: r.fields.clone(),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
