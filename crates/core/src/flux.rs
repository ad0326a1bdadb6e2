//! Recorded frequency-domain flux data and the snapshot used for projection.
//!
//! A [`FluxRecord`] is owned by the host simulation: each chunk holds the
//! transformed field values of one tangential component at the chunk's
//! integration points. Before a batch of projections the record is captured
//! into a [`FluxSnapshot`], which resolves the chunk symmetry (mirror flips,
//! shift, phase) into plain positions and values. The snapshot can be
//! written to a scratch file and reloaded by another call path.

use std::fs;
use std::path::Path;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::EigenmodeError;
use crate::geometry::{Component, Direction, Vec3, Volume};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluxPoint {
    pub position: Vec3,
    pub weight: f64,
}

/// Maps a chunk's stored coordinates and values into the full cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkTransform {
    pub flips: [bool; 3],
    pub shift: Vec3,
    pub phase: Complex64,
}

impl Default for ChunkTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ChunkTransform {
    pub fn identity() -> Self {
        Self {
            flips: [false; 3],
            shift: Vec3::ZERO,
            phase: Complex64::new(1.0, 0.0),
        }
    }

    pub fn apply(&self, p: &Vec3) -> Vec3 {
        let mut out = *p;
        for d in Direction::ALL {
            if self.flips[d.index()] {
                out.set_direction(d, -out.in_direction(d));
            }
        }
        out + self.shift
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxChunk {
    pub component: Component,
    #[serde(default)]
    pub transform: ChunkTransform,
    pub points: Vec<FluxPoint>,
    /// `values[freq][point]`.
    pub values: Vec<Vec<Complex64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxRecord {
    pub freq_min: f64,
    pub dfreq: f64,
    pub num_freqs: usize,
    pub chunks: Vec<FluxChunk>,
}

impl FluxRecord {
    pub fn frequency(&self, freq_index: usize) -> f64 {
        self.freq_min + freq_index as f64 * self.dfreq
    }

    pub fn frequencies(&self) -> Vec<f64> {
        (0..self.num_freqs).map(|i| self.frequency(i)).collect()
    }

    pub fn validate(&self) -> Result<(), EigenmodeError> {
        for (index, chunk) in self.chunks.iter().enumerate() {
            if chunk.values.len() != self.num_freqs {
                return Err(EigenmodeError::Geometry(format!(
                    "flux chunk {index} ({}) holds {} frequencies, expected {}",
                    chunk.component,
                    chunk.values.len(),
                    self.num_freqs
                )));
            }
            if let Some(row) = chunk.values.iter().find(|row| row.len() != chunk.points.len()) {
                return Err(EigenmodeError::Geometry(format!(
                    "flux chunk {index} ({}) holds {} values for {} points",
                    chunk.component,
                    row.len(),
                    chunk.points.len()
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Snapshot
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotChunk {
    pub component: Component,
    pub positions: Vec<Vec3>,
    pub weights: Vec<f64>,
    /// `values[freq][point]`, chunk phase already applied.
    pub values: Vec<Vec<Complex64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxSnapshot {
    pub volume: Volume,
    pub freq_min: f64,
    pub dfreq: f64,
    pub num_freqs: usize,
    pub chunks: Vec<SnapshotChunk>,
}

impl FluxSnapshot {
    /// Resolves the chunk transforms of `record` and keeps the points that
    /// land inside `volume`.
    pub fn capture(record: &FluxRecord, volume: &Volume) -> Result<Self, EigenmodeError> {
        record.validate()?;
        let chunks = record
            .chunks
            .iter()
            .map(|chunk| {
                let keep: Vec<usize> = chunk
                    .points
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| volume.contains_point(&chunk.transform.apply(&p.position)))
                    .map(|(i, _)| i)
                    .collect();
                SnapshotChunk {
                    component: chunk.component,
                    positions: keep
                        .iter()
                        .map(|&i| chunk.transform.apply(&chunk.points[i].position))
                        .collect(),
                    weights: keep.iter().map(|&i| chunk.points[i].weight).collect(),
                    values: chunk
                        .values
                        .iter()
                        .map(|row| keep.iter().map(|&i| row[i] * chunk.transform.phase).collect())
                        .collect(),
                }
            })
            .collect();

        Ok(Self {
            volume: *volume,
            freq_min: record.freq_min,
            dfreq: record.dfreq,
            num_freqs: record.num_freqs,
            chunks,
        })
    }

    pub fn frequency(&self, freq_index: usize) -> f64 {
        self.freq_min + freq_index as f64 * self.dfreq
    }

    /// Checks that every chunk holds `num_freqs` rows of one value per point.
    pub fn validate(&self) -> Result<(), EigenmodeError> {
        for (index, chunk) in self.chunks.iter().enumerate() {
            if chunk.weights.len() != chunk.positions.len() {
                return Err(EigenmodeError::Geometry(format!(
                    "snapshot chunk {index} ({}) holds {} weights for {} points",
                    chunk.component,
                    chunk.weights.len(),
                    chunk.positions.len()
                )));
            }
            if chunk.values.len() != self.num_freqs {
                return Err(EigenmodeError::Geometry(format!(
                    "snapshot chunk {index} ({}) holds {} frequencies, expected {}",
                    chunk.component,
                    chunk.values.len(),
                    self.num_freqs
                )));
            }
            if let Some(row) = chunk.values.iter().find(|row| row.len() != chunk.positions.len()) {
                return Err(EigenmodeError::Geometry(format!(
                    "snapshot chunk {index} ({}) holds {} values for {} points",
                    chunk.component,
                    row.len(),
                    chunk.positions.len()
                )));
            }
        }
        Ok(())
    }

    /// Chunks recording `component` (D and B match E and H).
    pub fn chunks_for(&self, component: Component) -> impl Iterator<Item = &SnapshotChunk> {
        let wanted = component.normalized();
        self.chunks
            .iter()
            .filter(move |chunk| chunk.component.normalized() == wanted)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), EigenmodeError> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EigenmodeError> {
        let text = fs::read_to_string(path)?;
        let snapshot: Self = serde_json::from_str(&text)?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}
