//! Collective reductions across the processes of a distributed simulation.
//!
//! Every process computes its local partial sums and then enters the same
//! reduction in the same order. [`SingleProcess`] is the trivial group;
//! [`LocalProcessGroup`] connects in-process ranks (threads) with one
//! channel per ordered peer pair and tags every message with a sequence
//! number and a label, so a rank that skips a reduction or enters a
//! different one is reported instead of silently pairing wrong data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use num_complex::Complex64;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollectiveError {
    #[error(
        "collective mismatch on rank {rank}: expected '{expected}' (#{expected_sequence}) \
         but peer {peer} sent '{found}' (#{found_sequence})"
    )]
    Mismatch {
        rank: usize,
        peer: usize,
        expected: &'static str,
        expected_sequence: u64,
        found: &'static str,
        found_sequence: u64,
    },

    #[error(
        "collective length mismatch on rank {rank} in '{label}' (#{sequence}): \
         {expected} local values but peer {peer} sent {found}"
    )]
    LengthMismatch {
        rank: usize,
        peer: usize,
        label: &'static str,
        sequence: u64,
        expected: usize,
        found: usize,
    },

    #[error("peer {peer} left the process group before '{label}' (#{sequence}) completed")]
    PeerExited {
        peer: usize,
        label: &'static str,
        sequence: u64,
    },

    #[error("timed out on rank {rank} waiting for peer {peer} in '{label}' (#{sequence})")]
    Timeout {
        rank: usize,
        peer: usize,
        label: &'static str,
        sequence: u64,
    },
}

pub trait Collective {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Element-wise sum of `local` over all ranks, returned on every rank.
    fn sum_to_all(
        &self,
        label: &'static str,
        local: &[Complex64],
    ) -> Result<Vec<Complex64>, CollectiveError>;

    /// Values held by `root`, returned on every rank.
    fn broadcast(
        &self,
        label: &'static str,
        root: usize,
        values: &[f64],
    ) -> Result<Vec<f64>, CollectiveError>;

    fn is_root(&self) -> bool {
        self.rank() == 0
    }
}

/// The one-process group.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleProcess;

impl Collective for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn sum_to_all(
        &self,
        _label: &'static str,
        local: &[Complex64],
    ) -> Result<Vec<Complex64>, CollectiveError> {
        Ok(local.to_vec())
    }

    fn broadcast(
        &self,
        _label: &'static str,
        _root: usize,
        values: &[f64],
    ) -> Result<Vec<f64>, CollectiveError> {
        Ok(values.to_vec())
    }
}

// ============================================================================
// In-process group
// ============================================================================

#[derive(Debug, Clone)]
enum Payload {
    Complex(Vec<Complex64>),
    Real(Vec<f64>),
}

#[derive(Debug, Clone)]
struct Message {
    sequence: u64,
    label: &'static str,
    payload: Payload,
}

/// One rank of a group of threads. Created all at once by
/// [`LocalProcessGroup::create`]; each member is moved to its own thread.
#[derive(Debug)]
pub struct LocalProcessGroup {
    rank: usize,
    size: usize,
    senders: Vec<Option<Sender<Message>>>,
    receivers: Vec<Option<Receiver<Message>>>,
    sequence: AtomicU64,
    timeout: Option<Duration>,
}

impl LocalProcessGroup {
    /// Builds `size` connected ranks. With `timeout = None` reductions block
    /// until every peer has contributed or left.
    pub fn create(size: usize, timeout: Option<Duration>) -> Vec<LocalProcessGroup> {
        let mut senders: Vec<Vec<Option<Sender<Message>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
        let mut receivers: Vec<Vec<Option<Receiver<Message>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();

        for from in 0..size {
            for to in 0..size {
                if from == to {
                    continue;
                }
                let (tx, rx) = unbounded();
                senders[from][to] = Some(tx);
                receivers[to][from] = Some(rx);
            }
        }

        senders
            .into_iter()
            .zip(receivers)
            .enumerate()
            .map(|(rank, (senders, receivers))| LocalProcessGroup {
                rank,
                size,
                senders,
                receivers,
                sequence: AtomicU64::new(0),
                timeout,
            })
            .collect()
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }

    fn send(&self, peer: usize, message: Message) -> Result<(), CollectiveError> {
        let (label, sequence) = (message.label, message.sequence);
        let exited = CollectiveError::PeerExited {
            peer,
            label,
            sequence,
        };
        match &self.senders[peer] {
            Some(tx) => tx.send(message).map_err(|_| exited),
            None => Err(exited),
        }
    }

    fn receive(
        &self,
        peer: usize,
        label: &'static str,
        sequence: u64,
    ) -> Result<Payload, CollectiveError> {
        let exited = CollectiveError::PeerExited {
            peer,
            label,
            sequence,
        };
        let rx = self.receivers[peer].as_ref().ok_or(exited.clone())?;
        let message = match self.timeout {
            Some(timeout) => rx.recv_timeout(timeout).map_err(|err| match err {
                RecvTimeoutError::Timeout => CollectiveError::Timeout {
                    rank: self.rank,
                    peer,
                    label,
                    sequence,
                },
                RecvTimeoutError::Disconnected => exited.clone(),
            })?,
            None => rx.recv().map_err(|_| exited.clone())?,
        };

        if message.sequence != sequence || message.label != label {
            return Err(CollectiveError::Mismatch {
                rank: self.rank,
                peer,
                expected: label,
                expected_sequence: sequence,
                found: message.label,
                found_sequence: message.sequence,
            });
        }
        Ok(message.payload)
    }
}

impl Collective for LocalProcessGroup {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn sum_to_all(
        &self,
        label: &'static str,
        local: &[Complex64],
    ) -> Result<Vec<Complex64>, CollectiveError> {
        let sequence = self.next_sequence();
        for peer in (0..self.size).filter(|&p| p != self.rank) {
            self.send(
                peer,
                Message {
                    sequence,
                    label,
                    payload: Payload::Complex(local.to_vec()),
                },
            )?;
        }

        // Summed in rank order so every rank gets bit-identical totals.
        let mut total = vec![Complex64::new(0.0, 0.0); local.len()];
        for peer in 0..self.size {
            let contribution = if peer == self.rank {
                local.to_vec()
            } else {
                match self.receive(peer, label, sequence)? {
                    Payload::Complex(values) if values.len() == local.len() => values,
                    Payload::Complex(values) => {
                        return Err(CollectiveError::LengthMismatch {
                            rank: self.rank,
                            peer,
                            label,
                            sequence,
                            expected: local.len(),
                            found: values.len(),
                        })
                    }
                    Payload::Real(_) => {
                        return Err(CollectiveError::Mismatch {
                            rank: self.rank,
                            peer,
                            expected: label,
                            expected_sequence: sequence,
                            found: "broadcast",
                            found_sequence: sequence,
                        })
                    }
                }
            };
            for (acc, value) in total.iter_mut().zip(contribution) {
                *acc += value;
            }
        }
        Ok(total)
    }

    fn broadcast(
        &self,
        label: &'static str,
        root: usize,
        values: &[f64],
    ) -> Result<Vec<f64>, CollectiveError> {
        let sequence = self.next_sequence();
        if self.rank == root {
            for peer in (0..self.size).filter(|&p| p != root) {
                self.send(
                    peer,
                    Message {
                        sequence,
                        label,
                        payload: Payload::Real(values.to_vec()),
                    },
                )?;
            }
            return Ok(values.to_vec());
        }

        match self.receive(root, label, sequence)? {
            Payload::Real(values) => Ok(values),
            Payload::Complex(_) => Err(CollectiveError::Mismatch {
                rank: self.rank,
                peer: root,
                expected: label,
                expected_sequence: sequence,
                found: "sum_to_all",
                found_sequence: sequence,
            }),
        }
    }
}
