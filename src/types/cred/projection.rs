// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Projection of a globally-described allocation onto a single node.

use core::ops::Range;

use crate::{
    error::{Error, Result},
    types::{
        cred::JobCredArgs,
        gres::{extract_node, NodeGres},
    },
};

/// One node's slice of a job allocation, ready to hand to the launch path.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NodeAllocation {
    /// Job cores on this node as a range list, re-based at zero.
    pub job_cores: String,
    /// Step cores on this node as a range list, re-based at zero.
    pub step_cores: String,
    /// Job memory limit on this node, in MiB.
    pub job_mem_limit: u64,
    /// Step memory limit on this node, in MiB.
    pub step_mem_limit: u64,
    /// Job generic resources on this node.
    pub job_gres: Option<Vec<NodeGres>>,
    /// Step generic resources on this node.
    pub step_gres: Option<Vec<NodeGres>>,
}

/// Index into a run-length-encoded per-node array for `node_index`.
///
/// Indexes past the encoded runs clamp to the last entry, matching the
/// convention that a trailing run extends to the end of the node list.
pub fn rep_count_index(rep_counts: &[u32], node_index: u32) -> usize {
    let mut covered = 0u64;
    for (i, &count) in rep_counts.iter().enumerate() {
        covered += u64::from(count);
        if u64::from(node_index) < covered {
            return i;
        }
    }

    rep_counts.len().saturating_sub(1)
}

/// The half-open slice of the global core bitmap belonging to the node at
/// `host_index`, or `None` when the shape arrays do not cover it.
pub fn node_bit_range(
    sockets_per_node: &[u16],
    cores_per_socket: &[u16],
    rep_counts: &[u32],
    host_index: u32,
) -> Option<Range<u32>> {
    let mut first_bit = 0u32;
    let mut remaining = host_index;

    for (k, &rep) in rep_counts.iter().enumerate() {
        let bits_per_node =
            u32::from(*sockets_per_node.get(k)?) * u32::from(*cores_per_socket.get(k)?);
        if remaining >= rep {
            first_bit += bits_per_node * rep;
            remaining -= rep;
        } else {
            first_bit += bits_per_node * remaining;
            return Some(first_bit..first_bit + bits_per_node);
        }
    }

    None
}

impl JobCredArgs {
    /// Projects the allocation onto `node`: core range strings, memory limits
    /// and generic resources for that single node.
    ///
    /// The bitmap slices are copies; the credential can be dropped while the
    /// caller keeps using the result.
    pub fn node_allocation(&self, node: &str) -> Result<NodeAllocation> {
        let host_index = self
            .job_hostlist
            .find(node)
            .ok_or_else(|| Error::UnknownNode(node.to_string()))? as u32;

        if host_index >= self.job_nhosts {
            return Err(Error::UnknownNode(node.to_string()));
        }

        let range = node_bit_range(
            &self.sockets_per_node,
            &self.cores_per_socket,
            &self.sock_core_rep_count,
            host_index,
        )
        .ok_or_else(|| Error::UnknownNode(node.to_string()))?;

        let job_cores = self.job_core_bitmap.slice(range.clone()).fmt_ranges();
        let step_cores = self.step_core_bitmap.slice(range).fmt_ranges();

        // The batch step runs on the first node of the job; its memory limit
        // reads the first run regardless of which node asks.
        let batch = self.step_id.is_batch();

        let job_rep = if batch {
            0
        } else {
            rep_count_index(&self.job_mem_alloc_rep_count, host_index)
        };
        let job_mem_limit = self.job_mem_alloc.get(job_rep).copied().unwrap_or(0);

        let step_mem_limit = self
            .step_mem_limit_for(node, batch)
            .filter(|&limit| limit != 0)
            .unwrap_or(job_mem_limit);

        Ok(NodeAllocation {
            job_cores,
            step_cores,
            job_mem_limit,
            step_mem_limit,
            job_gres: extract_node(self.job_gres.as_deref(), host_index as usize),
            step_gres: extract_node(self.step_gres.as_deref(), host_index as usize),
        })
    }

    fn step_mem_limit_for(&self, node: &str, batch: bool) -> Option<u64> {
        if self.step_mem_alloc.is_empty() {
            return None;
        }

        let rep = if batch {
            0
        } else {
            rep_count_index(
                &self.step_mem_alloc_rep_count,
                self.step_hostlist.find(node)? as u32,
            )
        };

        self.step_mem_alloc.get(rep).copied()
    }
}
