// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Generic resources (GPUs, NICs, licenses bound to hardware) allocated to a
//! job, and their projection onto a single node.

use packable::{
    error::UnpackError,
    packer::Packer,
    unpacker::Unpacker,
    Packable,
};

use crate::{
    error::Error,
    types::{pack_opt_string, pack_slice, pack_string, unpack_opt_string, unpack_string, unpack_vec},
};

/// A job-wide generic resource allocation with per-node counts, indexed by the
/// node's position in the job host list.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GresAllocation {
    /// Resource name, e.g. `gpu`.
    pub name: String,
    /// Optional resource subtype, e.g. `a100`.
    pub type_name: Option<String>,
    /// Allocated count per node index.
    pub node_counts: Vec<u64>,
}

/// One node's share of a generic resource.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NodeGres {
    /// Resource name.
    pub name: String,
    /// Optional resource subtype.
    pub type_name: Option<String>,
    /// Count allocated on this node.
    pub count: u64,
}

/// Projects a job-wide allocation list onto one node. Absent input yields
/// absent output; resources with nothing on the node are dropped.
pub fn extract_node(list: Option<&[GresAllocation]>, host_index: usize) -> Option<Vec<NodeGres>> {
    list.map(|allocations| {
        allocations
            .iter()
            .filter_map(|alloc| {
                let count = alloc.node_counts.get(host_index).copied().unwrap_or(0);
                (count > 0).then(|| NodeGres {
                    name: alloc.name.clone(),
                    type_name: alloc.type_name.clone(),
                    count,
                })
            })
            .collect()
    })
}

impl Packable for GresAllocation {
    type UnpackError = Error;
    type UnpackVisitor = ();

    fn pack<P: Packer>(&self, packer: &mut P) -> Result<(), P::Error> {
        pack_string(&self.name, packer)?;
        pack_opt_string(self.type_name.as_deref(), packer)?;
        pack_slice(&self.node_counts, packer)?;

        Ok(())
    }

    fn unpack<U: Unpacker, const VERIFY: bool>(
        unpacker: &mut U,
        _visitor: &Self::UnpackVisitor,
    ) -> Result<Self, UnpackError<Self::UnpackError, U::Error>> {
        Ok(Self {
            name: unpack_string::<_, VERIFY>(unpacker)?,
            type_name: unpack_opt_string::<_, VERIFY>(unpacker)?,
            node_counts: unpack_vec::<u64, _, VERIFY>(unpacker, &())?,
        })
    }
}
