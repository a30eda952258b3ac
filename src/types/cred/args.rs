// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The authorization payload of a job credential.

use packable::{
    error::{UnpackError, UnpackErrorExt},
    packer::Packer,
    unpacker::Unpacker,
    Packable,
};

use crate::{
    error::Error,
    types::{
        coremap::CoreBitmap,
        gres::GresAllocation,
        identity::Identity,
        netcred::NodeAddrTable,
        nodelist::NodeList,
        pack_opt_string, pack_slice, step::StepId, unpack_opt_string, unpack_vec,
    },
};

/// Everything a compute node needs to know to admit a step launch: the
/// principal, the step, and the allocation shape the controller granted.
///
/// The run-length shape arrays (`sockets_per_node`, `cores_per_socket`,
/// `sock_core_rep_count`) describe distinct per-node topologies by counting
/// consecutive nodes that share one; the core bitmaps are indexed by the
/// global bit space obtained by walking those arrays.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JobCredArgs {
    /// The step this credential authorizes.
    pub step_id: StepId,
    /// Requesting uid.
    pub uid: u32,
    /// Requesting gid.
    pub gid: u32,
    /// Enriched identity, filled in at creation when enrichment is enabled.
    pub id: Option<Identity>,

    /// All nodes of the job, in allocation order.
    pub job_hostlist: NodeList,
    /// Nodes of this step.
    pub step_hostlist: NodeList,
    /// Number of nodes in the job.
    pub job_nhosts: u32,
    /// Sockets per node, one entry per distinct shape.
    pub sockets_per_node: Vec<u16>,
    /// Cores per socket, one entry per distinct shape.
    pub cores_per_socket: Vec<u16>,
    /// Number of consecutive nodes sharing each shape.
    pub sock_core_rep_count: Vec<u32>,

    /// Cores allocated to the job, over the global bit space.
    pub job_core_bitmap: CoreBitmap,
    /// Cores allocated to the step, over the global bit space.
    pub step_core_bitmap: CoreBitmap,

    /// Job memory limit per node, run-length encoded.
    pub job_mem_alloc: Vec<u64>,
    /// Run lengths for `job_mem_alloc`.
    pub job_mem_alloc_rep_count: Vec<u32>,
    /// Step memory limit per node, run-length encoded; empty or 0 inherits
    /// the job limit.
    pub step_mem_alloc: Vec<u64>,
    /// Run lengths for `step_mem_alloc`.
    pub step_mem_alloc_rep_count: Vec<u32>,

    /// Generic resources allocated to the job.
    pub job_gres: Option<Vec<GresAllocation>>,
    /// Generic resources allocated to the step.
    pub step_gres: Option<Vec<GresAllocation>>,

    /// Accounting string.
    pub job_account: Option<String>,
    /// Free-form administrator comment.
    pub job_comment: Option<String>,
    /// Feature constraints the allocation satisfied.
    pub job_constraints: Option<String>,
    /// Licenses granted with the job.
    pub job_licenses: Option<String>,
    /// Reservation the job runs in.
    pub job_reservation: Option<String>,
    /// Partition the job was scheduled to.
    pub job_partition: Option<String>,
    /// Standard input path of the batch script.
    pub job_std_in: Option<String>,
    /// Standard output path of the batch script.
    pub job_std_out: Option<String>,
    /// Standard error path of the batch script.
    pub job_std_err: Option<String>,
    /// Node alias list for clusters with front-end naming.
    pub job_alias_list: Option<String>,
    /// Addresses of the job's nodes, for daemons without resolvable names.
    pub node_addrs: Option<NodeAddrTable>,
}

impl JobCredArgs {
    /// Creates args for a step with nothing allocated yet.
    pub fn new(step_id: StepId, uid: u32, gid: u32) -> Self {
        Self {
            step_id,
            uid,
            gid,
            ..Default::default()
        }
    }

    /// Number of leading shape-array entries that cover `job_nhosts` nodes.
    ///
    /// The controller may hand over shape arrays sized for the whole cluster;
    /// only the leading entries whose run lengths sum up to the job's node
    /// count are meaningful.
    pub fn core_array_size(&self) -> usize {
        let mut covered = 0u64;
        for (i, &count) in self.sock_core_rep_count.iter().enumerate() {
            covered += u64::from(count);
            if covered >= u64::from(self.job_nhosts) {
                return i + 1;
            }
        }

        self.sock_core_rep_count.len()
    }

    /// Truncates the shape arrays to [`Self::core_array_size`].
    pub(crate) fn truncate_shapes(&mut self) {
        let size = self.core_array_size();
        self.sock_core_rep_count.truncate(size);
        self.sockets_per_node.truncate(size);
        self.cores_per_socket.truncate(size);
    }

    /// Width of the global core bit space described by the shape arrays.
    pub fn total_core_bits(&self) -> u64 {
        self.sock_core_rep_count
            .iter()
            .zip(self.sockets_per_node.iter().zip(&self.cores_per_socket))
            .map(|(&rep, (&sockets, &cores))| u64::from(rep) * u64::from(sockets) * u64::from(cores))
            .sum()
    }
}

fn pack_opt_gres<P: Packer>(gres: Option<&[GresAllocation]>, packer: &mut P) -> Result<(), P::Error> {
    match gres {
        None => 0u8.pack(packer),
        Some(list) => {
            1u8.pack(packer)?;
            pack_slice(list, packer)
        }
    }
}

fn unpack_opt_gres<U: Unpacker, const VERIFY: bool>(
    unpacker: &mut U,
) -> Result<Option<Vec<GresAllocation>>, UnpackError<Error, U::Error>> {
    match u8::unpack::<_, VERIFY>(unpacker, &()).coerce()? {
        0 => Ok(None),
        1 => Ok(Some(unpack_vec::<GresAllocation, _, VERIFY>(unpacker, &())?)),
        tag => Err(UnpackError::Packable(Error::Decode(format!(
            "invalid option tag {tag}"
        )))),
    }
}

// The enriched identity is not part of this layout; it entered the wire format
// with a later protocol revision and is gated by the credential body.
impl Packable for JobCredArgs {
    type UnpackError = Error;
    type UnpackVisitor = ();

    fn pack<P: Packer>(&self, packer: &mut P) -> Result<(), P::Error> {
        self.step_id.pack(packer)?;
        self.uid.pack(packer)?;
        self.gid.pack(packer)?;

        self.job_hostlist.pack(packer)?;
        self.step_hostlist.pack(packer)?;
        self.job_nhosts.pack(packer)?;
        pack_slice(&self.sockets_per_node, packer)?;
        pack_slice(&self.cores_per_socket, packer)?;
        pack_slice(&self.sock_core_rep_count, packer)?;

        self.job_core_bitmap.pack(packer)?;
        self.step_core_bitmap.pack(packer)?;

        pack_slice(&self.job_mem_alloc, packer)?;
        pack_slice(&self.job_mem_alloc_rep_count, packer)?;
        pack_slice(&self.step_mem_alloc, packer)?;
        pack_slice(&self.step_mem_alloc_rep_count, packer)?;

        pack_opt_gres(self.job_gres.as_deref(), packer)?;
        pack_opt_gres(self.step_gres.as_deref(), packer)?;

        pack_opt_string(self.job_account.as_deref(), packer)?;
        pack_opt_string(self.job_comment.as_deref(), packer)?;
        pack_opt_string(self.job_constraints.as_deref(), packer)?;
        pack_opt_string(self.job_licenses.as_deref(), packer)?;
        pack_opt_string(self.job_reservation.as_deref(), packer)?;
        pack_opt_string(self.job_partition.as_deref(), packer)?;
        pack_opt_string(self.job_std_in.as_deref(), packer)?;
        pack_opt_string(self.job_std_out.as_deref(), packer)?;
        pack_opt_string(self.job_std_err.as_deref(), packer)?;
        pack_opt_string(self.job_alias_list.as_deref(), packer)?;

        match &self.node_addrs {
            None => 0u8.pack(packer)?,
            Some(table) => {
                1u8.pack(packer)?;
                table.pack(packer)?;
            }
        }

        Ok(())
    }

    fn unpack<U: Unpacker, const VERIFY: bool>(
        unpacker: &mut U,
        _visitor: &Self::UnpackVisitor,
    ) -> Result<Self, UnpackError<Self::UnpackError, U::Error>> {
        let step_id = StepId::unpack::<_, VERIFY>(unpacker, &())?;
        let uid = u32::unpack::<_, VERIFY>(unpacker, &()).coerce()?;
        let gid = u32::unpack::<_, VERIFY>(unpacker, &()).coerce()?;

        let job_hostlist = NodeList::unpack::<_, VERIFY>(unpacker, &())?;
        let step_hostlist = NodeList::unpack::<_, VERIFY>(unpacker, &())?;
        let job_nhosts = u32::unpack::<_, VERIFY>(unpacker, &()).coerce()?;
        let sockets_per_node = unpack_vec::<u16, _, VERIFY>(unpacker, &())?;
        let cores_per_socket = unpack_vec::<u16, _, VERIFY>(unpacker, &())?;
        let sock_core_rep_count = unpack_vec::<u32, _, VERIFY>(unpacker, &())?;

        let job_core_bitmap = CoreBitmap::unpack::<_, VERIFY>(unpacker, &())?;
        let step_core_bitmap = CoreBitmap::unpack::<_, VERIFY>(unpacker, &())?;

        let job_mem_alloc = unpack_vec::<u64, _, VERIFY>(unpacker, &())?;
        let job_mem_alloc_rep_count = unpack_vec::<u32, _, VERIFY>(unpacker, &())?;
        let step_mem_alloc = unpack_vec::<u64, _, VERIFY>(unpacker, &())?;
        let step_mem_alloc_rep_count = unpack_vec::<u32, _, VERIFY>(unpacker, &())?;

        let job_gres = unpack_opt_gres::<_, VERIFY>(unpacker)?;
        let step_gres = unpack_opt_gres::<_, VERIFY>(unpacker)?;

        let job_account = unpack_opt_string::<_, VERIFY>(unpacker)?;
        let job_comment = unpack_opt_string::<_, VERIFY>(unpacker)?;
        let job_constraints = unpack_opt_string::<_, VERIFY>(unpacker)?;
        let job_licenses = unpack_opt_string::<_, VERIFY>(unpacker)?;
        let job_reservation = unpack_opt_string::<_, VERIFY>(unpacker)?;
        let job_partition = unpack_opt_string::<_, VERIFY>(unpacker)?;
        let job_std_in = unpack_opt_string::<_, VERIFY>(unpacker)?;
        let job_std_out = unpack_opt_string::<_, VERIFY>(unpacker)?;
        let job_std_err = unpack_opt_string::<_, VERIFY>(unpacker)?;
        let job_alias_list = unpack_opt_string::<_, VERIFY>(unpacker)?;

        let node_addrs = match u8::unpack::<_, VERIFY>(unpacker, &()).coerce()? {
            0 => None,
            1 => Some(NodeAddrTable::unpack::<_, VERIFY>(unpacker, &())?),
            tag => {
                return Err(UnpackError::Packable(Error::Decode(format!(
                    "invalid option tag {tag}"
                ))))
            }
        };

        Ok(Self {
            step_id,
            uid,
            gid,
            id: None,
            job_hostlist,
            step_hostlist,
            job_nhosts,
            sockets_per_node,
            cores_per_socket,
            sock_core_rep_count,
            job_core_bitmap,
            step_core_bitmap,
            job_mem_alloc,
            job_mem_alloc_rep_count,
            step_mem_alloc,
            step_mem_alloc_rep_count,
            job_gres,
            step_gres,
            job_account,
            job_comment,
            job_constraints,
            job_licenses,
            job_reservation,
            job_partition,
            job_std_in,
            job_std_out,
            job_std_err,
            job_alias_list,
            node_addrs,
        })
    }
}
