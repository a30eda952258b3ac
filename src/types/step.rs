// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Job step identifiers.

use core::fmt;

use packable::{
    error::{UnpackError, UnpackErrorExt},
    packer::Packer,
    unpacker::Unpacker,
    Packable,
};

use crate::error::Error;

/// Identifies one step of a job, heterogeneous components included.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, serde::Serialize, serde::Deserialize)]
pub struct StepId {
    /// The job the step belongs to.
    pub job_id: u32,
    /// The heterogeneous job leader, or [`StepId::NONE`].
    pub het_job_id: u32,
    /// The step within the job; [`StepId::BATCH_SCRIPT`] for the batch step.
    pub step_id: u32,
}

impl StepId {
    /// Sentinel step id of the batch script step.
    pub const BATCH_SCRIPT: u32 = u32::MAX - 1;
    /// Sentinel for an unset id component.
    pub const NONE: u32 = u32::MAX;

    /// Creates a [`StepId`] for a regular step.
    pub fn new(job_id: u32, step_id: u32) -> Self {
        Self {
            job_id,
            het_job_id: Self::NONE,
            step_id,
        }
    }

    /// Creates a [`StepId`] for the batch script step of a job.
    pub fn batch(job_id: u32) -> Self {
        Self {
            job_id,
            het_job_id: Self::NONE,
            step_id: Self::BATCH_SCRIPT,
        }
    }

    /// Returns whether this is the batch script step.
    pub fn is_batch(&self) -> bool {
        self.step_id == Self::BATCH_SCRIPT
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.het_job_id != Self::NONE {
            write!(f, "{}+{}.", self.job_id, self.het_job_id)?;
        } else {
            write!(f, "{}.", self.job_id)?;
        }
        if self.is_batch() {
            write!(f, "batch")
        } else {
            write!(f, "{}", self.step_id)
        }
    }
}

impl Packable for StepId {
    type UnpackError = Error;
    type UnpackVisitor = ();

    fn pack<P: Packer>(&self, packer: &mut P) -> Result<(), P::Error> {
        self.job_id.pack(packer)?;
        self.het_job_id.pack(packer)?;
        self.step_id.pack(packer)?;

        Ok(())
    }

    fn unpack<U: Unpacker, const VERIFY: bool>(
        unpacker: &mut U,
        _visitor: &Self::UnpackVisitor,
    ) -> Result<Self, UnpackError<Self::UnpackError, U::Error>> {
        Ok(Self {
            job_id: u32::unpack::<_, VERIFY>(unpacker, &()).coerce()?,
            het_job_id: u32::unpack::<_, VERIFY>(unpacker, &()).coerce()?,
            step_id: u32::unpack::<_, VERIFY>(unpacker, &()).coerce()?,
        })
    }
}
