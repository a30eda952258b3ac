// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use rand::{
    distributions::{
        uniform::{SampleRange, SampleUniform},
        Distribution, Standard,
    },
    thread_rng, Rng,
};

/// Generates a random generic number.
pub fn rand_number<T>() -> T
where
    Standard: Distribution<T>,
{
    thread_rng().gen()
}

/// Generates a random generic number in the given range.
pub fn rand_number_range<T, R>(range: R) -> T
where
    T: SampleUniform,
    R: SampleRange<T>,
{
    thread_rng().gen_range(range)
}
