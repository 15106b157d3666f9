//! Utilities for experiments

use std::fmt::{Display, Formatter};

use itertools::Itertools;

use sluice::operators::from_sequence;
use sluice::{Done, Stream};

/// Parameters of one benchmark run.
#[derive(Clone, Debug)]
pub struct ExperimentConfig {
    /// Number of parallel streams, or the capacity of a buffer.
    pub width: usize,
    /// Number of elements moved through the pipeline.
    pub elements: u64,
}

impl Display for ExperimentConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "width={},elements={}", self.width, self.elements)
    }
}

/// Splits `0 .. elements` into `width` contiguous sequences of near-equal length.
pub fn split(elements: u64, width: usize) -> Vec<Vec<u64>> {
    let width = width.max(1) as u64;
    let chunk = elements.div_ceil(width).max(1) as usize;
    (0 .. elements)
        .chunks(chunk)
        .into_iter()
        .map(|chunk| chunk.collect())
        .collect()
}

/// One stream per sequence that [`split`] produces.
pub fn sources(done: &Done, elements: u64, width: usize) -> Vec<Stream<u64>> {
    split(elements, width)
        .into_iter()
        .map(|sequence| from_sequence(done, sequence))
        .collect()
}

/// Drains `stream`, returning how many elements it held.
pub fn drain<T>(stream: Stream<T>) -> u64 {
    stream.into_iter().count() as u64
}

#[cfg(test)]
mod tests {
    use super::split;

    #[test]
    fn split_covers_every_element_once() {
        for width in [1, 3, 7] {
            let parts = split(20, width);
            assert!(parts.len() <= width);
            assert_eq!(parts.concat(), (0 .. 20).collect::<Vec<_>>());
        }
        assert!(split(0, 4).is_empty());
    }
}
