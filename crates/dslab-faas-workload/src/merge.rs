//! K-way merge of per-function arrival processes into a single delta-encoded event stream.
use serde::Serialize;

use crate::sampler::ArrivalProcess;

/// One record of the output trace.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MergedEvent<'a> {
    /// Time since the previous event (or since the experiment start for the first one), ms.
    pub interval: u64,
    pub function: &'a str,
    pub payload: &'a serde_json::Value,
}

struct StreamCursor<'a> {
    process: &'a ArrivalProcess,
    index: usize,
    exhausted: bool,
}

impl<'a> StreamCursor<'a> {
    fn new(process: &'a ArrivalProcess) -> Self {
        debug_assert!(
            process.timestamps.windows(2).all(|w| w[0] <= w[1]),
            "timestamps of {} are not sorted",
            process.function
        );
        Self {
            process,
            index: 0,
            exhausted: process.is_empty(),
        }
    }

    fn head(&self) -> Option<u64> {
        if self.exhausted {
            None
        } else {
            Some(self.process.timestamps[self.index])
        }
    }

    fn advance(&mut self) {
        self.index += 1;
        if self.index == self.process.len() {
            self.exhausted = true;
        }
    }

    fn remaining(&self) -> usize {
        self.process.len() - self.index
    }
}

/// Iterator over merged events in non-decreasing time order.
///
/// Events with equal timestamps are emitted in the order of their processes in the input.
pub struct StreamMerger<'a> {
    cursors: Vec<StreamCursor<'a>>,
    prev_timestamp: u64,
}

impl<'a> StreamMerger<'a> {
    pub fn new(processes: &'a [ArrivalProcess]) -> Self {
        Self {
            cursors: processes.iter().map(StreamCursor::new).collect(),
            prev_timestamp: 0,
        }
    }

    /// Absolute time of the last emitted event.
    pub fn current_time(&self) -> u64 {
        self.prev_timestamp
    }
}

impl<'a> Iterator for StreamMerger<'a> {
    type Item = MergedEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut best: Option<(usize, u64)> = None;
        for (i, cursor) in self.cursors.iter().enumerate() {
            if let Some(t) = cursor.head() {
                // strict comparison keeps the earliest input on ties
                if best.map_or(true, |(_, t_min)| t < t_min) {
                    best = Some((i, t));
                }
            }
        }
        let (i, t_min) = best?;
        let cursor = &mut self.cursors[i];
        cursor.advance();
        let process = cursor.process;
        let interval = t_min - self.prev_timestamp;
        self.prev_timestamp = t_min;
        Some(MergedEvent {
            interval,
            function: &process.function,
            payload: &process.payload,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .cursors
            .iter()
            .filter(|c| !c.exhausted)
            .map(|c| c.remaining())
            .sum();
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for StreamMerger<'a> {}
