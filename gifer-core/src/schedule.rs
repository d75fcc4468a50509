//! Breakpoint scheduling and frame expansion

use crate::frame::DynamicFrame;
use crate::TIME_UNIT_SCALE;
use std::collections::BTreeMap;

/// Output instants of a timeline with the dynamic frames showing at each one
///
/// Built from the sparse instant map collected during registration. Buckets
/// hold indices into the timeline's frame arena, so a frame carried across
/// several breakpoints is never copied.
#[derive(Debug, Clone)]
pub struct Schedule<'a> {
    frames: &'a [DynamicFrame],
    breakpoints: Vec<u64>,
    buckets: Vec<Vec<usize>>,
}

impl<'a> Schedule<'a> {
    /// Computes breakpoints and expands frames across them
    ///
    /// Instants at or past `terminal` are dropped. With `include_origin`,
    /// instant 0 is a breakpoint even when no dynamic frame starts there.
    pub(crate) fn build(
        frames: &'a [DynamicFrame],
        instant_map: &BTreeMap<u64, Vec<usize>>,
        terminal: u64,
        include_origin: bool,
    ) -> Self {
        let mut breakpoints: Vec<u64> = instant_map
            .keys()
            .copied()
            .take_while(|&instant| instant < terminal)
            .collect();
        if include_origin && terminal > 0 && breakpoints.first() != Some(&0) {
            breakpoints.insert(0, 0);
        }
        breakpoints.push(terminal);

        let mut buckets: Vec<Vec<usize>> = breakpoints[..breakpoints.len() - 1]
            .iter()
            .map(|instant| instant_map.get(instant).cloned().unwrap_or_default())
            .collect();

        // Carry frames that are still showing into the next bucket, in order,
        // so long frames cascade across every breakpoint they span.
        for i in 1..buckets.len() {
            let next = breakpoints[i];
            let carried: Vec<usize> = buckets[i - 1]
                .iter()
                .copied()
                .filter(|&id| frames[id].outlasts(next))
                .collect();
            buckets[i].extend(carried);
        }

        tracing::debug!(
            breakpoints = breakpoints.len(),
            terminal,
            "computed timeline schedule"
        );

        Self {
            frames,
            breakpoints,
            buckets,
        }
    }

    /// All breakpoints in ascending order, terminal instant included
    pub fn breakpoints(&self) -> &[u64] {
        &self.breakpoints
    }

    /// Instants that produce an output frame (every breakpoint but the terminal one)
    pub fn instants(&self) -> &[u64] {
        &self.breakpoints[..self.frame_count()]
    }

    /// The terminal instant bounding the last output frame
    pub fn terminal(&self) -> u64 {
        self.breakpoints[self.breakpoints.len() - 1]
    }

    /// Number of output frames
    pub fn frame_count(&self) -> usize {
        self.breakpoints.len() - 1
    }

    /// Output frame durations in milliseconds
    pub fn durations_ms(&self) -> Vec<u64> {
        self.breakpoints.windows(2).map(|pair| pair[1] - pair[0]).collect()
    }

    /// Output frame durations in seconds
    pub fn durations(&self) -> Vec<f64> {
        self.durations_ms()
            .into_iter()
            .map(|ms| ms as f64 / TIME_UNIT_SCALE)
            .collect()
    }

    /// Dynamic frames showing at the output frame with the given index, after expansion
    pub fn bucket_at(&self, index: usize) -> impl Iterator<Item = &'a DynamicFrame> + '_ {
        let frames = self.frames;
        self.buckets
            .get(index)
            .into_iter()
            .flatten()
            .map(move |&id| &frames[id])
    }

    /// Dynamic frames showing at a breakpoint, after expansion
    pub fn bucket(&self, instant: u64) -> Option<Vec<&'a DynamicFrame>> {
        let index = self.instants().binary_search(&instant).ok()?;
        Some(self.bucket_at(index).collect())
    }
}
