// Segmenter - splits a fixed-duration track into equal, non-overlapping windows
//
// Segment d covers [d * sps, (d + 1) * sps) where sps = floor(total / N).
// Trailing samples past N * sps are never used. The expected frame count per
// segment, ceil(sps / hop), is the alignment target for every segment of every
// file in a corpus.

use std::ops::Range;

use crate::config::FeatureConfig;
use crate::error::FeatureError;

/// Fixed segmentation policy for one corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segmenter {
    samples_per_track: usize,
    num_segments: usize,
    samples_per_segment: usize,
    expected_frames: usize,
}

impl Segmenter {
    /// Create a segmenter
    ///
    /// # Errors
    /// `InvalidParameter` when N or the hop is zero, or when N exceeds the
    /// track length (every segment would be empty)
    pub fn new(
        samples_per_track: usize,
        num_segments: usize,
        hop_length: usize,
    ) -> Result<Self, FeatureError> {
        if num_segments == 0 {
            return Err(FeatureError::InvalidParameter {
                name: "num_segments",
                value: num_segments,
            });
        }
        if hop_length == 0 {
            return Err(FeatureError::InvalidParameter {
                name: "hop_length",
                value: hop_length,
            });
        }

        let samples_per_segment = samples_per_track / num_segments;
        if samples_per_segment == 0 {
            return Err(FeatureError::InvalidParameter {
                name: "num_segments",
                value: num_segments,
            });
        }

        Ok(Self {
            samples_per_track,
            num_segments,
            samples_per_segment,
            expected_frames: samples_per_segment.div_ceil(hop_length),
        })
    }

    /// Segmenter for sample_rate * track_duration_s samples
    pub fn from_config(config: &FeatureConfig) -> Result<Self, FeatureError> {
        let samples_per_track = config.sample_rate as usize * config.track_duration_s as usize;
        Self::new(samples_per_track, config.num_segments, config.hop_length)
    }

    pub fn samples_per_track(&self) -> usize {
        self.samples_per_track
    }

    pub fn num_segments(&self) -> usize {
        self.num_segments
    }

    pub fn samples_per_segment(&self) -> usize {
        self.samples_per_segment
    }

    /// Frame target shared by every segment
    pub fn expected_frames(&self) -> usize {
        self.expected_frames
    }

    /// Sample window for segment `index`
    pub fn window(&self, index: usize) -> Range<usize> {
        let start = index * self.samples_per_segment;
        start..start + self.samples_per_segment
    }

    /// All N windows in order
    pub fn windows(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.num_segments).map(move |d| self.window(d))
    }

    /// Slice segment `index` out of `samples`, clamped to what is available
    ///
    /// Sources shorter than the window yield a truncated or empty slice; the
    /// caller decides whether to keep it.
    pub fn slice<'a>(&self, samples: &'a [f32], index: usize) -> &'a [f32] {
        let window = self.window(index);
        let start = window.start.min(samples.len());
        let end = window.end.min(samples.len());
        &samples[start..end]
    }
}
