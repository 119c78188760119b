// FeaturePipeline - the one transform + align path shared by corpus and serving
//
// Both the dataset builder and the inference pipeline call `process` on a
// window of samples. They differ only in the parameters a pipeline is built
// with: the frame target and the alignment policy. Everything else (STFT,
// mel projection, decibel reference, DCT, stacking order) is shared code.

use ndarray::Array2;

use super::align::FrameAligner;
use super::features::{SpectralFeatures, SpectralTransform};
use super::segment::Segmenter;
use super::tensor::AlignedFeatureTensor;
use crate::config::{FeatureConfig, InferenceConfig};
use crate::error::FeatureError;

/// How a window whose natural frame count differs from the target is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentPolicy {
    /// Corpus policy: the MFCC frame count before alignment must already equal
    /// the target (short or corrupt windows are rejected); mel is aligned.
    Strict,
    /// Serving policy: both matrices are padded/truncated to the target.
    PadAll,
}

/// Frame-major matrices for one accepted window
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedWindow {
    /// Shape (target_frames, n_mfcc)
    pub mfcc: Array2<f32>,
    /// Shape (target_frames, n_mels)
    pub mel: Array2<f32>,
}

impl AlignedWindow {
    /// Concatenate into the canonical (frame, mfcc + mel) tensor
    pub fn to_tensor(&self) -> Result<AlignedFeatureTensor, FeatureError> {
        AlignedFeatureTensor::from_frame_major(self.mfcc.view(), self.mel.view())
    }
}

/// Result of running one window through the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum WindowOutcome {
    Accepted(AlignedWindow),
    /// Shape gate failed; not an error, the window is simply dropped
    Rejected { mfcc_frames: usize, mel_frames: usize },
}

impl WindowOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, WindowOutcome::Accepted(_))
    }
}

/// Spectral transform + frame aligner with a fixed target and policy
pub struct FeaturePipeline {
    transform: SpectralTransform,
    aligner: FrameAligner,
    policy: AlignmentPolicy,
}

impl FeaturePipeline {
    pub fn new(
        config: &FeatureConfig,
        target_frames: usize,
        policy: AlignmentPolicy,
    ) -> Result<Self, FeatureError> {
        if target_frames == 0 {
            return Err(FeatureError::InvalidParameter {
                name: "target_frames",
                value: target_frames,
            });
        }
        Ok(Self {
            transform: SpectralTransform::new(config)?,
            aligner: FrameAligner::new(target_frames),
            policy,
        })
    }

    /// Corpus pipeline: target = segmenter expected frames, strict gate
    pub fn for_dataset(config: &FeatureConfig) -> Result<(Self, Segmenter), FeatureError> {
        config.validate()?;
        let segmenter = Segmenter::from_config(config)?;
        let pipeline = Self::new(config, segmenter.expected_frames(), AlignmentPolicy::Strict)?;

        let natural = pipeline.transform.frame_count(segmenter.samples_per_segment());
        if natural != segmenter.expected_frames() {
            tracing::warn!(
                "[FeaturePipeline] Segments of {} samples produce {} frames but the target is {}; every segment will be rejected",
                segmenter.samples_per_segment(),
                natural,
                segmenter.expected_frames()
            );
        }

        Ok((pipeline, segmenter))
    }

    /// Serving pipeline: independent inference target, pad everything
    pub fn for_inference(
        config: &FeatureConfig,
        inference: &InferenceConfig,
    ) -> Result<Self, FeatureError> {
        Self::new(
            config,
            inference.resolved_target_frames(config),
            AlignmentPolicy::PadAll,
        )
    }

    pub fn target_frames(&self) -> usize {
        self.aligner.target_frames()
    }

    pub fn policy(&self) -> AlignmentPolicy {
        self.policy
    }

    pub fn transform(&self) -> &SpectralTransform {
        &self.transform
    }

    /// Extract, gate and align one window of samples
    ///
    /// # Errors
    /// `EmptyInput` / `NonFiniteOutput` from the transform. Callers that must
    /// not fail on short data check for empty windows first.
    pub fn process(&self, samples: &[f32]) -> Result<WindowOutcome, FeatureError> {
        let features = self.transform.extract(samples)?;
        Ok(self.align(features))
    }

    /// Apply the gate and alignment policy to already extracted features
    pub fn align(&self, features: SpectralFeatures) -> WindowOutcome {
        let target = self.aligner.target_frames();
        let mfcc_frames = features.mfcc_frames();

        let (mfcc, mel) = match self.policy {
            AlignmentPolicy::Strict => {
                if mfcc_frames != target {
                    return WindowOutcome::Rejected {
                        mfcc_frames,
                        mel_frames: features.mel_frames(),
                    };
                }
                (features.mfcc, self.aligner.align(&features.mel_db))
            }
            AlignmentPolicy::PadAll => (
                self.aligner.align(&features.mfcc),
                self.aligner.align(&features.mel_db),
            ),
        };

        let mfcc = mfcc.reversed_axes();
        let mel = mel.reversed_axes();
        if mfcc.nrows() != target || mel.nrows() != target {
            return WindowOutcome::Rejected {
                mfcc_frames: mfcc.nrows(),
                mel_frames: mel.nrows(),
            };
        }

        WindowOutcome::Accepted(AlignedWindow { mfcc, mel })
    }

    /// Process a window straight into the canonical tensor
    ///
    /// Returns `FrameMismatch` when the strict gate rejects the window.
    pub fn tensor(&self, samples: &[f32]) -> Result<AlignedFeatureTensor, FeatureError> {
        match self.process(samples)? {
            WindowOutcome::Accepted(window) => window.to_tensor(),
            WindowOutcome::Rejected { mfcc_frames, .. } => Err(FeatureError::FrameMismatch {
                expected: self.target_frames(),
                actual: mfcc_frames,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::signals::{sine_wave, white_noise};

    #[test]
    fn test_dataset_pipeline_accepts_full_segment() {
        let (pipeline, segmenter) = FeaturePipeline::for_dataset(&FeatureConfig::default()).unwrap();
        let signal = white_noise(segmenter.samples_per_segment(), 0.2, 1);

        match pipeline.process(&signal).unwrap() {
            WindowOutcome::Accepted(window) => {
                assert_eq!(window.mfcc.dim(), (130, 13));
                assert_eq!(window.mel.dim(), (130, 128));
            }
            other => panic!("expected acceptance, got {:?}", other),
        }
    }

    #[test]
    fn test_dataset_pipeline_rejects_short_segment() {
        let (pipeline, _) = FeaturePipeline::for_dataset(&FeatureConfig::default()).unwrap();
        let signal = white_noise(30_000, 0.2, 2);

        assert_eq!(
            pipeline.process(&signal).unwrap(),
            WindowOutcome::Rejected {
                mfcc_frames: 59,
                mel_frames: 59
            }
        );
    }

    #[test]
    fn test_inference_pipeline_pads_short_clip() {
        let config = FeatureConfig::default();
        let pipeline = FeaturePipeline::for_inference(&config, &InferenceConfig::default()).unwrap();
        let signal = sine_wave(22_050, 440.0, 10_000, 0.5);

        let tensor = pipeline.tensor(&signal).unwrap();
        assert_eq!(tensor.frames(), 130);
        assert_eq!(tensor.width(), 141);

        // Frames past the natural 20 are zero-filled in both feature kinds
        let natural = pipeline.transform().frame_count(10_000);
        assert!(tensor
            .as_array()
            .rows()
            .into_iter()
            .skip(natural)
            .all(|row| row.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn test_offline_and_online_agree_on_identical_window() {
        let config = FeatureConfig::default();
        let (offline, segmenter) = FeaturePipeline::for_dataset(&config).unwrap();
        let online = FeaturePipeline::for_inference(&config, &InferenceConfig::default()).unwrap();
        let signal = white_noise(segmenter.samples_per_segment(), 0.4, 11);

        let a = offline.tensor(&signal).unwrap();
        let b = online.tensor(&signal).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_strict_tensor_reports_frame_mismatch() {
        let (pipeline, _) = FeaturePipeline::for_dataset(&FeatureConfig::default()).unwrap();
        let err = pipeline.tensor(&vec![0.1; 1_024]).unwrap_err();
        assert_eq!(
            err,
            FeatureError::FrameMismatch {
                expected: 130,
                actual: 3
            }
        );
    }

    #[test]
    fn test_zero_target_rejected() {
        assert!(FeaturePipeline::new(&FeatureConfig::default(), 0, AlignmentPolicy::PadAll).is_err());
    }
}
