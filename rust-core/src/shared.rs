//! Thread-safe handle to a [`WaveProcessor`].
//!
//! Samples typically arrive on a sensor thread while cycles run on a timer.
//! Every operation takes the same lock, so a cycle always sees a consistent
//! buffer and `add_sample` never interleaves with it.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::WaveConfig;
use crate::error::Result;
use crate::processor::WaveProcessor;
use crate::types::{ProcessorState, SensorSample, WaveMetric};

/// Cloneable shared handle; clones refer to the same processor.
#[derive(Clone, Default)]
pub struct SharedWaveProcessor {
    inner: Arc<Mutex<WaveProcessor>>,
}

impl SharedWaveProcessor {
    pub fn new(config: WaveConfig) -> Result<Self> {
        Ok(Self::from(WaveProcessor::new(config)?))
    }

    pub fn add_sample(&self, sample: &SensorSample) {
        self.inner.lock().add_sample(sample);
    }

    /// Append a batch under a single lock acquisition.
    pub fn add_samples<'a, I>(&self, samples: I)
    where
        I: IntoIterator<Item = &'a SensorSample>,
    {
        let mut processor = self.inner.lock();
        for sample in samples {
            processor.add_sample(sample);
        }
    }

    pub fn process_cycle(&self, gyro_heading: Option<f64>) -> Option<WaveMetric> {
        self.inner.lock().process_cycle(gyro_heading)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn state(&self) -> ProcessorState {
        self.inner.lock().state()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Copy of the metric history, oldest first.
    pub fn history(&self) -> Vec<WaveMetric> {
        self.inner.lock().history().to_vec()
    }

    pub fn current_height(&self) -> Option<f64> {
        self.inner.lock().current_height()
    }

    pub fn current_period(&self) -> Option<f64> {
        self.inner.lock().current_period()
    }

    pub fn current_direction(&self) -> Option<f64> {
        self.inner.lock().current_direction()
    }

    /// Run `f` with exclusive access to the processor.
    pub fn with<R>(&self, f: impl FnOnce(&mut WaveProcessor) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl From<WaveProcessor> for SharedWaveProcessor {
    fn from(processor: WaveProcessor) -> Self {
        Self {
            inner: Arc::new(Mutex::new(processor)),
        }
    }
}
