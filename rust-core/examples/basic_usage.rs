/// Basic usage example: feed earth-frame acceleration, get wave metrics
use std::f64::consts::PI;

use swell_core::{SensorSample, TrendForecaster, WaveConfig, WaveMetric, WaveProcessor};

fn main() -> swell_core::Result<()> {
    println!("=== Swell Wave Estimator: Basic Example ===\n");

    // Default config: 2048-sample buffer, 1024-sample windows at 50% overlap
    let config = WaveConfig::default();
    let mut processor = WaveProcessor::new(config.clone())?;
    let mut forecaster = TrendForecaster::new(config.forecast);

    // Simulated 50Hz stream: a 5 s swell that builds over two minutes
    let rate = 50.0;
    let mut metric_count = 0;

    for i in 0..6000u64 {
        let t = i as f64 / rate;
        let amplitude = 1.0 + t / 60.0;
        let phase = 2.0 * PI * 0.2 * t;
        let sample = SensorSample::new(
            i * 20,
            amplitude * phase.sin(),
            0.4 * amplitude * phase.sin(),
            0.4 * amplitude * phase.cos(),
            rate,
        );
        processor.add_sample(&sample);

        // Run an analysis cycle every 2 seconds of data
        if (i + 1) % 100 == 0 {
            if let Some(metric) = processor.process_cycle(None) {
                metric_count += 1;
                let forecast = forecaster.evaluate(processor.history());
                print_metric(&metric, metric_count, forecast.confidence);
            }
        }
    }

    println!("\n=== Summary ===");
    println!("Total metrics emitted: {}", metric_count);
    println!("History retained: {}", processor.history().len());
    println!(
        "Zero-crossing period (last cycle): {:.2}s",
        processor.last_zero_crossing_period()
    );
    Ok(())
}

fn print_metric(metric: &WaveMetric, num: usize, confidence: f64) {
    println!(
        "[{num:>3}] t={:>6.1}s  Hs={:.2}m  T={:.1}s  dir={:.0}°  big-wave={:.2}",
        metric.elapsed_time, metric.height, metric.period, metric.direction, confidence
    );
}
