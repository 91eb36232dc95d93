//! `simulate` subcommand: drive the full pipeline from synthetic IMU data.
//!
//! A producer thread generates raw accelerometer and gyroscope readings,
//! runs them through sensor fusion and feeds the shared processor. After
//! every interval of samples it signals the main thread, which runs an
//! analysis cycle and the forecaster.

use std::f64::consts::{PI, SQRT_2};
use std::sync::mpsc;
use std::thread;

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use swell_core::{
    ForecastResult, GyroSample, HeadingFusion, RawImuSample, SensorFusion, SharedWaveProcessor,
    StaticAttitude, TrendForecaster, WaveConfig, WaveMetric,
};

use crate::cli::SimulateArgs;

const GRAVITY: f64 = 9.81;

/// Monochromatic swell with small high-frequency chop.
#[derive(Debug, Clone, Copy)]
struct SeaState {
    amplitude_m: f64,
    omega: f64,
    phase_rad: f64,
    heading_deg: f64,
}

impl SeaState {
    fn new(height_m: f64, period_s: f64, direction_deg: f64, heading_deg: f64) -> Self {
        Self {
            // Hs = 4·sqrt(a²/2) for a single sinusoid
            amplitude_m: height_m / (2.0 * SQRT_2),
            omega: 2.0 * PI / period_s,
            phase_rad: direction_deg.to_radians(),
            heading_deg,
        }
    }

    fn raw_imu(&self, timestamp_ms: u64, t: f64, rate_hz: f64) -> RawImuSample {
        let peak = self.amplitude_m * self.omega * self.omega;
        let phase = self.omega * t;
        let chop = 0.05 * (2.0 * PI * 1.7 * t).sin();
        RawImuSample::new(
            timestamp_ms,
            [
                peak * phase.sin(),
                peak * (phase + self.phase_rad).sin(),
                GRAVITY - peak * phase.sin() + chop,
            ],
            rate_hz,
        )
    }

    /// Slow ±5° yaw swing around the heading.
    fn gyro(&self, timestamp_ms: u64, t: f64) -> GyroSample {
        let swing = 2.0 * PI / 30.0;
        let heading = self.heading_deg + 5.0 * (swing * t).sin();
        let yaw_rate = (5.0 * swing * (swing * t).cos()).to_radians();
        GyroSample::new(timestamp_ms, yaw_rate, heading)
    }
}

#[derive(Serialize)]
struct CycleReport {
    #[serde(flatten)]
    metric: WaveMetric,
    forecast: ForecastResult,
}

pub fn run(args: SimulateArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => WaveConfig::load_from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => WaveConfig::default(),
    };
    if !(args.period > 0.0) {
        bail!("period must be positive, got {}", args.period);
    }
    if !(args.duration > 0.0 && args.interval > 0.0) {
        bail!("duration and interval must be positive");
    }

    let rate = config.sampling.clamp_rate(args.rate);
    if rate != args.rate {
        warn!(requested = args.rate, used = rate, "sampling rate clamped");
    }

    let sea = SeaState::new(args.height, args.period, args.direction, args.heading.unwrap_or(0.0));
    let processor = SharedWaveProcessor::new(config.clone())?;
    let mut forecaster = TrendForecaster::new(config.forecast.clone());

    let total = (args.duration * rate).round() as usize;
    let chunk = ((args.interval * rate).round() as usize).max(1);
    info!(samples = total, rate, "starting simulation");

    let (tx, rx) = mpsc::channel::<Option<f64>>();
    let producer = {
        let processor = processor.clone();
        let config = config.clone();
        thread::spawn(move || {
            let mut fusion = SensorFusion::new(&config.fusion, &config.sampling);
            fusion.attach(Box::new(StaticAttitude::identity()));
            let mut heading = HeadingFusion::new(&config.fusion);

            for start in (0..total).step_by(chunk) {
                let end = (start + chunk).min(total);
                let mut batch = Vec::with_capacity(end - start);
                let mut latest_heading = None;
                for i in start..end {
                    let t = i as f64 / rate;
                    let timestamp_ms = (t * 1000.0).round() as u64;
                    batch.push(fusion.process(&sea.raw_imu(timestamp_ms, t, rate)));
                    latest_heading = Some(heading.update(&sea.gyro(timestamp_ms, t)));
                }
                processor.add_samples(&batch);
                if tx.send(latest_heading).is_err() {
                    break;
                }
            }
        })
    };

    let mut cycles = 0usize;
    for latest_heading in rx {
        let gyro_heading = args.heading.and(latest_heading);
        let Some(metric) = processor.process_cycle(gyro_heading) else {
            continue;
        };
        cycles += 1;
        let forecast = forecaster.evaluate(&processor.history());
        report(&metric, &forecast, args.json)?;
    }
    producer
        .join()
        .map_err(|_| anyhow!("sample producer thread panicked"))?;

    if cycles == 0 {
        warn!("no wave metrics produced; try a longer duration");
        return Ok(());
    }

    let zero_crossing = processor.with(|p| p.last_zero_crossing_period());
    info!(cycles, zero_crossing_period = zero_crossing, "simulation finished");
    Ok(())
}

fn report(metric: &WaveMetric, forecast: &ForecastResult, json: bool) -> Result<()> {
    if json {
        let line = serde_json::to_string(&CycleReport {
            metric: *metric,
            forecast: *forecast,
        })?;
        println!("{line}");
    } else {
        println!(
            "{:>7.1}s  Hs {:>5.2} m  T {:>5.1} s  dir {:>5.1}°  big-wave {:.2}{}",
            metric.elapsed_time,
            metric.height,
            metric.period,
            metric.direction,
            forecast.smoothed_confidence,
            if forecast.big_wave { "  BIG WAVE" } else { "" },
        );
    }
    Ok(())
}
