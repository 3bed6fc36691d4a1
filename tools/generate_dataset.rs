//! Synthetic Dataset Generator
//!
//! Writes a tournament-style CSV (binned features, era groups, a target) and a
//! few JSON linear models, so the pipeline can be tried without real data.

use numerai_blocks::models::LinearArtifact;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;
use tracing::info;

const FEATURE_BINS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// Dataset generator with a hidden linear signal
struct DatasetGenerator {
    rng: StdRng,
    n_features: usize,
    signal: Vec<f64>,
}

impl DatasetGenerator {
    fn new(n_features: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let signal = (0..n_features).map(|_| rng.gen_range(-1.0..1.0)).collect();
        Self {
            rng,
            n_features,
            signal,
        }
    }

    /// One row of binned feature values
    fn generate_features(&mut self) -> Vec<f64> {
        (0..self.n_features)
            .map(|_| FEATURE_BINS[self.rng.gen_range(0..FEATURE_BINS.len())])
            .collect()
    }

    /// Noisy target binned like the features
    fn generate_target(&mut self, features: &[f64]) -> f64 {
        let norm: f64 = self.signal.iter().map(|w| w.abs()).sum::<f64>().max(1e-9);
        let raw: f64 = features
            .iter()
            .zip(&self.signal)
            .map(|(f, w)| f * w)
            .sum::<f64>()
            / norm;
        let noisy = 0.5 + raw * 0.5 + self.rng.gen_range(-0.25..0.25);
        let bin = (noisy.clamp(0.0, 1.0) * 4.0).round() as usize;
        FEATURE_BINS[bin]
    }

    /// Linear artifact that recovers a perturbed copy of the signal
    fn generate_model(&mut self) -> LinearArtifact {
        let coefficients = self
            .signal
            .iter()
            .map(|w| w + self.rng.gen_range(-0.2..0.2))
            .collect();
        LinearArtifact {
            coefficients: vec![coefficients],
            intercepts: vec![0.0],
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("generate_dataset=info".parse()?),
        )
        .init();

    info!("Starting Synthetic Dataset Generator");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let output = args.get(1).map(|s| s.as_str()).unwrap_or("data/live.csv");
    let models_dir = args.get(2).map(|s| s.as_str()).unwrap_or("models");
    let eras: usize = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(10);
    let rows_per_era: usize = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(200);
    let n_features: usize = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(20);
    let seed: u64 = args.get(6).and_then(|s| s.parse().ok()).unwrap_or(42);

    info!(
        output = %output,
        models_dir = %models_dir,
        eras = eras,
        rows_per_era = rows_per_era,
        n_features = n_features,
        "Configuration loaded"
    );

    let mut generator = DatasetGenerator::new(n_features, seed);

    if let Some(parent) = Path::new(output).parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(output)?;

    let mut header = vec!["id".to_string(), "era".to_string(), "data_type".to_string()];
    header.extend((0..n_features).map(|i| format!("feature_{:03}", i)));
    header.push("target".to_string());
    writer.write_record(&header)?;

    for era in 0..eras {
        for row in 0..rows_per_era {
            let features = generator.generate_features();
            let target = generator.generate_target(&features);

            let mut record = vec![
                format!("n{:06}{:04}", era, row),
                format!("{:04}", era + 1),
                "validation".to_string(),
            ];
            record.extend(features.iter().map(|f| f.to_string()));
            record.push(target.to_string());
            writer.write_record(&record)?;
        }
        info!("Generated era {}/{}", era + 1, eras);
    }
    writer.flush()?;

    fs::create_dir_all(models_dir)?;
    for i in 0..3 {
        let path = Path::new(models_dir).join(format!("linear_{}.json", i));
        fs::write(&path, serde_json::to_string_pretty(&generator.generate_model())?)?;
        info!(path = %path.display(), "Wrote linear model");
    }

    info!(
        "Completed! Wrote {} rows across {} eras to {}",
        eras * rows_per_era,
        eras,
        output
    );

    Ok(())
}
