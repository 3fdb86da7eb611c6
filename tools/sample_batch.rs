//! Sample Batch Generator
//!
//! Writes a random, schema-valid batch CSV for exercising the batch path.
//! Torque and power are written in the raw compound form ("113Nm@4400rpm").
//!
//! Usage: sample-batch [OUTPUT] [COUNT] [TEMPLATE]

use claim_predictor::schema::{FeatureSchema, FieldKind, FieldSpec, ID_COLUMN, TARGET_COLUMN};
use rand::Rng;
use std::fs::File;
use tracing::info;

/// Random policy generator for testing
struct PolicyGenerator {
    rng: rand::rngs::ThreadRng,
    policy_counter: u64,
}

impl PolicyGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            policy_counter: 0,
        }
    }

    fn next_id(&mut self) -> String {
        self.policy_counter += 1;
        format!("ID{:05}", self.policy_counter)
    }

    fn value_for(&mut self, spec: &FieldSpec) -> String {
        match &spec.kind {
            FieldKind::Categorical { options } => options[self.rng.gen_range(0..options.len())].to_string(),
            FieldKind::Numeric { .. } if spec.name == "max_torque" => format!(
                "{}Nm@{}rpm",
                self.rng.gen_range(60..250),
                self.rng.gen_range(20..50) * 100
            ),
            FieldKind::Numeric { .. } if spec.name == "max_power" => format!(
                "{:.2}bhp@{}rpm",
                self.rng.gen_range(40.0..120.0),
                self.rng.gen_range(40..65) * 100
            ),
            FieldKind::Numeric {
                min,
                max,
                default,
                integer,
            } => {
                let upper = max.unwrap_or(default * 2.0).max(*min + 1.0);
                if *integer {
                    format!("{}", self.rng.gen_range(*min as i64..=upper as i64))
                } else {
                    format!("{:.3}", self.rng.gen_range(*min..upper))
                }
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_batch=info".parse()?),
        )
        .init();

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let output = args.get(1).map(|s| s.as_str()).unwrap_or("sample_batch.csv");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let template = args.get(3);

    info!(output = %output, count = count, "Generating sample batch");

    let schema = FeatureSchema::new();
    let mut generator = PolicyGenerator::new();
    let mut writer = csv::Writer::from_writer(File::create(output)?);

    let mut header = vec![ID_COLUMN];
    header.extend(schema.feature_names());
    writer.write_record(&header)?;

    for _ in 0..count {
        let mut row = vec![generator.next_id()];
        for spec in schema.fields() {
            row.push(generator.value_for(spec));
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;

    if let Some(path) = template {
        let mut writer = csv::Writer::from_writer(File::create(path)?);
        writer.write_record([ID_COLUMN, TARGET_COLUMN])?;
        writer.flush()?;
        info!(template = %path, "Submission template written");
    }

    info!("Completed! Wrote {} policies to {}", count, output);
    Ok(())
}
