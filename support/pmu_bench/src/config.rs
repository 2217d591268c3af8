use crate::error::{BenchError, BenchResult};
use crate::report::ReportFormat;
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;

pub const DEFAULT_SAMPLES: usize = 1000;
pub const DEFAULT_ITERATIONS: [u64; 7] = [1, 2, 5, 10, 100, 1000, 10000];

/// Defaults for a benchmark run, read from a RON file. Command line flags win over it.
///
/// ```ron
/// (
///     samples: 500,
///     iterations: [1, 10, 100],
///     format: Json,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Measurements taken per data point.
    pub samples: usize,
    /// Loop lengths timed by the `spin` command.
    pub iterations: Vec<u64>,
    pub format: ReportFormat,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            samples: DEFAULT_SAMPLES,
            iterations: DEFAULT_ITERATIONS.to_vec(),
            format: ReportFormat::Text,
        }
    }
}

impl BenchConfig {
    pub fn deserialize_ron(ron: &str, origin: &str) -> BenchResult<Self> {
        let config: BenchConfig = ron::from_str(ron).map_err(|e| BenchError::ConfigParse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate(origin)?;
        Ok(config)
    }

    pub fn serialize_ron(&self) -> BenchResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| BenchError::Report(e.to_string()))
    }

    fn validate(&self, origin: &str) -> BenchResult<()> {
        if self.samples == 0 {
            return Err(BenchError::ConfigParse {
                path: origin.to_string(),
                message: "samples must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Read a benchmark configuration from a file.
pub fn read_configuration(path: &Path) -> BenchResult<BenchConfig> {
    let origin = path.display().to_string();
    let content = read_to_string(path).map_err(|source| BenchError::ConfigRead {
        path: origin.clone(),
        source,
    })?;
    BenchConfig::deserialize_ron(&content, &origin)
}
