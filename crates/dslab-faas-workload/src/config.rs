//! Workload configuration: raw YAML records and validated function profiles.
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ConfigError;

/// Placeholder request body sent with every invocation unless the record overrides it.
pub fn default_payload() -> serde_json::Value {
    json!({"request": 42})
}

/// One function record as it appears in the YAML config.
///
/// Every field is optional here so that missing fields can be reported by name during
/// validation instead of failing inside the deserializer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawFunctionConfig {
    pub name: Option<String>,
    /// Invocations per second.
    pub arrival_rate: Option<f64>,
    pub num_invocation: Option<u64>,
    /// Mean inter-arrival time inside the spike window, ms.
    pub mu: Option<f64>,
    /// ms
    pub start_time: Option<u64>,
    /// ms
    pub end_time: Option<u64>,
    /// Mean inter-arrival time outside the spike window, ms.
    pub background_mu: Option<f64>,
    pub payload: Option<serde_json::Value>,
}

/// YAML-serializable workload config: an ordered list of function records.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkloadConfig {
    pub functions: Vec<RawFunctionConfig>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowKind {
    Background,
    Spike,
}

/// Sub-window `[start, end]` of a function lifetime with its own mean inter-arrival time.
#[derive(Clone, Debug, PartialEq)]
pub struct RateWindow {
    pub start: u64,
    pub end: u64,
    pub mean_interval_ms: f64,
    pub kind: WindowKind,
}

impl RateWindow {
    pub fn new(start: u64, end: u64, mean_interval_ms: f64, kind: WindowKind) -> Self {
        Self {
            start,
            end,
            mean_interval_ms,
            kind,
        }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ArrivalRegime {
    /// A fixed number of invocations at a single rate over the whole experiment.
    FixedCount { arrival_rate: f64, count: u64 },
    /// Contiguous windows in increasing time order.
    Windowed(Vec<RateWindow>),
}

impl ArrivalRegime {
    /// Returns the spike window if the regime has one.
    pub fn spike_window(&self) -> Option<&RateWindow> {
        match self {
            ArrivalRegime::FixedCount { .. } => None,
            ArrivalRegime::Windowed(windows) => windows.iter().find(|w| w.kind == WindowKind::Spike),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionProfile {
    pub name: String,
    pub regime: ArrivalRegime,
    pub payload: serde_json::Value,
}

impl FunctionProfile {
    pub fn fixed_count(name: &str, arrival_rate: f64, count: u64) -> Self {
        Self {
            name: name.to_string(),
            regime: ArrivalRegime::FixedCount { arrival_rate, count },
            payload: default_payload(),
        }
    }

    pub fn windowed(name: &str, windows: Vec<RateWindow>) -> Self {
        Self {
            name: name.to_string(),
            regime: ArrivalRegime::Windowed(windows),
            payload: default_payload(),
        }
    }
}

/// Validated profiles together with the resolved experiment span.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedWorkload {
    pub profiles: Vec<FunctionProfile>,
    pub experiment_end: u64,
}

impl FromStr for WorkloadConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // an empty document is an empty workload
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(s)?)
    }
}

impl WorkloadConfig {
    pub fn from_yaml(path: &Path) -> Result<Self, ConfigError> {
        std::fs::read_to_string(path).map_err(ConfigError::Read)?.parse()
    }

    /// Validates the records and builds function profiles.
    ///
    /// `experiment_end` overrides the experiment span, which otherwise is the latest `end_time`
    /// among windowed functions.
    pub fn profiles(&self, experiment_end: Option<u64>) -> Result<LoadedWorkload, ConfigError> {
        let mut names = HashSet::new();
        for (index, raw) in self.functions.iter().enumerate() {
            let name = match raw.name.as_deref() {
                None => return Err(ConfigError::MissingName { index }),
                Some("") => return Err(ConfigError::EmptyName { index }),
                Some(name) => name,
            };
            if !names.insert(name) {
                return Err(ConfigError::DuplicateName { name: name.to_string() });
            }
        }

        let latest_end = self
            .functions
            .iter()
            .filter_map(|raw| raw.end_time)
            .max()
            .unwrap_or(0);
        let experiment_end = experiment_end.unwrap_or(latest_end);

        let profiles = self
            .functions
            .iter()
            .map(|raw| raw.to_profile(experiment_end))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "loaded {} function profiles, experiment end {} ms",
            profiles.len(),
            experiment_end
        );
        Ok(LoadedWorkload {
            profiles,
            experiment_end,
        })
    }
}

impl RawFunctionConfig {
    fn is_windowed(&self) -> bool {
        self.mu.is_some() || self.start_time.is_some() || self.end_time.is_some()
    }

    fn is_fixed_count(&self) -> bool {
        self.arrival_rate.is_some() || self.num_invocation.is_some()
    }

    /// Builds the profile of a record whose name is already validated.
    fn to_profile(&self, experiment_end: u64) -> Result<FunctionProfile, ConfigError> {
        let name = self.name.as_deref().unwrap_or_default();
        let missing = |field: &'static str| ConfigError::MissingField {
            function: name.to_string(),
            field,
        };

        if self.is_windowed() && self.is_fixed_count() {
            return Err(ConfigError::AmbiguousRegime {
                function: name.to_string(),
            });
        }

        let regime = if self.is_windowed() {
            let mu = self.mu.ok_or_else(|| missing("mu"))?;
            let start = self.start_time.ok_or_else(|| missing("start_time"))?;
            let end = self.end_time.ok_or_else(|| missing("end_time"))?;
            if start > end {
                return Err(ConfigError::InvalidWindow {
                    function: name.to_string(),
                    start,
                    end,
                });
            }
            if end > experiment_end {
                return Err(ConfigError::ExperimentEndTooEarly {
                    function: name.to_string(),
                    end,
                    experiment_end,
                });
            }
            if let Some(background_mu) = self.background_mu {
                // checked even when the spike covers the whole experiment and no background window is laid out
                if background_mu.is_nan() || background_mu <= 0. {
                    return Err(ConfigError::InvalidBackgroundMean {
                        function: name.to_string(),
                        mean: background_mu,
                    });
                }
            }
            ArrivalRegime::Windowed(build_windows(start, end, mu, self.background_mu, experiment_end))
        } else if self.background_mu.is_some() {
            return Err(ConfigError::OrphanBackground {
                function: name.to_string(),
            });
        } else {
            let arrival_rate = self.arrival_rate.ok_or_else(|| missing("arrival_rate"))?;
            let count = self.num_invocation.ok_or_else(|| missing("num_invocation"))?;
            ArrivalRegime::FixedCount { arrival_rate, count }
        };

        Ok(FunctionProfile {
            name: name.to_string(),
            regime,
            payload: self.payload.clone().unwrap_or_else(default_payload),
        })
    }
}

/// Lays out the spike window and, when a background rate is given, the background windows
/// covering the rest of `[0, experiment_end]`.
fn build_windows(start: u64, end: u64, mu: f64, background_mu: Option<f64>, experiment_end: u64) -> Vec<RateWindow> {
    let mut windows = Vec::with_capacity(3);
    if let Some(background_mu) = background_mu {
        if start > 0 {
            windows.push(RateWindow::new(0, start, background_mu, WindowKind::Background));
        }
        windows.push(RateWindow::new(start, end, mu, WindowKind::Spike));
        if experiment_end > end {
            windows.push(RateWindow::new(end, experiment_end, background_mu, WindowKind::Background));
        }
    } else {
        windows.push(RateWindow::new(start, end, mu, WindowKind::Spike));
    }
    windows
}

/// Reads the config at `path` and builds validated profiles.
pub fn load_profiles(path: &Path, experiment_end: Option<u64>) -> Result<LoadedWorkload, ConfigError> {
    WorkloadConfig::from_yaml(path)?.profiles(experiment_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(yaml: &str) -> Result<LoadedWorkload, ConfigError> {
        yaml.parse::<WorkloadConfig>()?.profiles(None)
    }

    #[test]
    fn test_fixed_count_record() {
        let loaded = load("- {name: f1, arrival_rate: 2.5, num_invocation: 100}").unwrap();
        assert_eq!(loaded.experiment_end, 0);
        assert_eq!(loaded.profiles, vec![FunctionProfile::fixed_count("f1", 2.5, 100)]);
    }

    #[test]
    fn test_spike_with_background() {
        let yaml = r#"
        - name: f1
          mu: 10
          start_time: 100
          end_time: 200
          background_mu: 50
        - name: f2
          mu: 5
          start_time: 0
          end_time: 500
        "#;
        let loaded = load(yaml).unwrap();
        assert_eq!(loaded.experiment_end, 500);
        assert_eq!(
            loaded.profiles[0].regime,
            ArrivalRegime::Windowed(vec![
                RateWindow::new(0, 100, 50., WindowKind::Background),
                RateWindow::new(100, 200, 10., WindowKind::Spike),
                RateWindow::new(200, 500, 50., WindowKind::Background),
            ])
        );
        assert_eq!(
            loaded.profiles[1].regime,
            ArrivalRegime::Windowed(vec![RateWindow::new(0, 500, 5., WindowKind::Spike)])
        );
    }

    #[test]
    fn test_boundary_background_windows_are_skipped() {
        let loaded = load("- {name: f, mu: 10, start_time: 0, end_time: 300, background_mu: 100}").unwrap();
        assert_eq!(
            loaded.profiles[0].regime,
            ArrivalRegime::Windowed(vec![RateWindow::new(0, 300, 10., WindowKind::Spike)])
        );
    }

    #[test]
    fn test_custom_payload() {
        let loaded = load("- {name: f, arrival_rate: 1, num_invocation: 1, payload: {n: 7}}").unwrap();
        assert_eq!(loaded.profiles[0].payload, json!({"n": 7}));
    }

    #[test]
    fn test_missing_fields() {
        assert!(matches!(
            load("- {name: f, arrival_rate: 1}"),
            Err(ConfigError::MissingField { field: "num_invocation", .. })
        ));
        assert!(matches!(
            load("- {name: f, mu: 1, end_time: 10}"),
            Err(ConfigError::MissingField { field: "start_time", .. })
        ));
        assert!(matches!(load("- {mu: 1}"), Err(ConfigError::MissingName { index: 0 })));
        assert!(matches!(load("- {name: f}"), Err(ConfigError::MissingField { .. })));
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        assert!(matches!(
            load("- {name: f, arrival_rate: fast, num_invocation: 1}"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(load("- {name: f, colour: red}"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_invalid_window_order() {
        assert!(matches!(
            load("- {name: f, mu: 1, start_time: 20, end_time: 10}"),
            Err(ConfigError::InvalidWindow { start: 20, end: 10, .. })
        ));
    }

    #[test]
    fn test_mixed_regimes_and_duplicates() {
        assert!(matches!(
            load("- {name: f, mu: 1, start_time: 0, end_time: 10, num_invocation: 3}"),
            Err(ConfigError::AmbiguousRegime { .. })
        ));
        assert!(matches!(
            load("- {name: f, arrival_rate: 1, num_invocation: 1, background_mu: 3}"),
            Err(ConfigError::OrphanBackground { .. })
        ));
        let yaml = "- {name: f, arrival_rate: 1, num_invocation: 1}\n- {name: f, arrival_rate: 2, num_invocation: 1}";
        assert!(matches!(load(yaml), Err(ConfigError::DuplicateName { .. })));
    }

    #[test]
    fn test_invalid_background_mean() {
        for mean in ["-5", "0", ".nan"] {
            let yaml = format!("- {{name: f, mu: 10, start_time: 0, end_time: 300, background_mu: {}}}", mean);
            assert!(matches!(load(&yaml), Err(ConfigError::InvalidBackgroundMean { .. })));
        }
        assert!(matches!(
            load("- {name: f, mu: 10, start_time: 100, end_time: 300, background_mu: -5}"),
            Err(ConfigError::InvalidBackgroundMean { .. })
        ));
    }

    #[test]
    fn test_experiment_end_override() {
        let config: WorkloadConfig = "- {name: f, mu: 1, start_time: 0, end_time: 10, background_mu: 2}"
            .parse()
            .unwrap();
        let loaded = config.profiles(Some(40)).unwrap();
        assert_eq!(loaded.experiment_end, 40);
        assert_eq!(
            loaded.profiles[0].regime,
            ArrivalRegime::Windowed(vec![
                RateWindow::new(0, 10, 1., WindowKind::Spike),
                RateWindow::new(10, 40, 2., WindowKind::Background),
            ])
        );
        assert!(matches!(
            config.profiles(Some(5)),
            Err(ConfigError::ExperimentEndTooEarly { .. })
        ));
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(load("").unwrap().profiles, vec![]);
        assert_eq!(load("[]").unwrap().profiles, vec![]);
    }
}
