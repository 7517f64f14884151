use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};

/// Accelerator placement for a run, parsed from the CLI device string.
///
/// Engine syntax: `""` (engine default), `"cpu"`, `"0"`, or `"0,1,2,3"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceSpec {
    /// Let the engine pick (its default device selection).
    Default,
    Cpu,
    /// One or more CUDA device indices.
    Cuda(Vec<u32>),
}

impl DeviceSpec {
    pub fn parse(spec: &str) -> TrainingResult<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Ok(Self::Default);
        }
        if spec.eq_ignore_ascii_case("cpu") {
            return Ok(Self::Cpu);
        }
        let indices = spec
            .split(',')
            .map(|tok| {
                tok.trim().parse::<u32>().map_err(|_| {
                    TrainingError::InvalidConfig(format!("invalid device token: {tok:?}"))
                })
            })
            .collect::<TrainingResult<Vec<u32>>>()?;
        Ok(Self::Cuda(indices))
    }

    /// True when training spans more than one accelerator.
    #[must_use]
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Cuda(indices) if indices.len() > 1)
    }

    /// Narrow a multi-device spec to its first index; other specs are
    /// returned unchanged.
    #[must_use]
    pub fn isolated(&self) -> Self {
        match self {
            Self::Cuda(indices) if indices.len() > 1 => Self::Cuda(vec![indices[0]]),
            other => other.clone(),
        }
    }

    /// Render back to the engine's device syntax. `Default` renders empty;
    /// callers omit the argument entirely in that case.
    #[must_use]
    pub fn engine_arg(&self) -> Option<String> {
        match self {
            Self::Default => None,
            Self::Cpu => Some("cpu".to_string()),
            Self::Cuda(indices) => Some(
                indices.iter().map(ToString::to_string).collect::<Vec<_>>().join(","),
            ),
        }
    }
}

impl std::fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.engine_arg() {
            Some(s) => f.write_str(&s),
            None => f.write_str("auto"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_is_default() {
        assert_eq!(DeviceSpec::parse("").unwrap(), DeviceSpec::Default);
        assert_eq!(DeviceSpec::parse("  ").unwrap(), DeviceSpec::Default);
    }

    #[test]
    fn test_parse_cpu_case_insensitive() {
        assert_eq!(DeviceSpec::parse("cpu").unwrap(), DeviceSpec::Cpu);
        assert_eq!(DeviceSpec::parse("CPU").unwrap(), DeviceSpec::Cpu);
    }

    #[test]
    fn test_parse_single_and_multi() {
        assert_eq!(DeviceSpec::parse("0").unwrap(), DeviceSpec::Cuda(vec![0]));
        assert_eq!(
            DeviceSpec::parse("0,1,2,3").unwrap(),
            DeviceSpec::Cuda(vec![0, 1, 2, 3])
        );
        assert!(!DeviceSpec::parse("0").unwrap().is_multi());
        assert!(DeviceSpec::parse("0,1").unwrap().is_multi());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DeviceSpec::parse("0,x").is_err());
        assert!(DeviceSpec::parse("gpu0").is_err());
    }

    #[test]
    fn test_isolated_narrows_to_first_index() {
        let multi = DeviceSpec::Cuda(vec![2, 3]);
        assert_eq!(multi.isolated(), DeviceSpec::Cuda(vec![2]));
        assert_eq!(DeviceSpec::Cpu.isolated(), DeviceSpec::Cpu);
        assert_eq!(DeviceSpec::Default.isolated(), DeviceSpec::Default);
    }

    #[test]
    fn test_engine_arg_round_trip() {
        assert_eq!(DeviceSpec::Cuda(vec![0, 1]).engine_arg().as_deref(), Some("0,1"));
        assert_eq!(DeviceSpec::Cpu.engine_arg().as_deref(), Some("cpu"));
        assert_eq!(DeviceSpec::Default.engine_arg(), None);
    }
}
