use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParameterError {
    #[error("Unknown parameter '{0}'")]
    UnknownKey(String),
    #[error("Invalid value for parameter '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
    #[error("TOML parsing error: {0}")]
    Toml(String),
}

/// Surface sampling algorithm requested from the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum Algorithm {
    #[default]
    #[serde(rename = "LeeRichards", alias = "lee-richards")]
    LeeRichards,
    #[serde(rename = "ShrakeRupley", alias = "shrake-rupley")]
    ShrakeRupley,
}

impl FromStr for Algorithm {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "leerichards" | "lee-richards" => Ok(Algorithm::LeeRichards),
            "shrakerupley" | "shrake-rupley" => Ok(Algorithm::ShrakeRupley),
            _ => Err(ParameterError::InvalidValue {
                key: "algorithm".to_string(),
                reason: format!("unknown algorithm '{}'", s),
            }),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::LeeRichards => write!(f, "LeeRichards"),
            Algorithm::ShrakeRupley => write!(f, "ShrakeRupley"),
        }
    }
}

/// A value passed to [`Parameters::from_pairs`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Text(String),
    Float(f64),
    Integer(i64),
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
struct RawParameters {
    algorithm: Algorithm,
    probe_radius: f64,
    n_points: i64,
    n_slices: i64,
    n_threads: i64,
}

impl Default for RawParameters {
    fn default() -> Self {
        let defaults = Parameters::default();
        Self {
            algorithm: defaults.algorithm,
            probe_radius: defaults.probe_radius,
            n_points: defaults.n_points as i64,
            n_slices: defaults.n_slices as i64,
            n_threads: defaults.n_threads as i64,
        }
    }
}

/// Settings forwarded to the surface calculator.
///
/// `n-points` applies to Shrake-Rupley and `n-slices` to Lee-Richards; both are kept so
/// switching algorithms does not lose the other setting.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    algorithm: Algorithm,
    probe_radius: f64,
    n_points: usize,
    n_slices: usize,
    n_threads: usize,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::LeeRichards,
            probe_radius: 1.4,
            n_points: 100,
            n_slices: 20,
            n_threads: 2,
        }
    }
}

fn positive(key: &str, value: i64) -> Result<usize, ParameterError> {
    if value > 0 {
        Ok(value as usize)
    } else {
        Err(ParameterError::InvalidValue {
            key: key.to_string(),
            reason: format!("must be positive (got {})", value),
        })
    }
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, ParameterError>
    where
        I: IntoIterator<Item = (&'a str, ParameterValue)>,
    {
        let mut parameters = Self::default();
        for (key, value) in pairs {
            let key = key.trim();
            let wrong_type = |expected: &str| ParameterError::InvalidValue {
                key: key.to_string(),
                reason: format!("expected {}", expected),
            };
            match (key, value) {
                ("algorithm", ParameterValue::Text(name)) => {
                    parameters.set_algorithm(name.parse()?);
                }
                ("algorithm", _) => return Err(wrong_type("a string")),
                ("probe-radius", ParameterValue::Float(v)) => parameters.set_probe_radius(v)?,
                ("probe-radius", ParameterValue::Integer(v)) => {
                    parameters.set_probe_radius(v as f64)?
                }
                ("probe-radius", _) => return Err(wrong_type("a number")),
                ("n-points", ParameterValue::Integer(v)) => {
                    parameters.set_n_points(positive(key, v)?)?
                }
                ("n-slices", ParameterValue::Integer(v)) => {
                    parameters.set_n_slices(positive(key, v)?)?
                }
                ("n-threads", ParameterValue::Integer(v)) => {
                    parameters.set_n_threads(positive(key, v)?)?
                }
                ("n-points" | "n-slices" | "n-threads", _) => {
                    return Err(wrong_type("an integer"));
                }
                _ => return Err(ParameterError::UnknownKey(key.to_string())),
            }
        }
        Ok(parameters)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ParameterError> {
        let raw: RawParameters =
            toml::from_str(content).map_err(|e| ParameterError::Toml(e.to_string()))?;
        let mut parameters = Self::default();
        parameters.set_algorithm(raw.algorithm);
        parameters.set_probe_radius(raw.probe_radius)?;
        parameters.set_n_points(positive("n-points", raw.n_points)?)?;
        parameters.set_n_slices(positive("n-slices", raw.n_slices)?)?;
        parameters.set_n_threads(positive("n-threads", raw.n_threads)?)?;
        Ok(parameters)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn probe_radius(&self) -> f64 {
        self.probe_radius
    }

    pub fn n_points(&self) -> usize {
        self.n_points
    }

    pub fn n_slices(&self) -> usize {
        self.n_slices
    }

    pub fn n_threads(&self) -> usize {
        self.n_threads
    }

    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
    }

    pub fn set_probe_radius(&mut self, probe_radius: f64) -> Result<(), ParameterError> {
        if !probe_radius.is_finite() || probe_radius < 0.0 {
            return Err(ParameterError::InvalidValue {
                key: "probe-radius".to_string(),
                reason: format!("must be a non-negative number (got {})", probe_radius),
            });
        }
        self.probe_radius = probe_radius;
        Ok(())
    }

    pub fn set_n_points(&mut self, n_points: usize) -> Result<(), ParameterError> {
        self.n_points = positive("n-points", n_points as i64)?;
        Ok(())
    }

    pub fn set_n_slices(&mut self, n_slices: usize) -> Result<(), ParameterError> {
        self.n_slices = positive("n-slices", n_slices as i64)?;
        Ok(())
    }

    pub fn set_n_threads(&mut self, n_threads: usize) -> Result<(), ParameterError> {
        self.n_threads = positive("n-threads", n_threads as i64)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let p = Parameters::default();
        assert_eq!(p.algorithm(), Algorithm::LeeRichards);
        assert_eq!(p.probe_radius(), 1.4);
        assert_eq!(p.n_points(), 100);
        assert_eq!(p.n_slices(), 20);
        assert_eq!(p.n_threads(), 2);
    }

    #[test]
    fn setters_validate_values() {
        let mut p = Parameters::new();
        p.set_algorithm(Algorithm::ShrakeRupley);
        p.set_probe_radius(1.5).unwrap();
        p.set_n_points(2000).unwrap();
        p.set_n_slices(10).unwrap();
        p.set_n_threads(4).unwrap();
        assert_eq!(p.algorithm(), Algorithm::ShrakeRupley);
        assert_eq!(p.probe_radius(), 1.5);
        assert_eq!(p.n_points(), 2000);

        assert!(p.set_probe_radius(-1.0).is_err());
        assert!(p.set_n_points(0).is_err());
        assert!(p.set_n_slices(0).is_err());
        assert!(p.set_n_threads(0).is_err());
        assert_eq!(p.probe_radius(), 1.5);
    }

    #[test]
    fn from_pairs_sets_known_keys() {
        let p = Parameters::from_pairs([
            ("algorithm", ParameterValue::Text("shrake-rupley".to_string())),
            ("probe-radius", ParameterValue::Float(1.2)),
            ("n-points", ParameterValue::Integer(200)),
        ])
        .unwrap();
        assert_eq!(p.algorithm(), Algorithm::ShrakeRupley);
        assert_eq!(p.probe_radius(), 1.2);
        assert_eq!(p.n_points(), 200);
        assert_eq!(p.n_slices(), 20);
    }

    #[test]
    fn from_pairs_rejects_unknown_keys_and_bad_values() {
        assert_eq!(
            Parameters::from_pairs([("not-an-option", ParameterValue::Integer(1))]),
            Err(ParameterError::UnknownKey("not-an-option".to_string()))
        );
        assert!(matches!(
            Parameters::from_pairs([("n-slices", ParameterValue::Integer(0))]),
            Err(ParameterError::InvalidValue { .. })
        ));
        assert!(matches!(
            Parameters::from_pairs([("n-points", ParameterValue::Float(1.5))]),
            Err(ParameterError::InvalidValue { .. })
        ));
        assert!(matches!(
            Parameters::from_pairs([("algorithm", ParameterValue::Text("magic".to_string()))]),
            Err(ParameterError::InvalidValue { .. })
        ));
    }

    #[test]
    fn from_toml_str_reads_kebab_case_keys() {
        let p = Parameters::from_toml_str(
            r#"
            algorithm = "ShrakeRupley"
            probe-radius = 1.0
            n-threads = 1
            "#,
        )
        .unwrap();
        assert_eq!(p.algorithm(), Algorithm::ShrakeRupley);
        assert_eq!(p.probe_radius(), 1.0);
        assert_eq!(p.n_threads(), 1);
        assert_eq!(p.n_points(), 100);
    }

    #[test]
    fn from_toml_str_rejects_unknown_keys_and_invalid_values() {
        assert!(matches!(
            Parameters::from_toml_str("bogus = 1"),
            Err(ParameterError::Toml(_))
        ));
        assert!(matches!(
            Parameters::from_toml_str("n-slices = -3"),
            Err(ParameterError::InvalidValue { .. })
        ));
    }
}
