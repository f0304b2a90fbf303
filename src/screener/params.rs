// src/screener/params.rs
use crate::error::ParameterError;
use crate::types::{ParameterValue, StrategyParameters};
use tracing::warn;

impl ParameterValue {
    pub fn kind(&self) -> &'static str {
        match self {
            ParameterValue::Bool(_) => "bool",
            ParameterValue::Int(_) => "int",
            ParameterValue::Float(_) => "float",
            ParameterValue::Text(_) => "string",
        }
    }

    /// Parses `input` as a value of the same kind as `self`.
    ///
    /// Numbers that do not parse fall back to `0`; the error is returned
    /// next to the fallback so the caller can tell the user.
    pub fn coerce(&self, name: &str, input: &str) -> (ParameterValue, Option<ParameterError>) {
        let trimmed = input.trim();
        let invalid = || ParameterError::InvalidValue {
            name: name.to_string(),
            kind: self.kind(),
            input: input.to_string(),
        };

        match self {
            ParameterValue::Bool(_) => {
                let on = matches!(trimmed.to_ascii_lowercase().as_str(), "true" | "1" | "yes");
                (ParameterValue::Bool(on), None)
            }
            ParameterValue::Int(_) => match trimmed.parse::<i64>() {
                Ok(v) => (ParameterValue::Int(v), None),
                Err(_) => (ParameterValue::Int(0), Some(invalid())),
            },
            ParameterValue::Float(_) => match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => (ParameterValue::Float(v), None),
                _ => (ParameterValue::Float(0.0), Some(invalid())),
            },
            ParameterValue::Text(_) => (ParameterValue::Text(input.to_string()), None),
        }
    }

    pub fn display(&self) -> String {
        match self {
            ParameterValue::Bool(v) => v.to_string(),
            ParameterValue::Int(v) => v.to_string(),
            ParameterValue::Float(v) => v.to_string(),
            ParameterValue::Text(v) => v.clone(),
        }
    }
}

/// Editable copy of one strategy's parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    strategy: String,
    original: StrategyParameters,
    current: StrategyParameters,
}

impl ParameterSet {
    pub fn new(strategy: impl Into<String>, values: StrategyParameters) -> Self {
        Self {
            strategy: strategy.into(),
            original: values.clone(),
            current: values,
        }
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterValue)> {
        self.current.iter()
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.current.get(name)
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Stores the coerced value. An `InvalidValue` error still leaves the
    /// safe default in place; only an unknown name rejects the edit.
    pub fn edit(&mut self, name: &str, input: &str) -> Result<(), ParameterError> {
        let slot = self
            .current
            .get_mut(name)
            .ok_or_else(|| ParameterError::Unknown(name.to_string()))?;

        let (value, error) = slot.coerce(name, input);
        *slot = value;

        match error {
            Some(e) => {
                warn!("{}", e);
                Err(e)
            }
            None => Ok(()),
        }
    }

    /// Flips a boolean parameter; other kinds are left alone.
    pub fn toggle(&mut self, name: &str) {
        if let Some(ParameterValue::Bool(v)) = self.current.get_mut(name) {
            *v = !*v;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.original != self.current
    }

    pub fn reset(&mut self) {
        self.current = self.original.clone();
    }

    /// Marks the current values as saved.
    pub fn commit(&mut self) {
        self.original = self.current.clone();
    }

    pub fn to_wire(&self) -> StrategyParameters {
        self.current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParameterSet {
        let mut values = StrategyParameters::new();
        values.insert("rsi_length".into(), ParameterValue::Int(14));
        values.insert("atr_multiplier".into(), ParameterValue::Float(1.5));
        values.insert("volume_filter".into(), ParameterValue::Bool(true));
        values.insert("label".into(), ParameterValue::Text("v27".into()));
        ParameterSet::new("XTUMYV27Strategy", values)
    }

    #[test]
    fn unparseable_number_becomes_zero() {
        let mut params = sample();
        let err = params.edit("rsi_length", "abc").unwrap_err();
        assert!(matches!(err, ParameterError::InvalidValue { kind: "int", .. }));
        assert_eq!(params.get("rsi_length"), Some(&ParameterValue::Int(0)));

        params.edit("atr_multiplier", "").unwrap_err();
        assert_eq!(params.get("atr_multiplier"), Some(&ParameterValue::Float(0.0)));
    }

    #[test]
    fn edits_keep_declared_kind() {
        let mut params = sample();
        params.edit("rsi_length", " 21 ").unwrap();
        params.edit("atr_multiplier", "2.25").unwrap();
        params.edit("volume_filter", "no").unwrap();
        params.edit("label", "fast").unwrap();

        assert_eq!(params.get("rsi_length"), Some(&ParameterValue::Int(21)));
        assert_eq!(params.get("atr_multiplier"), Some(&ParameterValue::Float(2.25)));
        assert_eq!(params.get("volume_filter"), Some(&ParameterValue::Bool(false)));
        assert_eq!(params.get("label"), Some(&ParameterValue::Text("fast".into())));
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let mut params = sample();
        assert_eq!(
            params.edit("missing", "1"),
            Err(ParameterError::Unknown("missing".into()))
        );
        assert!(!params.is_dirty());
    }

    #[test]
    fn reset_and_commit_track_dirty_state() {
        let mut params = sample();
        params.toggle("volume_filter");
        assert!(params.is_dirty());
        params.reset();
        assert!(!params.is_dirty());

        params.edit("rsi_length", "9").unwrap();
        params.commit();
        assert!(!params.is_dirty());
        assert_eq!(params.to_wire()["rsi_length"], ParameterValue::Int(9));
    }
}
