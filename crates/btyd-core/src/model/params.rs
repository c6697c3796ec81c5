//! Named parameter values as seen by likelihood and QoI code.

use btyd_common::{Error, Result};

/// One value per declared parameter of a model, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamVector {
    model: &'static str,
    names: &'static [&'static str],
    values: Vec<f64>,
}

impl ParamVector {
    pub fn new(
        model: &'static str,
        names: &'static [&'static str],
        values: Vec<f64>,
    ) -> Result<Self> {
        if values.len() != names.len() {
            return Err(Error::invalid_input(
                "parameters",
                format!(
                    "model {} declares {} parameters, got {} values",
                    model,
                    names.len(),
                    values.len()
                ),
            ));
        }
        Ok(ParamVector {
            model,
            names,
            values,
        })
    }

    /// Value of a declared parameter. Names outside the declared set fail
    /// with [`Error::UnknownParameter`].
    pub fn get(&self, name: &str) -> Result<f64> {
        self.names
            .iter()
            .position(|n| *n == name)
            .map(|i| self.values[i])
            .ok_or_else(|| Error::UnknownParameter {
                model: self.model.to_string(),
                name: name.to_string(),
            })
    }

    pub fn model(&self) -> &'static str {
        self.model
    }

    pub fn names(&self) -> &'static [&'static str] {
        self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.names.iter().copied().zip(self.values.iter().copied())
    }
}

/// A batch of parameter draws: one column of values per declared name,
/// all of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDraws {
    model: &'static str,
    names: &'static [&'static str],
    columns: Vec<Vec<f64>>,
}

impl ParameterDraws {
    pub fn new(
        model: &'static str,
        names: &'static [&'static str],
        columns: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if columns.len() != names.len() {
            return Err(Error::invalid_input(
                "parameters",
                format!(
                    "model {} declares {} parameters, got {} columns",
                    model,
                    names.len(),
                    columns.len()
                ),
            ));
        }
        let len = columns.first().map_or(0, Vec::len);
        if len == 0 || columns.iter().any(|c| c.len() != len) {
            return Err(Error::invalid_input(
                "parameters",
                "draw columns must be non-empty and of equal length",
            ));
        }
        Ok(ParameterDraws {
            model,
            names,
            columns,
        })
    }

    /// Number of draws.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> &'static [&'static str] {
        self.names
    }

    /// All draws of one parameter.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.names
            .iter()
            .position(|n| *n == name)
            .map(|i| self.columns[i].as_slice())
            .ok_or_else(|| Error::UnknownParameter {
                model: self.model.to_string(),
                name: name.to_string(),
            })
    }

    /// The `i`-th draw as a parameter vector.
    pub fn draw(&self, i: usize) -> Option<ParamVector> {
        if i >= self.len() {
            return None;
        }
        Some(ParamVector {
            model: self.model,
            names: self.names,
            values: self.columns.iter().map(|c| c[i]).collect(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = ParamVector> + '_ {
        (0..self.len()).filter_map(move |i| self.draw(i))
    }
}

impl From<ParamVector> for ParameterDraws {
    fn from(params: ParamVector) -> Self {
        ParameterDraws {
            model: params.model,
            names: params.names,
            columns: params.values.into_iter().map(|v| vec![v]).collect(),
        }
    }
}
