//! RFM (recency, frequency, monetary value) input types.
//!
//! An [`RfmTable`] is the loosely-typed tabular input handed to `fit` and
//! `predict`. [`RfmData::from_table`] normalizes it into typed, validated
//! columns. Column names are matched case-insensitively; `ID` is optional and
//! defaults to the row index.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Column name of the optional customer identifier.
pub const ID_COLUMN: &str = "ID";
/// Column name of the repeat-purchase count.
pub const FREQUENCY_COLUMN: &str = "FREQUENCY";
/// Column name of the time of the last purchase.
pub const RECENCY_COLUMN: &str = "RECENCY";
/// Column name of the observation window length.
pub const T_COLUMN: &str = "T";
/// Column name of the average purchase value.
pub const MONETARY_COLUMN: &str = "MONETARY_VALUE";

/// Values of one table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnValues {
    Numbers(Vec<f64>),
    Labels(Vec<String>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numbers(v) => v.len(),
            ColumnValues::Labels(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Raw tabular input: an ordered list of named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RfmTable {
    columns: Vec<(String, ColumnValues)>,
}

impl RfmTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append (or replace, matching case-insensitively) a numeric column.
    pub fn with_numbers(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.insert(name.into(), ColumnValues::Numbers(values));
        self
    }

    /// Append (or replace, matching case-insensitively) a text column.
    pub fn with_labels(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.insert(name.into(), ColumnValues::Labels(values));
        self
    }

    fn insert(&mut self, name: String, values: ColumnValues) {
        match self
            .columns
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => *slot = (name, values),
            None => self.columns.push((name, values)),
        }
    }

    /// Look up a column by name, ignoring ASCII case.
    pub fn column(&self, name: &str) -> Option<&ColumnValues> {
        self.columns
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, values)| values)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Parse CSV text with a header row.
    ///
    /// Fields are trimmed and may be quoted. A column whose every cell parses
    /// as `f64` becomes numeric; anything else is kept as labels.
    pub fn from_csv_str(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());
        let names: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();
        if names.iter().all(String::is_empty) {
            return Err(Error::invalid_input("csv", "input has no header row"));
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); names.len()];
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            for (column, field) in cells.iter_mut().zip(record.iter()) {
                column.push(field.to_string());
            }
        }

        let mut table = RfmTable::new();
        for (name, raw) in names.into_iter().zip(cells) {
            let parsed: std::result::Result<Vec<f64>, _> =
                raw.iter().map(|cell| cell.parse::<f64>()).collect();
            table = match parsed {
                Ok(numbers) => table.with_numbers(name, numbers),
                Err(_) => table.with_labels(name, raw),
            };
        }
        Ok(table)
    }
}

fn csv_error(err: csv::Error) -> Error {
    Error::invalid_input("csv", err.to_string())
}

/// One customer's RFM summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfmRecord {
    pub customer_id: String,
    pub frequency: u64,
    pub recency: f64,
    #[serde(rename = "T")]
    pub t: f64,
    pub monetary_value: f64,
}

/// Validated, column-oriented RFM arrays.
///
/// `frequency` is stored as `f64` because every consumer feeds it straight
/// into floating point formulas; integrality is checked at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfmData {
    customer_id: Vec<String>,
    frequency: Vec<f64>,
    recency: Vec<f64>,
    t: Vec<f64>,
    monetary_value: Vec<f64>,
}

impl RfmData {
    /// Parse and validate a table.
    pub fn from_table(table: &RfmTable) -> Result<Self> {
        let frequency = numeric_column(table, FREQUENCY_COLUMN)?;
        let recency = numeric_column(table, RECENCY_COLUMN)?;
        let t = numeric_column(table, T_COLUMN)?;
        let monetary_value = numeric_column(table, MONETARY_COLUMN)?;

        let rows = frequency.len();
        expect_rows(RECENCY_COLUMN, rows, recency.len())?;
        expect_rows(T_COLUMN, rows, t.len())?;
        expect_rows(MONETARY_COLUMN, rows, monetary_value.len())?;

        let customer_id = match table.column(ID_COLUMN) {
            Some(values) => {
                expect_rows(ID_COLUMN, rows, values.len())?;
                match values {
                    ColumnValues::Labels(labels) => labels.clone(),
                    ColumnValues::Numbers(numbers) => {
                        numbers.iter().map(|&n| format_id(n)).collect()
                    }
                }
            }
            None => (0..rows).map(|i| i.to_string()).collect(),
        };

        Self::from_columns(customer_id, frequency, recency, t, monetary_value)
    }

    /// Build from already-split columns, validating lengths and domains.
    pub fn from_columns(
        customer_id: Vec<String>,
        frequency: Vec<f64>,
        recency: Vec<f64>,
        t: Vec<f64>,
        monetary_value: Vec<f64>,
    ) -> Result<Self> {
        let rows = frequency.len();
        expect_rows(ID_COLUMN, rows, customer_id.len())?;
        expect_rows(RECENCY_COLUMN, rows, recency.len())?;
        expect_rows(T_COLUMN, rows, t.len())?;
        expect_rows(MONETARY_COLUMN, rows, monetary_value.len())?;

        check_inputs(&frequency, &recency, &t, &monetary_value)?;

        Ok(Self {
            customer_id,
            frequency,
            recency,
            t,
            monetary_value,
        })
    }

    /// Build from records.
    pub fn from_records(records: &[RfmRecord]) -> Result<Self> {
        Self::from_columns(
            records.iter().map(|r| r.customer_id.clone()).collect(),
            records.iter().map(|r| r.frequency as f64).collect(),
            records.iter().map(|r| r.recency).collect(),
            records.iter().map(|r| r.t).collect(),
            records.iter().map(|r| r.monetary_value).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.frequency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequency.is_empty()
    }

    pub fn customer_ids(&self) -> &[String] {
        &self.customer_id
    }

    pub fn frequency(&self) -> &[f64] {
        &self.frequency
    }

    pub fn recency(&self) -> &[f64] {
        &self.recency
    }

    #[allow(non_snake_case)]
    pub fn T(&self) -> &[f64] {
        &self.t
    }

    pub fn monetary_value(&self) -> &[f64] {
        &self.monetary_value
    }

    /// Row view of the data.
    pub fn records(&self) -> impl Iterator<Item = RfmRecord> + '_ {
        (0..self.len()).map(move |i| RfmRecord {
            customer_id: self.customer_id[i].clone(),
            frequency: self.frequency[i] as u64,
            recency: self.recency[i],
            t: self.t[i],
            monetary_value: self.monetary_value[i],
        })
    }
}

/// Domain checks applied to every parsed table.
///
/// Rejects the whole table on the first offending row:
/// - frequency must be a finite non-negative integer
/// - recency must be finite and non-negative
/// - T must be finite and positive
/// - recency must not exceed T
/// - monetary value must be finite and non-negative
pub fn check_inputs(
    frequency: &[f64],
    recency: &[f64],
    t: &[f64],
    monetary_value: &[f64],
) -> Result<()> {
    for (row, &x) in frequency.iter().enumerate() {
        if !x.is_finite() || x < 0.0 || x.fract() != 0.0 {
            return Err(Error::invalid_input(
                "frequency",
                format!("row {} has frequency {}; expected a non-negative integer", row, x),
            ));
        }
    }
    for (row, &r) in recency.iter().enumerate() {
        if !r.is_finite() || r < 0.0 {
            return Err(Error::invalid_input(
                "recency",
                format!("row {} has recency {}; expected a non-negative number", row, r),
            ));
        }
    }
    for (row, &big_t) in t.iter().enumerate() {
        if !big_t.is_finite() || big_t <= 0.0 {
            return Err(Error::invalid_input(
                "T",
                format!("row {} has T {}; expected a positive number", row, big_t),
            ));
        }
    }
    for (row, (&r, &big_t)) in recency.iter().zip(t).enumerate() {
        if r > big_t {
            return Err(Error::invalid_input(
                "recency",
                format!("row {} has recency {} greater than T {}", row, r, big_t),
            ));
        }
    }
    for (row, &m) in monetary_value.iter().enumerate() {
        if !m.is_finite() || m < 0.0 {
            return Err(Error::invalid_input(
                "monetary_value",
                format!("row {} has monetary value {}; expected a non-negative number", row, m),
            ));
        }
    }
    Ok(())
}

fn numeric_column(table: &RfmTable, name: &str) -> Result<Vec<f64>> {
    match table.column(name) {
        Some(ColumnValues::Numbers(values)) => Ok(values.clone()),
        Some(ColumnValues::Labels(_)) => Err(Error::invalid_input(
            name,
            "column contains non-numeric values",
        )),
        None => Err(Error::MissingColumn {
            column: name.to_string(),
        }),
    }
}

fn expect_rows(column: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::ColumnLengthMismatch {
            column: column.to_string(),
            expected,
            actual,
        })
    }
}

fn format_id(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
