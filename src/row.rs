use serde::{Deserialize, Serialize};
use std::fmt;

use crate::format::{is_digit_string, parse_number};

/// A numeric cell while it is being edited.
///
/// Holds a digit string without grouping separators; the empty string means
/// "not entered", which is distinct from an entered zero.
#[derive(Clone, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct Amount(String);

impl Amount {
    pub fn unset() -> Self {
        Amount(String::new())
    }

    /// Accept a displayed value, rejecting anything that is not a
    /// non-negative integer fitting in `i64`.
    pub fn parse(raw: &str) -> Option<Self> {
        let clean = parse_number(raw);
        if clean.is_empty() {
            return Some(Amount::unset());
        }
        if !is_digit_string(&clean) || clean.parse::<i64>().is_err() {
            return None;
        }
        Some(Amount(clean))
    }

    /// Persisted rows store plain integers; zero reads back as unset.
    pub fn from_stored(value: i64) -> Self {
        if value == 0 {
            Amount::unset()
        } else {
            Amount(value.to_string())
        }
    }

    pub fn is_set(&self) -> bool {
        !self.0.is_empty()
    }

    /// Integer value, unset counts as 0.
    pub fn value(&self) -> i64 {
        self.0.parse().unwrap_or(0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount(value.max(0).to_string())
    }
}

/// Columns of a report row, in grid order.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Sabablar,
    Tovar,
    Ok,
    Rasxod,
    Vazvirat,
    Pul,
    KilikOzi,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Sabablar,
        Field::Tovar,
        Field::Ok,
        Field::Rasxod,
        Field::Vazvirat,
        Field::Pul,
        Field::KilikOzi,
    ];

    pub const NUMERIC: [Field; 6] = [
        Field::Tovar,
        Field::Ok,
        Field::Rasxod,
        Field::Vazvirat,
        Field::Pul,
        Field::KilikOzi,
    ];

    /// Deductions subtracted from the inbound amount.
    pub const OUTBOUND: [Field; 5] = [
        Field::Ok,
        Field::Rasxod,
        Field::Vazvirat,
        Field::Pul,
        Field::KilikOzi,
    ];

    pub fn is_numeric(self) -> bool {
        self != Field::Sabablar
    }

    pub fn position(self) -> usize {
        Field::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn first() -> Field {
        Field::ALL[0]
    }

    pub fn last() -> Field {
        Field::ALL[Field::ALL.len() - 1]
    }

    pub fn next(self) -> Option<Field> {
        Field::ALL.get(self.position() + 1).copied()
    }

    pub fn prev(self) -> Option<Field> {
        self.position().checked_sub(1).map(|i| Field::ALL[i])
    }

    pub fn key(self) -> &'static str {
        match self {
            Field::Sabablar => "sabablar",
            Field::Tovar => "tovar",
            Field::Ok => "ok",
            Field::Rasxod => "rasxod",
            Field::Vazvirat => "vazvirat",
            Field::Pul => "pul",
            Field::KilikOzi => "kilik_ozi",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.key() == key)
    }

    /// Column caption used by the grid header and exported documents.
    pub fn caption(self) -> &'static str {
        match self {
            Field::Sabablar => "SABABLAR",
            Field::Tovar => "TOVAR",
            Field::Ok => "OK",
            Field::Rasxod => "RASXOD",
            Field::Vazvirat => "VAZVIRAT",
            Field::Pul => "PUL",
            Field::KilikOzi => "KILIK O'ZI",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One line item of a report.
#[derive(Clone, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ReportRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub sabablar: String,
    #[serde(default)]
    pub tovar: Amount,
    #[serde(default)]
    pub ok: Amount,
    #[serde(default)]
    pub rasxod: Amount,
    #[serde(default)]
    pub vazvirat: Amount,
    #[serde(default)]
    pub pul: Amount,
    #[serde(default)]
    pub kilik_ozi: Amount,
}

impl ReportRow {
    pub fn empty() -> Self {
        ReportRow::default()
    }

    pub fn with_label(label: &str) -> Self {
        ReportRow {
            sabablar: label.to_string(),
            ..ReportRow::default()
        }
    }

    /// Numeric cell for `field`; `None` for the label column.
    pub fn amount(&self, field: Field) -> Option<&Amount> {
        match field {
            Field::Sabablar => None,
            Field::Tovar => Some(&self.tovar),
            Field::Ok => Some(&self.ok),
            Field::Rasxod => Some(&self.rasxod),
            Field::Vazvirat => Some(&self.vazvirat),
            Field::Pul => Some(&self.pul),
            Field::KilikOzi => Some(&self.kilik_ozi),
        }
    }

    pub fn amount_mut(&mut self, field: Field) -> Option<&mut Amount> {
        match field {
            Field::Sabablar => None,
            Field::Tovar => Some(&mut self.tovar),
            Field::Ok => Some(&mut self.ok),
            Field::Rasxod => Some(&mut self.rasxod),
            Field::Vazvirat => Some(&mut self.vazvirat),
            Field::Pul => Some(&mut self.pul),
            Field::KilikOzi => Some(&mut self.kilik_ozi),
        }
    }

    pub fn value(&self, field: Field) -> i64 {
        self.amount(field).map_or(0, Amount::value)
    }

    pub fn set_amount(mut self, field: Field, value: i64) -> Self {
        if let Some(slot) = self.amount_mut(field) {
            *slot = Amount::from(value);
        }
        self
    }

    /// Raw editing text of a cell: the label, or the digit string.
    pub fn text(&self, field: Field) -> &str {
        match self.amount(field) {
            Some(amount) => amount.as_str(),
            None => &self.sabablar,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.sabablar.trim().is_empty()
            || Field::NUMERIC
                .iter()
                .any(|f| self.amount(*f).is_some_and(Amount::is_set))
    }
}

/// Net total of a row: inbound minus every outbound deduction.
pub fn calculate_itog(row: &ReportRow) -> i64 {
    let outbound = saturating_sum(Field::OUTBOUND.iter().map(|f| row.value(*f)));
    row.value(Field::Tovar).saturating_sub(outbound)
}

/// Rows carrying a label or at least one entered number.
pub fn filter_active_rows(rows: &[ReportRow]) -> Vec<ReportRow> {
    rows.iter().filter(|r| r.is_active()).cloned().collect()
}

/// Sum of a numeric column, unset counting as 0. The label column sums to 0.
pub fn aggregate_column(rows: &[ReportRow], field: Field) -> i64 {
    saturating_sum(rows.iter().map(|r| r.value(field)))
}

/// Sums pin at the `i64` bounds instead of overflowing.
fn saturating_sum(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}

/// Footer values of a report: row count, per-column sums and the grand itog.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct Totals {
    pub row_count: usize,
    pub tovar: i64,
    pub ok: i64,
    pub rasxod: i64,
    pub vazvirat: i64,
    pub pul: i64,
    pub kilik_ozi: i64,
    pub itog: i64,
}

impl Totals {
    pub fn compute(rows: &[ReportRow]) -> Self {
        Totals {
            row_count: rows.len(),
            tovar: aggregate_column(rows, Field::Tovar),
            ok: aggregate_column(rows, Field::Ok),
            rasxod: aggregate_column(rows, Field::Rasxod),
            vazvirat: aggregate_column(rows, Field::Vazvirat),
            pul: aggregate_column(rows, Field::Pul),
            kilik_ozi: aggregate_column(rows, Field::KilikOzi),
            itog: saturating_sum(rows.iter().map(calculate_itog)),
        }
    }

    pub fn column(&self, field: Field) -> i64 {
        match field {
            Field::Sabablar => 0,
            Field::Tovar => self.tovar,
            Field::Ok => self.ok,
            Field::Rasxod => self.rasxod,
            Field::Vazvirat => self.vazvirat,
            Field::Pul => self.pul,
            Field::KilikOzi => self.kilik_ozi,
        }
    }
}
