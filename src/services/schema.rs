//! Positional column layout of the published sheets
//!
//! Sheets carry no trusted headers: a cell's index is its meaning. Each
//! sheet is described once here and checked at startup so a layout edit
//! surfaces as a config error instead of silently shifted prices.

use std::collections::HashSet;

use tracing::warn;

use crate::types::{FloorcalcError, Result, Row};

/// How a cell is read
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnKind {
    Text,
    /// Blank or absent cells read as `default`; with no default they are an error
    Number { default: Option<f64> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub index: usize,
    pub kind: ColumnKind,
}

impl Column {
    const fn text(name: &'static str, index: usize) -> Self {
        Self {
            name,
            index,
            kind: ColumnKind::Text,
        }
    }

    const fn number(name: &'static str, index: usize, default: f64) -> Self {
        Self {
            name,
            index,
            kind: ColumnKind::Number {
                default: Some(default),
            },
        }
    }

    const fn required_number(name: &'static str, index: usize) -> Self {
        Self {
            name,
            index,
            kind: ColumnKind::Number { default: None },
        }
    }

    /// Cell contents, `None` when blank or past the end of a short row
    pub fn text_in<'a>(&self, row: &'a Row) -> Option<&'a str> {
        row.get(self.index)
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
    }

    /// Cell as a number, falling back to the column default when blank.
    pub fn number_in(&self, row: &Row) -> Result<f64> {
        let default = match self.kind {
            ColumnKind::Number { default } => default,
            ColumnKind::Text => None,
        };

        let Some(raw) = self.text_in(row) else {
            return default.ok_or_else(|| self.coercion_error(""));
        };

        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(self.coercion_error(raw)),
        }
    }

    fn coercion_error(&self, raw: &str) -> FloorcalcError {
        FloorcalcError::Coercion {
            column: self.name,
            value: raw.to_string(),
        }
    }
}

pub mod pricing {
    use super::Column;
    use crate::types::{DEFAULT_RANGE_MAX, DEFAULT_RANGE_MIN};

    pub const CATEGORY: Column = Column::text("category", 0);
    pub const TIER: Column = Column::text("tier", 1);
    pub const MIN: Column = Column::number("min", 2, DEFAULT_RANGE_MIN);
    pub const MAX: Column = Column::number("max", 3, DEFAULT_RANGE_MAX);
    /// Doubles as the flat price column for `other` services
    pub const GRIT_200: Column = Column::number("grit_200", 4, 0.0);
    pub const GRIT_400: Column = Column::number("grit_400", 5, 0.0);
    pub const GRIT_800: Column = Column::number("grit_800", 6, 0.0);
    pub const GRIT_1800: Column = Column::number("grit_1800", 7, 0.0);
    pub const BASE: Column = Column::number("base", 8, 0.0);
    pub const SINGLE: Column = Column::number("single", 9, 0.0);
    pub const METALLIC: Column = Column::number("metallic", 10, 0.0);
    pub const QUARTZ: Column = Column::number("quartz", 11, 0.0);
    pub const FLAKE: Column = Column::number("flake", 12, 0.0);
    pub const SERVICE: Column = Column::text("service", 13);
}

pub mod settings {
    use super::Column;

    pub const KEY: Column = Column::text("key", 0);
    pub const VALUE: Column = Column::required_number("value", 1);
}

/// Ordered description of one sheet
#[derive(Debug)]
pub struct SheetSchema {
    pub name: &'static str,
    /// First-cell text that marks row 0 as a header
    pub header_marker: &'static str,
    pub columns: &'static [Column],
    pub expected_width: usize,
}

pub const PRICING: SheetSchema = SheetSchema {
    name: "pricing",
    header_marker: "category",
    columns: &[
        pricing::CATEGORY,
        pricing::TIER,
        pricing::MIN,
        pricing::MAX,
        pricing::GRIT_200,
        pricing::GRIT_400,
        pricing::GRIT_800,
        pricing::GRIT_1800,
        pricing::BASE,
        pricing::SINGLE,
        pricing::METALLIC,
        pricing::QUARTZ,
        pricing::FLAKE,
        pricing::SERVICE,
    ],
    expected_width: 14,
};

pub const SETTINGS: SheetSchema = SheetSchema {
    name: "settings",
    header_marker: "key",
    columns: &[settings::KEY, settings::VALUE],
    expected_width: 2,
};

impl SheetSchema {
    /// Check the descriptor itself: width, positional indices, unique names.
    pub fn validate(&self) -> Result<()> {
        if self.columns.len() != self.expected_width {
            return Err(FloorcalcError::Config(format!(
                "{} sheet schema has {} columns, expected {}",
                self.name,
                self.columns.len(),
                self.expected_width
            )));
        }

        let mut seen = HashSet::new();
        for (position, column) in self.columns.iter().enumerate() {
            if column.index != position {
                return Err(FloorcalcError::Config(format!(
                    "{} sheet column '{}' declares index {} at position {}",
                    self.name, column.name, column.index, position
                )));
            }
            if !seen.insert(column.name) {
                return Err(FloorcalcError::Config(format!(
                    "{} sheet column '{}' is declared twice",
                    self.name, column.name
                )));
            }
        }

        Ok(())
    }

    /// Row 0 is a header when its first cell equals the marker, ignoring case
    pub fn is_header(&self, row: &Row) -> bool {
        row.first()
            .map(|cell| cell.trim().eq_ignore_ascii_case(self.header_marker))
            .unwrap_or(false)
    }

    /// A header narrower than the schema suggests columns were removed or
    /// merged. Extra trailing columns are ignored positionally and tolerated.
    pub fn check_header(&self, header: &Row) -> Result<()> {
        if header.len() < self.expected_width {
            return Err(FloorcalcError::Config(format!(
                "{} sheet header has {} columns, expected {}",
                self.name,
                header.len(),
                self.expected_width
            )));
        }
        Ok(())
    }

    /// Split off a leading header row.
    /// Returns the body rows and how many rows were consumed.
    ///
    /// A recognized header is always dropped; one narrower than the schema is
    /// only logged, since data rows are read by position regardless.
    pub fn strip_header<'a>(&self, rows: &'a [Row]) -> (&'a [Row], usize) {
        match rows.first() {
            Some(first) if self.is_header(first) => {
                if let Err(e) = self.check_header(first) {
                    warn!(sheet = self.name, error = %e, "sheet header narrower than schema");
                }
                (&rows[1..], 1)
            }
            _ => (rows, 0),
        }
    }
}

/// Validate every sheet descriptor; run once at startup
pub fn validate_all() -> Result<()> {
    PRICING.validate()?;
    SETTINGS.validate()?;
    Ok(())
}
