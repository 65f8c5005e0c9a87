//! # Sheet Configuration & Layout Engine
//!
//! [`SheetConfig`] holds the sheet-wide geometry loaded from the `[sheet]`
//! section of an INI-style configuration file. [`SheetConfig::place`] is the
//! pure grid/pagination function: it maps a label index to its page and
//! (x, y) translation.
//!
//! ```
//! use etiqueta::sheet::{FillDir, SheetConfig};
//!
//! let config = SheetConfig::parse(
//!     "[sheet]\nsizex = 8.5in\nsizey = 11in\noffx = 10\noffy = 10\n\
//!      incx = 100\nincy = 50\nnrows = 2\nncols = 2\n",
//! )
//! .unwrap();
//! let (page, offset) = config.place(5);
//! assert_eq!(page, 1); // capacity 4, sixth label starts page 1
//! assert_eq!((offset.x, offset.y), (10.0, 60.0));
//! ```

use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::EtiquetaError;
use crate::geom::{Point, parse_length};

/// Order in which grid slots are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillDir {
    /// Fill across a row before moving down.
    Row,
    /// Fill down a column before moving right.
    #[default]
    Col,
}

impl FromStr for FillDir {
    type Err = EtiquetaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "row" => Ok(FillDir::Row),
            "col" => Ok(FillDir::Col),
            other => Err(EtiquetaError::Config(format!(
                "dir must be 'row' or 'col', got '{other}'"
            ))),
        }
    }
}

/// Sheet-wide geometry, immutable after load.
///
/// Increments of zero are legal: labels then overlap, which is a valid
/// (if unusual) sheet design, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetConfig {
    /// Page size in user units.
    pub size: Point,
    /// Offset of the first label's origin.
    pub offset: Point,
    /// Step between adjacent labels.
    pub increment: Point,
    /// Grid rows per page, >= 1.
    pub nrows: usize,
    /// Grid columns per page, >= 1.
    pub ncols: usize,
    /// Fill direction.
    pub dir: FillDir,
}

impl SheetConfig {
    /// Parse the `[sheet]` section of an INI-style configuration.
    ///
    /// Lines are `key = value`; `;` and `#` open comment lines; keys outside
    /// the `[sheet]` section are ignored. Missing or malformed required keys
    /// are fatal, raised here before any row is processed.
    pub fn parse(text: &str) -> Result<Self, EtiquetaError> {
        let mut section = String::new();
        let mut values: IndexMap<&str, &str> = IndexMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = name.trim().to_string();
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| {
                EtiquetaError::Config(format!("expected 'key = value', got '{line}'"))
            })?;
            if section == "sheet" {
                values.insert(key.trim(), value.trim());
            }
        }

        let length = |key: &str, desc: &str| -> Result<f64, EtiquetaError> {
            parse_length(get(&values, key, desc)?)
        };
        let count = |key: &str, desc: &str| -> Result<usize, EtiquetaError> {
            let raw = get(&values, key, desc)?;
            let n: usize = raw.parse().map_err(|_| {
                EtiquetaError::Config(format!("sheet.{key} must be a positive integer, got '{raw}'"))
            })?;
            if n == 0 {
                return Err(EtiquetaError::Config(format!("sheet.{key} must be >= 1")));
            }
            Ok(n)
        };

        Ok(Self {
            size: Point::new(
                length("sizex", "sheet width")?,
                length("sizey", "sheet height")?,
            ),
            offset: Point::new(
                length("offx", "initial horizontal offset")?,
                length("offy", "initial vertical offset")?,
            ),
            increment: Point::new(
                length("incx", "horizontal spacing")?,
                length("incy", "vertical spacing")?,
            ),
            nrows: count("nrows", "number of rows (vertical elements)")?,
            ncols: count("ncols", "number of columns (horizontal elements)")?,
            dir: match values.get("dir") {
                Some(raw) => raw.parse()?,
                None => FillDir::default(),
            },
        })
    }

    /// Labels per page.
    pub fn capacity(&self) -> usize {
        self.nrows * self.ncols
    }

    /// Place the label with flattened index `index`: which page it lands on
    /// and its translation offset on that page.
    ///
    /// Pure function of `(index, self)`. `dir = col` fills down a column
    /// before advancing to the next; `dir = row` fills across a row first.
    pub fn place(&self, index: usize) -> (usize, Point) {
        let page = index / self.capacity();
        let local = index % self.capacity();
        let (row, col) = match self.dir {
            FillDir::Col => (local % self.nrows, local / self.nrows),
            FillDir::Row => (local / self.ncols, local % self.ncols),
        };
        let offset = Point::new(
            self.offset.x + col as f64 * self.increment.x,
            self.offset.y + row as f64 * self.increment.y,
        );
        (page, offset)
    }

    /// Flatten a starting grid position into the local slot index the first
    /// label occupies. The slot shifts the index before the page/grid split,
    /// so a resumed run continues exactly where the previous one stopped.
    pub fn start_slot(&self, start_row: usize, start_col: usize) -> Result<usize, EtiquetaError> {
        if start_row >= self.nrows {
            return Err(EtiquetaError::Config(format!(
                "start_row {start_row} exceeds nrows {}",
                self.nrows
            )));
        }
        if start_col >= self.ncols {
            return Err(EtiquetaError::Config(format!(
                "start_col {start_col} exceeds ncols {}",
                self.ncols
            )));
        }
        Ok(match self.dir {
            FillDir::Col => start_col * self.nrows + start_row,
            FillDir::Row => start_row * self.ncols + start_col,
        })
    }
}

fn get<'a>(
    values: &IndexMap<&str, &'a str>,
    key: &str,
    desc: &str,
) -> Result<&'a str, EtiquetaError> {
    values.get(key).copied().ok_or_else(|| {
        EtiquetaError::Config(format!("configuration not specified for sheet.{key} ({desc})"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config(nrows: usize, ncols: usize, dir: FillDir) -> SheetConfig {
        SheetConfig {
            size: Point::new(765.0, 990.0),
            offset: Point::new(10.0, 20.0),
            increment: Point::new(100.0, 50.0),
            nrows,
            ncols,
            dir,
        }
    }

    #[test]
    fn test_parse_sheet_section() {
        let config = SheetConfig::parse(
            "; label sheet\n[sheet]\nsizex = 8.5in\nsizey = 11in\n\
             offx = 10\noffy = 20\nincx = 2cm\nincy = 50\n\
             nrows = 5\nncols = 3\ndir = row\n",
        )
        .unwrap();
        assert_eq!(config.size.x, 8.5 * 90.0);
        assert_eq!(config.increment.x, 2.0 * 35.43307);
        assert_eq!(config.nrows, 5);
        assert_eq!(config.dir, FillDir::Row);
    }

    #[test]
    fn test_parse_ignores_other_sections() {
        let err = SheetConfig::parse("[other]\nsizex = 1\n[sheet]\nsizey = 2\n").unwrap_err();
        assert!(err.to_string().contains("sheet.sizex"));
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let err = SheetConfig::parse("[sheet]\nsizex = 1\n").unwrap_err();
        assert!(err.to_string().contains("sizey"));
    }

    #[test]
    fn test_zero_grid_dimension_rejected() {
        let err = SheetConfig::parse(
            "[sheet]\nsizex = 1\nsizey = 1\noffx = 0\noffy = 0\n\
             incx = 0\nincy = 0\nnrows = 0\nncols = 2\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("nrows"));
    }

    #[test]
    fn test_dir_defaults_to_col() {
        let config = SheetConfig::parse(
            "[sheet]\nsizex = 1\nsizey = 1\noffx = 0\noffy = 0\n\
             incx = 0\nincy = 0\nnrows = 2\nncols = 2\n",
        )
        .unwrap();
        assert_eq!(config.dir, FillDir::Col);
    }

    #[test]
    fn test_place_col_fills_rows_first() {
        let config = config(3, 2, FillDir::Col);
        // Down the first column...
        assert_eq!(config.place(0), (0, Point::new(10.0, 20.0)));
        assert_eq!(config.place(1), (0, Point::new(10.0, 70.0)));
        assert_eq!(config.place(2), (0, Point::new(10.0, 120.0)));
        // ...then the second column.
        assert_eq!(config.place(3), (0, Point::new(110.0, 20.0)));
        // Capacity 6: index 6 starts page 1 at the first slot.
        assert_eq!(config.place(6), (1, Point::new(10.0, 20.0)));
    }

    #[test]
    fn test_place_row_fills_cols_first() {
        let config = config(3, 2, FillDir::Row);
        assert_eq!(config.place(0), (0, Point::new(10.0, 20.0)));
        assert_eq!(config.place(1), (0, Point::new(110.0, 20.0)));
        assert_eq!(config.place(2), (0, Point::new(10.0, 70.0)));
    }

    #[test]
    fn test_zero_increment_overlaps() {
        let mut config = config(2, 2, FillDir::Col);
        config.increment = Point::new(0.0, 0.0);
        assert_eq!(config.place(0).1, config.place(3).1);
    }

    #[test]
    fn test_start_slot_flattens_before_split() {
        let config = config(3, 2, FillDir::Col);
        assert_eq!(config.start_slot(0, 0).unwrap(), 0);
        assert_eq!(config.start_slot(2, 0).unwrap(), 2);
        assert_eq!(config.start_slot(0, 1).unwrap(), 3);

        let config = self::config(3, 2, FillDir::Row);
        assert_eq!(config.start_slot(1, 1).unwrap(), 3);
    }

    #[test]
    fn test_start_slot_bounds() {
        let config = config(3, 2, FillDir::Col);
        assert!(config.start_slot(3, 0).is_err());
        assert!(config.start_slot(0, 2).is_err());
    }
}
