use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("Failed to read category file '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse category file '{path}': {source}", path = path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: ::csv::Error,
    },
    #[error("Required category '{0}' is missing")]
    MissingCategory(String),
    #[error("Required field '{category}.{field}' is missing")]
    MissingField { category: String, field: String },
    #[error("Invalid value '{value}' in '{category}.{field}' at row {row}")]
    InvalidValue {
        category: String,
        field: String,
        row: usize,
        value: String,
    },
    #[error("Category '{category}' has rows of unequal length")]
    RaggedRows { category: String },
}

/// Anything that can hand out categories by name.
pub trait CategorySource {
    fn category(&self, name: &str) -> Option<&Table>;

    fn require(&self, name: &str) -> Result<&Table, CategoryError> {
        self.category(name)
            .ok_or_else(|| CategoryError::MissingCategory(name.to_string()))
    }
}

/// Column-major table of string values, the shape every tokenizer can produce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    name: String,
    row_count: usize,
    fields: HashMap<String, Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            row_count: 0,
            fields: HashMap::new(),
        }
    }

    /// Builds a table from a header and rows of equal length.
    pub fn from_rows<S: AsRef<str>>(
        name: impl Into<String>,
        header: &[&str],
        rows: &[Vec<S>],
    ) -> Result<Self, CategoryError> {
        let name = name.into();
        let mut columns: Vec<Vec<String>> = vec![Vec::with_capacity(rows.len()); header.len()];
        for row in rows {
            if row.len() != header.len() {
                return Err(CategoryError::RaggedRows { category: name });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value.as_ref().to_string());
            }
        }
        let fields = header
            .iter()
            .map(|h| h.to_string())
            .zip(columns)
            .collect();
        Ok(Self {
            name,
            row_count: rows.len(),
            fields,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// A column accessor; absent fields read as undefined in every row.
    pub fn column<'a>(&'a self, field: &'a str) -> Column<'a> {
        Column {
            category: &self.name,
            field,
            values: self.fields.get(field).map(Vec::as_slice),
        }
    }

    pub fn require_column<'a>(&'a self, field: &'a str) -> Result<Column<'a>, CategoryError> {
        if !self.has_field(field) {
            return Err(CategoryError::MissingField {
                category: self.name.clone(),
                field: field.to_string(),
            });
        }
        Ok(self.column(field))
    }
}

/// Typed view of one field, modeled on `table.column.value(row)`.
#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    category: &'a str,
    field: &'a str,
    values: Option<&'a [String]>,
}

impl<'a> Column<'a> {
    pub fn is_present(&self) -> bool {
        self.values.is_some()
    }

    /// `false` for absent fields and the placeholders `.` and `?`.
    pub fn is_defined(&self, row: usize) -> bool {
        match self.raw(row) {
            Some(v) => !v.is_empty() && v != "." && v != "?",
            None => false,
        }
    }

    fn raw(&self, row: usize) -> Option<&'a str> {
        self.values.and_then(|v| v.get(row)).map(|s| s.trim())
    }

    /// String value, empty when undefined.
    pub fn str(&self, row: usize) -> &'a str {
        if self.is_defined(row) {
            self.raw(row).unwrap_or("")
        } else {
            ""
        }
    }

    pub fn int(&self, row: usize) -> Result<Option<i64>, CategoryError> {
        if !self.is_defined(row) {
            return Ok(None);
        }
        let raw = self.raw(row).unwrap_or("");
        raw.parse::<i64>().map(Some).map_err(|_| self.invalid(row, raw))
    }

    pub fn float(&self, row: usize) -> Result<Option<f64>, CategoryError> {
        if !self.is_defined(row) {
            return Ok(None);
        }
        let raw = self.raw(row).unwrap_or("");
        // Standard uncertainties in parentheses, e.g. `12.345(6)`, are dropped.
        let number = raw.split('(').next().unwrap_or(raw);
        number.parse::<f64>().map(Some).map_err(|_| self.invalid(row, raw))
    }

    pub fn float_or(&self, row: usize, default: f64) -> Result<f64, CategoryError> {
        Ok(self.float(row)?.unwrap_or(default))
    }

    pub fn required_float(&self, row: usize) -> Result<f64, CategoryError> {
        self.float(row)?.ok_or_else(|| self.invalid(row, ""))
    }

    fn invalid(&self, row: usize, value: &str) -> CategoryError {
        CategoryError::InvalidValue {
            category: self.category.to_string(),
            field: self.field.to_string(),
            row,
            value: value.to_string(),
        }
    }
}

/// In-memory category collection.
#[derive(Debug, Clone, Default)]
pub struct CategoryData {
    categories: HashMap<String, Table>,
}

impl CategoryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: Table) {
        self.categories.insert(table.name().to_string(), table);
    }

    pub fn with(mut self, table: Table) -> Self {
        self.insert(table);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }
}

impl CategorySource for CategoryData {
    fn category(&self, name: &str) -> Option<&Table> {
        self.categories.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_table() -> Table {
        Table::from_rows(
            "cell",
            &["length_a", "angle_alpha", "note"],
            &[vec!["12.5(3)", "90", "?"], vec!["7", ".", "x"]],
        )
        .unwrap()
    }

    #[test]
    fn typed_accessors_parse_values_and_placeholders() {
        let table = cell_table();
        let a = table.column("length_a");
        assert_eq!(a.float(0).unwrap(), Some(12.5));
        assert_eq!(a.int(1).unwrap(), Some(7));
        let alpha = table.column("angle_alpha");
        assert_eq!(alpha.float(1).unwrap(), None);
        assert_eq!(alpha.float_or(1, 90.0).unwrap(), 90.0);
        assert_eq!(table.column("note").str(0), "");
        assert_eq!(table.column("note").str(1), "x");
    }

    #[test]
    fn missing_fields_read_as_undefined() {
        let table = cell_table();
        let missing = table.column("length_b");
        assert!(!missing.is_present());
        assert!(!missing.is_defined(0));
        assert!(matches!(
            table.require_column("length_b"),
            Err(CategoryError::MissingField { .. })
        ));
    }

    #[test]
    fn invalid_numbers_report_their_location() {
        let table = Table::from_rows("atom_site", &["Cartn_x"], &[vec!["abc"]]).unwrap();
        let err = table.column("Cartn_x").float(0).unwrap_err();
        assert!(matches!(
            err,
            CategoryError::InvalidValue { row: 0, ref field, .. } if field == "Cartn_x"
        ));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let result = Table::from_rows("x", &["a", "b"], &[vec!["1"]]);
        assert!(matches!(result, Err(CategoryError::RaggedRows { .. })));
    }

    #[test]
    fn category_data_requires_known_categories() {
        let data = CategoryData::new().with(cell_table());
        assert!(data.require("cell").is_ok());
        assert!(matches!(
            data.require("symmetry"),
            Err(CategoryError::MissingCategory(name)) if name == "symmetry"
        ));
    }
}
