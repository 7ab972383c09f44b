//! Table and column metadata consumed by the DDL emitter.

use serde::{Deserialize, Serialize};

/// Runtime type names that carry a length (`string(50)`).
pub const LENGTH_DATATYPES: &[&str] = &["string", "biginteger"];

/// Runtime type names that carry precision and scale (`bigdecimal(10, 2)`).
pub const PRECISION_DATATYPES: &[&str] = &["bigdecimal"];

/// Prefix of UUIDs assigned by the metadata loader rather than the user.
/// Such UUIDs are not re-emitted as options.
pub const SYNTHETIC_UUID_PREFIX: &str = "tid:";

/// Nullability of a column or datatype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullType {
    #[default]
    Nullable,
    NoNulls,
    Unknown,
}

/// Whether a datatype is a built-in runtime type or a named domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatatypeKind {
    #[default]
    Basic,
    Domain,
}

/// Resolved datatype of a column.
///
/// A domain datatype fixes its own length, precision and nullability; columns
/// using it render the domain name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datatype {
    /// Declared name (the domain name for domains).
    pub name: String,

    /// Runtime type the datatype maps to (e.g. "string", "bigdecimal").
    pub runtime_type_name: String,

    #[serde(default)]
    pub kind: DatatypeKind,

    /// Default length for the type.
    #[serde(default)]
    pub length: u32,

    /// Default precision for the type.
    #[serde(default)]
    pub precision: u32,

    /// Default scale for the type.
    #[serde(default)]
    pub scale: u32,

    #[serde(default)]
    pub null_type: NullType,
}

impl Datatype {
    /// A basic runtime datatype with the given default length.
    pub fn basic(runtime_type_name: impl Into<String>, length: u32) -> Self {
        let name = runtime_type_name.into();
        Self {
            name: name.clone(),
            runtime_type_name: name,
            kind: DatatypeKind::Basic,
            length,
            precision: 0,
            scale: 0,
            null_type: NullType::Nullable,
        }
    }

    /// A named domain over a runtime type.
    pub fn domain(
        name: impl Into<String>,
        runtime_type_name: impl Into<String>,
        null_type: NullType,
    ) -> Self {
        Self {
            name: name.into(),
            runtime_type_name: runtime_type_name.into(),
            kind: DatatypeKind::Domain,
            length: 0,
            precision: 0,
            scale: 0,
            null_type,
        }
    }

    pub fn is_domain(&self) -> bool {
        self.kind == DatatypeKind::Domain
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Runtime type name, used when no datatype is resolved.
    pub runtime_type: String,

    /// Resolved datatype; its runtime type name overrides `runtime_type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<Datatype>,

    /// Declared length (0 = unspecified).
    #[serde(default)]
    pub length: u32,

    /// Numeric precision (0 = unspecified).
    #[serde(default)]
    pub precision: u32,

    /// Numeric scale.
    #[serde(default)]
    pub scale: u32,

    #[serde(default)]
    pub null_type: NullType,

    /// Array dimensionality (0 for scalars).
    #[serde(default)]
    pub array_dimensions: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_in_source: Option<String>,

    /// UUID tag; `Some` means it was explicitly set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl Column {
    /// A nullable scalar column with no datatype, length or options.
    pub fn new(name: impl Into<String>, runtime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runtime_type: runtime_type.into(),
            datatype: None,
            length: 0,
            precision: 0,
            scale: 0,
            null_type: NullType::Nullable,
            array_dimensions: 0,
            annotation: None,
            name_in_source: None,
            uuid: None,
        }
    }

    /// Runtime type name after datatype resolution.
    pub fn resolved_runtime_type(&self) -> &str {
        match &self.datatype {
            Some(dt) => &dt.runtime_type_name,
            None => &self.runtime_type,
        }
    }

    /// Whether the column uses a domain datatype.
    pub fn is_domain(&self) -> bool {
        self.datatype.as_ref().is_some_and(Datatype::is_domain)
    }

    /// Whether precision and scale are unspecified or equal to the
    /// datatype's own defaults.
    pub fn is_default_precision_scale(&self) -> bool {
        let (default_precision, default_scale) = self
            .datatype
            .as_ref()
            .map(|dt| (dt.precision, dt.scale))
            .unwrap_or((0, 0));
        (self.precision == 0 || self.precision == default_precision)
            && (self.scale == 0 || self.scale == default_scale)
    }

    /// Whether the declared length differs from the type default and
    /// should be rendered.
    pub fn has_explicit_length(&self) -> bool {
        self.length != 0
            && self
                .datatype
                .as_ref()
                .map_or(true, |dt| self.length != dt.length)
    }
}

/// Table-level constraint. The default emitter does not render these; a
/// [`DdlExtensions`](crate::core::DdlExtensions) implementation may.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,

    #[serde(default)]
    pub kind: ConstraintKind,

    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    #[default]
    PrimaryKey,
    Unique,
    Index,
}

/// Table metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Column definitions in declaration order.
    #[serde(default)]
    pub columns: Vec<Column>,

    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            constraints: Vec::new(),
        }
    }

    /// Find a column by name (case-insensitive).
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_runtime_type_prefers_datatype() {
        let mut col = Column::new("Amount", "string");
        assert_eq!(col.resolved_runtime_type(), "string");

        col.datatype = Some(Datatype::basic("bigdecimal", 0));
        assert_eq!(col.resolved_runtime_type(), "bigdecimal");
    }

    #[test]
    fn test_explicit_length() {
        let mut col = Column::new("Name", "string");
        assert!(!col.has_explicit_length());

        col.length = 50;
        assert!(col.has_explicit_length());

        col.datatype = Some(Datatype::basic("string", 4000));
        assert!(col.has_explicit_length());

        col.length = 4000;
        assert!(!col.has_explicit_length());
    }

    #[test]
    fn test_default_precision_scale() {
        let mut col = Column::new("Price", "bigdecimal");
        assert!(col.is_default_precision_scale());

        col.precision = 10;
        assert!(!col.is_default_precision_scale());

        let mut dt = Datatype::basic("bigdecimal", 0);
        dt.precision = 10;
        col.datatype = Some(dt);
        assert!(col.is_default_precision_scale());

        col.scale = 2;
        assert!(!col.is_default_precision_scale());
    }

    #[test]
    fn test_is_domain() {
        let mut col = Column::new("Email", "string");
        assert!(!col.is_domain());
        col.datatype = Some(Datatype::domain("email_t", "string", NullType::NoNulls));
        assert!(col.is_domain());
    }

    #[test]
    fn test_table_from_yaml() {
        let yaml = r#"
name: Account
columns:
  - name: Id
    runtime_type: string
    length: 18
    null_type: no_nulls
    name_in_source: Id
  - name: Tags
    runtime_type: string
    datatype: { name: string, runtime_type_name: string }
    array_dimensions: 1
"#;
        let table: Table = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[0].null_type, NullType::NoNulls);
        assert_eq!(table.column("tags").unwrap().array_dimensions, 1);
        assert!(table.constraints.is_empty());
    }
}
