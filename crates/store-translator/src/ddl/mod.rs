//! Foreign-table DDL emission.
//!
//! Renders a sequence of [`Table`]s as `CREATE FOREIGN TABLE` statements:
//!
//! ```text
//! CREATE FOREIGN TABLE Account (
//!     Id string(18) NOT NULL OPTIONS (NAMEINSOURCE 'Id'),
//!     Revenue bigdecimal(18,2),
//!     Tags string[]
//! );
//! ```
//!
//! Columns are indented with a tab. Statements are separated by one blank
//! line. Option-key namespaces are prefixed through a
//! [`NamespacePrefixTable`] that lives for a single [`DdlEmitter::emit`] call.

mod namespace;

pub use namespace::{builtin_prefix, NamespacePrefixTable, BUILTIN_NAMESPACES};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::identifier::{escape_single_part, escape_validated};
use crate::core::language::Literal;
use crate::core::schema::{
    Column, NullType, Table, LENGTH_DATATYPES, PRECISION_DATATYPES, SYNTHETIC_UUID_PREFIX,
};
use crate::core::traits::{DdlExtensions, DdlOption, NoExtensions};
use crate::error::Result;

/// Emitter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DdlOptions {
    /// Synthesize `n<k>` prefixes for option-key URIs with no built-in prefix.
    pub emit_namespace_prefixes: bool,

    /// Enter every option-key URI in the prefix table, built-in or not.
    pub always_declare_namespaces: bool,
}

impl Default for DdlOptions {
    fn default() -> Self {
        Self {
            emit_namespace_prefixes: true,
            always_declare_namespaces: false,
        }
    }
}

/// Renders table models as DDL text.
#[derive(Debug, Clone, Default)]
pub struct DdlEmitter<E: DdlExtensions = NoExtensions> {
    options: DdlOptions,
    extensions: E,
}

impl DdlEmitter {
    pub fn new(options: DdlOptions) -> Self {
        Self {
            options,
            extensions: NoExtensions,
        }
    }
}

impl<E: DdlExtensions> DdlEmitter<E> {
    /// Replace the extension hooks.
    pub fn with_extensions<X: DdlExtensions>(self, extensions: X) -> DdlEmitter<X> {
        DdlEmitter {
            options: self.options,
            extensions,
        }
    }

    pub fn options(&self) -> DdlOptions {
        self.options
    }

    /// Render `tables` as one DDL text blob.
    ///
    /// # Errors
    ///
    /// Returns `TranslateError::Schema` if a table or column name is empty,
    /// contains a null byte or is over-long.
    pub fn emit(&self, tables: &[Table]) -> Result<String> {
        Ok(self.emit_with_namespaces(tables)?.0)
    }

    /// Like [`emit`](Self::emit), also returning the prefixes assigned.
    pub fn emit_with_namespaces(&self, tables: &[Table]) -> Result<(String, NamespacePrefixTable)> {
        let mut emission = Emission {
            emitter: self,
            buffer: String::new(),
            namespaces: NamespacePrefixTable::new(),
        };
        for (i, table) in tables.iter().enumerate() {
            if i > 0 {
                emission.buffer.push_str("\n\n");
            }
            emission.table(table)?;
        }
        debug!(
            "Emitted DDL for {} tables ({} namespace prefixes)",
            tables.len(),
            emission.namespaces.len()
        );
        Ok((emission.buffer, emission.namespaces))
    }
}

/// Render `tables` with the default hooks.
pub fn ddl_string(tables: &[Table], options: DdlOptions) -> Result<String> {
    DdlEmitter::new(options).emit(tables)
}

/// State for a single emit call.
struct Emission<'a, E: DdlExtensions> {
    emitter: &'a DdlEmitter<E>,
    buffer: String,
    namespaces: NamespacePrefixTable,
}

impl<E: DdlExtensions> Emission<'_, E> {
    fn table(&mut self, table: &Table) -> Result<()> {
        let name = escape_validated(&table.name)?;
        self.buffer.push_str("CREATE FOREIGN TABLE ");
        self.buffer.push_str(&name);

        if !table.columns.is_empty() {
            self.buffer.push_str(" (");
            for (i, column) in table.columns.iter().enumerate() {
                if i > 0 {
                    self.buffer.push(',');
                }
                self.column(table, column)?;
            }
            for constraint in self.emitter.extensions.constraints(table) {
                self.buffer.push_str(",\n\t");
                self.buffer.push_str(&constraint);
            }
            self.buffer.push_str("\n)");
        }

        let options = self.emitter.extensions.table_options(table);
        self.options_clause(&options);
        self.buffer.push(';');
        Ok(())
    }

    fn column(&mut self, table: &Table, column: &Column) -> Result<()> {
        let name = escape_validated(&column.name)?;
        self.buffer.push_str("\n\t");
        self.buffer.push_str(&name);
        self.buffer.push(' ');

        let domain = column.datatype.as_ref().filter(|dt| dt.is_domain());
        match domain {
            Some(dt) => self.buffer.push_str(&dt.name),
            None => {
                let runtime = column.resolved_runtime_type();
                self.buffer.push_str(runtime);
                if LENGTH_DATATYPES.contains(&runtime) {
                    if column.has_explicit_length() {
                        self.buffer.push_str(&format!("({})", column.length));
                    }
                } else if PRECISION_DATATYPES.contains(&runtime)
                    && !column.is_default_precision_scale()
                {
                    self.buffer.push_str(&format!("({}", column.precision));
                    if column.scale != 0 {
                        self.buffer.push_str(&format!(",{}", column.scale));
                    }
                    self.buffer.push(')');
                }
            }
        }

        if column.datatype.is_some() {
            for _ in 0..column.array_dimensions {
                self.buffer.push_str("[]");
            }
        }

        let domain_not_null = domain.is_some_and(|dt| dt.null_type == NullType::NoNulls);
        if column.null_type == NullType::NoNulls && !domain_not_null {
            self.buffer.push_str(" NOT NULL");
        }

        let mut options = common_options(column);
        options.extend(self.emitter.extensions.column_options(table, column));
        self.options_clause(&options);
        Ok(())
    }

    fn options_clause(&mut self, options: &[DdlOption]) {
        if options.is_empty() {
            return;
        }
        let rendered: Vec<String> = options.iter().map(|o| self.option(o)).collect();
        self.buffer.push_str(" OPTIONS (");
        self.buffer.push_str(&rendered.join(", "));
        self.buffer.push(')');
    }

    fn option(&mut self, option: &DdlOption) -> String {
        let opts = self.emitter.options;
        let key = self.namespaces.rewrite_key(
            &option.key,
            opts.emit_namespace_prefixes,
            opts.always_declare_namespaces,
        );
        let value = option
            .value
            .as_ref()
            .map_or_else(|| Literal::Null.to_sql_literal(), Literal::to_sql_literal);
        format!("{} {}", escape_single_part(&key), value)
    }
}

/// UUID, annotation and name-in-source options, in that order.
fn common_options(column: &Column) -> Vec<DdlOption> {
    let mut options = Vec::new();
    if let Some(uuid) = column
        .uuid
        .as_ref()
        .filter(|u| !u.starts_with(SYNTHETIC_UUID_PREFIX))
    {
        options.push(DdlOption::new("UUID", Some(Literal::from(uuid.as_str()))));
    }
    if let Some(annotation) = &column.annotation {
        options.push(DdlOption::new("ANNOTATION", Some(Literal::from(annotation.as_str()))));
    }
    if let Some(name_in_source) = &column.name_in_source {
        options.push(DdlOption::new(
            "NAMEINSOURCE",
            Some(Literal::from(name_in_source.as_str())),
        ));
    }
    options
}
