//! SQL data type definitions.

use core::fmt;

/// SQL data types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    // Integer types
    /// Tiny integer (1 byte).
    Tinyint,
    /// Small integer (2 bytes).
    Smallint,
    /// Integer (4 bytes).
    Integer,
    /// Big integer (8 bytes).
    Bigint,

    // Floating point
    /// Real (4-byte float).
    Real,
    /// Double precision (8-byte float).
    Double,
    /// Decimal with precision and scale.
    Decimal {
        /// Total number of digits.
        precision: Option<u16>,
        /// Number of digits after decimal point.
        scale: Option<u16>,
    },

    // String types
    /// Fixed-length character string.
    Char(Option<u32>),
    /// Variable-length character string.
    Varchar(Option<u32>),
    /// Variable-length national character string.
    Nvarchar(Option<u32>),
    /// Text (variable length, no limit).
    Text,
    /// Character large object.
    Clob,
    /// National character large object.
    Nclob,

    // Binary types
    /// Binary large object.
    Blob,
    /// Variable-length binary.
    Varbinary(Option<u32>),

    // Date/time types
    /// Date.
    Date,
    /// Time.
    Time,
    /// Timestamp.
    Timestamp,

    // Boolean
    /// Boolean.
    Boolean,

    // Custom type (for database-specific types).
    Custom(String),
}

impl DataType {
    /// Resolves a type from its SQL name, e.g. `"VARCHAR"` with a length of 20.
    ///
    /// Matching is case-insensitive. Returns `None` for names that are not
    /// part of the portable type set.
    #[must_use]
    pub fn from_name(
        name: &str,
        length: Option<u32>,
        precision: Option<u16>,
        scale: Option<u16>,
    ) -> Option<Self> {
        let dt = match name.trim().to_ascii_uppercase().as_str() {
            "TINYINT" => Self::Tinyint,
            "SMALLINT" => Self::Smallint,
            "INTEGER" | "INT" => Self::Integer,
            "BIGINT" => Self::Bigint,
            "REAL" | "FLOAT" => Self::Real,
            "DOUBLE" | "DOUBLE PRECISION" => Self::Double,
            "DECIMAL" | "NUMERIC" => Self::Decimal { precision, scale },
            "CHAR" | "CHARACTER" => Self::Char(length),
            "VARCHAR" | "CHARACTER VARYING" => Self::Varchar(length),
            "NVARCHAR" => Self::Nvarchar(length),
            "TEXT" => Self::Text,
            "CLOB" => Self::Clob,
            "NCLOB" => Self::Nclob,
            "BLOB" => Self::Blob,
            "VARBINARY" | "BINARY" => Self::Varbinary(length),
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "TIMESTAMP" | "DATETIME" => Self::Timestamp,
            "BOOLEAN" | "BOOL" | "BIT" => Self::Boolean,
            _ => return None,
        };
        Some(dt)
    }

    /// Returns whether values of this type are character data.
    #[must_use]
    pub const fn is_character(&self) -> bool {
        matches!(
            self,
            Self::Char(_) | Self::Varchar(_) | Self::Nvarchar(_) | Self::Text | Self::Clob | Self::Nclob
        )
    }

    /// Returns whether values of this type are integral.
    #[must_use]
    pub const fn is_integral(&self) -> bool {
        matches!(
            self,
            Self::Tinyint | Self::Smallint | Self::Integer | Self::Bigint
        )
    }

    /// Returns the SQL representation of the data type.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Tinyint => String::from("TINYINT"),
            Self::Smallint => String::from("SMALLINT"),
            Self::Integer => String::from("INTEGER"),
            Self::Bigint => String::from("BIGINT"),
            Self::Real => String::from("REAL"),
            Self::Double => String::from("DOUBLE"),
            Self::Decimal { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => format!("DECIMAL({p}, {s})"),
                (Some(p), None) => format!("DECIMAL({p})"),
                _ => String::from("DECIMAL"),
            },
            Self::Char(len) => sized("CHAR", *len),
            Self::Varchar(len) => sized("VARCHAR", *len),
            Self::Nvarchar(len) => sized("NVARCHAR", *len),
            Self::Text => String::from("TEXT"),
            Self::Clob => String::from("CLOB"),
            Self::Nclob => String::from("NCLOB"),
            Self::Blob => String::from("BLOB"),
            Self::Varbinary(len) => sized("VARBINARY", *len),
            Self::Date => String::from("DATE"),
            Self::Time => String::from("TIME"),
            Self::Timestamp => String::from("TIMESTAMP"),
            Self::Boolean => String::from("BOOLEAN"),
            Self::Custom(name) => name.clone(),
        }
    }
}

/// Renders `NAME(len)` or bare `NAME`.
pub(crate) fn sized(name: &str, len: Option<u32>) -> String {
    match len {
        Some(n) => format!("{name}({n})"),
        None => String::from(name),
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// A column definition for CREATE TABLE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Data type, carrying length/precision/scale.
    pub data_type: DataType,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
    /// Whether the column is nullable.
    pub nullable: bool,
    /// Whether this column is unique.
    pub unique: bool,
    /// Whether the database generates the value (identity/auto-increment).
    pub identity: bool,
    /// Extra column arguments appended verbatim, e.g. `DEFAULT 0`.
    pub args: Option<String>,
}

impl ColumnDef {
    /// Creates a new nullable column definition.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            primary_key: false,
            nullable: true,
            unique: false,
            identity: false,
            args: None,
        }
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column as part of the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false; // Primary keys are implicitly NOT NULL
        self
    }

    /// Sets the column as UNIQUE.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Lets the database generate the column value.
    #[must_use]
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    /// Appends free-form arguments to the column definition.
    #[must_use]
    pub fn args(mut self, args: impl Into<String>) -> Self {
        self.args = Some(args.into());
        self
    }
}
