//! Statement AST.

mod statement;
mod types;

pub use statement::{
    Assignment, Check, CreateTableStatement, CreateViewStatement, DeleteStatement, DropStatement,
    ForeignKey, InsertStatement, Join, JoinKind, KeyConstraint, ObjectKind, OrderBy,
    SelectStatement, SequenceStatement, TableRef, UpdateStatement,
};
pub use types::{ColumnDef, DataType};
pub(crate) use types::sized;
