pub mod catalog;
pub mod field;

pub use catalog::{Catalog, CatalogError, catalog_schema};
pub use field::{
    Field, FieldOption, FieldType, RuleKind, RuleValue, ValidationRule, VisibleWhen,
};
