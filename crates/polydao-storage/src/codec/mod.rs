//! Backend representations of [`Value`](polydao_core::Value)s.
//!
//! Each codec maps between the neutral value model and one driver's native
//! types, guided by the declared [`FieldType`](polydao_core::FieldType).
//! Failures surface as [`DaoError::Codec`](polydao_core::DaoError::Codec)
//! naming the field.

pub mod bson;
pub mod sql;
