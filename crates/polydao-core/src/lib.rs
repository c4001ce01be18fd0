//! # Polydao Core
//!
//! Backend-agnostic building blocks of the Polydao data-access layer:
//!
//! - [`Entity`] declarations and their cached [`EntityDescriptor`]s
//! - the [`Value`] model with scalar and structured-text codecs
//! - the [`Dao`] contract every storage engine implements
//! - the [`DaoError`] taxonomy every engine reports through

pub mod codec;
pub mod entity;
pub mod error;
pub mod logging;
pub mod result;
pub mod traits;

pub use codec::{CodecError, FieldType, FromValue, Json, ToValue, Value};
pub use entity::{describe, Entity, EntityDescriptor, FieldDescriptor, Record, Schema};
pub use error::*;
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use result::*;
pub use traits::*;
