//! moondoc-model — API documentation records for Luau libraries.
//!
//! Provides the pieces shared by the `moondoc` renderer:
//! - [`model`]: typed records (`ClassDoc`, `FunctionDoc`, `PropertyDoc`, ...)
//! - [`extract`]: JSON payloads embedded in webpack doc chunks
//! - [`validate`]: schema checks that report the offending field path

pub mod error;
pub mod extract;
pub mod model;
pub mod validate;

pub use error::{ExtractError, ModelError};
pub use extract::{chunk_ids, extract_payloads, load_payloads, Payload};
pub use model::{
    return_list, Annotated, ClassDoc, Deprecation, ErrorDoc, FieldDoc, FunctionDoc, FunctionType,
    ParamDoc, PropertyDoc, Realm, ReturnDoc, SourceLocation, TypeDoc,
};
pub use validate::{looks_like_record, validate, Violation, ViolationKind};
