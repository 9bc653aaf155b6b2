//! Test utilities for the engagement ledger crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for tests and when the `test-support` feature is enabled.

mod clock;
mod in_memory_store;

pub use clock::MutableClock;
pub use in_memory_store::InMemoryEngagementStore;

pub mod openapi {
    //! OpenAPI schema traversal helpers.
    //!
    //! Resolves `RefOr<Schema>` wrappers to concrete `Object` schemas with
    //! diagnostic panics on type mismatches.

    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::{Object, Schema};

    /// Extract an `Object` schema, panicking with a diagnostic if it is not
    /// one.
    pub fn unwrap_object_schema<'a>(schema: &'a RefOr<Schema>, name: &str) -> &'a Object {
        match schema {
            RefOr::T(Schema::Object(obj)) => obj,
            RefOr::Ref(reference) => panic!(
                "schema '{name}' is a $ref to '{}'; resolve the reference first",
                reference.ref_location
            ),
            RefOr::T(Schema::Array(_)) => panic!("schema '{name}' is an Array, not an Object"),
            _ => panic!("schema '{name}' is not a plain Object"),
        }
    }

    /// Whether `obj` lists `field` as required.
    pub fn is_required(obj: &Object, field: &str) -> bool {
        obj.required.iter().any(|name| name == field)
    }
}
