//! Firestore emulator client over the REST documents API.

mod api;
pub mod error;
mod model;
mod rpc_error;
pub mod serializer;
mod value;

pub use api::{CollectionReference, DocumentReference, DocumentSnapshot, Firestore};
pub use error::{FirestoreError, FirestoreErrorCode, FirestoreResult};
pub use model::{GeoPoint, Timestamp};
pub use value::{
    document_data_from_json, document_data_to_json, DocumentData, FirestoreValue, ValueKind,
};
