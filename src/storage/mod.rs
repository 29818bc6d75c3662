//! Object storage for the transformed CSVs and Athena query results.

pub mod s3;

pub use s3::{
    ObjectSummary, S3Location, delete_object, encode_body, get_object_bytes, list_buckets,
    list_objects, object_key, other_variant_key, upload_file,
};
