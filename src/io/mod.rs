//! Object storage for staged table data

pub mod bucket;
pub mod local_bucket;
pub mod prefix;
pub mod s3_bucket;
pub mod upload;

pub use bucket::Bucket;
pub use local_bucket::LocalBucket;
pub use prefix::{external_location, prefix_dir, staged_prefix};
pub use s3_bucket::{S3Bucket, attach_s3_bucket};
pub use upload::upload_directory;
