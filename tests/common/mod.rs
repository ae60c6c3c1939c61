mod test_server;

pub use test_server::{MAX_UPLOAD_BYTES, TestServer};
