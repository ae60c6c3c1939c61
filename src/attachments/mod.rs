mod storage;

pub use storage::{AttachmentStore, decode_data_url};
