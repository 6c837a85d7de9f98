mod feed_worker;

pub use feed_worker::{apply_batch, feed_process, FeedContext};
