mod unix;

pub use self::unix::{raise_open_file_limit, rlim_t};
