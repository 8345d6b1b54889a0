mod record;
mod traits;

pub use record::PgMediaRecordStore;
pub use traits::MediaRecordStore;
