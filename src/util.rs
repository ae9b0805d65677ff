pub mod callback;
#[cfg(feature = "native")]
pub(crate) mod file_key;
pub(crate) mod spawn;
