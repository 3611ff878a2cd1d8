pub mod deletion;
pub mod duplicates;
pub mod fingerprint;
pub mod retention;
