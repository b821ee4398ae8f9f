pub mod debounce;
pub mod synchronizer;
