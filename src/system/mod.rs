pub mod interface;
pub mod network;
pub mod rate_file;
pub mod sampler;
