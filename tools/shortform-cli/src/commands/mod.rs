pub mod captions;
pub mod check;
pub mod graph;
pub mod init_config;
pub mod run;
