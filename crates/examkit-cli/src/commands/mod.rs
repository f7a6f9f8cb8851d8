pub mod bank;
pub mod delete;
pub mod grade;
pub mod init;
pub mod pull;
pub mod push;
pub mod validate;
