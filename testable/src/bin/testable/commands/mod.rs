pub mod expand;
pub mod generate;
pub mod init;
pub mod report;
