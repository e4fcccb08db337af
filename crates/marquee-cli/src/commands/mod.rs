pub mod check;
pub mod events;
pub mod init;
pub mod run;
