pub mod db;
pub mod password;

pub use db::DbAdapter;
