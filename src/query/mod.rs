pub mod ast;
pub mod types;
pub mod validator;
pub mod sql;
