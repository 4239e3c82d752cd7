pub mod school_api;

pub use school_api::{LoginRequest, LoginResponse, SchoolApi, student_id};
