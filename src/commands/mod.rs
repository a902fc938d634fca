pub mod doctor;
pub mod next;
pub mod run;
pub mod schema;
