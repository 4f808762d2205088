pub mod generation_task;
pub mod rest;
pub mod state;

// Re-export the handlers so the binary can build the router from one place.
pub use rest::{
    clear_job_handler, create_generation_handler, create_session_handler, delete_session_handler,
    get_job_handler, get_session_handler, list_plans_handler, list_suggestions_handler,
};
