mod handlers;
mod journal;
mod metrics;
mod routes;
mod run;

pub use routes::create_router;
