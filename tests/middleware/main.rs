
mod client_test;
mod logging_test;
mod pipeline_test;
